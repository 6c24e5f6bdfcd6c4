//! Bracketing (bisection, false position) and open (fixed-point, secant) root-finders.
//!
//! Every method runs the same small state machine: validate the inputs, iterate,
//! then end in exactly one of
//!
//! - `Ok(Root)` when the approximate relative error between successive
//!   estimates drops below `tolerance`, or `f` is exactly zero at an estimate;
//! - `NotConverged` when `max_iterations` is exhausted;
//! - `Diverged` when an open method's iterate leaves `divergence_threshold`
//!   (or stops being finite);
//! - `NoSignChange` / `SignMismatch` when a bracket is missing or lost;
//! - `Degenerate` when an update would divide by zero.

use serde::{Deserialize, Serialize};

use crate::core::error::{NumericsError, NumericsResult};
use crate::core::numeric::{ensure_finite, ensure_positive};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RootSearchConfig {
    pub tolerance: f64, // approximate relative error at which to stop
    pub max_iterations: usize,
    pub divergence_threshold: f64, // open methods give up once |x| exceeds this
}

impl Default for RootSearchConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_iterations: 1000,
            divergence_threshold: 1e10,
        }
    }
}

impl RootSearchConfig {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    fn validate(&self) -> NumericsResult<()> {
        ensure_positive(self.tolerance, "tolerance")?;
        ensure_positive(self.divergence_threshold, "divergence_threshold")?;
        if self.max_iterations == 0 {
            return Err(NumericsError::invalid_argument(
                "max_iterations must be at least one",
            ));
        }
        Ok(())
    }
}

/// A converged root estimate.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub estimate: f64,
    pub iterations: usize,
    pub relative_error: f64, // approximate relative error at termination
}

/// `|new - old| / |old|`.
///
/// Zero when both estimates are zero. A zero `old` with a non-zero `new` has no
/// relative error and is reported as `Degenerate`.
pub fn approximate_relative_error(old: f64, new: f64) -> NumericsResult<f64> {
    if old == 0.0 {
        if new == 0.0 {
            return Ok(0.0);
        }
        return Err(NumericsError::Degenerate {
            what: "relative error against a previous estimate of exactly zero",
        });
    }
    Ok(((new - old) / old).abs())
}

fn same_sign(a: f64, b: f64) -> bool {
    (a > 0.0 && b > 0.0) || (a < 0.0 && b < 0.0)
}

fn evaluate<F: Fn(f64) -> f64>(f: &F, x: f64) -> NumericsResult<f64> {
    ensure_finite(f(x), "root function value")
}

/// Returns `(f(lower), f(upper))` once the interval is known to bracket a sign change.
fn check_bracket<F: Fn(f64) -> f64>(f: &F, lower: f64, upper: f64) -> NumericsResult<(f64, f64)> {
    ensure_finite(lower, "lower bound")?;
    ensure_finite(upper, "upper bound")?;
    let f_lower = evaluate(f, lower)?;
    let f_upper = evaluate(f, upper)?;
    let brackets = (f_lower < 0.0 && f_upper > 0.0) || (f_lower > 0.0 && f_upper < 0.0);
    if !brackets {
        return Err(NumericsError::NoSignChange {
            lower,
            upper,
            f_lower,
            f_upper,
        });
    }
    Ok((f_lower, f_upper))
}

/// Bisection on `[lower, upper]`, which must satisfy `f(lower) * f(upper) < 0`.
pub fn bisection<F>(f: &F, lower: f64, upper: f64, config: &RootSearchConfig) -> NumericsResult<Root>
where
    F: Fn(f64) -> f64,
{
    config.validate()?;
    let (mut f_lower, _) = check_bracket(f, lower, upper)?;
    let (mut xl, mut xu) = (lower, upper);

    for iteration in 1..=config.max_iterations {
        let xr = 0.5 * (xl + xu);
        let fr = evaluate(f, xr)?;
        tracing::trace!(iteration, xl, xu, xr, fr, "bisection");
        if fr == 0.0 {
            return Ok(Root {
                estimate: xr,
                iterations: iteration,
                relative_error: 0.0,
            });
        }
        if same_sign(f_lower, fr) {
            xl = xr;
            f_lower = fr;
        } else {
            xu = xr;
        }

        // The bracket keeps shrinking, so a midpoint of exactly zero just defers the test.
        let next = 0.5 * (xl + xu);
        let ea = approximate_relative_error(xr, next).unwrap_or(f64::INFINITY);
        if ea < config.tolerance {
            tracing::debug!(iteration, root = next, "bisection converged");
            return Ok(Root {
                estimate: next,
                iterations: iteration,
                relative_error: ea,
            });
        }
    }

    Err(NumericsError::NotConverged {
        method: "bisection",
        iterations: config.max_iterations,
        estimate: 0.5 * (xl + xu),
    })
}

/// False position (regula falsi): bisection with the midpoint replaced by the
/// root of the chord through `(xl, f(xl))` and `(xu, f(xu))`.
pub fn false_position<F>(
    f: &F,
    lower: f64,
    upper: f64,
    config: &RootSearchConfig,
) -> NumericsResult<Root>
where
    F: Fn(f64) -> f64,
{
    config.validate()?;
    let (mut f_lower, mut f_upper) = check_bracket(f, lower, upper)?;
    let (mut xl, mut xu) = (lower, upper);
    let mut previous: Option<f64> = None;

    for iteration in 1..=config.max_iterations {
        let denominator = f_lower - f_upper;
        if denominator == 0.0 {
            return Err(NumericsError::Degenerate {
                what: "f(lower) == f(upper) in the false-position chord",
            });
        }
        let xr = xu - f_upper * (xl - xu) / denominator;
        let fr = evaluate(f, xr)?;
        tracing::trace!(iteration, xl, xu, xr, fr, "false position");
        if fr == 0.0 {
            return Ok(Root {
                estimate: xr,
                iterations: iteration,
                relative_error: 0.0,
            });
        }

        if let Some(old) = previous {
            let ea = approximate_relative_error(old, xr).unwrap_or(f64::INFINITY);
            if ea < config.tolerance {
                tracing::debug!(iteration, root = xr, "false position converged");
                return Ok(Root {
                    estimate: xr,
                    iterations: iteration,
                    relative_error: ea,
                });
            }
        }

        if same_sign(f_lower, fr) {
            xl = xr;
            f_lower = fr;
        } else if same_sign(f_upper, fr) {
            xu = xr;
            f_upper = fr;
        } else {
            return Err(NumericsError::SignMismatch { estimate: xr });
        }
        previous = Some(xr);
    }

    Err(NumericsError::NotConverged {
        method: "false position",
        iterations: config.max_iterations,
        estimate: previous.unwrap_or(0.5 * (xl + xu)),
    })
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FixedPointForm {
    /// x <- g(x)
    Direct,
    /// x <- x + g(x), which turns a root of g into a fixed point.
    #[default]
    Residual,
}

impl FixedPointForm {
    #[inline]
    pub fn next<G: Fn(f64) -> f64>(&self, g: &G, x: f64) -> f64 {
        match self {
            FixedPointForm::Direct => g(x),
            FixedPointForm::Residual => x + g(x),
        }
    }
}

fn check_divergence(
    method: &'static str,
    iterations: usize,
    estimate: f64,
    config: &RootSearchConfig,
) -> NumericsResult<()> {
    if !estimate.is_finite() || estimate.abs() > config.divergence_threshold {
        tracing::debug!(method, iterations, estimate, "iteration diverged");
        return Err(NumericsError::Diverged {
            method,
            iterations,
            estimate,
        });
    }
    Ok(())
}

/// Drives an open method: `update` maps one estimate to the next. Successive
/// estimates are compared from the first update onwards; the seed itself is not.
fn iterate_open_method<U>(
    method: &'static str,
    x0: f64,
    config: &RootSearchConfig,
    update: U,
) -> NumericsResult<Root>
where
    U: Fn(f64) -> NumericsResult<Option<f64>>,
{
    config.validate()?;
    ensure_finite(x0, "initial estimate")?;

    let mut x = x0;
    for iteration in 1..=config.max_iterations {
        let next = match update(x)? {
            Some(next) => next,
            None => {
                // `x` is an exact root.
                return Ok(Root {
                    estimate: x,
                    iterations: iteration - 1,
                    relative_error: 0.0,
                });
            }
        };
        tracing::trace!(method, iteration, x, next, "open method");
        check_divergence(method, iteration, next, config)?;
        if iteration > 1 {
            let ea = approximate_relative_error(x, next)?;
            if ea < config.tolerance {
                tracing::debug!(method, iteration, root = next, "converged");
                return Ok(Root {
                    estimate: next,
                    iterations: iteration,
                    relative_error: ea,
                });
            }
        }
        x = next;
    }

    Err(NumericsError::NotConverged {
        method,
        iterations: config.max_iterations,
        estimate: x,
    })
}

/// Fixed-point iteration of `g` in the chosen form. Non-contracting maps are
/// caught by the divergence threshold or the iteration cap.
pub fn fixed_point<G>(
    g: &G,
    x0: f64,
    form: FixedPointForm,
    config: &RootSearchConfig,
) -> NumericsResult<Root>
where
    G: Fn(f64) -> f64,
{
    iterate_open_method("fixed-point iteration", x0, config, |x| {
        Ok(Some(form.next(g, x)))
    })
}

pub const DEFAULT_SECANT_STEP: f64 = 1e-4;

/// Secant method with a finite-difference derivative:
/// `x <- x - s * f(x) / (f(x + s) - f(x))`.
pub fn secant<F>(f: &F, x0: f64, step: f64, config: &RootSearchConfig) -> NumericsResult<Root>
where
    F: Fn(f64) -> f64,
{
    ensure_positive(step, "secant step")?;
    iterate_open_method("secant method", x0, config, |x| {
        let fx = evaluate(f, x)?;
        if fx == 0.0 {
            return Ok(None);
        }
        let slope_numerator = evaluate(f, x + step)? - fx;
        if slope_numerator == 0.0 {
            return Err(NumericsError::Degenerate {
                what: "f(x + s) == f(x) in the secant update",
            });
        }
        Ok(Some(x - step * fx / slope_numerator))
    })
}

/// A root-finding method together with its seeds, as read from a parameter file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RootMethod {
    Bisection {
        lower: f64,
        upper: f64,
    },
    FalsePosition {
        lower: f64,
        upper: f64,
    },
    FixedPoint {
        initial: f64,
        #[serde(default)]
        form: FixedPointForm,
    },
    Secant {
        initial: f64,
        #[serde(default = "default_secant_step")]
        step: f64,
    },
}

fn default_secant_step() -> f64 {
    DEFAULT_SECANT_STEP
}

impl RootMethod {
    pub fn name(&self) -> &'static str {
        match self {
            RootMethod::Bisection { .. } => "bisection",
            RootMethod::FalsePosition { .. } => "false position",
            RootMethod::FixedPoint { .. } => "fixed-point iteration",
            RootMethod::Secant { .. } => "secant method",
        }
    }

    /// Runs the method on `f`. For fixed-point iteration `f` plays the role of `g`.
    pub fn solve<F: Fn(f64) -> f64>(&self, f: &F, config: &RootSearchConfig) -> NumericsResult<Root> {
        match *self {
            RootMethod::Bisection { lower, upper } => bisection(f, lower, upper, config),
            RootMethod::FalsePosition { lower, upper } => false_position(f, lower, upper, config),
            RootMethod::FixedPoint { initial, form } => fixed_point(f, initial, form, config),
            RootMethod::Secant { initial, step } => secant(f, initial, step, config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use more_asserts::{assert_le, assert_lt};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn power_of_two_minus_five(x: f64) -> f64 {
        2f64.powf(x) - 5.0
    }

    #[test]
    fn relative_error_special_cases() {
        assert_relative_eq!(approximate_relative_error(2.0, 2.1).unwrap(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(approximate_relative_error(-2.0, -2.1).unwrap(), 0.05, epsilon = 1e-12);
        assert_eq!(approximate_relative_error(0.0, 0.0).unwrap(), 0.0);
        assert!(matches!(
            approximate_relative_error(0.0, 1e-3),
            Err(NumericsError::Degenerate { .. })
        ));
    }

    #[test]
    fn bisection_textbook_roots() {
        let config = RootSearchConfig::default();
        let root = bisection(&f64::cos, 0.0, 3.0, &config).unwrap();
        assert_relative_eq!(root.estimate, FRAC_PI_2, epsilon = 5e-3);
        assert_lt!(root.relative_error, config.tolerance);

        let root = bisection(&f64::sin, 1.0, 5.0, &config).unwrap();
        assert_relative_eq!(root.estimate, PI, epsilon = 5e-3);

        let root = bisection(&power_of_two_minus_five, 0.0, 3.0, &config).unwrap();
        assert_relative_eq!(root.estimate, 5f64.log2(), epsilon = 5e-3);
    }

    #[test]
    fn bisection_tighter_tolerance_is_more_accurate() {
        let loose = bisection(&f64::cos, 0.0, 3.0, &RootSearchConfig::with_tolerance(1e-3)).unwrap();
        let tight = bisection(&f64::cos, 0.0, 3.0, &RootSearchConfig::with_tolerance(1e-9)).unwrap();
        assert_lt!(loose.iterations, tight.iterations);
        assert_relative_eq!(tight.estimate, FRAC_PI_2, epsilon = 1e-8);
    }

    #[test]
    fn bisection_exact_midpoint_root() {
        let root = bisection(&|x: f64| x - 1.5, 0.0, 3.0, &RootSearchConfig::default()).unwrap();
        assert_eq!(root.estimate, 1.5);
        assert_eq!(root.iterations, 1);
        assert_eq!(root.relative_error, 0.0);
    }

    #[test]
    fn bisection_survives_a_zero_midpoint() {
        let root = bisection(&|x: f64| x - 0.3, -1.0, 1.0, &RootSearchConfig::default()).unwrap();
        assert_relative_eq!(root.estimate, 0.3, epsilon = 1e-3);
    }

    #[test]
    fn bracketing_methods_require_a_sign_change() {
        let config = RootSearchConfig::default();
        let shifted = |x: f64| x * x + 1.0;
        assert!(matches!(
            bisection(&shifted, -1.0, 1.0, &config),
            Err(NumericsError::NoSignChange { .. })
        ));
        assert!(matches!(
            false_position(&f64::cos, 0.0, 1.0, &config),
            Err(NumericsError::NoSignChange { .. })
        ));
    }

    #[test]
    fn bisection_reports_iteration_cap() {
        let config = RootSearchConfig {
            tolerance: 1e-15,
            max_iterations: 5,
            ..RootSearchConfig::default()
        };
        match bisection(&f64::cos, 0.0, 3.0, &config) {
            Err(NumericsError::NotConverged {
                iterations,
                estimate,
                ..
            }) => {
                assert_eq!(iterations, 5);
                assert_relative_eq!(estimate, FRAC_PI_2, epsilon = 0.1);
            }
            other => panic!("expected non-convergence, got {other:?}"),
        }
    }

    #[test]
    fn false_position_textbook_roots() {
        let config = RootSearchConfig::default();
        let root = false_position(&f64::cos, 0.0, 3.0, &config).unwrap();
        assert_relative_eq!(root.estimate, FRAC_PI_2, epsilon = 5e-3);

        let root = false_position(&f64::sin, 1.0, 5.0, &config).unwrap();
        assert_relative_eq!(root.estimate, PI, epsilon = 5e-3);

        let root = false_position(&power_of_two_minus_five, 0.0, 3.0, &config).unwrap();
        assert_relative_eq!(root.estimate, 5f64.log2(), epsilon = 5e-3);
    }

    #[test]
    fn false_position_exact_chord_root() {
        let root = false_position(&|x: f64| 2.0 * x - 1.0, 0.0, 3.0, &RootSearchConfig::default())
            .unwrap();
        assert_relative_eq!(root.estimate, 0.5, epsilon = 1e-12);
        assert_eq!(root.iterations, 1);
    }

    #[test]
    fn fixed_point_residual_form() {
        let config = RootSearchConfig::default();
        let root = fixed_point(&f64::cos, 1.0, FixedPointForm::Residual, &config).unwrap();
        assert_relative_eq!(root.estimate, FRAC_PI_2, epsilon = 5e-3);

        // x + e^-x - x = e^-x contracts onto the omega constant.
        let root =
            fixed_point(&|x: f64| (-x).exp() - x, 0.0, FixedPointForm::Residual, &config).unwrap();
        assert_relative_eq!(root.estimate, 0.567_143_290_409_783_8, epsilon = 2e-3);
    }

    #[test]
    fn fixed_point_direct_form_diverges() {
        // x <- e^-x - x has |g'| > 1 everywhere, so iterates run away.
        let result = fixed_point(
            &|x: f64| (-x).exp() - x,
            -5.0,
            FixedPointForm::Direct,
            &RootSearchConfig::default(),
        );
        match result {
            Err(NumericsError::Diverged { iterations, .. }) => assert_le!(iterations, 10),
            other => panic!("expected divergence, got {other:?}"),
        }
    }

    #[test]
    fn fixed_point_bounded_oscillation_hits_iteration_cap() {
        let config = RootSearchConfig {
            max_iterations: 25,
            ..RootSearchConfig::default()
        };
        let result = fixed_point(&|x: f64| -x, 1.0, FixedPointForm::Direct, &config);
        assert!(matches!(
            result,
            Err(NumericsError::NotConverged { iterations: 25, .. })
        ));
    }

    #[test]
    fn secant_textbook_roots() {
        let config = RootSearchConfig::default();
        let root = secant(&f64::cos, 1.0, DEFAULT_SECANT_STEP, &config).unwrap();
        assert_relative_eq!(root.estimate, FRAC_PI_2, epsilon = 1e-4);

        let root = secant(&power_of_two_minus_five, 2.0, DEFAULT_SECANT_STEP, &config).unwrap();
        assert_relative_eq!(root.estimate, 5f64.log2(), epsilon = 1e-4);

        let root = secant(&|x: f64| (-x).exp() - x, 0.0, DEFAULT_SECANT_STEP, &config).unwrap();
        assert_relative_eq!(root.estimate, 0.567_143_290_409_783_8, epsilon = 1e-4);
    }

    #[test]
    fn secant_flat_function_is_degenerate() {
        let result = secant(&|_x: f64| 1.0, 0.5, 1e-4, &RootSearchConfig::default());
        assert!(matches!(result, Err(NumericsError::Degenerate { .. })));
    }

    #[test]
    fn secant_seed_on_root() {
        let root = secant(&|x: f64| x - 2.0, 2.0, 1e-4, &RootSearchConfig::default()).unwrap();
        assert_eq!(root.estimate, 2.0);
        assert_eq!(root.iterations, 0);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = RootSearchConfig {
            tolerance: 0.0,
            ..RootSearchConfig::default()
        };
        assert!(matches!(
            bisection(&f64::cos, 0.0, 3.0, &config),
            Err(NumericsError::InvalidArgument { .. })
        ));
        assert!(matches!(
            secant(&f64::cos, 1.0, 0.0, &RootSearchConfig::default()),
            Err(NumericsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn root_method_from_json() {
        let method: RootMethod =
            serde_json::from_str(r#"{"secant": {"initial": 1.0}}"#).unwrap();
        assert_eq!(
            method,
            RootMethod::Secant {
                initial: 1.0,
                step: DEFAULT_SECANT_STEP
            }
        );
        let root = method.solve(&f64::cos, &RootSearchConfig::default()).unwrap();
        assert_relative_eq!(root.estimate, FRAC_PI_2, epsilon = 1e-4);

        let method: RootMethod =
            serde_json::from_str(r#"{"bisection": {"lower": 0.0, "upper": 3.0}}"#).unwrap();
        assert_eq!(method.name(), "bisection");
    }
}
