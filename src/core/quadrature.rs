//! Fixed-step Riemann-sum and trapezoidal quadrature.
//!
//! Sample points are `x_i = a + i * dx` for `i in 0..n`, with `n` the number of
//! steps needed to span `[a, b)`. Every panel is `dx` wide except the last, which
//! is cut off at `b` when `dx` does not divide the interval. There is no adaptive
//! refinement: accuracy is governed by `dx` alone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{NumericsError, NumericsResult};
use crate::core::numeric::{ensure_finite, fixed_step_count, sample_capacity};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuadratureRule {
    Left,
    Right,
    #[serde(alias = "midpoint")]
    Mid,
    Trapezoid,
}

impl QuadratureRule {
    pub const ALL: [QuadratureRule; 4] = [
        QuadratureRule::Left,
        QuadratureRule::Right,
        QuadratureRule::Mid,
        QuadratureRule::Trapezoid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QuadratureRule::Left => "left",
            QuadratureRule::Right => "right",
            QuadratureRule::Mid => "mid",
            QuadratureRule::Trapezoid => "trapezoid",
        }
    }

    /// Area contributed by the panel `[x, x + dx]`.
    #[inline]
    fn panel_area<F: Fn(f64) -> f64>(&self, f: &F, x: f64, dx: f64) -> f64 {
        match self {
            QuadratureRule::Left => f(x) * dx,
            QuadratureRule::Right => f(x + dx) * dx,
            QuadratureRule::Mid => f(x + 0.5 * dx) * dx,
            QuadratureRule::Trapezoid => 0.5 * (f(x) + f(x + dx)) * dx,
        }
    }
}

impl fmt::Display for QuadratureRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuadratureRule {
    type Err = NumericsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(QuadratureRule::Left),
            "right" => Ok(QuadratureRule::Right),
            "mid" | "midpoint" => Ok(QuadratureRule::Mid),
            "trapezoid" => Ok(QuadratureRule::Trapezoid),
            _ => Err(NumericsError::invalid_argument(format!(
                "unknown quadrature method `{s}` (expected left, right, mid, or trapezoid)"
            ))),
        }
    }
}

fn panel_count(a: f64, b: f64, dx: f64) -> NumericsResult<usize> {
    ensure_finite(a, "a")?;
    ensure_finite(b, "b")?;
    if b < a {
        return Err(NumericsError::invalid_argument(format!(
            "upper bound {b} is below lower bound {a}"
        )));
    }
    fixed_step_count(b - a, dx)
}

/// Left edge and width of each of the `n` panels covering `[a, b]`.
fn panels(a: f64, b: f64, dx: f64, n: usize) -> impl Iterator<Item = (f64, f64)> {
    (0..n).map(move |i| {
        let x = a + (i as f64) * dx;
        let width = if i + 1 == n { b - x } else { dx };
        (x, width)
    })
}

/// Approximates the integral of `f` over `[a, b]` with panels of width `dx`.
pub fn integrate<F>(f: &F, a: f64, b: f64, dx: f64, rule: QuadratureRule) -> NumericsResult<f64>
where
    F: Fn(f64) -> f64,
{
    let n = panel_count(a, b, dx)?;
    let total: f64 = panels(a, b, dx, n)
        .map(|(x, width)| rule.panel_area(f, x, width))
        .sum();
    ensure_finite(total, "integral estimate")
}

/// As [`integrate`], with the rule given by name. Unknown names are rejected.
pub fn integrate_by_name<F>(f: &F, a: f64, b: f64, dx: f64, method: &str) -> NumericsResult<f64>
where
    F: Fn(f64) -> f64,
{
    integrate(f, a, b, dx, method.parse()?)
}

/// Running integral: `(a, 0)` followed by the right edge of each panel and the
/// sum of the panels up to it. The last entry sits at `b`.
pub fn cumulative_integral<F>(
    f: &F,
    a: f64,
    b: f64,
    dx: f64,
    rule: QuadratureRule,
) -> NumericsResult<Vec<(f64, f64)>>
where
    F: Fn(f64) -> f64,
{
    let n = panel_count(a, b, dx)?;
    let mut series = Vec::with_capacity(sample_capacity(n as f64, "cumulative integral")?);
    series.push((a, 0.0));
    let mut total = 0.0;
    for (x, width) in panels(a, b, dx, n) {
        total += rule.panel_area(f, x, width);
        series.push((x + width, total));
    }
    ensure_finite(total, "integral estimate")?;
    Ok(series)
}
