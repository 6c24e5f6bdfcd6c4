//! Runs one root-finding method against one function from a small catalogue.

use serde::{Deserialize, Serialize};

use crate::core::error::NumericsResult;
use crate::core::numeric::{ensure_finite, ensure_positive};
use crate::core::root_finding::{Root, RootMethod, RootSearchConfig};

use super::common::Scenario;

/// A parachutist falling with linear drag `c`:
/// `v(c) = (g m / c) (1 - exp(-c t / m))`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ParachutistParams {
    pub mass: f64,     // kg
    pub gravity: f64,  // m/s^2
    pub velocity: f64, // target velocity, m/s
    pub time: f64,     // s
}

impl Default for ParachutistParams {
    fn default() -> Self {
        ParachutistParams {
            mass: 68.1,
            gravity: 9.81,
            velocity: 40.0,
            time: 10.0,
        }
    }
}

impl ParachutistParams {
    /// Velocity after `time` seconds with drag coefficient `drag` (kg/s).
    /// Without drag this is free fall, `g t`.
    pub fn velocity(&self, drag: f64) -> f64 {
        if drag == 0.0 {
            return self.gravity * self.time;
        }
        self.gravity * self.mass / drag * (1.0 - (-drag * self.time / self.mass).exp())
    }

    /// Zero at the drag coefficient that gives the target velocity.
    pub fn residual(&self, drag: f64) -> f64 {
        self.velocity(drag) - self.velocity
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RootTarget {
    ParachutistDrag(ParachutistParams),
    Cosine,
    Sine,
    PowerOfTwoMinus { value: f64 }, // 2^x - value
    ExpMinusX,                      // exp(-x) - x
}

impl RootTarget {
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            RootTarget::ParachutistDrag(parachutist) => parachutist.residual(x),
            RootTarget::Cosine => x.cos(),
            RootTarget::Sine => x.sin(),
            RootTarget::PowerOfTwoMinus { value } => 2f64.powf(x) - value,
            RootTarget::ExpMinusX => (-x).exp() - x,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RootTarget::ParachutistDrag(_) => "parachutist drag",
            RootTarget::Cosine => "cos(x)",
            RootTarget::Sine => "sin(x)",
            RootTarget::PowerOfTwoMinus { .. } => "2^x - value",
            RootTarget::ExpMinusX => "exp(-x) - x",
        }
    }

    fn validate(&self) -> NumericsResult<()> {
        match self {
            RootTarget::ParachutistDrag(parachutist) => {
                ensure_positive(parachutist.mass, "mass")?;
                ensure_positive(parachutist.gravity, "gravity")?;
                ensure_finite(parachutist.velocity, "velocity")?;
                ensure_positive(parachutist.time, "time")?;
            }
            RootTarget::PowerOfTwoMinus { value } => {
                ensure_finite(*value, "value")?;
            }
            RootTarget::Cosine | RootTarget::Sine | RootTarget::ExpMinusX => {}
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RootSearchParams {
    pub target: RootTarget,
    pub method: RootMethod,
    #[serde(default)]
    pub config: RootSearchConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RootSearchReport {
    pub target: String,
    pub method: String,
    pub root: Root,
    pub residual: f64, // target evaluated at the root
}

impl Scenario for RootSearchParams {
    type Report = RootSearchReport;

    fn validate(&self) -> NumericsResult<()> {
        self.target.validate()?;
        match self.method {
            RootMethod::Bisection { lower, upper } | RootMethod::FalsePosition { lower, upper } => {
                ensure_finite(lower, "lower")?;
                ensure_finite(upper, "upper")?;
            }
            RootMethod::FixedPoint { initial, .. } => {
                ensure_finite(initial, "initial")?;
            }
            RootMethod::Secant { initial, step } => {
                ensure_finite(initial, "initial")?;
                ensure_positive(step, "step")?;
            }
        }
        ensure_positive(self.config.tolerance, "tolerance")?;
        Ok(())
    }

    fn run(&self) -> NumericsResult<RootSearchReport> {
        self.validate()?;
        let target = self.target;
        let f = move |x: f64| target.evaluate(x);
        let root = self.method.solve(&f, &self.config).map_err(|err| {
            if err.is_non_convergence() {
                tracing::warn!("{} on {}: {}", self.method.name(), target.name(), err);
            }
            err
        })?;
        tracing::info!(
            "{} on {}: root {} after {} iterations",
            self.method.name(),
            target.name(),
            root.estimate,
            root.iterations
        );
        Ok(RootSearchReport {
            target: target.name().to_owned(),
            method: self.method.name().to_owned(),
            root,
            residual: target.evaluate(root.estimate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::NumericsError;
    use crate::core::root_finding::FixedPointForm;
    use approx::assert_relative_eq;

    #[test]
    fn parachutist_velocity() {
        let parachutist = ParachutistParams::default();
        assert_relative_eq!(parachutist.velocity(0.0), 98.1);
        assert_relative_eq!(parachutist.velocity(1e-9), 98.1, epsilon = 1e-4);
        assert_relative_eq!(parachutist.residual(4.0), 34.19047, epsilon = 1e-4);
        assert_relative_eq!(parachutist.residual(20.0), -8.36838, epsilon = 1e-4);
    }

    #[test]
    fn parachutist_drag_by_bisection() {
        let params: RootSearchParams = serde_json::from_str(
            r#"{
                "target": { "parachutist_drag": {} },
                "method": { "bisection": { "lower": 4.0, "upper": 20.0 } },
                "config": { "tolerance": 1e-6 }
            }"#,
        )
        .unwrap();
        assert_eq!(params.config.max_iterations, 1000);
        let report = params.run().unwrap();
        assert_relative_eq!(report.root.estimate, 14.8011, epsilon = 1e-3);
        assert_relative_eq!(report.residual, 0.0, epsilon = 1e-3);
        assert_eq!(report.method, "bisection");
    }

    #[test]
    fn exp_minus_x_by_secant() {
        let params = RootSearchParams {
            target: RootTarget::ExpMinusX,
            method: RootMethod::Secant {
                initial: 1.0,
                step: 1e-4,
            },
            config: RootSearchConfig::with_tolerance(1e-8),
        };
        let report = params.run().unwrap();
        assert_relative_eq!(report.root.estimate, 0.567143290409784, epsilon = 1e-8);
    }

    #[test]
    fn divergent_fixed_point_is_reported() {
        let params = RootSearchParams {
            target: RootTarget::PowerOfTwoMinus { value: 5.0 },
            method: RootMethod::FixedPoint {
                initial: 4.0,
                form: FixedPointForm::Direct,
            },
            config: RootSearchConfig::default(),
        };
        let err = params.run().unwrap_err();
        assert!(matches!(err, NumericsError::Diverged { .. }));
    }

    #[test]
    fn missing_bracket_is_reported() {
        let params = RootSearchParams {
            target: RootTarget::Cosine,
            method: RootMethod::FalsePosition {
                lower: 0.0,
                upper: 1.0,
            },
            config: RootSearchConfig::default(),
        };
        assert!(matches!(
            params.run(),
            Err(NumericsError::NoSignChange { .. })
        ));
    }
}
