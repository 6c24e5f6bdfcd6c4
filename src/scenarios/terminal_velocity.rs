//! Speed of a sphere falling from rest, `dv/dt = g - k v^2` (down positive),
//! integrated with RK4 and with explicit Euler at the same step size.

use serde::{Deserialize, Serialize};

use crate::core::error::NumericsResult;
use crate::core::error_metrics::WorstCaseError;
use crate::core::euler::{self, EulerMode, StopCondition};
use crate::core::numeric::ensure_positive;
use crate::core::ode_solvers::rk4;

use super::common::Scenario;
use super::falling_sphere::{DragParams, FallingBody, SphereParams};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TerminalVelocityParams {
    pub sphere: SphereParams,
    pub drag: DragParams,
    pub t_final: f64,
    pub step: f64,
}

impl Default for TerminalVelocityParams {
    fn default() -> Self {
        TerminalVelocityParams {
            sphere: SphereParams::default(),
            drag: DragParams::default(),
            t_final: 10.0,
            step: 0.1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TerminalVelocityReport {
    pub terminal_speed: f64,
    pub samples: Vec<(f64, f64)>, // (t, v) from RK4
    pub exact: Vec<f64>,          // v at the same times
    pub error: WorstCaseError,
    pub euler_error: WorstCaseError, // explicit Euler, same step
}

impl Scenario for TerminalVelocityParams {
    type Report = TerminalVelocityReport;

    fn validate(&self) -> NumericsResult<()> {
        self.sphere.validate()?;
        self.drag.validate()?;
        ensure_positive(self.t_final, "t_final")?;
        ensure_positive(self.step, "step")?;
        Ok(())
    }

    fn run(&self) -> NumericsResult<TerminalVelocityReport> {
        self.validate()?;
        let body = FallingBody::new(&self.sphere, &self.drag)?;
        // `FallingBody` is up-positive; flip the sign for down-positive speed.
        let speed_rate = |v: f64| -body.acceleration(-v);
        let exact_speed = |t: f64| -body.exact_velocity(t);

        let samples = rk4(&|_t: f64, v: f64| speed_rate(v), 0.0, 0.0, self.t_final, self.step)?;
        let speeds: Vec<f64> = samples.iter().map(|&(_, v)| v).collect();
        let exact: Vec<f64> = samples.iter().map(|&(t, _)| exact_speed(t)).collect();
        let error = WorstCaseError::compute(&speeds, &exact)?;

        let euler_trajectory = euler::integrate(
            &|_x: f64, v: f64| speed_rate(v),
            0.0,
            StopCondition::FinalTime(self.t_final),
            self.step,
            0.0,
            0.0,
            EulerMode::Explicit,
        )?;
        let euler_speeds: Vec<f64> = euler_trajectory.iter().map(|s| s.v).collect();
        let euler_exact: Vec<f64> = euler_trajectory.iter().map(|s| exact_speed(s.t)).collect();
        let euler_error = WorstCaseError::compute(&euler_speeds, &euler_exact)?;

        tracing::info!(
            "Terminal speed {:.4} m/s; worst speed error {:.3e} (rk4) vs {:.3e} (euler)",
            body.terminal_speed(),
            error.absolute,
            euler_error.absolute
        );
        Ok(TerminalVelocityReport {
            terminal_speed: body.terminal_speed(),
            samples,
            exact,
            error,
            euler_error,
        })
    }
}
