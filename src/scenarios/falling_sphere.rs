//! A sphere dropped from rest under gravity and quadratic drag, integrated with
//! Euler at several step sizes and compared against the closed-form solution.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::core::error::{NumericsError, NumericsResult};
use crate::core::error_metrics::WorstCaseError;
use crate::core::euler::{integrate, EulerMode, StopCondition, Trajectory};
use crate::core::numeric::{ensure_finite, ensure_positive, nearly_equal, Tolerances};

use super::common::Scenario;

/// Relative band around the terminal speed that counts as having reached it.
const TERMINAL_SPEED_BAND: f64 = 0.01;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DragParams {
    pub drag_coefficient: f64,
    pub air_density: f64, // kg/m^3
    pub gravity: f64,     // m/s^2, magnitude
}

impl Default for DragParams {
    fn default() -> Self {
        DragParams {
            drag_coefficient: 0.5,
            air_density: 1.225,
            gravity: 9.80665,
        }
    }
}

impl DragParams {
    pub fn validate(&self) -> NumericsResult<()> {
        ensure_positive(self.drag_coefficient, "drag_coefficient")?;
        ensure_positive(self.air_density, "air_density")?;
        ensure_positive(self.gravity, "gravity")?;
        Ok(())
    }
}

/// Defaults to a basketball.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SphereParams {
    pub mass: f64,   // kg
    pub radius: f64, // m
}

impl Default for SphereParams {
    fn default() -> Self {
        SphereParams {
            mass: 0.625,
            radius: 0.12,
        }
    }
}

impl SphereParams {
    pub fn validate(&self) -> NumericsResult<()> {
        ensure_positive(self.mass, "mass")?;
        ensure_positive(self.radius, "radius")?;
        Ok(())
    }

    pub fn cross_section_area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

/// Vertical motion with quadratic drag, up positive:
/// `a = -g - k v |v|` with `k = D rho A / (2 m)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingBody {
    pub gravity: f64,
    pub drag_per_mass: f64, // k, 1/m
}

impl FallingBody {
    pub fn new(sphere: &SphereParams, drag: &DragParams) -> NumericsResult<FallingBody> {
        sphere.validate()?;
        drag.validate()?;
        Ok(FallingBody {
            gravity: drag.gravity,
            drag_per_mass: drag.drag_coefficient * drag.air_density * sphere.cross_section_area()
                / (2.0 * sphere.mass),
        })
    }

    /// Drag always opposes the velocity, whichever way the body is moving.
    pub fn acceleration(&self, velocity: f64) -> f64 {
        -self.gravity - self.drag_per_mass * velocity * velocity.abs()
    }

    /// `sqrt(2 m g / (D rho A))`
    pub fn terminal_speed(&self) -> f64 {
        (self.gravity / self.drag_per_mass).sqrt()
    }

    fn rate(&self) -> f64 {
        (self.gravity * self.drag_per_mass).sqrt()
    }

    /// Velocity after falling from rest for `t` seconds (negative, i.e. downward).
    pub fn exact_velocity(&self, t: f64) -> f64 {
        -self.terminal_speed() * (self.rate() * t).tanh()
    }

    /// Height after falling from rest at `initial_height` for `t` seconds.
    pub fn exact_position(&self, initial_height: f64, t: f64) -> f64 {
        initial_height - ln_cosh(self.rate() * t) / self.drag_per_mass
    }
}

/// `ln(cosh(z))` without overflowing for large `z`.
fn ln_cosh(z: f64) -> f64 {
    let z = z.abs();
    z + (-2.0 * z).exp().ln_1p() - std::f64::consts::LN_2
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FallingSphereParams {
    #[serde(default)]
    pub sphere: SphereParams,
    #[serde(default)]
    pub drag: DragParams,
    pub initial_height: f64,
    #[serde(default)]
    pub floor: f64,
    pub time_steps: Vec<f64>, // one independent run per step size
    #[serde(default)]
    pub mode: EulerMode,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_max_steps() -> usize {
    1_000_000
}

impl Default for FallingSphereParams {
    fn default() -> Self {
        FallingSphereParams {
            sphere: SphereParams::default(),
            drag: DragParams::default(),
            initial_height: 100.0,
            floor: 0.0,
            time_steps: vec![0.1, 0.01, 0.001],
            mode: EulerMode::default(),
            max_steps: default_max_steps(),
        }
    }
}

/// Accuracy of one Euler run against the closed-form fall.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepSizeStudy {
    pub time_step: f64,
    pub steps: usize,
    pub impact_time: f64, // time of the first sample below the floor
    pub impact_speed: f64,
    pub velocity_error: WorstCaseError,
    pub position_error: WorstCaseError,
    pub reached_terminal_velocity: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FallingSphereReport {
    pub terminal_speed: f64,
    pub studies: Vec<StepSizeStudy>, // same order as `time_steps`
    pub trajectory: Trajectory<f64>, // run with the first time step
}

impl FallingSphereParams {
    fn simulate(&self, body: &FallingBody, dt: f64) -> NumericsResult<Trajectory<f64>> {
        let floor = self.floor;
        let below_floor = move |x: &f64| *x < floor;
        integrate(
            &|_x: f64, v: f64| body.acceleration(v),
            0.0,
            StopCondition::Predicate {
                predicate: &below_floor,
                max_steps: self.max_steps,
            },
            dt,
            self.initial_height,
            0.0,
            self.mode,
        )
    }

    fn study(&self, body: &FallingBody, dt: f64) -> NumericsResult<(StepSizeStudy, Trajectory<f64>)> {
        let trajectory = self.simulate(body, dt)?;
        let times: Vec<f64> = trajectory.iter().map(|s| s.t).collect();
        let velocities: Vec<f64> = trajectory.iter().map(|s| s.v).collect();
        let positions: Vec<f64> = trajectory.iter().map(|s| s.x).collect();
        let exact_velocities: Vec<f64> = times.iter().map(|&t| body.exact_velocity(t)).collect();
        let exact_positions: Vec<f64> = times
            .iter()
            .map(|&t| body.exact_position(self.initial_height, t))
            .collect();

        let terminal_speed = body.terminal_speed();
        let band = Tolerances {
            abs: 0.0,
            rel: TERMINAL_SPEED_BAND,
        };
        let impact = trajectory[trajectory.len() - 1];
        let study = StepSizeStudy {
            time_step: dt,
            steps: trajectory.len() - 1,
            impact_time: impact.t,
            impact_speed: impact.v.abs(),
            velocity_error: WorstCaseError::compute(&velocities, &exact_velocities)?,
            position_error: WorstCaseError::compute(&positions, &exact_positions)?,
            reached_terminal_velocity: velocities
                .iter()
                .any(|v| nearly_equal(v.abs(), terminal_speed, band)),
        };
        tracing::debug!(?study, "falling sphere run");
        Ok((study, trajectory))
    }
}

impl Scenario for FallingSphereParams {
    type Report = FallingSphereReport;

    fn validate(&self) -> NumericsResult<()> {
        self.sphere.validate()?;
        self.drag.validate()?;
        ensure_finite(self.initial_height, "initial_height")?;
        ensure_finite(self.floor, "floor")?;
        if self.initial_height <= self.floor {
            return Err(NumericsError::invalid_argument(format!(
                "initial_height {} must be above the floor {}",
                self.initial_height, self.floor
            )));
        }
        if self.time_steps.is_empty() {
            return Err(NumericsError::invalid_argument("time_steps is empty"));
        }
        for &dt in &self.time_steps {
            ensure_positive(dt, "time step")?;
        }
        Ok(())
    }

    fn run(&self) -> NumericsResult<FallingSphereReport> {
        self.validate()?;
        let body = FallingBody::new(&self.sphere, &self.drag)?;

        let mut runs = self
            .time_steps
            .par_iter()
            .map(|&dt| self.study(&body, dt))
            .collect::<NumericsResult<Vec<_>>>()?;

        let trajectory = std::mem::take(&mut runs[0].1);
        let studies: Vec<StepSizeStudy> = runs.into_iter().map(|(study, _)| study).collect();
        for study in &studies {
            tracing::info!(
                "dt = {}: impact at t = {:.4} s, worst velocity error {:.3e} m/s, worst position error {:.3e} m",
                study.time_step,
                study.impact_time,
                study.velocity_error.absolute,
                study.position_error.absolute
            );
        }
        Ok(FallingSphereReport {
            terminal_speed: body.terminal_speed(),
            studies,
            trajectory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use more_asserts::{assert_gt, assert_lt};

    fn basketball() -> FallingBody {
        FallingBody::new(&SphereParams::default(), &DragParams::default()).unwrap()
    }

    #[test]
    fn drag_opposes_motion() {
        let body = basketball();
        assert_relative_eq!(body.acceleration(0.0), -9.80665);
        assert_gt!(body.acceleration(-5.0), -9.80665);
        assert_lt!(body.acceleration(5.0), -9.80665);
        let vt = body.terminal_speed();
        assert_relative_eq!(body.acceleration(-vt), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn exact_solution_starts_at_rest_and_approaches_terminal_speed() {
        let body = basketball();
        assert_eq!(body.exact_velocity(0.0), 0.0);
        assert_eq!(body.exact_position(100.0, 0.0), 100.0);
        assert_relative_eq!(body.exact_velocity(1e3), -body.terminal_speed(), epsilon = 1e-9);
        // Far past terminal speed the fall is linear in time.
        let slope = body.exact_position(0.0, 1001.0) - body.exact_position(0.0, 1000.0);
        assert_relative_eq!(slope, -body.terminal_speed(), epsilon = 1e-6);
    }

    #[test]
    fn ln_cosh_is_stable() {
        assert_relative_eq!(ln_cosh(0.5), 0.5_f64.cosh().ln(), epsilon = 1e-14);
        assert_relative_eq!(ln_cosh(-2.0), 2.0_f64.cosh().ln(), epsilon = 1e-14);
        assert!(ln_cosh(1e4).is_finite());
    }

    #[test]
    fn error_shrinks_with_step_size() {
        let params = FallingSphereParams {
            time_steps: vec![0.1, 0.01, 0.001],
            ..Default::default()
        };
        let report = params.run().unwrap();
        assert_eq!(report.studies.len(), 3);
        assert_relative_eq!(report.trajectory[1].t, 0.1, epsilon = 1e-12);
        for pair in report.studies.windows(2) {
            assert_lt!(pair[1].velocity_error.absolute, pair[0].velocity_error.absolute);
            assert_lt!(pair[1].position_error.absolute, pair[0].position_error.absolute);
        }
        for study in &report.studies {
            assert_relative_eq!(study.impact_time, 6.23, epsilon = 0.15);
            assert!(study.reached_terminal_velocity);
        }
    }

    #[test]
    fn short_drop_stays_below_terminal_speed() {
        let params = FallingSphereParams {
            initial_height: 2.0,
            time_steps: vec![0.01],
            ..Default::default()
        };
        let report = params.run().unwrap();
        assert!(!report.studies[0].reached_terminal_velocity);
        assert_lt!(report.trajectory.last().unwrap().x, 0.0);
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut params = FallingSphereParams {
            time_steps: vec![],
            ..Default::default()
        };
        assert!(params.validate().is_err());
        params.time_steps = vec![0.1, 0.0];
        assert!(params.validate().is_err());
        params.time_steps = vec![0.1];
        params.initial_height = -1.0;
        assert!(params.validate().is_err());
        params.initial_height = 10.0;
        params.sphere.mass = 0.0;
        assert!(params.run().is_err());
    }

    #[test]
    fn exhausted_step_budget_is_reported() {
        let params = FallingSphereParams {
            time_steps: vec![0.01],
            max_steps: 10,
            ..Default::default()
        };
        assert!(matches!(
            params.run(),
            Err(NumericsError::NotConverged { .. })
        ));
    }
}
