//! Ballistic flight with quadratic drag, in a vertical plane or in 3-D.
//!
//! The vertical axis is the last component: `y` for planar flight, `z` for 3-D.

use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::core::error::{NumericsError, NumericsResult};
use crate::core::euler::{integrate, EulerMode, StopCondition, Trajectory};
use crate::core::numeric::{ensure_finite, ensure_positive, State};

use super::common::Scenario;
use super::falling_sphere::SphereParams;

/// `rho(h) = rho0 (1 - c h / T0)^alpha`, a fair model of the lower atmosphere
/// up to roughly 10 km. Above the altitude where the base reaches zero the
/// density is taken as zero.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AltitudeDensity {
    pub sea_level_density: f64,     // kg/m^3
    pub lapse_rate: f64,            // K/m
    pub sea_level_temperature: f64, // K
    pub exponent: f64,
}

impl Default for AltitudeDensity {
    fn default() -> Self {
        AltitudeDensity {
            sea_level_density: 1.2,
            lapse_rate: 6.5e-3,
            sea_level_temperature: 300.0,
            exponent: 2.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AirDensity {
    Constant { density: f64 },
    Altitude(AltitudeDensity),
}

impl Default for AirDensity {
    fn default() -> Self {
        AirDensity::Constant { density: 1.225 }
    }
}

impl AirDensity {
    pub fn validate(&self) -> NumericsResult<()> {
        match self {
            AirDensity::Constant { density } => {
                ensure_finite(*density, "density")?;
                if *density < 0.0 {
                    return Err(NumericsError::invalid_argument("density is negative"));
                }
            }
            AirDensity::Altitude(model) => {
                ensure_positive(model.sea_level_density, "sea_level_density")?;
                ensure_finite(model.lapse_rate, "lapse_rate")?;
                ensure_positive(model.sea_level_temperature, "sea_level_temperature")?;
                ensure_finite(model.exponent, "exponent")?;
            }
        }
        Ok(())
    }

    pub fn at(&self, altitude: f64) -> f64 {
        match self {
            AirDensity::Constant { density } => *density,
            AirDensity::Altitude(model) => {
                let base = 1.0 - model.lapse_rate * altitude / model.sea_level_temperature;
                if base <= 0.0 {
                    0.0
                } else {
                    model.sea_level_density * base.powf(model.exponent)
                }
            }
        }
    }
}

/// Launch velocity for planar flight: `[horizontal, vertical]`.
pub fn launch_vector_2d(speed: f64, incline_degrees: f64) -> Vector2<f64> {
    let incline = incline_degrees.to_radians();
    Vector2::new(speed * incline.cos(), speed * incline.sin())
}

/// Launch velocity in 3-D: `[x, y, vertical]`, azimuth measured from `x` toward `y`.
pub fn launch_vector_3d(speed: f64, incline_degrees: f64, azimuth_degrees: f64) -> Vector3<f64> {
    let incline = incline_degrees.to_radians();
    let azimuth = azimuth_degrees.to_radians();
    let horizontal = speed * incline.cos();
    Vector3::new(
        horizontal * azimuth.cos(),
        horizontal * azimuth.sin(),
        speed * incline.sin(),
    )
}

/// Positions and velocities a projectile can fly in.
pub trait LaunchFrame: State {
    fn height(&self) -> f64;

    /// Distance from the vertical axis through the origin.
    fn horizontal_distance(&self) -> f64;

    /// A point on the vertical axis, or (for `gravity`) a vector pointing down it.
    fn vertical(value: f64) -> Self;
}

impl LaunchFrame for Vector2<f64> {
    fn height(&self) -> f64 {
        self[1]
    }

    fn horizontal_distance(&self) -> f64 {
        self[0].abs()
    }

    fn vertical(value: f64) -> Self {
        Vector2::new(0.0, value)
    }
}

impl LaunchFrame for Vector3<f64> {
    fn height(&self) -> f64 {
        self[2]
    }

    fn horizontal_distance(&self) -> f64 {
        self[0].hypot(self[1])
    }

    fn vertical(value: f64) -> Self {
        Vector3::new(0.0, 0.0, value)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LaunchParams {
    pub speed: f64,           // m/s
    pub incline_degrees: f64, // above the horizon
    #[serde(default)]
    pub azimuth_degrees: Option<f64>, // present for 3-D flight
}

impl Default for LaunchParams {
    fn default() -> Self {
        LaunchParams {
            speed: 20.0,
            incline_degrees: 45.0,
            azimuth_degrees: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ProjectileParams {
    pub launch: LaunchParams,
    pub ball: SphereParams,
    pub drag_coefficient: f64, // zero for a vacuum
    pub air_density: AirDensity,
    pub gravity: f64,
    pub launch_height: f64,
    pub time_step: f64,
    pub mode: EulerMode,
    pub max_steps: usize,
}

impl Default for ProjectileParams {
    fn default() -> Self {
        ProjectileParams {
            launch: LaunchParams::default(),
            ball: SphereParams::default(),
            drag_coefficient: 0.5,
            air_density: AirDensity::default(),
            gravity: 9.81,
            launch_height: 0.0,
            time_step: 0.01,
            mode: EulerMode::SemiImplicit,
            max_steps: 1_000_000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum Flight {
    Planar(Trajectory<Vector2<f64>>),
    Spatial(Trajectory<Vector3<f64>>),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProjectileReport {
    pub flight_time: f64, // time of the first sample below the ground
    pub range: f64,       // horizontal distance to that sample
    pub apex: f64,        // greatest height reached
    pub impact_speed: f64,
    pub trajectory: Flight,
}

struct FlightSummary {
    flight_time: f64,
    range: f64,
    apex: f64,
    impact_speed: f64,
}

impl ProjectileParams {
    /// `D A / (2 m)`; multiplied by the local density gives the drag factor `k`.
    fn drag_per_density(&self) -> f64 {
        self.drag_coefficient * self.ball.cross_section_area() / (2.0 * self.ball.mass)
    }

    fn fly<S: LaunchFrame>(&self, v0: S) -> NumericsResult<(FlightSummary, Trajectory<S>)> {
        let gravity = S::vertical(-self.gravity);
        let drag_per_density = self.drag_per_density();
        let air_density = self.air_density;
        let acceleration = move |x: S, v: S| -> S {
            let k = drag_per_density * air_density.at(x.height());
            gravity - v * (k * v.magnitude())
        };
        let below_ground = |x: &S| x.height() < 0.0;

        let trajectory = integrate(
            &acceleration,
            0.0,
            StopCondition::Predicate {
                predicate: &below_ground,
                max_steps: self.max_steps,
            },
            self.time_step,
            S::vertical(self.launch_height),
            v0,
            self.mode,
        )?;

        let landing = trajectory[trajectory.len() - 1];
        let summary = FlightSummary {
            flight_time: landing.t,
            range: landing.x.horizontal_distance(),
            apex: trajectory
                .iter()
                .map(|s| s.x.height())
                .fold(f64::NEG_INFINITY, f64::max),
            impact_speed: landing.v.magnitude(),
        };
        Ok((summary, trajectory))
    }
}

impl Scenario for ProjectileParams {
    type Report = ProjectileReport;

    fn validate(&self) -> NumericsResult<()> {
        ensure_positive(self.launch.speed, "launch speed")?;
        ensure_finite(self.launch.incline_degrees, "incline_degrees")?;
        if let Some(azimuth) = self.launch.azimuth_degrees {
            ensure_finite(azimuth, "azimuth_degrees")?;
        }
        self.ball.validate()?;
        ensure_finite(self.drag_coefficient, "drag_coefficient")?;
        if self.drag_coefficient < 0.0 {
            return Err(NumericsError::invalid_argument("drag_coefficient is negative"));
        }
        self.air_density.validate()?;
        ensure_positive(self.gravity, "gravity")?;
        ensure_finite(self.launch_height, "launch_height")?;
        if self.launch_height < 0.0 {
            return Err(NumericsError::invalid_argument("launch_height is below the ground"));
        }
        ensure_positive(self.time_step, "time_step")?;
        Ok(())
    }

    fn run(&self) -> NumericsResult<ProjectileReport> {
        self.validate()?;
        let launch = &self.launch;
        let (summary, trajectory) = match launch.azimuth_degrees {
            None => {
                let (summary, trajectory) =
                    self.fly(launch_vector_2d(launch.speed, launch.incline_degrees))?;
                (summary, Flight::Planar(trajectory))
            }
            Some(azimuth) => {
                let (summary, trajectory) =
                    self.fly(launch_vector_3d(launch.speed, launch.incline_degrees, azimuth))?;
                (summary, Flight::Spatial(trajectory))
            }
        };
        tracing::info!(
            "Landed after {:.3} s: range {:.3} m, apex {:.3} m",
            summary.flight_time,
            summary.range,
            summary.apex
        );
        Ok(ProjectileReport {
            flight_time: summary.flight_time,
            range: summary.range,
            apex: summary.apex,
            impact_speed: summary.impact_speed,
            trajectory,
        })
    }
}
