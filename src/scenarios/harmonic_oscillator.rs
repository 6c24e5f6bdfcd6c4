//! Mass on a linear spring, used to compare the explicit and semi-implicit Euler
//! orderings over many periods.

use serde::{Deserialize, Serialize};

use crate::core::error::{NumericsError, NumericsResult};
use crate::core::error_metrics::{relative_error, WorstCaseError};
use crate::core::euler::{integrate, EulerMode, StopCondition, Trajectory};
use crate::core::numeric::{ensure_finite, ensure_positive};

use super::common::Scenario;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SpringParams {
    pub stiffness: f64, // N/m
    pub mass: f64,      // kg
    pub equilibrium: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        SpringParams {
            stiffness: 10.0,
            mass: 1.0,
            equilibrium: 0.0,
        }
    }
}

impl SpringParams {
    pub fn validate(&self) -> NumericsResult<()> {
        ensure_positive(self.stiffness, "stiffness")?;
        ensure_positive(self.mass, "mass")?;
        ensure_finite(self.equilibrium, "equilibrium")?;
        Ok(())
    }

    pub fn angular_frequency(&self) -> f64 {
        (self.stiffness / self.mass).sqrt()
    }

    /// `2 pi sqrt(m / k)`
    pub fn period(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.angular_frequency()
    }

    /// Hooke's law: `a = -(k / m) (x - x_eq)`.
    pub fn acceleration(&self, position: f64) -> f64 {
        -(self.stiffness / self.mass) * (position - self.equilibrium)
    }

    /// Kinetic plus spring potential energy.
    pub fn energy(&self, position: f64, velocity: f64) -> f64 {
        let stretch = position - self.equilibrium;
        0.5 * self.mass * velocity * velocity + 0.5 * self.stiffness * stretch * stretch
    }

    pub fn exact_position(&self, x0: f64, v0: f64, t: f64) -> f64 {
        let omega = self.angular_frequency();
        self.equilibrium + (x0 - self.equilibrium) * (omega * t).cos() + v0 / omega * (omega * t).sin()
    }

    /// Largest displacement from equilibrium within each complete period of the
    /// trajectory. A trailing partial period is left out.
    pub fn peak_amplitudes(&self, trajectory: &Trajectory<f64>) -> Vec<f64> {
        let (Some(first), Some(last)) = (trajectory.first(), trajectory.last()) else {
            return Vec::new();
        };
        let period = self.period();
        let complete_periods = ((last.t - first.t) / period).floor() as usize;
        let mut peaks = vec![0.0_f64; complete_periods];
        for sample in trajectory {
            let index = ((sample.t - first.t) / period).floor() as usize;
            if let Some(peak) = peaks.get_mut(index) {
                *peak = peak.max((sample.x - self.equilibrium).abs());
            }
        }
        peaks
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct HarmonicOscillatorParams {
    pub spring: SpringParams,
    pub initial_position: f64,
    pub initial_velocity: f64,
    pub t_final: f64,
    pub time_step: f64,
    pub modes: Vec<EulerMode>,
}

impl Default for HarmonicOscillatorParams {
    fn default() -> Self {
        HarmonicOscillatorParams {
            spring: SpringParams::default(),
            initial_position: 0.25,
            initial_velocity: 0.0,
            t_final: 50.0,
            time_step: 0.01,
            modes: vec![EulerMode::Explicit, EulerMode::SemiImplicit],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModeSummary {
    pub mode: EulerMode,
    pub peak_amplitudes: Vec<f64>,
    pub initial_energy: f64,
    pub final_energy: f64,
    pub max_relative_energy_error: f64,
    pub position_error: WorstCaseError,
    pub trajectory: Trajectory<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HarmonicOscillatorReport {
    pub period: f64,
    pub modes: Vec<ModeSummary>,
}

impl HarmonicOscillatorParams {
    fn summarize(&self, mode: EulerMode) -> NumericsResult<ModeSummary> {
        let spring = &self.spring;
        let trajectory = integrate(
            &|x: f64, _v: f64| spring.acceleration(x),
            0.0,
            StopCondition::FinalTime(self.t_final),
            self.time_step,
            self.initial_position,
            self.initial_velocity,
            mode,
        )?;

        let energies: Vec<f64> = trajectory.iter().map(|s| spring.energy(s.x, s.v)).collect();
        let initial_energy = energies[0];
        let energy_errors = relative_error(&energies, &vec![initial_energy; energies.len()])?;

        let positions: Vec<f64> = trajectory.iter().map(|s| s.x).collect();
        let exact: Vec<f64> = trajectory
            .iter()
            .map(|s| spring.exact_position(self.initial_position, self.initial_velocity, s.t))
            .collect();

        Ok(ModeSummary {
            mode,
            peak_amplitudes: spring.peak_amplitudes(&trajectory),
            initial_energy,
            final_energy: energies[energies.len() - 1],
            max_relative_energy_error: energy_errors.into_iter().fold(0.0, f64::max),
            position_error: WorstCaseError::compute(&positions, &exact)?,
            trajectory,
        })
    }
}

impl Scenario for HarmonicOscillatorParams {
    type Report = HarmonicOscillatorReport;

    fn validate(&self) -> NumericsResult<()> {
        self.spring.validate()?;
        ensure_finite(self.initial_position, "initial_position")?;
        ensure_finite(self.initial_velocity, "initial_velocity")?;
        ensure_positive(self.t_final, "t_final")?;
        ensure_positive(self.time_step, "time_step")?;
        if self.modes.is_empty() {
            return Err(NumericsError::invalid_argument("modes is empty"));
        }
        Ok(())
    }

    fn run(&self) -> NumericsResult<HarmonicOscillatorReport> {
        self.validate()?;
        let modes = self
            .modes
            .iter()
            .map(|&mode| self.summarize(mode))
            .collect::<NumericsResult<Vec<_>>>()?;
        for summary in &modes {
            tracing::info!(
                "{:?}: energy {:.4} J -> {:.4} J over {} complete periods",
                summary.mode,
                summary.initial_energy,
                summary.final_energy,
                summary.peak_amplitudes.len()
            );
        }
        Ok(HarmonicOscillatorReport {
            period: self.spring.period(),
            modes,
        })
    }
}
