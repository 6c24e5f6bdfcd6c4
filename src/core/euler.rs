//! Fixed-step Euler integration of a second-order ODE, `x'' = a(x, x')`.
//!
//! Two update orderings are supported:
//!
//! - Explicit: `x += dt * v`, then `v += dt * a`, both from start-of-step values.
//! - Semi-implicit (symplectic): `v += dt * a` first, then `x += dt * v_new`.
//!   This ordering keeps the energy of oscillatory systems bounded, where the
//!   explicit ordering slowly pumps energy in.
//!
//! There is no error control here. The local truncation error is O(dt^2) per step
//! and the global error over a fixed horizon is O(dt), so accuracy depends only on
//! the `dt` chosen by the caller. Choose a smaller `dt`, or use the RK4 stepper in
//! `ode_solvers`, when more accuracy is needed.

use serde::{Deserialize, Serialize};

use crate::core::error::{NumericsError, NumericsResult};
use crate::core::numeric::{
    ensure_finite, ensure_positive, fixed_step_count, sample_capacity, State,
};

/// One point along a trajectory. Scalars for 1-D motion, `nalgebra` vectors otherwise.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct StateSample<S> {
    pub t: f64,
    pub x: S, // position
    pub v: S, // velocity
    pub a: S, // acceleration
}

/// Samples ordered by time, index 0 holding the initial condition.
pub type Trajectory<S> = Vec<StateSample<S>>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EulerMode {
    #[default]
    Explicit,
    SemiImplicit,
}

impl EulerMode {
    /// Position and velocity at the end of one step of size `dt`.
    pub fn advance<S: State>(&self, dt: f64, sample: &StateSample<S>) -> (S, S) {
        match self {
            EulerMode::Explicit => (sample.x + sample.v * dt, sample.v + sample.a * dt),
            EulerMode::SemiImplicit => {
                let v = sample.v + sample.a * dt;
                (sample.x + v * dt, v)
            }
        }
    }
}

/// Describes when the integration loop ends.
pub enum StopCondition<'a, S> {
    /// Run `ceil((tf - t0) / dt)` steps.
    FinalTime(f64),
    /// Stop on the first sample whose position satisfies `predicate`. That sample
    /// is kept. Gives up with `NotConverged` after `max_steps` steps.
    Predicate {
        predicate: &'a dyn Fn(&S) -> bool,
        max_steps: usize,
    },
}

fn ensure_finite_sample<S: State>(sample: &StateSample<S>) -> NumericsResult<()> {
    for (value, what) in [
        (sample.x, "position"),
        (sample.v, "velocity"),
        (sample.a, "acceleration"),
    ] {
        if !value.is_finite() {
            return Err(NumericsError::NonFinite {
                what,
                value: value.magnitude(),
            });
        }
    }
    Ok(())
}

/// Integrates `x'' = accel(x, v)` from `(t0, x0, v0)` with a fixed step `dt`.
///
/// Sample `i` sits at exactly `t0 + i * dt`.
pub fn integrate<S, F>(
    accel: &F,
    t0: f64,
    stop: StopCondition<S>,
    dt: f64,
    x0: S,
    v0: S,
    mode: EulerMode,
) -> NumericsResult<Trajectory<S>>
where
    S: State,
    F: Fn(S, S) -> S,
{
    ensure_positive(dt, "dt")?;
    ensure_finite(t0, "t0")?;

    let initial = StateSample {
        t: t0,
        x: x0,
        v: v0,
        a: accel(x0, v0),
    };
    ensure_finite_sample(&initial)?;

    let step = |previous: &StateSample<S>, index: usize| -> NumericsResult<StateSample<S>> {
        let (x, v) = mode.advance(dt, previous);
        let sample = StateSample {
            t: t0 + (index as f64) * dt,
            x,
            v,
            a: accel(x, v),
        };
        ensure_finite_sample(&sample)?;
        Ok(sample)
    };

    let mut trajectory = vec![initial];
    match stop {
        StopCondition::FinalTime(tf) => {
            ensure_finite(tf, "tf")?;
            if tf < t0 {
                return Err(NumericsError::invalid_argument(format!(
                    "final time {tf} is before initial time {t0}"
                )));
            }
            let n_steps = fixed_step_count(tf - t0, dt)?;
            tracing::debug!(?mode, dt, n_steps, "euler: fixed final time");
            let capacity = sample_capacity(n_steps as f64, "euler final time")?;
            trajectory.reserve_exact(capacity - 1);
            for index in 1..=n_steps {
                let sample = step(&trajectory[index - 1], index)?;
                trajectory.push(sample);
            }
            Ok(trajectory)
        }
        StopCondition::Predicate {
            predicate,
            max_steps,
        } => {
            tracing::debug!(?mode, dt, max_steps, "euler: stopping predicate");
            for index in 1..=max_steps {
                let sample = step(&trajectory[index - 1], index)?;
                trajectory.push(sample);
                if predicate(&sample.x) {
                    return Ok(trajectory);
                }
            }
            Err(NumericsError::NotConverged {
                method: "euler stopping predicate",
                iterations: max_steps,
                estimate: trajectory[max_steps].t,
            })
        }
    }
}
