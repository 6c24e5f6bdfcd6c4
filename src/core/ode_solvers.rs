//! Explicit ODE solvers

use crate::core::error::{NumericsError, NumericsResult};
use crate::core::numeric::{ensure_finite, ensure_positive, sample_capacity, State};

/// One classical fourth-order Runge-Kutta step of `y' = dynamics(t, y)`.
///
/// Local truncation error is O(dt^5), global error O(dt^4). The stage
/// coefficients and weights are the textbook ones and are not tunable.
pub fn rk4_method_step<S, F>(dt: f64, t: f64, x: S, dynamics: &F) -> S
where
    S: State,
    F: Fn(f64, S) -> S,
{
    let t_mid = t + 0.5 * dt;
    let t_next = t + dt;
    let k1 = dynamics(t, x);
    let k2 = dynamics(t_mid, x + k1 * (0.5 * dt));
    let k3 = dynamics(t_mid, x + k2 * (0.5 * dt));
    let k4 = dynamics(t_next, x + k3 * dt);
    let one_by_six_dt = dt / 6.0;
    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * one_by_six_dt
}

/// Simulates `n_steps` uniform RK4 steps over `[t_begin, t_final]` and returns the final state.
pub fn rk4_simulate<S, F>(t_begin: f64, t_final: f64, n_steps: u32, x0: S, dynamics: &F) -> S
where
    S: State,
    F: Fn(f64, S) -> S,
{
    let dt = (t_final - t_begin) / (n_steps as f64);
    let mut x = x0;
    for i_step in 0..n_steps {
        let alpha = (i_step as f64) / (n_steps as f64);
        let t = t_begin + alpha * (t_final - t_begin);
        x = rk4_method_step(dt, t, x, dynamics);
    }
    x
}

/**
 * Integrates `dy/dx = derivative(x, y)` from `(x0, y0)` with step `h`, returning
 * every sample `(x_i, y_i)` with `x_i = x0 + i * h`, starting with the initial one.
 *
 * Stepping stops at the first `x_i >= x_upper`. There is no interpolation back to
 * the boundary, so the last sample may overshoot `x_upper` by less than one step.
 */
pub fn rk4<S, F>(
    derivative: &F,
    x0: f64,
    y0: S,
    x_upper: f64,
    h: f64,
) -> NumericsResult<Vec<(f64, S)>>
where
    S: State,
    F: Fn(f64, S) -> S,
{
    ensure_positive(h, "h")?;
    ensure_finite(x0, "x0")?;
    ensure_finite(x_upper, "x_upper")?;

    let capacity = sample_capacity(((x_upper - x0) / h).max(0.0).ceil(), "rk4")?;
    let mut samples = Vec::with_capacity(capacity);
    samples.push((x0, y0));

    let mut x = x0;
    let mut y = y0;
    let mut index: usize = 0;
    while x < x_upper {
        y = rk4_method_step(h, x, y, derivative);
        index += 1;
        x = x0 + (index as f64) * h;
        if !y.is_finite() {
            return Err(NumericsError::NonFinite {
                what: "rk4 state",
                value: y.magnitude(),
            });
        }
        samples.push((x, y));
    }
    tracing::debug!(steps = index, x_final = x, "rk4 finished");
    Ok(samples)
}
