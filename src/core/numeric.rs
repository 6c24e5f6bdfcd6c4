//! Shared numeric helpers: the `State` abstraction used by the ODE solvers,
//! argument validation, and fixed-step grid sizing.

use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

use nalgebra::{Vector2, Vector3};

use crate::core::error::{NumericsError, NumericsResult};

/// Anything that can be advanced by a fixed-step integrator: scalars for
/// one-dimensional motion, and statically sized vectors for 2-D and 3-D motion.
pub trait State: Copy + Debug + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self> {
    fn zero() -> Self;

    /// |x| for scalars, Euclidean norm for vectors.
    fn magnitude(&self) -> f64;

    fn is_finite(&self) -> bool;
}

impl State for f64 {
    fn zero() -> Self {
        0.0
    }

    fn magnitude(&self) -> f64 {
        self.abs()
    }

    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }
}

macro_rules! impl_vector_state {
    ($($vector:ty),*) => {
        $(
            impl State for $vector {
                fn zero() -> Self {
                    <$vector>::zeros()
                }

                fn magnitude(&self) -> f64 {
                    self.norm()
                }

                fn is_finite(&self) -> bool {
                    self.iter().all(|x| x.is_finite())
                }
            }
        )*
    };
}

impl_vector_state!(Vector2<f64>, Vector3<f64>);

/// Absolute-or-relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

pub fn nearly_equal(a: f64, b: f64, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(value: f64, what: &'static str) -> NumericsResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(NumericsError::NonFinite { what, value })
    }
}

/// Step sizes (`dt`, `h`, `dx`), tolerances and physical constants must be finite and strictly positive.
pub fn ensure_positive(value: f64, what: &'static str) -> NumericsResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(NumericsError::invalid_argument(format!(
            "{what} must be finite and positive, got {value}"
        )))
    }
}

/// Upper bound on the number of samples a stored trajectory or series may hold.
pub const MAX_STORED_SAMPLES: usize = 1 << 26;

/// Capacity for `steps` steps plus the initial sample, rejecting counts past
/// [`MAX_STORED_SAMPLES`] instead of attempting the allocation.
pub fn sample_capacity(steps: f64, what: &'static str) -> NumericsResult<usize> {
    if !(steps >= 0.0 && steps < MAX_STORED_SAMPLES as f64) {
        return Err(NumericsError::invalid_argument(format!(
            "{what} needs {steps} steps, more than the {MAX_STORED_SAMPLES} samples that can be stored"
        )));
    }
    Ok(steps as usize + 1)
}

/// Number of uniform steps of size `step` needed to cover `span`.
///
/// This is `ceil(span / step)`, except that ratios within round-off of an
/// integer snap to it: `fixed_step_count(10.0, 0.1)` is 100, not 101.
pub fn fixed_step_count(span: f64, step: f64) -> NumericsResult<usize> {
    ensure_positive(step, "step")?;
    ensure_finite(span, "span")?;
    if span < 0.0 {
        return Err(NumericsError::invalid_argument(format!(
            "span must be non-negative, got {span}"
        )));
    }
    const SNAP_TOLERANCE: f64 = 1e-9;
    let ratio = span / step;
    let nearest = ratio.round();
    let count = if (ratio - nearest).abs() <= SNAP_TOLERANCE * nearest.max(1.0) {
        nearest
    } else {
        ratio.ceil()
    };
    if count > (usize::MAX as f64) {
        return Err(NumericsError::invalid_argument(format!(
            "step {step} is too small to cover span {span}"
        )));
    }
    Ok(count as usize)
}
