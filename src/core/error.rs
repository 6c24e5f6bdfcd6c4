use thiserror::Error;

pub type NumericsResult<T> = Result<T, NumericsError>;

/// Every way a call into the integrators, quadrature, or root-finders can fail.
/// Failures are local to the call that produced them.
#[derive(Error, Debug)]
pub enum NumericsError {
    #[error("Invalid argument: {what}")]
    InvalidArgument { what: String },

    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error(
        "No sign change on [{lower}, {upper}]: f(lower) = {f_lower}, f(upper) = {f_upper}"
    )]
    NoSignChange {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },

    #[error("{method} did not converge after {iterations} iterations (last estimate: {estimate})")]
    NotConverged {
        method: &'static str,
        iterations: usize,
        estimate: f64,
    },

    #[error("{method} diverged after {iterations} iterations (last estimate: {estimate})")]
    Diverged {
        method: &'static str,
        iterations: usize,
        estimate: f64,
    },

    #[error("Sign mismatch: f(xr) at xr = {estimate} matches neither bracket bound")]
    SignMismatch { estimate: f64 },

    #[error("Numerical degeneracy: {what}")]
    Degenerate { what: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NumericsError {
    pub fn invalid_argument(what: impl Into<String>) -> Self {
        NumericsError::InvalidArgument { what: what.into() }
    }

    /// True for the outcomes of an iteration that ran out of budget or ran away,
    /// as opposed to bad inputs.
    pub fn is_non_convergence(&self) -> bool {
        matches!(
            self,
            NumericsError::NotConverged { .. } | NumericsError::Diverged { .. }
        )
    }
}
