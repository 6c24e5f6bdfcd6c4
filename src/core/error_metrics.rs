//! Pointwise error between a numerical series and its exact counterpart.

use serde::{Deserialize, Serialize};

use crate::core::error::{NumericsError, NumericsResult};

fn check_lengths(approx: &[f64], exact: &[f64]) -> NumericsResult<()> {
    if approx.len() != exact.len() {
        return Err(NumericsError::invalid_argument(format!(
            "series lengths differ: {} approximate vs {} exact",
            approx.len(),
            exact.len()
        )));
    }
    Ok(())
}

pub fn absolute_error(approx: &[f64], exact: &[f64]) -> NumericsResult<Vec<f64>> {
    check_lengths(approx, exact)?;
    Ok(approx
        .iter()
        .zip(exact)
        .map(|(a, e)| (a - e).abs())
        .collect())
}

/// `|a - e| / |e|`, taken as zero wherever the exact value is zero.
pub fn relative_error(approx: &[f64], exact: &[f64]) -> NumericsResult<Vec<f64>> {
    check_lengths(approx, exact)?;
    Ok(approx
        .iter()
        .zip(exact)
        .map(|(a, e)| if *e == 0.0 { 0.0 } else { ((a - e) / e).abs() })
        .collect())
}

/// Largest absolute and relative error over one quantity (position or velocity,
/// never a mix of the two).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct WorstCaseError {
    pub absolute: f64,
    pub relative: f64,
}

impl WorstCaseError {
    pub fn compute(approx: &[f64], exact: &[f64]) -> NumericsResult<Self> {
        let max = |values: Vec<f64>| values.into_iter().fold(0.0, f64::max);
        Ok(WorstCaseError {
            absolute: max(absolute_error(approx, exact)?),
            relative: max(relative_error(approx, exact)?),
        })
    }
}
