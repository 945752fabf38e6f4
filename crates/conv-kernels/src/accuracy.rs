//! Agreement metrics between kernel outputs

use crate::error::{ConvError, Result};

/// Floor on the denominator of the relative error
pub const RELATIVE_ERROR_EPS: f64 = 1e-8;

/// Default relative tolerance for float64 equivalence checks
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// `max |a - b| / max(eps, |a| + |b|)` over paired elements
pub fn relative_error<'a>(
    a: impl IntoIterator<Item = &'a f64>,
    b: impl IntoIterator<Item = &'a f64>,
) -> f64 {
    a.into_iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs() / RELATIVE_ERROR_EPS.max(x.abs() + y.abs()))
        .fold(0.0, f64::max)
}

/// `sum |a - b|` over paired elements
pub fn absolute_error<'a>(
    a: impl IntoIterator<Item = &'a f64>,
    b: impl IntoIterator<Item = &'a f64>,
) -> f64 {
    a.into_iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// Check `candidate` against `reference`; returns the relative error.
pub fn ensure_equivalent(reference: &[f64], candidate: &[f64], tolerance: f64) -> Result<f64> {
    if reference.len() != candidate.len() {
        return Err(ConvError::invalid(format!(
            "cannot compare outputs of length {} and {}",
            reference.len(),
            candidate.len()
        )));
    }
    let relative = relative_error(reference, candidate);
    if relative > tolerance {
        return Err(ConvError::NumericMismatch {
            relative_error: relative,
            tolerance,
        });
    }
    Ok(relative)
}
