//! Descriptive statistics over `f64` samples.
//!
//! `mean` and `standard_deviation` refuse empty input; `median` treats it as
//! zero so an empty selection can render without special casing.

use crate::StatsError;

/// Arithmetic mean.
///
/// # Errors
/// Returns [`StatsError::InvalidInput`] when `values` is empty.
pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::InvalidInput("mean of an empty sequence is undefined"));
    }
    Ok(values.iter().sum::<f64>() / count(values))
}

/// Population standard deviation (divisor `n`, not `n - 1`).
///
/// # Errors
/// Returns [`StatsError::InvalidInput`] when `values` is empty.
pub fn standard_deviation(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::InvalidInput(
            "standard deviation of an empty sequence is undefined",
        ));
    }
    let center = mean(values)?;
    let variance = values.iter().map(|value| (value - center).powi(2)).sum::<f64>() / count(values);
    Ok(variance.sqrt())
}

/// Median of `values`, computed on a sorted copy. Empty input yields `0.0`.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let half = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[half]
    } else {
        (sorted[half - 1] + sorted[half]) / 2.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn count(values: &[f64]) -> f64 {
    values.len() as f64
}
