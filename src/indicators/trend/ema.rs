//! EMA (Exponential Moving Average) indicator

use crate::common::math;
use crate::indicators::error::{require_history, require_period, IndicatorError};

/// EMA series seeded with the mean of the first `period` values.
///
/// Output index 0 is the seed; output index `j` corresponds to input index
/// `period - 1 + j`. Length is `len - period + 1`.
pub fn try_ema(series: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    require_period(period)?;
    require_history(series.len(), period)?;

    let seed = math::sma(series, period).ok_or(IndicatorError::InsufficientData {
        required: period,
        available: series.len(),
    })?;

    let mut values = Vec::with_capacity(series.len() - period + 1);
    values.push(seed);
    let mut previous = seed;
    for &price in &series[period..] {
        previous = math::ema_from_previous(price, previous, period);
        values.push(previous);
    }
    Ok(values)
}

/// Same as [`try_ema`], empty on insufficient data.
pub fn ema(series: &[f64], period: usize) -> Vec<f64> {
    try_ema(series, period).unwrap_or_else(|e| {
        tracing::debug!(period, error = %e, "EMA unavailable");
        Vec::new()
    })
}
