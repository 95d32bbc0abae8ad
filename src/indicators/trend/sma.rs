//! SMA (Simple Moving Average) indicator

use crate::common::math;
use crate::indicators::error::{require_history, require_period, IndicatorError};

/// Trailing SMA series. Element `j` is the mean of `series[j..j + period]`,
/// so the output has `len - period + 1` elements and ends at the last input.
pub fn try_sma(series: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    require_period(period)?;
    require_history(series.len(), period)?;

    Ok(series
        .windows(period)
        .filter_map(math::mean)
        .collect())
}

/// Same as [`try_sma`], empty on insufficient data.
pub fn sma(series: &[f64], period: usize) -> Vec<f64> {
    try_sma(series, period).unwrap_or_else(|e| {
        tracing::debug!(period, error = %e, "SMA unavailable");
        Vec::new()
    })
}
