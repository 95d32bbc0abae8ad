//! RSI (Relative Strength Index) indicator

use crate::indicators::error::{require_history, require_period, IndicatorError};

/// RSI series over a sliding window of simple (not Wilder-smoothed) gain
/// and loss averages.
///
/// RSI = 100 - (100 / (1 + RS)), RS = Average Gain / Average Loss, and
/// exactly 100 when the window has no losses. Length is `len - period`.
pub fn try_rsi(series: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    require_period(period)?;
    require_history(series.len(), period + 1)?;

    let (gains, losses): (Vec<f64>, Vec<f64>) = series
        .windows(2)
        .map(|pair| {
            let change = pair[1] - pair[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let values = gains
        .windows(period)
        .zip(losses.windows(period))
        .map(|(gain_window, loss_window)| {
            let avg_gain = gain_window.iter().sum::<f64>() / period as f64;
            let avg_loss = loss_window.iter().sum::<f64>() / period as f64;
            if avg_loss == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
            }
        })
        .collect();

    Ok(values)
}

/// Same as [`try_rsi`], empty on insufficient data.
pub fn rsi(series: &[f64], period: usize) -> Vec<f64> {
    try_rsi(series, period).unwrap_or_else(|e| {
        tracing::debug!(period, error = %e, "RSI unavailable");
        Vec::new()
    })
}
