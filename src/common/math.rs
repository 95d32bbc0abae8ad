//! Small numeric primitives. All of these work on plain `f64` slices.

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Simple moving average of the first `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    mean(&values[..period])
}

/// EMA smoothing factor `2 / (period + 1)`.
pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// One EMA step from the previous value.
pub fn ema_from_previous(price: f64, previous: f64, period: usize) -> f64 {
    (price - previous) * smoothing_factor(period) + previous
}

/// Drop elements from the front of `longer` so it ends at the same sample
/// as a series of `target_len` elements.
pub fn align_tail(longer: &[f64], target_len: usize) -> &[f64] {
    let skip = longer.len().saturating_sub(target_len);
    &longer[skip..]
}

/// Last two values of a series as `(previous, last)`.
pub fn last_two(values: &[f64]) -> Option<(f64, f64)> {
    let len = values.len();
    if len < 2 {
        return None;
    }
    Some((values[len - 2], values[len - 1]))
}

/// Round down to `decimals` fractional digits.
pub fn floor_to_decimals(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).floor() / scale
}
