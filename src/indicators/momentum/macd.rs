//! MACD (Moving Average Convergence Divergence) indicator

use serde::{Deserialize, Serialize};

use crate::common::math;
use crate::indicators::trend::ema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl MacdParams {
    /// Samples needed for `points` histogram values.
    pub fn required_history(&self, points: usize) -> usize {
        self.slow.max(self.fast) + self.signal + points.saturating_sub(2)
    }
}

/// MACD line, signal line and histogram, each ending at the last input
/// sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdSeries {
    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }
}

/// MACD = EMA(fast) - EMA(slow), Signal = EMA(signal) of MACD,
/// Histogram = MACD - Signal.
///
/// The longer EMA is shorter as a series; the fast EMA is trimmed from the
/// front so both end on the same sample, and the MACD line is trimmed the
/// same way against the signal line. Histogram length is
/// `len - slow - signal + 2`.
pub fn macd(series: &[f64], params: MacdParams) -> MacdSeries {
    let fast_ema = ema(series, params.fast);
    let slow_ema = ema(series, params.slow);
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return MacdSeries::default();
    }

    let fast_aligned = math::align_tail(&fast_ema, slow_ema.len());
    let macd_line: Vec<f64> = fast_aligned
        .iter()
        .zip(&slow_ema)
        .map(|(fast, slow)| fast - slow)
        .collect();

    let signal_line = ema(&macd_line, params.signal);
    if signal_line.is_empty() {
        return MacdSeries::default();
    }

    let histogram = math::align_tail(&macd_line, signal_line.len())
        .iter()
        .zip(&signal_line)
        .map(|(line, signal)| line - signal)
        .collect();

    MacdSeries {
        macd_line,
        signal_line,
        histogram,
    }
}
