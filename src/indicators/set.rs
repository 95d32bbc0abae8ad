//! Lazily computed indicator bundle over one close-price series.

use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

use crate::indicators::momentum::{macd, rsi, MacdParams, MacdSeries};
use crate::indicators::trend::sma;
use crate::models::indicators::IndicatorSnapshot;

/// Lookback periods for the indicators feeding the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub rsi_period: usize,
    pub macd: MacdParams,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_fast: 20,
            sma_slow: 50,
            rsi_period: 14,
            macd: MacdParams::default(),
        }
    }
}

impl IndicatorParams {
    /// History needed so every paired series has two points and RSI has one.
    pub fn required_history(&self) -> usize {
        [
            self.sma_fast + 1,
            self.sma_slow + 1,
            self.rsi_period + 1,
            self.macd.required_history(2),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Each series is computed on first access and cached afterwards.
pub struct IndicatorSet {
    closes: Vec<f64>,
    params: IndicatorParams,
    sma_fast: OnceCell<Vec<f64>>,
    sma_slow: OnceCell<Vec<f64>>,
    rsi: OnceCell<Vec<f64>>,
    macd: OnceCell<MacdSeries>,
}

impl IndicatorSet {
    pub fn new(closes: Vec<f64>, params: IndicatorParams) -> Self {
        Self {
            closes,
            params,
            sma_fast: OnceCell::new(),
            sma_slow: OnceCell::new(),
            rsi: OnceCell::new(),
            macd: OnceCell::new(),
        }
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn sma_fast(&self) -> &[f64] {
        self.sma_fast
            .get_or_init(|| sma(&self.closes, self.params.sma_fast))
    }

    pub fn sma_slow(&self) -> &[f64] {
        self.sma_slow
            .get_or_init(|| sma(&self.closes, self.params.sma_slow))
    }

    pub fn rsi(&self) -> &[f64] {
        self.rsi
            .get_or_init(|| rsi(&self.closes, self.params.rsi_period))
    }

    pub fn macd(&self) -> &MacdSeries {
        self.macd
            .get_or_init(|| macd(&self.closes, self.params.macd))
    }

    pub fn macd_histogram(&self) -> &[f64] {
        &self.macd().histogram
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            sma_fast: self.sma_fast().last().copied(),
            sma_slow: self.sma_slow().last().copied(),
            rsi: self.rsi().last().copied(),
            macd_histogram: self.macd_histogram().last().copied(),
        }
    }
}
