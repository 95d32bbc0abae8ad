use serde::{Deserialize, Serialize};

use crate::common::math;
use crate::indicators::IndicatorSet;
use crate::models::signal::{Signal, SignalReason};

/// RSI levels separating overbought/oversold from neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiLevels {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiLevels {
    fn default() -> Self {
        Self {
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

/// The readings a signal is derived from: previous and latest values of the
/// paired series, latest RSI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalInputs {
    pub prev_fast: f64,
    pub last_fast: f64,
    pub prev_slow: f64,
    pub last_slow: f64,
    pub last_rsi: f64,
    pub prev_hist: f64,
    pub last_hist: f64,
}

impl SignalInputs {
    /// `None` when any paired series has fewer than two points or RSI is
    /// empty.
    pub fn from_indicators(indicators: &IndicatorSet) -> Option<Self> {
        let (prev_fast, last_fast) = math::last_two(indicators.sma_fast())?;
        let (prev_slow, last_slow) = math::last_two(indicators.sma_slow())?;
        let (prev_hist, last_hist) = math::last_two(indicators.macd_histogram())?;
        let last_rsi = *indicators.rsi().last()?;

        Some(Self {
            prev_fast,
            last_fast,
            prev_slow,
            last_slow,
            last_rsi,
            prev_hist,
            last_hist,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalDecision {
    pub signal: Signal,
    pub reasons: Vec<SignalReason>,
}

impl SignalDecision {
    fn hold(reason: &str) -> Self {
        Self {
            signal: Signal::Hold,
            reasons: vec![SignalReason::new(reason)],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    levels: RsiLevels,
}

impl SignalGenerator {
    pub fn new(levels: RsiLevels) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> RsiLevels {
        self.levels
    }

    pub fn generate(&self, indicators: &IndicatorSet) -> SignalDecision {
        match SignalInputs::from_indicators(indicators) {
            Some(inputs) => self.generate_from(&inputs),
            None => SignalDecision::hold("insufficient indicator history"),
        }
    }

    pub fn generate_from(&self, input: &SignalInputs) -> SignalDecision {
        let cross_above = input.prev_fast <= input.prev_slow && input.last_fast > input.last_slow;
        let cross_below = input.prev_fast >= input.prev_slow && input.last_fast < input.last_slow;
        let overbought = input.last_rsi > self.levels.overbought;
        let oversold = input.last_rsi < self.levels.oversold;
        let macd_positive_cross = input.prev_hist <= 0.0 && input.last_hist > 0.0;
        let macd_negative_cross = input.prev_hist >= 0.0 && input.last_hist < 0.0;

        let mut reasons = Vec::new();
        if cross_above {
            reasons.push(SignalReason::new(format!(
                "fast SMA crossed above slow: {:.4} > {:.4}",
                input.last_fast, input.last_slow
            )));
        }
        if cross_below {
            reasons.push(SignalReason::new(format!(
                "fast SMA crossed below slow: {:.4} < {:.4}",
                input.last_fast, input.last_slow
            )));
        }
        if overbought {
            reasons.push(SignalReason::new(format!("RSI overbought: {:.2}", input.last_rsi)));
        }
        if oversold {
            reasons.push(SignalReason::new(format!("RSI oversold: {:.2}", input.last_rsi)));
        }
        if macd_positive_cross {
            reasons.push(SignalReason::new(format!(
                "MACD histogram turned positive: {:.4} -> {:.4}",
                input.prev_hist, input.last_hist
            )));
        }
        if macd_negative_cross {
            reasons.push(SignalReason::new(format!(
                "MACD histogram turned negative: {:.4} -> {:.4}",
                input.prev_hist, input.last_hist
            )));
        }

        let signal = if (cross_above || oversold || macd_positive_cross) && !overbought {
            Signal::Buy
        } else if (cross_below || overbought || macd_negative_cross) && !oversold {
            Signal::Sell
        } else {
            Signal::Hold
        };

        SignalDecision { signal, reasons }
    }
}
