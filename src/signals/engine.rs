//! Candles in, signal out.

use serde::Serialize;

use crate::indicators::{IndicatorParams, IndicatorSet};
use crate::models::indicators::{closes, Candle, IndicatorSnapshot};
use crate::models::signal::{Signal, SignalReason};
use crate::signals::signal_generator::{RsiLevels, SignalGenerator};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalEvaluation {
    pub signal: Signal,
    pub reasons: Vec<SignalReason>,
    pub indicators: IndicatorSnapshot,
}

#[derive(Debug, Clone, Default)]
pub struct SignalEngine {
    params: IndicatorParams,
    generator: SignalGenerator,
}

impl SignalEngine {
    pub fn new(params: IndicatorParams, levels: RsiLevels) -> Self {
        Self {
            params,
            generator: SignalGenerator::new(levels),
        }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Evaluate the signal for a chronological candle series. Short history
    /// yields `Hold`.
    pub fn evaluate(&self, candles: &[Candle]) -> SignalEvaluation {
        self.evaluate_closes(closes(candles))
    }

    pub fn evaluate_closes(&self, closes: Vec<f64>) -> SignalEvaluation {
        let indicators = IndicatorSet::new(closes, self.params);
        let decision = self.generator.generate(&indicators);

        SignalEvaluation {
            signal: decision.signal,
            reasons: decision.reasons,
            indicators: indicators.snapshot(),
        }
    }
}
