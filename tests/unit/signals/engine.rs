//! Unit tests for the candles-to-signal pipeline

use spotrix::indicators::{IndicatorParams, MacdParams};
use spotrix::models::signal::Signal;
use spotrix::signals::{RsiLevels, SignalEngine};

use crate::support::{candles_from_closes, falling, rising};

fn engine() -> SignalEngine {
    SignalEngine::new(
        IndicatorParams {
            sma_fast: 3,
            sma_slow: 5,
            rsi_period: 3,
            macd: MacdParams {
                fast: 3,
                slow: 6,
                signal: 3,
            },
        },
        RsiLevels::default(),
    )
}

#[test]
fn test_short_history_holds() {
    let evaluation = engine().evaluate(&candles_from_closes(&[100.0, 101.0, 102.0]));
    assert_eq!(evaluation.signal, Signal::Hold);
    assert_eq!(evaluation.reasons.len(), 1);
    assert!(evaluation.indicators.sma_slow.is_none());
}

#[test]
fn test_empty_history_holds() {
    let evaluation = engine().evaluate(&[]);
    assert_eq!(evaluation.signal, Signal::Hold);
}

#[test]
fn test_persistent_decline_is_oversold_buy() {
    let evaluation = engine().evaluate(&candles_from_closes(&falling(130.0, 30)));
    assert_eq!(evaluation.signal, Signal::Buy);
    assert_eq!(evaluation.indicators.rsi, Some(0.0));
}

#[test]
fn test_persistent_rise_is_overbought_sell() {
    let evaluation = engine().evaluate_closes(rising(70.0, 30));
    assert_eq!(evaluation.signal, Signal::Sell);
    assert_eq!(evaluation.indicators.rsi, Some(100.0));
}
