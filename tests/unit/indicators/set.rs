//! Unit tests for the lazy indicator bundle

use spotrix::indicators::{IndicatorParams, IndicatorSet, MacdParams};

use crate::support::rising;

fn small_params() -> IndicatorParams {
    IndicatorParams {
        sma_fast: 3,
        sma_slow: 5,
        rsi_period: 3,
        macd: MacdParams {
            fast: 3,
            slow: 6,
            signal: 3,
        },
    }
}

#[test]
fn test_default_params() {
    let params = IndicatorParams::default();
    assert_eq!(params.sma_fast, 20);
    assert_eq!(params.sma_slow, 50);
    assert_eq!(params.rsi_period, 14);
    assert_eq!(params.macd, MacdParams::default());
    assert_eq!(params.required_history(), 51);
}

#[test]
fn test_required_history_covers_macd() {
    assert_eq!(small_params().required_history(), 9);
}

#[test]
fn test_series_lengths() {
    let set = IndicatorSet::new(rising(10.0, 20), small_params());
    assert_eq!(set.sma_fast().len(), 18);
    assert_eq!(set.sma_slow().len(), 16);
    assert_eq!(set.rsi().len(), 17);
    assert_eq!(set.macd_histogram().len(), 20 - 6 - 3 + 2);
}

#[test]
fn test_snapshot_reads_latest_values() {
    let set = IndicatorSet::new(rising(10.0, 20), small_params());
    let snapshot = set.snapshot();
    assert_eq!(snapshot.sma_fast, Some(28.0));
    assert_eq!(snapshot.sma_slow, Some(27.0));
    assert_eq!(snapshot.rsi, Some(100.0));
    assert!(snapshot.macd_histogram.is_some());
}

#[test]
fn test_snapshot_empty_for_short_history() {
    let set = IndicatorSet::new(vec![1.0, 2.0], small_params());
    let snapshot = set.snapshot();
    assert!(snapshot.sma_fast.is_none());
    assert!(snapshot.sma_slow.is_none());
    assert!(snapshot.rsi.is_none());
    assert!(snapshot.macd_histogram.is_none());
}
