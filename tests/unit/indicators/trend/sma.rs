//! Unit tests for SMA indicator

use spotrix::indicators::error::IndicatorError;
use spotrix::indicators::trend::{sma, try_sma};

use crate::support::rising;

#[test]
fn test_sma_trailing_windows() {
    let values = sma(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
    assert_eq!(values, vec![2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_sma_length() {
    let series = rising(100.0, 40);
    assert_eq!(sma(&series, 20).len(), 21);
    assert_eq!(sma(&series, 40).len(), 1);
}

#[test]
fn test_sma_insufficient_data() {
    assert!(sma(&[1.0, 2.0], 3).is_empty());
    assert_eq!(
        try_sma(&[1.0, 2.0], 3),
        Err(IndicatorError::InsufficientData {
            required: 3,
            available: 2
        })
    );
}

#[test]
fn test_sma_rejects_zero_period() {
    assert_eq!(try_sma(&[1.0, 2.0], 0), Err(IndicatorError::InvalidPeriod));
}
