use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("period must be positive")]
    InvalidPeriod,
}

/// Check that `available` samples satisfy a lookback of `required`.
pub fn require_history(available: usize, required: usize) -> Result<(), IndicatorError> {
    if available < required {
        return Err(IndicatorError::InsufficientData {
            required,
            available,
        });
    }
    Ok(())
}

pub fn require_period(period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod);
    }
    Ok(())
}
