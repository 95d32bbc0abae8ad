//! Error taxonomy for the trading loop.

use crate::models::order::OrderSide;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradingError {
    /// Indicator lookback exceeds the available history. Signal generation
    /// degrades to `Hold` instead of surfacing this.
    #[error("insufficient data: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("exchange gateway unavailable while trying to {action} {symbol}: {reason}")]
    GatewayUnavailable {
        symbol: String,
        action: String,
        reason: String,
    },

    #[error("{side} order for {symbol} rejected: {reason}")]
    OrderRejected {
        symbol: String,
        side: OrderSide,
        reason: String,
    },

    #[error("no active trading session")]
    SessionInactive,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl TradingError {
    pub fn gateway(symbol: &str, action: &str, reason: impl ToString) -> Self {
        Self::GatewayUnavailable {
            symbol: symbol.to_string(),
            action: action.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-friendly label, used for metrics and HTTP responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "insufficient_data",
            Self::GatewayUnavailable { .. } => "gateway_unavailable",
            Self::OrderRejected { .. } => "order_rejected",
            Self::SessionInactive => "session_inactive",
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::Persistence(_) => "persistence",
        }
    }
}

pub type TradingResult<T> = Result<T, TradingError>;
