//! Shared data models spanning the engine layers.

pub mod indicators;
pub mod order;
pub mod position;
pub mod session;
pub mod signal;

pub use indicators::{Candle, IndicatorSnapshot};
pub use order::{OrderRequest, OrderResponse, OrderSide, OrderType};
pub use position::{Position, PositionSide};
pub use session::{
    CloseReason, SessionStatus, StopReason, TradeTransaction, TradingSession,
};
pub use signal::{Signal, SignalReason};
