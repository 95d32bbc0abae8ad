//! Position state machine and session control.

pub mod position_manager;
pub mod session;

pub use position_manager::{
    forced_exit, plan, ExitThresholds, PositionDecision, PositionManager, TradeAction,
};
pub use session::{SessionController, TickDetails, TickResult, TradingState};
