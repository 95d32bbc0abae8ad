//! Indicator engine: SMA, EMA, RSI and MACD over close-price series.

pub mod error;
pub mod momentum;
pub mod set;
pub mod trend;

pub use error::IndicatorError;
pub use momentum::{macd, rsi, MacdParams, MacdSeries};
pub use set::{IndicatorParams, IndicatorSet};
pub use trend::{ema, sma};
