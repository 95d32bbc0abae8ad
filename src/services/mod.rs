//! External collaborators: exchange gateway, market data, paper trading.

pub mod exchange;
pub mod market_data;
pub mod paper;
pub mod price_feed;

pub use exchange::{ExchangeGateway, GatewayError};
pub use market_data::MarketDataProvider;
pub use paper::PaperExchange;
pub use price_feed::{RestPriceFeed, StaticPriceFeed};
