//! Market data provider interface.

use async_trait::async_trait;

use crate::models::indicators::Candle;
use crate::services::exchange::GatewayError;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Historical candles for a symbol, oldest first.
    async fn get_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, GatewayError>;
}
