//! Exchange gateway capability consumed by the trading core.
//!
//! Wire format and request signing live entirely behind this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::indicators::Candle;
use crate::models::order::{OrderRequest, OrderResponse};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Transport-level failure: the exchange could not be reached or
    /// answered with something unusable.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The exchange answered and refused the request.
    #[error("rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    async fn get_price_series(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, GatewayError>;

    async fn get_available_balance(&self, currency: &str) -> Result<f64, GatewayError>;

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderResponse, GatewayError>;
}
