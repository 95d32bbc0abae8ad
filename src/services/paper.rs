//! Paper-trading gateway: real or scripted prices, simulated fills.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::models::indicators::Candle;
use crate::models::order::{OrderRequest, OrderResponse, OrderSide};
use crate::services::exchange::{ExchangeGateway, GatewayError};
use crate::services::market_data::MarketDataProvider;

/// Fills market orders at the latest close seen from the price feed.
/// Sells may take the base balance negative, which is how a short is
/// carried.
pub struct PaperExchange {
    feed: Arc<dyn MarketDataProvider>,
    base_currency: String,
    quote_currency: String,
    balances: Mutex<HashMap<String, f64>>,
    last_price: Mutex<Option<f64>>,
    next_order_id: AtomicU64,
}

impl PaperExchange {
    pub fn new(
        feed: Arc<dyn MarketDataProvider>,
        base_currency: impl Into<String>,
        quote_currency: impl Into<String>,
        quote_balance: f64,
    ) -> Self {
        let base_currency = base_currency.into();
        let quote_currency = quote_currency.into();
        let mut balances = HashMap::new();
        balances.insert(base_currency.clone(), 0.0);
        balances.insert(quote_currency.clone(), quote_balance);

        Self {
            feed,
            base_currency,
            quote_currency,
            balances: Mutex::new(balances),
            last_price: Mutex::new(None),
            next_order_id: AtomicU64::new(1),
        }
    }

    pub fn balance(&self, currency: &str) -> f64 {
        self.balances
            .lock()
            .map(|b| b.get(currency).copied().unwrap_or(0.0))
            .unwrap_or(0.0)
    }

    fn lock_err() -> GatewayError {
        GatewayError::Unavailable("paper exchange state lock poisoned".into())
    }
}

#[async_trait]
impl ExchangeGateway for PaperExchange {
    async fn get_price_series(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, GatewayError> {
        let candles = self.feed.get_candles(symbol, interval, limit).await?;
        if let Some(last) = candles.last() {
            *self.last_price.lock().map_err(|_| Self::lock_err())? = Some(last.close);
        }
        Ok(candles)
    }

    async fn get_available_balance(&self, currency: &str) -> Result<f64, GatewayError> {
        let balances = self.balances.lock().map_err(|_| Self::lock_err())?;
        Ok(balances.get(currency).copied().unwrap_or(0.0))
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderResponse, GatewayError> {
        let last_price = *self.last_price.lock().map_err(|_| Self::lock_err())?;
        let Some(price) = order.price.or(last_price) else {
            warn!(symbol = %order.symbol, "PaperExchange: no reference price, rejecting order");
            return Ok(OrderResponse::without_id("no_reference_price"));
        };
        if order.amount <= 0.0 {
            return Ok(OrderResponse::without_id("invalid_amount"));
        }

        let total = order.amount * price;
        let mut balances = self.balances.lock().map_err(|_| Self::lock_err())?;
        let quote = balances.get(&self.quote_currency).copied().unwrap_or(0.0);
        let base = balances.get(&self.base_currency).copied().unwrap_or(0.0);

        let (new_base, new_quote) = match order.side {
            OrderSide::Buy => {
                if total > quote {
                    warn!(
                        symbol = %order.symbol,
                        required = total,
                        available = quote,
                        "PaperExchange: insufficient quote balance"
                    );
                    return Ok(OrderResponse::without_id("insufficient_balance"));
                }
                (base + order.amount, quote - total)
            }
            OrderSide::Sell => (base - order.amount, quote + total),
        };
        balances.insert(self.base_currency.clone(), new_base);
        balances.insert(self.quote_currency.clone(), new_quote);

        let order_id = format!("paper-{}", self.next_order_id.fetch_add(1, Ordering::SeqCst));
        info!(
            order_id = %order_id,
            symbol = %order.symbol,
            side = %order.side,
            amount = order.amount,
            price = price,
            "PaperExchange: filled order"
        );
        Ok(OrderResponse::accepted(order_id, "filled"))
    }
}
