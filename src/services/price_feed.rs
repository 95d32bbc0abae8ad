//! Price feeds backing the paper exchange.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

use crate::models::indicators::Candle;
use crate::services::exchange::GatewayError;
use crate::services::market_data::MarketDataProvider;

/// Public kline endpoint client (`GET /api/v3/klines`). Rows are arrays of
/// `[open_time_ms, open, high, low, close, volume, ...]` with prices as
/// strings or numbers.
pub struct RestPriceFeed {
    base_url: String,
    client: reqwest::Client,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

impl RestPriceFeed {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Client whose requests fail as unavailable after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn parse_row(row: &Value) -> Result<Candle, GatewayError> {
        let fields = row
            .as_array()
            .ok_or_else(|| GatewayError::Unavailable("kline row is not an array".into()))?;
        if fields.len() < 6 {
            return Err(GatewayError::Unavailable(format!(
                "kline row has {} fields, expected at least 6",
                fields.len()
            )));
        }

        let open_time = fields[0]
            .as_i64()
            .ok_or_else(|| GatewayError::Unavailable("kline open time is not an integer".into()))?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(open_time)
            .ok_or_else(|| GatewayError::Unavailable(format!("invalid kline time {}", open_time)))?;

        Ok(Candle::new(
            number(&fields[1])?,
            number(&fields[2])?,
            number(&fields[3])?,
            number(&fields[4])?,
            number(&fields[5])?,
            timestamp,
        ))
    }
}

fn number(value: &Value) -> Result<f64, GatewayError> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| GatewayError::Unavailable(format!("malformed kline value {}", value)))
}

#[async_trait]
impl MarketDataProvider for RestPriceFeed {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, GatewayError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("interval", interval), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("kline request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Unavailable(format!(
                "kline endpoint returned {}",
                status
            )));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("malformed kline payload: {}", e)))?;

        let mut candles = rows
            .iter()
            .map(Self::parse_row)
            .collect::<Result<Vec<_>, _>>()?;
        candles.sort_by_key(|c| c.timestamp);

        debug!(symbol = %symbol, interval = %interval, count = candles.len(), "RestPriceFeed: fetched candles");
        Ok(candles)
    }
}

/// Fixed in-memory candle series, replaceable at runtime.
#[derive(Default)]
pub struct StaticPriceFeed {
    candles: RwLock<Vec<Candle>>,
}

impl StaticPriceFeed {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles: RwLock::new(candles),
        }
    }

    pub fn set_candles(&self, candles: Vec<Candle>) {
        if let Ok(mut guard) = self.candles.write() {
            *guard = candles;
        }
    }
}

#[async_trait]
impl MarketDataProvider for StaticPriceFeed {
    async fn get_candles(
        &self,
        _symbol: &str,
        _interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, GatewayError> {
        let candles = self
            .candles
            .read()
            .map_err(|_| GatewayError::Unavailable("price feed lock poisoned".into()))?;
        let skip = candles.len().saturating_sub(limit);
        Ok(candles[skip..].to_vec())
    }
}
