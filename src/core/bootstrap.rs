//! Wiring of gateway, repository and controller from configuration.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{ServiceConfig, TradingConfig};
use crate::core::runtime::TradingRuntime;
use crate::db::{InMemorySessionRepository, PostgresSessionRepository, SessionRepository};
use crate::error::{TradingError, TradingResult};
use crate::metrics::Metrics;
use crate::services::{ExchangeGateway, PaperExchange, RestPriceFeed};
use crate::trading::SessionController;

pub async fn build_repository(service: &ServiceConfig) -> TradingResult<Arc<dyn SessionRepository>> {
    match &service.database_url {
        Some(url) => {
            let repository = PostgresSessionRepository::connect(url).await?;
            info!("PostgreSQL session repository connected");
            Ok(Arc::new(repository))
        }
        None => {
            warn!("DATABASE_URL not set, sessions are kept in memory only");
            Ok(Arc::new(InMemorySessionRepository::new()))
        }
    }
}

/// Paper exchange fed by the public kline endpoint.
pub fn build_gateway(
    trading: &TradingConfig,
    service: &ServiceConfig,
) -> TradingResult<Arc<dyn ExchangeGateway>> {
    info!(
        price_feed = %service.price_feed_url,
        quote_balance = service.paper_quote_balance,
        "Paper trading on live prices"
    );
    let feed = RestPriceFeed::new(service.price_feed_url.clone())
        .map_err(|e| TradingError::gateway(&trading.symbol, "build price feed", e))?;
    Ok(Arc::new(PaperExchange::new(
        Arc::new(feed),
        &trading.base_currency,
        &trading.quote_currency,
        service.paper_quote_balance,
    )))
}

pub async fn build_runtime(
    trading: TradingConfig,
    service: &ServiceConfig,
    metrics: Arc<Metrics>,
) -> TradingResult<TradingRuntime> {
    let repository = build_repository(service).await?;
    let gateway = build_gateway(&trading, service)?;

    let mut controller =
        SessionController::new(trading, gateway, repository)?.with_metrics(metrics.clone());
    controller.restore().await?;

    Ok(TradingRuntime::new(controller, metrics))
}
