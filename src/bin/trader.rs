//! Spotrix Trader
//!
//! Runs the trading loop on a cron schedule and serves the HTTP control
//! surface from the same process, so both share one single-flight runtime.

use dotenvy::dotenv;
use spotrix::config::{get_environment, ServiceConfig, TradingConfig};
use spotrix::core::bootstrap::build_runtime;
use spotrix::core::http::{start_server, AppState};
use spotrix::core::TickScheduler;
use spotrix::logging;
use spotrix::metrics::Metrics;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let trading = TradingConfig::from_env()?;
    let service = ServiceConfig::from_env()?;

    info!("Starting Spotrix Trader");
    info!(environment = %get_environment(), "Environment");
    info!(
        symbol = %trading.symbol,
        interval = %trading.price_interval,
        profit_threshold_pct = trading.profit_threshold_pct,
        loss_threshold_pct = trading.loss_threshold_pct,
        "Trading configuration"
    );

    let metrics = Arc::new(Metrics::new()?);
    let runtime = build_runtime(trading, &service, metrics).await?;

    if let Some(session) = runtime.check_and_restart().await? {
        info!(session_id = %session.id, balance = session.initial_balance, "Session started");
    }

    let scheduler = TickScheduler::new(runtime.clone(), service.tick_interval_seconds)?;
    scheduler.start().await;

    let state = AppState::new(runtime.clone());
    let port = service.port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(state, port).await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("Trader started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down trader...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    scheduler.stop().await;
    match runtime.shutdown().await {
        Ok(Some(session)) => info!(
            session_id = %session.id,
            profit_pct = session.profit_pct.unwrap_or(0.0),
            "Session stopped on shutdown"
        ),
        Ok(None) => {}
        Err(e) => error!(error = %e, "Failed to stop session on shutdown"),
    }
    info!("Trader stopped");

    Ok(())
}
