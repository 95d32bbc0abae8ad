//! Cron-based tick scheduler

use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::core::runtime::{TickOutcome, TradingRuntime};
use crate::error::{TradingError, TradingResult};

/// Cron expression (with seconds field) firing every `interval_seconds`.
///
/// Cron steps restart at each minute, hour and day boundary, so only
/// intervals that divide the enclosing unit evenly keep a fixed spacing.
/// Anything else (90s, 45s, 5400s) yields `None`.
pub fn cron_expression(interval_seconds: u64) -> Option<String> {
    match interval_seconds {
        0 => None,
        s if s < 60 => (60 % s == 0).then(|| format!("*/{} * * * * *", s)),
        s if s < 3600 => {
            let minutes = s / 60;
            (s % 60 == 0 && 60 % minutes == 0).then(|| format!("0 */{} * * * *", minutes))
        }
        86_400 => Some("0 0 0 * * *".to_string()),
        s if s < 86_400 => {
            let hours = s / 3600;
            (s % 3600 == 0 && 24 % hours == 0).then(|| format!("0 0 */{} * * *", hours))
        }
        _ => None,
    }
}

/// Reject tick intervals the cron schedule cannot honour exactly.
pub fn validate_interval(interval_seconds: u64) -> TradingResult<String> {
    cron_expression(interval_seconds).ok_or_else(|| {
        TradingError::InvalidConfiguration(format!(
            "tick interval {}s must evenly divide a minute, an hour or a day",
            interval_seconds
        ))
    })
}

/// One scheduled firing: day rollover check, then a trading tick.
pub async fn run_once(runtime: &TradingRuntime) {
    match runtime.check_and_restart().await {
        Ok(Some(session)) => info!(session_id = %session.id, "TickScheduler: started session"),
        Ok(None) => {}
        Err(e) => error!(error = %e, "TickScheduler: session rollover failed"),
    }

    match runtime.tick().await {
        Ok(TickOutcome::Completed(result)) => {
            debug!(action = ?result.action, "TickScheduler: tick done");
        }
        Ok(TickOutcome::Skipped) => {}
        Err(TradingError::SessionInactive) => {
            debug!("TickScheduler: no active session, waiting for rollover");
        }
        // Already logged and counted by the runtime.
        Err(_) => {}
    }
}

pub struct TickScheduler {
    runtime: TradingRuntime,
    schedule: Schedule,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl TickScheduler {
    pub fn new(runtime: TradingRuntime, interval_seconds: u64) -> TradingResult<Self> {
        let cron_expr = validate_interval(interval_seconds)?;
        let schedule = Schedule::from_str(&cron_expr).map_err(|e| {
            TradingError::InvalidConfiguration(format!(
                "invalid cron expression '{}': {}",
                cron_expr, e
            ))
        })?;

        info!(
            interval = interval_seconds,
            cron = %cron_expr,
            "TickScheduler: created with interval {}s", interval_seconds
        );

        Ok(Self {
            runtime,
            schedule,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub async fn start(&self) {
        let runtime = self.runtime.clone();
        let schedule = self.schedule.clone();

        let handle = tokio::spawn(async move {
            info!("TickScheduler: started, waiting for cron schedule...");
            loop {
                let Some(next_tick) = schedule.upcoming(chrono::Utc).next() else {
                    tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                    continue;
                };
                let now = chrono::Utc::now();
                if next_tick > now {
                    let wait = (next_tick - now).to_std().unwrap_or_default();
                    tokio::time::sleep(wait).await;
                }
                run_once(&runtime).await;
            }
        });

        *self.handle.write().await = Some(handle);
    }

    pub async fn stop(&self) {
        if let Some(h) = self.handle.write().await.take() {
            h.abort();
            info!("TickScheduler: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }
}
