//! Single-flight wrapper around the session controller.
//!
//! Every caller (scheduler, HTTP handlers, shutdown hook) goes through one
//! `TradingRuntime`. Ticks never queue: if one is in flight the next is
//! reported as skipped.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::error::TradingResult;
use crate::metrics::Metrics;
use crate::models::position::Position;
use crate::models::session::{StopReason, TradingSession};
use crate::trading::{SessionController, TickResult};

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Completed(TickResult),
    Skipped,
}

#[derive(Clone)]
pub struct TradingRuntime {
    controller: Arc<Mutex<SessionController>>,
    metrics: Arc<Metrics>,
}

impl TradingRuntime {
    pub fn new(controller: SessionController, metrics: Arc<Metrics>) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            metrics,
        }
    }

    pub fn controller(&self) -> Arc<Mutex<SessionController>> {
        self.controller.clone()
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub async fn tick(&self) -> TradingResult<TickOutcome> {
        let Ok(mut controller) = self.controller.try_lock() else {
            warn!("TradingRuntime: tick already in flight, skipping");
            self.metrics.ticks_skipped_total.inc();
            return Ok(TickOutcome::Skipped);
        };

        let start = Instant::now();
        let result = controller.execute_trading().await;
        self.metrics
            .tick_duration_seconds
            .observe(start.elapsed().as_secs_f64());
        self.metrics.ticks_total.inc();

        match result {
            Ok(tick) => {
                debug!(action = ?tick.action, "TradingRuntime: tick completed");
                Ok(TickOutcome::Completed(tick))
            }
            Err(e) => {
                self.metrics.tick_errors_total.inc();
                error!(error = %e, kind = e.kind(), "TradingRuntime: tick failed");
                Err(e)
            }
        }
    }

    pub async fn check_and_restart(&self) -> TradingResult<Option<TradingSession>> {
        self.controller.lock().await.check_and_restart().await
    }

    pub async fn start_session(&self) -> TradingResult<TradingSession> {
        self.controller.lock().await.start_session().await
    }

    pub async fn stop_session(&self, reason: StopReason) -> TradingResult<TradingSession> {
        self.controller.lock().await.stop_session(reason).await
    }

    pub async fn current_session(&self) -> Option<TradingSession> {
        self.controller.lock().await.get_current_session().cloned()
    }

    pub async fn is_session_active(&self) -> bool {
        self.controller.lock().await.is_session_active()
    }

    pub async fn position(&self) -> Position {
        self.controller.lock().await.position().clone()
    }

    /// Stop the active session, if any, closing its position.
    pub async fn shutdown(&self) -> TradingResult<Option<TradingSession>> {
        let mut controller = self.controller.lock().await;
        if !controller.is_session_active() {
            return Ok(None);
        }
        controller.stop_session(StopReason::Shutdown).await.map(Some)
    }
}
