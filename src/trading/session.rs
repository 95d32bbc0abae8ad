//! Session lifecycle and per-tick orchestration.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::TradingConfig;
use crate::db::SessionRepository;
use crate::error::{TradingError, TradingResult};
use crate::metrics::Metrics;
use crate::models::indicators::IndicatorSnapshot;
use crate::models::position::{Position, PositionSide};
use crate::models::session::{CloseReason, StopReason, TradeTransaction, TradingSession};
use crate::models::signal::{Signal, SignalReason};
use crate::services::exchange::ExchangeGateway;
use crate::signals::SignalEngine;
use crate::trading::position_manager::{
    plan, ExitThresholds, PositionDecision, PositionManager, TradeAction,
};

/// Everything the controller mutates across ticks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradingState {
    pub session: Option<TradingSession>,
    pub position: Position,
    pub last_tick_date: Option<NaiveDate>,
    /// Set while a close has gone out but the session P&L has not yet been
    /// recomputed against the thresholds.
    pub pending_session_check: bool,
}

impl TradingState {
    pub fn new(symbol: &str) -> Self {
        Self {
            session: None,
            position: Position::flat(symbol),
            last_tick_date: None,
            pending_session_check: false,
        }
    }

    fn active_session(&self) -> TradingResult<&TradingSession> {
        self.session
            .as_ref()
            .filter(|s| s.is_active())
            .ok_or(TradingError::SessionInactive)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<SignalReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorSnapshot>,
    pub position: Position,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<TradeTransaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<CloseReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_stopped: Option<StopReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResult {
    pub action: TradeAction,
    pub details: TickDetails,
}

pub struct SessionController {
    config: TradingConfig,
    gateway: Arc<dyn ExchangeGateway>,
    repository: Arc<dyn SessionRepository>,
    positions: PositionManager,
    signals: SignalEngine,
    metrics: Option<Arc<Metrics>>,
    state: TradingState,
}

impl SessionController {
    pub fn new(
        config: TradingConfig,
        gateway: Arc<dyn ExchangeGateway>,
        repository: Arc<dyn SessionRepository>,
    ) -> TradingResult<Self> {
        config.validate()?;

        let positions = PositionManager::new(
            gateway.clone(),
            repository.clone(),
            &config.symbol,
            &config.quote_currency,
            config.sizing,
        );
        let signals = SignalEngine::new(config.indicators, config.rsi_levels);
        let state = TradingState::new(&config.symbol);

        Ok(Self {
            config,
            gateway,
            repository,
            positions,
            signals,
            metrics: None,
            state,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.positions = self.positions.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &TradingConfig {
        &self.config
    }

    pub fn state(&self) -> &TradingState {
        &self.state
    }

    pub fn get_current_session(&self) -> Option<&TradingSession> {
        self.state.session.as_ref()
    }

    pub fn is_session_active(&self) -> bool {
        self.state.active_session().is_ok()
    }

    pub fn position(&self) -> &Position {
        &self.state.position
    }

    /// Adopt the active session recorded for this symbol, if any. The
    /// position is not persisted and restarts flat. The last tick date is
    /// rebuilt from the most recent session so a restart does not count as
    /// a day rollover.
    pub async fn restore(&mut self) -> TradingResult<Option<TradingSession>> {
        if let Some(latest) = self
            .repository
            .load_latest_session(&self.config.symbol)
            .await?
        {
            let last_seen = latest.end_time.unwrap_or(latest.start_time);
            self.state.last_tick_date = Some(last_seen.date_naive());
        }

        let session = self
            .repository
            .load_active_session(&self.config.symbol)
            .await?;
        if let Some(ref session) = session {
            warn!(
                symbol = %self.config.symbol,
                session_id = %session.id,
                "SessionController: resumed active session, position assumed flat"
            );
            self.state.session = Some(session.clone());
            self.state.position = Position::flat(&self.config.symbol);
        }
        Ok(session)
    }

    pub async fn start_session(&mut self) -> TradingResult<TradingSession> {
        self.start_session_at(Utc::now()).await
    }

    /// Start a session, or return the one already active.
    pub async fn start_session_at(&mut self, now: DateTime<Utc>) -> TradingResult<TradingSession> {
        if let Ok(active) = self.state.active_session() {
            debug!(session_id = %active.id, "SessionController: session already active");
            return Ok(active.clone());
        }

        let balance = self.quote_balance("snapshot opening balance").await?;
        let session = TradingSession::start(
            &self.config.symbol,
            balance,
            self.config.profit_threshold_pct,
            self.config.loss_threshold_pct,
            now,
        );
        self.repository.save_session(&session).await?;

        info!(
            symbol = %session.symbol,
            session_id = %session.id,
            balance = balance,
            profit_threshold_pct = session.profit_threshold_pct,
            loss_threshold_pct = session.loss_threshold_pct,
            "SessionController: session started"
        );
        if let Some(metrics) = &self.metrics {
            metrics.sessions_started_total.inc();
            metrics.session_profit_pct.set(0.0);
            metrics.position_side.set(0.0);
        }

        self.state.session = Some(session.clone());
        self.state.position = Position::flat(&self.config.symbol);
        self.state.last_tick_date = Some(now.date_naive());
        Ok(session)
    }

    pub async fn stop_session(&mut self, reason: StopReason) -> TradingResult<TradingSession> {
        self.stop_session_with(reason, CloseReason::Manual).await
    }

    /// Stop with an explicit reason for closing any open position.
    pub async fn stop_session_with(
        &mut self,
        reason: StopReason,
        close_reason: CloseReason,
    ) -> TradingResult<TradingSession> {
        self.stop_session_at(reason, close_reason, Utc::now()).await
    }

    pub async fn stop_session_at(
        &mut self,
        reason: StopReason,
        close_reason: CloseReason,
        now: DateTime<Utc>,
    ) -> TradingResult<TradingSession> {
        let session_id = self.state.active_session()?.id.clone();

        if !self.state.position.is_flat() {
            let candles = self
                .gateway
                .get_price_series(&self.config.symbol, &self.config.price_interval, 1)
                .await
                .map_err(|e| TradingError::gateway(&self.config.symbol, "fetch closing price", e))?;
            let price = candles.last().map(|c| c.close).ok_or_else(|| {
                TradingError::gateway(&self.config.symbol, "fetch closing price", "empty price series")
            })?;
            self.positions
                .close_position(&session_id, &mut self.state.position, price, close_reason, now)
                .await?;
        }

        self.finish_session(reason, now).await
    }

    pub async fn execute_trading(&mut self) -> TradingResult<TickResult> {
        self.execute_trading_at(Utc::now()).await
    }

    /// One tick: price series, signal, position transition, session
    /// bookkeeping.
    pub async fn execute_trading_at(&mut self, now: DateTime<Utc>) -> TradingResult<TickResult> {
        self.state.active_session()?;
        if self.state.pending_session_check {
            warn!(
                symbol = %self.config.symbol,
                "SessionController: previous close was not checked against session thresholds, checking now"
            );
            if let Some(reason) = self.after_close(now).await? {
                self.state.last_tick_date = Some(now.date_naive());
                return Ok(self.result(TradeAction::Hold, TickDetails {
                    session_stopped: Some(reason),
                    message: Some("session stopped before trading".to_string()),
                    ..self.empty_details()
                }));
            }
        }

        let session = self.state.active_session()?;
        let session_id = session.id.clone();
        let thresholds = ExitThresholds {
            profit_pct: session.profit_threshold_pct,
            loss_pct: session.loss_threshold_pct,
        };
        let symbol = self.config.symbol.clone();

        let candles = self
            .gateway
            .get_price_series(&symbol, &self.config.price_interval, self.config.history_limit)
            .await
            .map_err(|e| TradingError::gateway(&symbol, "fetch price series", e))?;
        self.state.last_tick_date = Some(now.date_naive());

        let Some(price) = candles.last().map(|c| c.close) else {
            warn!(symbol = %symbol, "SessionController: empty price series, holding");
            return Ok(self.result(TradeAction::Hold, TickDetails {
                message: Some("no price data".to_string()),
                ..self.empty_details()
            }));
        };

        let evaluation = self.signals.evaluate(&candles);
        let decision = plan(&self.state.position, evaluation.signal, price, thresholds);
        info!(
            symbol = %symbol,
            session_id = %session_id,
            signal = %evaluation.signal,
            price = price,
            position = %self.state.position.side,
            decision = ?decision,
            "SessionController: tick evaluated"
        );

        let mut details = TickDetails {
            signal: Some(evaluation.signal),
            reasons: evaluation.reasons,
            price: Some(price),
            indicators: Some(evaluation.indicators),
            ..self.empty_details()
        };

        let action = match decision {
            PositionDecision::Hold => TradeAction::Hold,
            PositionDecision::Close(reason) => {
                self.close_leg(&session_id, price, reason, now, &mut details)
                    .await?;
                TradeAction::ClosePosition
            }
            PositionDecision::Open(side) => {
                self.open_leg(&session_id, side, price, now, &mut details)
                    .await?
            }
            PositionDecision::Flip(side) => {
                self.close_leg(&session_id, price, CloseReason::SignalChange, now, &mut details)
                    .await?;
                if details.session_stopped.is_some() {
                    TradeAction::ClosePosition
                } else {
                    match self.open_leg(&session_id, side, price, now, &mut details).await? {
                        TradeAction::Hold => TradeAction::ClosePosition,
                        opened => opened,
                    }
                }
            }
        };

        details.position = self.state.position.clone();
        Ok(self.result(action, details))
    }

    pub async fn check_and_restart(&mut self) -> TradingResult<Option<TradingSession>> {
        self.check_and_restart_at(Utc::now()).await
    }

    /// Day-boundary rollover: start a fresh session when the UTC date moved
    /// past the last tick and nothing is active.
    pub async fn check_and_restart_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> TradingResult<Option<TradingSession>> {
        let today = now.date_naive();
        if self.state.last_tick_date == Some(today) {
            return Ok(None);
        }
        if self.is_session_active() {
            debug!(date = %today, "SessionController: new day, session still active");
            return Ok(None);
        }

        info!(
            symbol = %self.config.symbol,
            last_tick = ?self.state.last_tick_date,
            date = %today,
            "SessionController: day rolled over, starting new session"
        );
        self.start_session_at(now).await.map(Some)
    }

    async fn close_leg(
        &mut self,
        session_id: &str,
        price: f64,
        reason: CloseReason,
        now: DateTime<Utc>,
        details: &mut TickDetails,
    ) -> TradingResult<()> {
        // Cleared by after_close once the session P&L is recomputed.
        self.state.pending_session_check = true;
        if let Some(tx) = self
            .positions
            .close_position(session_id, &mut self.state.position, price, reason, now)
            .await?
        {
            details.transactions.push(tx);
        }
        details.close_reason = Some(reason);
        details.session_stopped = self.after_close(now).await?;
        Ok(())
    }

    async fn open_leg(
        &mut self,
        session_id: &str,
        side: PositionSide,
        price: f64,
        now: DateTime<Utc>,
        details: &mut TickDetails,
    ) -> TradingResult<TradeAction> {
        match self
            .positions
            .open_position(session_id, &mut self.state.position, side, price, now)
            .await?
        {
            Some(tx) => {
                details.transactions.push(tx);
                Ok(TradeAction::opening(side))
            }
            None => {
                details.message = Some("balance too small to open a position".to_string());
                Ok(TradeAction::Hold)
            }
        }
    }

    /// Refresh the balance snapshot from the exchange and apply the
    /// session-level stop rule.
    async fn after_close(&mut self, now: DateTime<Utc>) -> TradingResult<Option<StopReason>> {
        let balance = self.quote_balance("refresh balance after close").await?;
        let Some(session) = self.state.session.as_mut() else {
            return Err(TradingError::SessionInactive);
        };
        session.current_balance = balance;
        let profit_pct = session.profit_pct_now();
        let breach = session.threshold_breach();
        self.repository.save_session(session).await?;

        if let Some(metrics) = &self.metrics {
            metrics.session_profit_pct.set(profit_pct);
        }
        debug!(balance = balance, profit_pct = profit_pct, "SessionController: balance refreshed");

        if let Some(reason) = breach {
            info!(
                symbol = %self.config.symbol,
                profit_pct = profit_pct,
                reason = %reason,
                "SessionController: session threshold reached"
            );
            self.finish_session(reason, now).await?;
        }
        self.state.pending_session_check = false;
        Ok(breach)
    }

    async fn finish_session(
        &mut self,
        reason: StopReason,
        now: DateTime<Utc>,
    ) -> TradingResult<TradingSession> {
        let balance = self.quote_balance("snapshot closing balance").await?;
        let mut session = self.state.active_session()?.clone();
        session.close(balance, reason, now);
        self.repository.save_session(&session).await?;

        info!(
            symbol = %session.symbol,
            session_id = %session.id,
            reason = %reason,
            initial_balance = session.initial_balance,
            final_balance = balance,
            profit = session.profit.unwrap_or(0.0),
            profit_pct = session.profit_pct.unwrap_or(0.0),
            "SessionController: session stopped"
        );
        if let Some(metrics) = &self.metrics {
            metrics.sessions_stopped_total.inc();
            metrics.session_profit_pct.set(session.profit_pct.unwrap_or(0.0));
            metrics.position_side.set(0.0);
        }

        self.state.session = Some(session.clone());
        self.state.pending_session_check = false;
        Ok(session)
    }

    async fn quote_balance(&self, action: &str) -> TradingResult<f64> {
        self.gateway
            .get_available_balance(&self.config.quote_currency)
            .await
            .map_err(|e| TradingError::gateway(&self.config.symbol, action, e))
    }

    fn empty_details(&self) -> TickDetails {
        TickDetails {
            signal: None,
            reasons: Vec::new(),
            price: None,
            indicators: None,
            position: self.state.position.clone(),
            transactions: Vec::new(),
            close_reason: None,
            session_stopped: None,
            message: None,
        }
    }

    fn result(&self, action: TradeAction, details: TickDetails) -> TickResult {
        if let Some(metrics) = &self.metrics {
            metrics.position_side.set(self.state.position.side.as_gauge());
        }
        TickResult { action, details }
    }
}
