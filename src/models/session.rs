//! Session and fill records persisted through the repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::order::OrderSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Closed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Closed => "closed",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "closed" => Ok(SessionStatus::Closed),
            other => Err(format!("unknown session status '{}'", other)),
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    ProfitTarget,
    StopLoss,
    SignalChange,
    Manual,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::ProfitTarget => "profit_target",
            CloseReason::StopLoss => "stop_loss",
            CloseReason::SignalChange => "signal_change",
            CloseReason::Manual => "manual",
        }
    }

    pub fn is_forced(self) -> bool {
        matches!(self, CloseReason::ProfitTarget | CloseReason::StopLoss)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloseReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profit_target" => Ok(CloseReason::ProfitTarget),
            "stop_loss" => Ok(CloseReason::StopLoss),
            "signal_change" => Ok(CloseReason::SignalChange),
            "manual" => Ok(CloseReason::Manual),
            other => Err(format!("unknown close reason '{}'", other)),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Manual,
    ProfitTarget,
    StopLoss,
    Shutdown,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Manual => "manual",
            StopReason::ProfitTarget => "profit_target",
            StopReason::StopLoss => "stop_loss",
            StopReason::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StopReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(StopReason::Manual),
            "profit_target" => Ok(StopReason::ProfitTarget),
            "stop_loss" => Ok(StopReason::StopLoss),
            "shutdown" => Ok(StopReason::Shutdown),
            other => Err(format!("unknown stop reason '{}'", other)),
        }
    }
}

/// A bounded trading episode. `current_balance` is a snapshot taken at start,
/// after each close and at stop; it is not tracked continuously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSession {
    pub id: String,
    pub symbol: String,
    pub initial_balance: f64,
    pub current_balance: f64,
    pub profit_threshold_pct: f64,
    pub loss_threshold_pct: f64,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_pct: Option<f64>,
}

impl TradingSession {
    pub fn start(
        symbol: impl Into<String>,
        balance: f64,
        profit_threshold_pct: f64,
        loss_threshold_pct: f64,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            initial_balance: balance,
            current_balance: balance,
            profit_threshold_pct,
            loss_threshold_pct,
            status: SessionStatus::Active,
            start_time,
            end_time: None,
            stop_reason: None,
            profit: None,
            profit_pct: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Cumulative P&L percentage against the opening balance snapshot.
    pub fn profit_pct_now(&self) -> f64 {
        if self.initial_balance <= 0.0 {
            return 0.0;
        }
        (self.current_balance - self.initial_balance) * 100.0 / self.initial_balance
    }

    /// Session-level stop rule: the reason the session should end at the
    /// current balance snapshot, if any.
    pub fn threshold_breach(&self) -> Option<StopReason> {
        let pct = self.profit_pct_now();
        if pct >= self.profit_threshold_pct {
            Some(StopReason::ProfitTarget)
        } else if pct <= -self.loss_threshold_pct {
            Some(StopReason::StopLoss)
        } else {
            None
        }
    }

    pub fn close(&mut self, final_balance: f64, reason: StopReason, end_time: DateTime<Utc>) {
        self.current_balance = final_balance;
        let profit = final_balance - self.initial_balance;
        self.profit = Some(profit);
        self.profit_pct = Some(self.profit_pct_now());
        self.status = SessionStatus::Closed;
        self.end_time = Some(end_time);
        self.stop_reason = Some(reason);
    }
}

/// Immutable record of an accepted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeTransaction {
    pub session_id: String,
    pub order_id: String,
    #[serde(rename = "type")]
    pub side: OrderSide,
    pub price: f64,
    pub amount: f64,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<CloseReason>,
    pub status: String,
    pub executed_at: DateTime<Utc>,
}
