//! Single-position state machine: forced exits first, then signal-driven
//! opens and flips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::common::math;
use crate::config::SizingPolicy;
use crate::db::SessionRepository;
use crate::error::{TradingError, TradingResult};
use crate::metrics::Metrics;
use crate::models::order::{OrderRequest, OrderResponse, OrderSide};
use crate::models::position::{Position, PositionSide};
use crate::models::session::{CloseReason, TradeTransaction};
use crate::models::signal::Signal;
use crate::services::exchange::{ExchangeGateway, GatewayError};

/// Per-trade exit thresholds, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitThresholds {
    pub profit_pct: f64,
    pub loss_pct: f64,
}

/// What the tick should do with the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionDecision {
    Hold,
    Close(CloseReason),
    Open(PositionSide),
    /// Close the current position on a signal change, then open the other
    /// side.
    Flip(PositionSide),
}

/// Action reported back to the caller for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
    ClosePosition,
    Hold,
}

impl TradeAction {
    pub fn opening(side: PositionSide) -> Self {
        match side {
            PositionSide::Long => TradeAction::Buy,
            PositionSide::Short => TradeAction::Sell,
            PositionSide::Flat => TradeAction::Hold,
        }
    }
}

/// Threshold check for an open position. Both bounds are inclusive and
/// profit is checked first.
pub fn forced_exit(position: &Position, price: f64, thresholds: ExitThresholds) -> Option<CloseReason> {
    let diff = position.price_diff_pct(price)?;
    if diff >= thresholds.profit_pct {
        Some(CloseReason::ProfitTarget)
    } else if diff <= -thresholds.loss_pct {
        Some(CloseReason::StopLoss)
    } else {
        None
    }
}

/// Decide the transition for this tick. A forced exit wins over any signal.
pub fn plan(
    position: &Position,
    signal: Signal,
    price: f64,
    thresholds: ExitThresholds,
) -> PositionDecision {
    if let Some(reason) = forced_exit(position, price, thresholds) {
        return PositionDecision::Close(reason);
    }

    let target = match signal {
        Signal::Buy => PositionSide::Long,
        Signal::Sell => PositionSide::Short,
        Signal::Hold => return PositionDecision::Hold,
    };

    match position.side {
        side if side == target => PositionDecision::Hold,
        PositionSide::Flat => PositionDecision::Open(target),
        _ => PositionDecision::Flip(target),
    }
}

/// Executes planned transitions against the exchange. The in-memory
/// position changes only after the exchange returns an order id.
pub struct PositionManager {
    gateway: Arc<dyn ExchangeGateway>,
    repository: Arc<dyn SessionRepository>,
    symbol: String,
    quote_currency: String,
    sizing: SizingPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl PositionManager {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        repository: Arc<dyn SessionRepository>,
        symbol: impl Into<String>,
        quote_currency: impl Into<String>,
        sizing: SizingPolicy,
    ) -> Self {
        Self {
            gateway,
            repository,
            symbol: symbol.into(),
            quote_currency: quote_currency.into(),
            sizing,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Base quantity for a new position given the available quote balance.
    pub fn size_order(&self, quote_balance: f64, price: f64) -> f64 {
        if price <= 0.0 || quote_balance <= 0.0 {
            return 0.0;
        }
        math::floor_to_decimals(
            quote_balance * self.sizing.balance_fraction / price,
            self.sizing.quantity_decimals,
        )
    }

    /// Open `side` at `price`. `Ok(None)` when the balance sizes to zero and
    /// no order was sent.
    pub async fn open_position(
        &self,
        session_id: &str,
        position: &mut Position,
        side: PositionSide,
        price: f64,
        now: DateTime<Utc>,
    ) -> TradingResult<Option<TradeTransaction>> {
        let Some(order_side) = side.entry_order() else {
            return Ok(None);
        };
        let action = format!("open {}", side);

        let balance = self
            .gateway
            .get_available_balance(&self.quote_currency)
            .await
            .map_err(|e| TradingError::gateway(&self.symbol, "fetch quote balance", e))?;
        let quantity = self.size_order(balance, price);
        if quantity <= 0.0 {
            warn!(
                symbol = %self.symbol,
                balance = balance,
                price = price,
                "PositionManager: balance too small to {}", action
            );
            return Ok(None);
        }

        let order = OrderRequest::market(&self.symbol, order_side, quantity);
        let (order_id, response) = self.submit(&order, &action).await?;

        *position = Position::open(&self.symbol, side, price, quantity, now);
        info!(
            symbol = %self.symbol,
            session_id = %session_id,
            order_id = %order_id,
            side = %side,
            price = price,
            quantity = quantity,
            "PositionManager: opened position"
        );

        let transaction = TradeTransaction {
            session_id: session_id.to_string(),
            order_id,
            side: order_side,
            price,
            amount: quantity,
            total: price * quantity,
            profit_pct: None,
            close_reason: None,
            status: response.status,
            executed_at: now,
        };
        self.repository.append_transaction(&transaction).await?;
        Ok(Some(transaction))
    }

    /// Liquidate the whole tracked quantity. `Ok(None)` when already flat.
    pub async fn close_position(
        &self,
        session_id: &str,
        position: &mut Position,
        price: f64,
        reason: CloseReason,
        now: DateTime<Utc>,
    ) -> TradingResult<Option<TradeTransaction>> {
        let Some(order_side) = position.side.exit_order() else {
            debug!(symbol = %self.symbol, "PositionManager: nothing to close");
            return Ok(None);
        };
        let action = format!("close {} ({})", position.side, reason);
        let profit_pct = position.price_diff_pct(price);
        let quantity = position.quantity;

        let order = OrderRequest::market(&self.symbol, order_side, quantity);
        let (order_id, response) = self.submit(&order, &action).await?;

        info!(
            symbol = %self.symbol,
            session_id = %session_id,
            order_id = %order_id,
            side = %position.side,
            entry_price = position.entry_price,
            price = price,
            quantity = quantity,
            profit_pct = profit_pct.unwrap_or(0.0),
            reason = %reason,
            "PositionManager: closed position"
        );
        position.clear();

        let transaction = TradeTransaction {
            session_id: session_id.to_string(),
            order_id,
            side: order_side,
            price,
            amount: quantity,
            total: price * quantity,
            profit_pct,
            close_reason: Some(reason),
            status: response.status,
            executed_at: now,
        };
        self.repository.append_transaction(&transaction).await?;
        Ok(Some(transaction))
    }

    async fn submit(
        &self,
        order: &OrderRequest,
        action: &str,
    ) -> TradingResult<(String, OrderResponse)> {
        let response = match self.gateway.place_order(order).await {
            Ok(response) => response,
            Err(GatewayError::Unavailable(reason)) => {
                return Err(TradingError::gateway(&self.symbol, action, reason));
            }
            Err(GatewayError::Rejected(reason)) => {
                return Err(self.rejected(order.side, reason));
            }
        };

        match response.order_id.clone() {
            Some(order_id) => {
                if let Some(metrics) = &self.metrics {
                    metrics.orders_placed_total.inc();
                }
                Ok((order_id, response))
            }
            None => Err(self.rejected(
                order.side,
                format!("no order id in response (status: {})", response.status),
            )),
        }
    }

    fn rejected(&self, side: OrderSide, reason: String) -> TradingError {
        warn!(symbol = %self.symbol, side = %side, reason = %reason, "PositionManager: order rejected");
        if let Some(metrics) = &self.metrics {
            metrics.orders_rejected_total.inc();
        }
        TradingError::OrderRejected {
            symbol: self.symbol.clone(),
            side,
            reason,
        }
    }
}
