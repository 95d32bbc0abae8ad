//! Session controller scenarios against a scripted gateway

use chrono::{TimeZone, Utc};
use spotrix::db::{InMemorySessionRepository, SessionRepository};
use spotrix::models::order::{OrderResponse, OrderSide};
use spotrix::models::position::PositionSide;
use spotrix::models::session::{CloseReason, SessionStatus, StopReason, TradingSession};
use spotrix::models::signal::Signal;
use spotrix::services::exchange::GatewayError;
use spotrix::trading::{SessionController, TradeAction};
use spotrix::TradingError;
use std::sync::Arc;

use crate::test_utils::{falling_to, rising_to, test_config, MockGateway, TestHarness};

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
}

/// Session started and a long opened at 100.
async fn harness_with_long() -> TestHarness {
    let mut h = TestHarness::new(1000.0);
    h.controller.start_session().await.unwrap();
    h.gateway.set_closes(&falling_to(100.0, 30));
    let result = h.controller.execute_trading().await.unwrap();
    assert_eq!(result.action, TradeAction::Buy);
    h
}

#[tokio::test]
async fn start_session_snapshots_balance() {
    let mut h = TestHarness::new(1000.0);
    let session = h.controller.start_session().await.unwrap();

    assert!(h.controller.is_session_active());
    assert_eq!(session.initial_balance, 1000.0);
    assert_eq!(session.current_balance, 1000.0);
    assert_eq!(session.profit_threshold_pct, 5.0);
    assert_eq!(h.repository.sessions().await, vec![session]);
    assert!(h.controller.position().is_flat());
}

#[tokio::test]
async fn start_session_while_active_returns_existing() {
    let mut h = TestHarness::new(1000.0);
    let first = h.controller.start_session().await.unwrap();
    let second = h.controller.start_session().await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(h.repository.sessions().await.len(), 1);
}

#[tokio::test]
async fn tick_without_session_is_rejected() {
    let mut h = TestHarness::new(1000.0);
    h.gateway.set_closes(&falling_to(100.0, 30));
    let result = h.controller.execute_trading().await;
    assert!(matches!(result, Err(TradingError::SessionInactive)));
    assert!(h.gateway.orders().is_empty());
}

#[tokio::test]
async fn buy_signal_opens_long_sized_from_balance() {
    let h = harness_with_long().await;

    let position = h.controller.position();
    assert_eq!(position.side, PositionSide::Long);
    assert_eq!(position.entry_price, 100.0);
    assert_close(position.quantity, 9.0);

    let orders = h.gateway.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].side, OrderSide::Buy);
    assert_close(orders[0].amount, 9.0);

    let session_id = h.controller.get_current_session().unwrap().id.clone();
    let transactions = h.repository.list_transactions(&session_id).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].order_id, "mock-1");
    assert!(transactions[0].close_reason.is_none());
}

#[tokio::test]
async fn profit_target_closes_position() {
    let mut h = harness_with_long().await;
    h.gateway.set_closes(&falling_to(105.0, 30));

    let result = h.controller.execute_trading().await.unwrap();

    assert_eq!(result.action, TradeAction::ClosePosition);
    assert_eq!(result.details.close_reason, Some(CloseReason::ProfitTarget));
    assert!(result.details.session_stopped.is_none());
    assert!(result.details.position.is_flat());
    let tx = &result.details.transactions[0];
    assert_eq!(tx.side, OrderSide::Sell);
    assert_close(tx.profit_pct.unwrap(), 5.0);
    assert!(h.controller.is_session_active());
}

#[tokio::test]
async fn session_loss_threshold_stops_session() {
    let mut h = harness_with_long().await;
    h.gateway.set_closes(&falling_to(94.0, 30));
    h.gateway.set_balance(950.0);

    let result = h.controller.execute_trading().await.unwrap();

    assert_eq!(result.action, TradeAction::ClosePosition);
    assert_eq!(result.details.close_reason, Some(CloseReason::StopLoss));
    assert_eq!(result.details.session_stopped, Some(StopReason::StopLoss));

    let session = h.controller.get_current_session().unwrap();
    assert_eq!(session.status, SessionStatus::Closed);
    assert_eq!(session.stop_reason, Some(StopReason::StopLoss));
    assert_close(session.profit_pct.unwrap(), -5.0);
    assert!(session.end_time.is_some());

    let stored = h.repository.load_session(&session.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Closed);

    let next = h.controller.execute_trading().await;
    assert!(matches!(next, Err(TradingError::SessionInactive)));
}

#[tokio::test]
async fn failed_balance_refresh_defers_session_stop_to_next_tick() {
    let mut h = harness_with_long().await;
    h.gateway.set_closes(&falling_to(94.0, 30));
    h.gateway.set_balance(950.0);
    h.gateway.fail_balance("timeout");

    let result = h.controller.execute_trading().await;

    assert!(matches!(result, Err(TradingError::GatewayUnavailable { .. })));
    assert!(h.controller.position().is_flat());
    assert!(h.controller.is_session_active());
    assert!(h.controller.state().pending_session_check);

    // Next tick reads BUY again, but the session is already down 5%.
    h.gateway.restore_balance();
    h.gateway.set_closes(&falling_to(100.0, 30));
    let result = h.controller.execute_trading().await.unwrap();

    assert_eq!(result.action, TradeAction::Hold);
    assert_eq!(result.details.session_stopped, Some(StopReason::StopLoss));
    assert!(!h.controller.is_session_active());
    assert!(!h.controller.state().pending_session_check);
    assert!(h.controller.position().is_flat());
    assert_eq!(h.gateway.orders().len(), 2);

    let session = h.controller.get_current_session().unwrap();
    assert_eq!(session.stop_reason, Some(StopReason::StopLoss));
    assert_close(session.profit_pct.unwrap(), -5.0);
}

#[tokio::test]
async fn deferred_check_within_thresholds_keeps_trading() {
    let mut h = harness_with_long().await;
    h.gateway.set_closes(&rising_to(102.0, 30));
    h.gateway.set_balance(1020.0);
    h.gateway.fail_balance("timeout");

    // The flip's close goes out, then the balance refresh fails.
    let result = h.controller.execute_trading().await;
    assert!(matches!(result, Err(TradingError::GatewayUnavailable { .. })));
    assert!(h.controller.state().pending_session_check);

    h.gateway.restore_balance();
    let result = h.controller.execute_trading().await.unwrap();

    assert!(h.controller.is_session_active());
    assert!(!h.controller.state().pending_session_check);
    assert_eq!(result.action, TradeAction::Sell);
    assert_close(h.controller.get_current_session().unwrap().current_balance, 1020.0);
}

#[tokio::test]
async fn opposite_signal_flips_position() {
    let mut h = harness_with_long().await;
    h.gateway.set_closes(&rising_to(102.0, 30));

    let result = h.controller.execute_trading().await.unwrap();

    assert_eq!(result.details.signal, Some(Signal::Sell));
    assert_eq!(result.action, TradeAction::Sell);
    assert_eq!(result.details.close_reason, Some(CloseReason::SignalChange));
    assert_eq!(result.details.transactions.len(), 2);
    assert_eq!(
        result.details.transactions[0].close_reason,
        Some(CloseReason::SignalChange)
    );

    let position = h.controller.position();
    assert_eq!(position.side, PositionSide::Short);
    assert_eq!(position.entry_price, 102.0);
    assert_close(position.quantity, 8.823529);

    let sides: Vec<_> = h.gateway.orders().iter().map(|o| o.side).collect();
    assert_eq!(sides, vec![OrderSide::Buy, OrderSide::Sell, OrderSide::Sell]);
}

#[tokio::test]
async fn flip_skips_open_when_close_ends_session() {
    let mut h = harness_with_long().await;
    h.gateway.set_closes(&rising_to(102.0, 30));
    h.gateway.set_balance(1060.0);

    let result = h.controller.execute_trading().await.unwrap();

    assert_eq!(result.action, TradeAction::ClosePosition);
    assert_eq!(result.details.session_stopped, Some(StopReason::ProfitTarget));
    assert!(h.controller.position().is_flat());
    assert_eq!(h.gateway.orders().len(), 2);
}

#[tokio::test]
async fn order_without_id_leaves_position_unchanged() {
    let mut h = TestHarness::new(1000.0);
    h.controller.start_session().await.unwrap();
    h.gateway.set_closes(&falling_to(100.0, 30));
    h.gateway
        .script_order(Ok(OrderResponse::without_id("insufficient_balance")));

    let result = h.controller.execute_trading().await;

    assert!(matches!(
        result,
        Err(TradingError::OrderRejected {
            side: OrderSide::Buy,
            ..
        })
    ));
    assert!(h.controller.position().is_flat());
    assert!(h.repository.transactions().await.is_empty());
    assert!(h.controller.is_session_active());
}

#[tokio::test]
async fn exchange_refusal_is_order_rejected() {
    let mut h = harness_with_long().await;
    h.gateway.set_closes(&falling_to(105.0, 30));
    h.gateway
        .script_order(Err(GatewayError::Rejected("min notional".to_string())));

    let result = h.controller.execute_trading().await;

    assert!(matches!(result, Err(TradingError::OrderRejected { .. })));
    assert_eq!(h.controller.position().side, PositionSide::Long);
}

#[tokio::test]
async fn unavailable_gateway_aborts_tick() {
    let mut h = harness_with_long().await;
    let before = h.controller.state().clone();
    h.gateway.fail_prices("connection refused");

    let result = h.controller.execute_trading().await;

    assert!(matches!(result, Err(TradingError::GatewayUnavailable { .. })));
    assert_eq!(h.controller.state(), &before);
    assert_eq!(h.gateway.orders().len(), 1);
}

#[tokio::test]
async fn empty_series_holds() {
    let mut h = TestHarness::new(1000.0);
    h.controller.start_session().await.unwrap();

    let result = h.controller.execute_trading().await.unwrap();

    assert_eq!(result.action, TradeAction::Hold);
    assert_eq!(result.details.message.as_deref(), Some("no price data"));
    assert!(result.details.signal.is_none());
}

#[tokio::test]
async fn short_history_holds_without_orders() {
    let mut h = TestHarness::new(1000.0);
    h.controller.start_session().await.unwrap();
    h.gateway.set_closes(&[100.0, 99.0, 98.0]);

    let result = h.controller.execute_trading().await.unwrap();

    assert_eq!(result.action, TradeAction::Hold);
    assert_eq!(result.details.signal, Some(Signal::Hold));
    assert_eq!(result.details.price, Some(98.0));
    assert!(h.gateway.orders().is_empty());
}

#[tokio::test]
async fn empty_balance_skips_open() {
    let mut h = TestHarness::new(1000.0);
    h.controller.start_session().await.unwrap();
    h.gateway.set_closes(&falling_to(100.0, 30));
    h.gateway.set_balance(0.0);

    let result = h.controller.execute_trading().await.unwrap();

    assert_eq!(result.action, TradeAction::Hold);
    assert!(result.details.message.is_some());
    assert!(h.gateway.orders().is_empty());
    assert!(h.controller.position().is_flat());
}

#[tokio::test]
async fn stop_session_closes_open_position() {
    let mut h = harness_with_long().await;
    h.gateway.set_closes(&falling_to(101.0, 30));

    let session = h.controller.stop_session(StopReason::Manual).await.unwrap();

    assert_eq!(session.status, SessionStatus::Closed);
    assert_eq!(session.stop_reason, Some(StopReason::Manual));
    assert!(h.controller.position().is_flat());

    let transactions = h.repository.list_transactions(&session.id).await.unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[1].close_reason, Some(CloseReason::Manual));
    assert_eq!(transactions[1].price, 101.0);
}

#[tokio::test]
async fn stop_session_twice_is_inactive() {
    let mut h = TestHarness::new(1000.0);
    h.controller.start_session().await.unwrap();
    h.controller.stop_session(StopReason::Manual).await.unwrap();

    let again = h.controller.stop_session(StopReason::Manual).await;
    assert!(matches!(again, Err(TradingError::SessionInactive)));
}

#[tokio::test]
async fn check_and_restart_rolls_over_daily() {
    let mut h = TestHarness::new(1000.0);
    let day1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let day1_later = Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap();
    let day2 = Utc.with_ymd_and_hms(2024, 3, 2, 0, 5, 0).unwrap();

    let first = h.controller.check_and_restart_at(day1).await.unwrap().unwrap();
    assert!(h.controller.check_and_restart_at(day1_later).await.unwrap().is_none());

    h.controller
        .stop_session_at(StopReason::ProfitTarget, CloseReason::ProfitTarget, day1_later)
        .await
        .unwrap();
    assert!(h.controller.check_and_restart_at(day1_later).await.unwrap().is_none());

    let second = h.controller.check_and_restart_at(day2).await.unwrap().unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(second.start_time, day2);
}

#[tokio::test]
async fn check_and_restart_keeps_active_session_across_days() {
    let mut h = TestHarness::new(1000.0);
    let day1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let day2 = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();

    h.controller.start_session_at(day1).await.unwrap();
    assert!(h.controller.check_and_restart_at(day2).await.unwrap().is_none());
    assert_eq!(h.repository.sessions().await.len(), 1);
}

#[tokio::test]
async fn restore_adopts_active_session() {
    let gateway = Arc::new(MockGateway::new(1000.0));
    let repository = Arc::new(InMemorySessionRepository::new());
    let session = TradingSession::start("BTCUSDT", 800.0, 5.0, 5.0, Utc::now());
    repository.save_session(&session).await.unwrap();

    let mut controller =
        SessionController::new(test_config(), gateway, repository.clone()).unwrap();
    let restored = controller.restore().await.unwrap();

    assert_eq!(restored.map(|s| s.id), Some(session.id));
    assert!(controller.is_session_active());
    assert_eq!(controller.get_current_session().unwrap().initial_balance, 800.0);
}

#[tokio::test]
async fn restore_does_not_replace_session_stopped_earlier_today() {
    let gateway = Arc::new(MockGateway::new(1000.0));
    let repository = Arc::new(InMemorySessionRepository::new());
    let morning = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let stopped_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    let noon = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let next_day = Utc.with_ymd_and_hms(2024, 3, 2, 0, 5, 0).unwrap();

    let mut first =
        SessionController::new(test_config(), gateway.clone(), repository.clone()).unwrap();
    first.start_session_at(morning).await.unwrap();
    first
        .stop_session_at(StopReason::StopLoss, CloseReason::StopLoss, stopped_at)
        .await
        .unwrap();

    let mut restarted =
        SessionController::new(test_config(), gateway, repository.clone()).unwrap();
    assert!(restarted.restore().await.unwrap().is_none());
    assert_eq!(restarted.state().last_tick_date, Some(stopped_at.date_naive()));

    assert!(restarted.check_and_restart_at(noon).await.unwrap().is_none());
    assert_eq!(repository.sessions().await.len(), 1);

    let fresh = restarted.check_and_restart_at(next_day).await.unwrap().unwrap();
    assert_eq!(fresh.start_time, next_day);
    assert_eq!(repository.sessions().await.len(), 2);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let mut config = test_config();
    config.history_limit = 2;
    let result = SessionController::new(
        config,
        Arc::new(MockGateway::new(1000.0)),
        Arc::new(InMemorySessionRepository::new()),
    );
    assert!(matches!(result, Err(TradingError::InvalidConfiguration(_))));
}
