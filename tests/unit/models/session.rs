//! Unit tests for session bookkeeping

use chrono::Utc;
use serde_json::json;
use spotrix::models::order::OrderSide;
use spotrix::models::session::{
    CloseReason, SessionStatus, StopReason, TradeTransaction, TradingSession,
};

use crate::support::assert_close;

fn session(balance: f64) -> TradingSession {
    TradingSession::start("BTCUSDT", balance, 5.0, 5.0, Utc::now())
}

#[test]
fn test_new_session_is_active() {
    let session = session(1000.0);
    assert!(session.is_active());
    assert_eq!(session.current_balance, 1000.0);
    assert!(session.end_time.is_none());
    assert!(!session.id.is_empty());
}

#[test]
fn test_session_ids_are_unique() {
    assert_ne!(session(1000.0).id, session(1000.0).id);
}

#[test]
fn test_loss_at_threshold_stops_session() {
    let mut session = session(1000.0);
    session.current_balance = 950.0;
    assert_close(session.profit_pct_now(), -5.0);
    assert_eq!(session.threshold_breach(), Some(StopReason::StopLoss));
}

#[test]
fn test_profit_at_threshold_stops_session() {
    let mut session = session(1000.0);
    session.current_balance = 1050.0;
    assert_eq!(session.threshold_breach(), Some(StopReason::ProfitTarget));

    session.current_balance = 1049.0;
    assert_eq!(session.threshold_breach(), None);
}

#[test]
fn test_zero_opening_balance_has_zero_pnl() {
    let session = session(0.0);
    assert_eq!(session.profit_pct_now(), 0.0);
}

#[test]
fn test_close_records_outcome() {
    let mut session = session(1000.0);
    let end = Utc::now();
    session.close(1020.0, StopReason::Manual, end);

    assert_eq!(session.status, SessionStatus::Closed);
    assert_eq!(session.end_time, Some(end));
    assert_eq!(session.stop_reason, Some(StopReason::Manual));
    assert_close(session.profit.unwrap(), 20.0);
    assert_close(session.profit_pct.unwrap(), 2.0);
}

#[test]
fn test_reason_labels_parse_back() {
    for reason in [
        CloseReason::ProfitTarget,
        CloseReason::StopLoss,
        CloseReason::SignalChange,
        CloseReason::Manual,
    ] {
        assert_eq!(reason.as_str().parse::<CloseReason>(), Ok(reason));
    }
    assert!("bogus".parse::<StopReason>().is_err());
    assert!(CloseReason::StopLoss.is_forced());
    assert!(!CloseReason::SignalChange.is_forced());
}

#[test]
fn test_transaction_serializes_side_as_type() {
    let tx = TradeTransaction {
        session_id: "s-1".to_string(),
        order_id: "o-1".to_string(),
        side: OrderSide::Sell,
        price: 105.0,
        amount: 2.0,
        total: 210.0,
        profit_pct: Some(5.0),
        close_reason: Some(CloseReason::ProfitTarget),
        status: "filled".to_string(),
        executed_at: Utc::now(),
    };
    let value = serde_json::to_value(&tx).unwrap();
    assert_eq!(value["type"], json!("sell"));
    assert_eq!(value["close_reason"], json!("profit_target"));
}
