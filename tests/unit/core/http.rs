//! Unit tests for HTTP error mapping

use axum::http::StatusCode;
use axum::response::IntoResponse;
use spotrix::core::http::ApiError;
use spotrix::models::order::OrderSide;
use spotrix::TradingError;

fn status(error: TradingError) -> StatusCode {
    ApiError(error).into_response().status()
}

#[test]
fn test_error_status_mapping() {
    assert_eq!(status(TradingError::SessionInactive), StatusCode::CONFLICT);
    assert_eq!(
        status(TradingError::gateway("BTCUSDT", "fetch price series", "timeout")),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        status(TradingError::OrderRejected {
            symbol: "BTCUSDT".to_string(),
            side: OrderSide::Buy,
            reason: "insufficient funds".to_string(),
        }),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        status(TradingError::Persistence("connection reset".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_error_kinds() {
    assert_eq!(TradingError::SessionInactive.kind(), "session_inactive");
    assert_eq!(
        TradingError::InsufficientData {
            required: 51,
            available: 10
        }
        .kind(),
        "insufficient_data"
    );
}
