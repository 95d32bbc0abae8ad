//! Kline client against a mock HTTP server

use serde_json::json;
use std::time::Duration;
use spotrix::services::market_data::MarketDataProvider;
use spotrix::services::price_feed::RestPriceFeed;
use spotrix::services::exchange::GatewayError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn parses_and_orders_klines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("interval", "1h"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [1704070800000i64, "101.0", "103.5", "100.5", "102.25", "12.5", 1704074399999i64],
            [1704067200000i64, 100.0, 101.5, 99.0, 101.0, 8.0, 1704070799999i64]
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let feed = RestPriceFeed::new(server.uri()).unwrap();
    let candles = feed.get_candles("BTCUSDT", "1h", 2).await.unwrap();

    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].close, 101.0);
    assert_eq!(candles[1].close, 102.25);
    assert_eq!(candles[1].volume, 12.5);
    assert!(candles[0].timestamp < candles[1].timestamp);
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let feed = RestPriceFeed::new(server.uri()).unwrap();
    let result = feed.get_candles("BTCUSDT", "1h", 10).await;
    assert!(matches!(result, Err(GatewayError::Unavailable(_))));
}

#[tokio::test]
async fn malformed_row_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [1704067200000i64, "100.0", "oops", "99.0", "101.0", "8.0"]
        ])))
        .mount(&server)
        .await;

    let feed = RestPriceFeed::new(server.uri()).unwrap();
    let result = feed.get_candles("BTCUSDT", "1h", 10).await;
    assert!(matches!(result, Err(GatewayError::Unavailable(_))));
}

#[tokio::test]
async fn unreachable_host_is_unavailable() {
    let feed = RestPriceFeed::new("http://127.0.0.1:1").unwrap();
    let result = feed.get_candles("BTCUSDT", "1h", 10).await;
    assert!(matches!(result, Err(GatewayError::Unavailable(_))));
}

#[tokio::test]
async fn slow_response_times_out_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let feed = RestPriceFeed::with_timeout(server.uri(), Duration::from_millis(100)).unwrap();
    let result = feed.get_candles("BTCUSDT", "1h", 10).await;
    assert!(matches!(result, Err(GatewayError::Unavailable(_))));
}
