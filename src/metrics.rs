//! Prometheus metrics for the trading loop and its HTTP surface.

use prometheus::{
    Counter, Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,

    pub ticks_total: IntCounter,
    pub ticks_skipped_total: IntCounter,
    pub tick_errors_total: IntCounter,
    pub tick_duration_seconds: Histogram,
    pub orders_placed_total: IntCounter,
    pub orders_rejected_total: IntCounter,
    pub sessions_started_total: IntCounter,
    pub sessions_stopped_total: IntCounter,
    pub session_profit_pct: Gauge,
    pub position_side: Gauge,

    pub http_requests_total: Counter,
    pub http_requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("spotrix".to_string()), None)?;

        let ticks_total = IntCounter::new("ticks_total", "Trading ticks executed")?;
        let ticks_skipped_total = IntCounter::new(
            "ticks_skipped_total",
            "Ticks skipped because another tick was in flight",
        )?;
        let tick_errors_total = IntCounter::new("tick_errors_total", "Ticks that returned an error")?;
        let tick_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("tick_duration_seconds", "Wall time of one trading tick")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        let orders_placed_total = IntCounter::new("orders_placed_total", "Orders accepted by the exchange")?;
        let orders_rejected_total =
            IntCounter::new("orders_rejected_total", "Orders answered without an order id")?;
        let sessions_started_total = IntCounter::new("sessions_started_total", "Trading sessions started")?;
        let sessions_stopped_total = IntCounter::new("sessions_stopped_total", "Trading sessions stopped")?;
        let session_profit_pct = Gauge::with_opts(Opts::new(
            "session_profit_pct",
            "Cumulative P&L of the current session in percent",
        ))?;
        let position_side = Gauge::with_opts(Opts::new(
            "position_side",
            "Open position direction: -1 short, 0 flat, 1 long",
        ))?;

        let http_requests_total = Counter::new("http_requests_total", "HTTP requests served")?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently being served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency",
        ))?;

        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(ticks_skipped_total.clone()))?;
        registry.register(Box::new(tick_errors_total.clone()))?;
        registry.register(Box::new(tick_duration_seconds.clone()))?;
        registry.register(Box::new(orders_placed_total.clone()))?;
        registry.register(Box::new(orders_rejected_total.clone()))?;
        registry.register(Box::new(sessions_started_total.clone()))?;
        registry.register(Box::new(sessions_stopped_total.clone()))?;
        registry.register(Box::new(session_profit_pct.clone()))?;
        registry.register(Box::new(position_side.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            ticks_total,
            ticks_skipped_total,
            tick_errors_total,
            tick_duration_seconds,
            orders_placed_total,
            orders_rejected_total,
            sessions_started_total,
            sessions_stopped_total,
            session_profit_pct,
            position_side,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
        })
    }

    /// Text exposition format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
