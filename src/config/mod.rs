//! Environment-driven configuration.
//!
//! Risk parameters (symbol, currencies, thresholds) are required and never
//! defaulted; everything else falls back to conservative defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::core::scheduler::validate_interval;
use crate::error::{TradingError, TradingResult};
use crate::indicators::{IndicatorParams, MacdParams};
use crate::signals::RsiLevels;

/// Deployment environment name (`APP_ENV`), `sandbox` when unset.
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

/// How much of the quote balance a new position uses, and how the
/// resulting quantity is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingPolicy {
    pub balance_fraction: f64,
    pub quantity_decimals: u32,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            balance_fraction: 0.9,
            quantity_decimals: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingConfig {
    pub symbol: String,
    pub base_currency: String,
    pub quote_currency: String,
    pub price_interval: String,
    pub history_limit: usize,
    pub profit_threshold_pct: f64,
    pub loss_threshold_pct: f64,
    pub indicators: IndicatorParams,
    pub rsi_levels: RsiLevels,
    pub sizing: SizingPolicy,
}

impl TradingConfig {
    /// Defaults for everything but the risk parameters.
    pub fn new(
        symbol: impl Into<String>,
        base_currency: impl Into<String>,
        quote_currency: impl Into<String>,
        profit_threshold_pct: f64,
        loss_threshold_pct: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            base_currency: base_currency.into(),
            quote_currency: quote_currency.into(),
            price_interval: "1h".to_string(),
            history_limit: 100,
            profit_threshold_pct,
            loss_threshold_pct,
            indicators: IndicatorParams::default(),
            rsi_levels: RsiLevels::default(),
            sizing: SizingPolicy::default(),
        }
    }

    pub fn from_env() -> TradingResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source. Values are validated before return.
    pub fn from_lookup<F>(lookup: F) -> TradingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Lookup(&lookup);

        let config = Self {
            symbol: source.required("TRADING_SYMBOL")?,
            base_currency: source.required("BASE_CURRENCY")?,
            quote_currency: source.required("QUOTE_CURRENCY")?,
            price_interval: source
                .optional("PRICE_INTERVAL")
                .unwrap_or_else(|| "1h".to_string()),
            history_limit: source.parsed_or("PRICE_HISTORY_LIMIT", 100)?,
            profit_threshold_pct: source.parsed_required("PROFIT_THRESHOLD_PCT")?,
            loss_threshold_pct: source.parsed_required("LOSS_THRESHOLD_PCT")?,
            indicators: IndicatorParams {
                sma_fast: source.parsed_or("SMA_FAST_PERIOD", 20)?,
                sma_slow: source.parsed_or("SMA_SLOW_PERIOD", 50)?,
                rsi_period: source.parsed_or("RSI_PERIOD", 14)?,
                macd: MacdParams {
                    fast: source.parsed_or("MACD_FAST_PERIOD", 12)?,
                    slow: source.parsed_or("MACD_SLOW_PERIOD", 26)?,
                    signal: source.parsed_or("MACD_SIGNAL_PERIOD", 9)?,
                },
            },
            rsi_levels: RsiLevels {
                overbought: source.parsed_or("RSI_OVERBOUGHT", 70.0)?,
                oversold: source.parsed_or("RSI_OVERSOLD", 30.0)?,
            },
            sizing: SizingPolicy {
                balance_fraction: source.parsed_or("POSITION_BALANCE_FRACTION", 0.9)?,
                quantity_decimals: source.parsed_or("QUANTITY_DECIMALS", 6)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TradingResult<()> {
        let invalid = |msg: String| Err(TradingError::InvalidConfiguration(msg));

        for (name, value) in [
            ("symbol", &self.symbol),
            ("base currency", &self.base_currency),
            ("quote currency", &self.quote_currency),
            ("price interval", &self.price_interval),
        ] {
            if value.trim().is_empty() {
                return invalid(format!("{} must not be empty", name));
            }
        }
        if !(self.profit_threshold_pct.is_finite() && self.profit_threshold_pct > 0.0) {
            return invalid(format!(
                "profit threshold must be positive, got {}",
                self.profit_threshold_pct
            ));
        }
        if !(self.loss_threshold_pct.is_finite() && self.loss_threshold_pct > 0.0) {
            return invalid(format!(
                "loss threshold must be positive, got {}",
                self.loss_threshold_pct
            ));
        }

        let p = &self.indicators;
        if [p.sma_fast, p.sma_slow, p.rsi_period, p.macd.fast, p.macd.slow, p.macd.signal]
            .contains(&0)
        {
            return invalid("indicator periods must be positive".to_string());
        }
        if p.sma_fast >= p.sma_slow {
            return invalid(format!(
                "fast SMA period ({}) must be shorter than slow ({})",
                p.sma_fast, p.sma_slow
            ));
        }
        if p.macd.fast >= p.macd.slow {
            return invalid(format!(
                "fast MACD period ({}) must be shorter than slow ({})",
                p.macd.fast, p.macd.slow
            ));
        }
        if self.rsi_levels.oversold >= self.rsi_levels.overbought {
            return invalid("RSI oversold level must be below overbought".to_string());
        }
        if self.history_limit < p.required_history() {
            return invalid(format!(
                "history limit {} is shorter than the {} samples the indicators need",
                self.history_limit,
                p.required_history()
            ));
        }
        if !(self.sizing.balance_fraction > 0.0 && self.sizing.balance_fraction <= 1.0) {
            return invalid(format!(
                "balance fraction must be in (0, 1], got {}",
                self.sizing.balance_fraction
            ));
        }
        Ok(())
    }
}

/// Process-level settings for the `trader` binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub tick_interval_seconds: u64,
    pub port: u16,
    pub database_url: Option<String>,
    pub price_feed_url: String,
    pub paper_quote_balance: f64,
}

impl ServiceConfig {
    pub fn from_env() -> TradingResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> TradingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Lookup(&lookup);
        let config = Self {
            tick_interval_seconds: source.parsed_or("TICK_INTERVAL_SECONDS", 60)?,
            port: source.parsed_or("PORT", 8080)?,
            database_url: source.optional("DATABASE_URL"),
            price_feed_url: source
                .optional("PRICE_FEED_URL")
                .unwrap_or_else(|| "https://api.binance.com".to_string()),
            paper_quote_balance: source.parsed_or("PAPER_QUOTE_BALANCE", 1000.0)?,
        };
        validate_interval(config.tick_interval_seconds)?;
        Ok(config)
    }
}

struct Lookup<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Lookup<'_, F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> TradingResult<String> {
        self.optional(key)
            .ok_or_else(|| TradingError::InvalidConfiguration(format!("{} is required", key)))
    }

    fn parse<T: FromStr>(key: &str, raw: &str) -> TradingResult<T> {
        raw.parse().map_err(|_| {
            TradingError::InvalidConfiguration(format!("{} has invalid value '{}'", key, raw))
        })
    }

    fn parsed_required<T: FromStr>(&self, key: &str) -> TradingResult<T> {
        Self::parse(key, &self.required(key)?)
    }

    fn parsed_or<T: FromStr>(&self, key: &str, default: T) -> TradingResult<T> {
        match self.optional(key) {
            Some(raw) => Self::parse(key, &raw),
            None => Ok(default),
        }
    }
}
