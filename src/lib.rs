//! Spotrix: a single-symbol spot trading loop.
//!
//! Price history flows through the indicator pipeline into a signal, the
//! position manager turns that signal into orders, and the session
//! controller keeps cumulative P&L inside the configured risk bounds.

pub mod common;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
pub mod trading;

pub use error::TradingError;
