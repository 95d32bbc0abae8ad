//! Runtime plumbing around the trading core: single-flight runtime,
//! scheduler, HTTP surface.

pub mod bootstrap;
pub mod http;
pub mod runtime;
pub mod scheduler;

pub use runtime::{TickOutcome, TradingRuntime};
pub use scheduler::TickScheduler;
