//! Signal evaluation interfaces.

pub mod engine;
pub mod signal_generator;

pub use engine::{SignalEngine, SignalEvaluation};
pub use signal_generator::{RsiLevels, SignalDecision, SignalGenerator, SignalInputs};
