//! Health Signal Module
//!
//! Turns the raw monitor event stream into stable verdicts:
//! - Signal and verdict types
//! - Flap-suppressing debouncer

pub mod debouncer;
pub mod event;

pub use debouncer::SignalDebouncer;
pub use event::{HealthSignal, SignalDirection, Verdict};
