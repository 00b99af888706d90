//! Failover Module
//!
//! The decision core:
//! - Failover decisions
//! - Per-group state machine
//! - Promotion coordinator

pub mod coordinator;
pub mod decision;
pub mod state_machine;

pub use coordinator::{AttemptStatus, PromotionAttempt, PromotionCoordinator};
pub use decision::{DecisionKind, FailoverDecision};
pub use state_machine::{FailoverStateMachine, GroupState, Transition};
