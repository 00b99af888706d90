//! # failctl - Region Failover Controller
//!
//! Safe standby promotion for multi-region deployments:
//! - **Signal debouncing**: noisy health events become stable verdicts
//! - **Failover state machine**: per-group authority on promote/block/reject
//! - **Promotion coordination**: bounded timeouts, verification, rollback
//! - **Audit log**: hash-chained, replayable system of record
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use failctl::audit::MemoryStore;
//! use failctl::config::{ControllerConfig, GroupConfig, RegionConfig};
//! use failctl::control::{InMemoryControlPlane, InMemoryNotificationSink};
//! use failctl::controller::Controller;
//! use failctl::signal::{HealthSignal, SignalDirection};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ControllerConfig::new(vec![GroupConfig::new(
//!         "pg-main",
//!         vec![
//!             RegionConfig::new("delhi", "Delhi", "db-del-1").primary(),
//!             RegionConfig::new("chennai", "Chennai", "db-chn-1"),
//!         ],
//!     )]);
//!     let plane = Arc::new(InMemoryControlPlane::with_primary("delhi"));
//!     let controller = Controller::new(
//!         config,
//!         plane.clone(),
//!         plane,
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(InMemoryNotificationSink::new()),
//!     )
//!     .await
//!     .unwrap();
//!
//!     let outcome = controller
//!         .handle_signal(HealthSignal::new("delhi", SignalDirection::Down))
//!         .await
//!         .unwrap();
//!     println!("outcome: {:?}", outcome);
//! }
//! ```

pub mod audit;
pub mod config;
pub mod control;
pub mod controller;
pub mod core;
pub mod failover;
pub mod region;
pub mod signal;
pub mod telemetry;
pub mod webhook;

pub use crate::core::error::{Error, Result};
