//! Control Plane Module
//!
//! Collaborator seams for external systems:
//! - Database promote/demote/role query
//! - Routing repoint
//! - Operator notifications
//! - In-memory reference adapters

pub mod memory;
pub mod notify;
pub mod plane;

pub use memory::{InMemoryControlPlane, InMemoryNotificationSink};
pub use notify::{Notification, NotificationSink, NotifySeverity};
pub use plane::{DatabaseControl, DbRole, PromoteResponse, RoutingControl};
