//! Operator notifications.
//!
//! Fire-and-forget sink for failover outcomes. Delivery failures are logged
//! and never reach the state machine.

use crate::core::{now, Result, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Notification severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifySeverity {
    /// Informational
    Info,
    /// Needs operator attention
    Warning,
    /// Manual intervention required
    Critical,
}

/// A notification for the operations team.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    /// Severity
    pub severity: NotifySeverity,
    /// Machine-readable reason code
    pub reason_code: String,
    /// Human-readable message
    pub message: String,
    /// When the notification was produced
    pub timestamp: Timestamp,
}

impl Notification {
    /// Informational notification.
    pub fn info(reason_code: &str, message: &str) -> Self {
        Self {
            severity: NotifySeverity::Info,
            reason_code: reason_code.to_string(),
            message: message.to_string(),
            timestamp: now(),
        }
    }

    /// Warning notification.
    pub fn warning(reason_code: &str, message: &str) -> Self {
        Self {
            severity: NotifySeverity::Warning,
            ..Self::info(reason_code, message)
        }
    }

    /// Critical notification.
    pub fn critical(reason_code: &str, message: &str) -> Self {
        Self {
            severity: NotifySeverity::Critical,
            ..Self::info(reason_code, message)
        }
    }
}

/// Sink for operator notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification. Errors are logged by the caller, never acted on.
    async fn notify(&self, notification: Notification) -> Result<()>;
}
