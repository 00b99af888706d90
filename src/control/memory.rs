//! In-memory control-plane adapters.
//!
//! Reference implementations used by tests and local runs. Failure modes and
//! latency are injectable so rollback and timeout paths can be exercised.

use crate::control::notify::{Notification, NotificationSink};
use crate::control::plane::{DatabaseControl, DbRole, PromoteResponse, RoutingControl};
use crate::core::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

/// In-memory database and routing control plane.
pub struct InMemoryControlPlane {
    roles: RwLock<HashMap<String, DbRole>>,
    target: RwLock<Option<String>>,
    promote_delay_ms: AtomicU64,
    fail_promote: AtomicBool,
    fail_repoint: AtomicBool,
    fail_demote: AtomicBool,
    promote_calls: AtomicU64,
}

impl InMemoryControlPlane {
    /// Create a plane with no roles assigned.
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
            target: RwLock::new(None),
            promote_delay_ms: AtomicU64::new(0),
            fail_promote: AtomicBool::new(false),
            fail_repoint: AtomicBool::new(false),
            fail_demote: AtomicBool::new(false),
            promote_calls: AtomicU64::new(0),
        }
    }

    /// Create a plane with `primary` holding the primary role and routing target.
    pub fn with_primary(primary: &str) -> Self {
        let plane = Self::new();
        plane.set_role(primary, DbRole::Primary);
        *plane.target.write().unwrap() = Some(primary.to_string());
        plane
    }

    /// Set the database role of a region.
    pub fn set_role(&self, region_id: &str, role: DbRole) {
        self.roles
            .write()
            .unwrap()
            .insert(region_id.to_string(), role);
    }

    /// Delay promote calls, to exercise timeouts.
    pub fn set_promote_delay(&self, delay: Duration) {
        self.promote_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Make promote calls fail.
    pub fn set_fail_promote(&self, fail: bool) {
        self.fail_promote.store(fail, Ordering::SeqCst);
    }

    /// Make repoint calls fail.
    pub fn set_fail_repoint(&self, fail: bool) {
        self.fail_repoint.store(fail, Ordering::SeqCst);
    }

    /// Make demote calls fail, to exercise rollback escalation.
    pub fn set_fail_demote(&self, fail: bool) {
        self.fail_demote.store(fail, Ordering::SeqCst);
    }

    /// Number of promote calls that reached the plane.
    pub fn promote_calls(&self) -> u64 {
        self.promote_calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseControl for InMemoryControlPlane {
    async fn promote(&self, region_id: &str, _instance_id: &str) -> Result<PromoteResponse> {
        let delay = self.promote_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_promote.load(Ordering::SeqCst) {
            return Err(Error::Collaborator("promote refused".to_string()));
        }
        self.promote_calls.fetch_add(1, Ordering::SeqCst);
        self.roles
            .write()
            .unwrap()
            .insert(region_id.to_string(), DbRole::Primary);
        Ok(PromoteResponse {
            new_role: DbRole::Primary,
        })
    }

    async fn demote(&self, region_id: &str, _instance_id: &str) -> Result<()> {
        if self.fail_demote.load(Ordering::SeqCst) {
            return Err(Error::Collaborator("demote refused".to_string()));
        }
        self.roles
            .write()
            .unwrap()
            .insert(region_id.to_string(), DbRole::Replica);
        Ok(())
    }

    async fn query_role(&self, region_id: &str) -> Result<DbRole> {
        Ok(self
            .roles
            .read()
            .unwrap()
            .get(region_id)
            .copied()
            .unwrap_or(DbRole::Replica))
    }
}

#[async_trait]
impl RoutingControl for InMemoryControlPlane {
    async fn repoint(&self, new_primary: &str) -> Result<()> {
        if self.fail_repoint.load(Ordering::SeqCst) {
            return Err(Error::Collaborator("repoint refused".to_string()));
        }
        *self.target.write().unwrap() = Some(new_primary.to_string());
        Ok(())
    }

    async fn current_target(&self) -> Result<String> {
        self.target
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Collaborator("routing target unset".to_string()))
    }
}

/// Notification sink that records what was sent.
pub struct InMemoryNotificationSink {
    sent: Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

impl InMemoryNotificationSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Make deliveries fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Everything delivered so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for InMemoryNotificationSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn notify(&self, notification: Notification) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Collaborator("notification endpoint down".to_string()));
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}
