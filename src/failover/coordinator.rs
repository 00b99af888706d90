//! Promotion coordinator.
//!
//! Drives one promotion attempt against the database and routing control
//! planes: role query, promote, repoint, verification, and rollback on
//! failure. Every collaborator response is captured on the attempt record.

use crate::config::PromotionConfig;
use crate::control::plane::{DatabaseControl, DbRole, RoutingControl};
use crate::core::{now, Error, Result, Timestamp};
use crate::failover::decision::FailoverDecision;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Status of a promotion attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStatus {
    /// Created, promote not yet issued
    Pending,
    /// Promote issued, outcome unknown
    InProgress,
    /// Promotion committed and verified
    Succeeded,
    /// Failed and rollback also failed (or was impossible)
    Failed,
    /// Failed, candidate demoted back to standby
    RolledBack,
}

impl AttemptStatus {
    /// Still counts against the at-most-one-in-flight guard.
    pub fn in_flight(&self) -> bool {
        matches!(self, AttemptStatus::Pending | AttemptStatus::InProgress)
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptStatus::Pending => write!(f, "pending"),
            AttemptStatus::InProgress => write!(f, "in_progress"),
            AttemptStatus::Succeeded => write!(f, "succeeded"),
            AttemptStatus::Failed => write!(f, "failed"),
            AttemptStatus::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// One collaborator call made during an attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollaboratorResponse {
    /// Step name (query_role, promote, repoint, verify, demote)
    pub step: String,
    /// Whether the call succeeded
    pub success: bool,
    /// Response or error detail
    pub detail: String,
    /// Reason code on failure
    pub reason: Option<String>,
    /// When the response arrived
    pub timestamp: Timestamp,
}

/// A promotion attempt for one decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromotionAttempt {
    /// Attempt ID
    pub id: Uuid,
    /// Decision that triggered this attempt
    pub decision_id: Uuid,
    /// Failover group
    pub group: String,
    /// Region that failed
    pub failed_region: String,
    /// Candidate being promoted
    pub candidate_region: String,
    /// Current status
    pub status: AttemptStatus,
    /// When the attempt started
    pub started_at: Timestamp,
    /// When the attempt reached a terminal status
    pub completed_at: Option<Timestamp>,
    /// Collaborator responses in call order
    pub responses: Vec<CollaboratorResponse>,
}

impl PromotionAttempt {
    /// Create a pending attempt for a decision.
    pub fn new(decision: &FailoverDecision) -> Self {
        Self {
            id: Uuid::new_v4(),
            decision_id: decision.id,
            group: decision.group.clone(),
            failed_region: decision.failed_region.clone(),
            candidate_region: decision.candidate_region.clone(),
            status: AttemptStatus::Pending,
            started_at: now(),
            completed_at: None,
            responses: Vec::new(),
        }
    }

    /// Record a successful collaborator response.
    pub fn record(&mut self, step: &str, success: bool, detail: &str) {
        self.responses.push(CollaboratorResponse {
            step: step.to_string(),
            success,
            detail: detail.to_string(),
            reason: None,
            timestamp: now(),
        });
    }

    /// Record a failed collaborator call with its reason code.
    pub fn record_failure(&mut self, step: &str, err: &Error) {
        self.responses.push(CollaboratorResponse {
            step: step.to_string(),
            success: false,
            detail: err.to_string(),
            reason: Some(err.reason_code().to_string()),
            timestamp: now(),
        });
    }

    /// Last recorded failure detail, if any.
    pub fn failure_detail(&self) -> Option<&str> {
        self.responses
            .iter()
            .rev()
            .find(|r| !r.success)
            .map(|r| r.detail.as_str())
    }

    /// Reason code of the first failing step, if any.
    ///
    /// The first failure is what triggered rollback; later failures (for
    /// example a failed demote) escalate but do not replace the cause.
    pub fn failure_reason(&self) -> Option<&str> {
        self.responses
            .iter()
            .find(|r| !r.success)
            .and_then(|r| r.reason.as_deref())
    }

    fn complete(&mut self, status: AttemptStatus) {
        self.status = status;
        self.completed_at = Some(now());
    }
}

/// Executes promotion sequences with bounded timeouts and rollback.
pub struct PromotionCoordinator {
    db: Arc<dyn DatabaseControl>,
    routing: Arc<dyn RoutingControl>,
    config: PromotionConfig,
}

impl PromotionCoordinator {
    /// Create a coordinator over concrete control planes.
    pub fn new(
        db: Arc<dyn DatabaseControl>,
        routing: Arc<dyn RoutingControl>,
        config: PromotionConfig,
    ) -> Self {
        Self {
            db,
            routing,
            config,
        }
    }

    /// Execute a pending attempt. Always returns a terminal attempt.
    ///
    /// The caller records the pending attempt durably before handing it over.
    /// Once the promote call has been issued the sequence runs to completion;
    /// there is no safe abort mid-promotion.
    pub async fn execute(&self, mut attempt: PromotionAttempt, instance_id: &str) -> PromotionAttempt {
        let candidate = attempt.candidate_region.clone();
        info!(
            attempt = %attempt.id,
            candidate = %candidate,
            failed = %attempt.failed_region,
            "starting promotion"
        );

        // Promote is only issued when the instance is not already primary, so
        // re-executing against a promoted candidate is a no-op success.
        let role = match self
            .bounded(self.config.promote_timeout_ms, self.db.query_role(&candidate))
            .await
        {
            Ok(role) => {
                attempt.record("query_role", true, &role.to_string());
                role
            }
            Err(err) => {
                attempt.record_failure("query_role", &err);
                attempt.complete(AttemptStatus::Failed);
                return attempt;
            }
        };

        if role == DbRole::Primary {
            attempt.record("promote", true, "already primary, skipped");
        } else {
            attempt.status = AttemptStatus::InProgress;
            match self
                .bounded(
                    self.config.promote_timeout_ms,
                    self.db.promote(&candidate, instance_id),
                )
                .await
            {
                Ok(response) => {
                    attempt.record("promote", true, &format!("new_role={}", response.new_role));
                }
                Err(err) => {
                    attempt.record_failure("promote", &err);
                    return self.rollback(attempt, instance_id).await;
                }
            }
        }

        match self
            .bounded(self.config.repoint_timeout_ms, self.routing.repoint(&candidate))
            .await
        {
            Ok(()) => attempt.record("repoint", true, &candidate),
            Err(err) => {
                attempt.record_failure("repoint", &err);
                return self.rollback(attempt, instance_id).await;
            }
        }

        match self.verify_target(&candidate).await {
            Ok(()) => attempt.record("verify", true, "routing serves new primary"),
            Err(err) => {
                attempt.record_failure("verify", &err);
                return self.rollback(attempt, instance_id).await;
            }
        }

        attempt.complete(AttemptStatus::Succeeded);
        info!(attempt = %attempt.id, candidate = %candidate, "promotion succeeded");
        attempt
    }

    /// Poll routing until it reports the candidate, bounded by the
    /// verification window.
    async fn verify_target(&self, candidate: &str) -> Result<()> {
        let deadline = tokio::time::Instant::now()
            + Duration::from_millis(self.config.verification_window_ms);
        loop {
            if let Ok(target) = self.routing.current_target().await {
                if target == candidate {
                    return Ok(());
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::CollaboratorTimeout(self.config.verification_window_ms));
            }
            tokio::time::sleep(Duration::from_millis(self.config.verification_poll_ms)).await;
        }
    }

    /// Demote the candidate back to replica. The old primary's role is left
    /// untouched. A rollback failure leaves the attempt `Failed` for manual
    /// intervention.
    async fn rollback(&self, mut attempt: PromotionAttempt, instance_id: &str) -> PromotionAttempt {
        warn!(attempt = %attempt.id, candidate = %attempt.candidate_region, "rolling back promotion");
        let candidate = attempt.candidate_region.clone();
        match self
            .bounded(
                self.config.rollback_timeout_ms,
                self.db.demote(&candidate, instance_id),
            )
            .await
        {
            Ok(()) => {
                attempt.record("demote", true, "candidate demoted to replica");
                attempt.complete(AttemptStatus::RolledBack);
            }
            Err(err) => {
                attempt.record_failure("demote", &err);
                attempt.complete(AttemptStatus::Failed);
            }
        }
        attempt
    }

    async fn bounded<T>(&self, timeout_ms: u64, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::CollaboratorTimeout(timeout_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::memory::InMemoryControlPlane;

    fn config() -> PromotionConfig {
        PromotionConfig {
            promote_timeout_ms: 100,
            repoint_timeout_ms: 100,
            rollback_timeout_ms: 100,
            verification_window_ms: 200,
            verification_poll_ms: 10,
        }
    }

    fn coordinator(plane: &Arc<InMemoryControlPlane>) -> PromotionCoordinator {
        PromotionCoordinator::new(plane.clone(), plane.clone(), config())
    }

    fn decision() -> FailoverDecision {
        FailoverDecision::promote("pg-main", "delhi", "chennai", "primary_down")
    }

    #[tokio::test]
    async fn test_happy_path_succeeds() {
        let plane = Arc::new(InMemoryControlPlane::with_primary("delhi"));
        let attempt = coordinator(&plane).execute(PromotionAttempt::new(&decision()), "db-2").await;

        assert_eq!(attempt.status, AttemptStatus::Succeeded);
        assert!(attempt.completed_at.is_some());
        assert_eq!(plane.current_target().await.unwrap(), "chennai");
        assert_eq!(plane.query_role("chennai").await.unwrap(), DbRole::Primary);
    }

    #[tokio::test]
    async fn test_promote_timeout_rolls_back() {
        let plane = Arc::new(InMemoryControlPlane::with_primary("delhi"));
        plane.set_promote_delay(Duration::from_millis(500));

        let attempt = coordinator(&plane).execute(PromotionAttempt::new(&decision()), "db-2").await;
        assert_eq!(attempt.status, AttemptStatus::RolledBack);
        assert!(attempt.failure_detail().unwrap().contains("timed out"));
        // Routing was never repointed.
        assert_eq!(plane.current_target().await.unwrap(), "delhi");
    }

    #[tokio::test]
    async fn test_repoint_failure_rolls_back() {
        let plane = Arc::new(InMemoryControlPlane::with_primary("delhi"));
        plane.set_fail_repoint(true);

        let attempt = coordinator(&plane).execute(PromotionAttempt::new(&decision()), "db-2").await;
        assert_eq!(attempt.status, AttemptStatus::RolledBack);
        // Rollback demoted the candidate again.
        assert_eq!(plane.query_role("chennai").await.unwrap(), DbRole::Replica);
    }

    #[tokio::test]
    async fn test_rollback_failure_is_terminal_failed() {
        let plane = Arc::new(InMemoryControlPlane::with_primary("delhi"));
        plane.set_fail_repoint(true);
        plane.set_fail_demote(true);

        let attempt = coordinator(&plane).execute(PromotionAttempt::new(&decision()), "db-2").await;
        assert_eq!(attempt.status, AttemptStatus::Failed);
    }

    #[tokio::test]
    async fn test_already_promoted_candidate_skips_promote() {
        let plane = Arc::new(InMemoryControlPlane::with_primary("delhi"));
        plane.set_role("chennai", DbRole::Primary);

        let attempt = coordinator(&plane).execute(PromotionAttempt::new(&decision()), "db-2").await;
        assert_eq!(attempt.status, AttemptStatus::Succeeded);
        // The promote call never reached the control plane.
        assert_eq!(plane.promote_calls(), 0);
        let promote = attempt.responses.iter().find(|r| r.step == "promote").unwrap();
        assert!(promote.detail.contains("skipped"));
    }

    #[tokio::test]
    async fn test_attempt_status_in_flight() {
        assert!(AttemptStatus::Pending.in_flight());
        assert!(AttemptStatus::InProgress.in_flight());
        assert!(!AttemptStatus::Succeeded.in_flight());
        assert!(!AttemptStatus::RolledBack.in_flight());
    }
}
