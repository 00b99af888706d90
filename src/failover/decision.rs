//! Failover decisions.
//!
//! A decision pairs a failed region with a candidate and is immutable once
//! recorded; the audit log keeps every one, including rejections.

use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the state machine decided for a (failed, candidate) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionKind {
    /// Proceed with promotion
    Promote,
    /// Rejected, no state mutation
    Reject,
    /// Deferred, requires operator action
    Defer,
}

/// A recorded failover decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailoverDecision {
    /// Decision ID
    pub id: Uuid,
    /// Failover group
    pub group: String,
    /// Region that failed
    pub failed_region: String,
    /// Candidate for promotion
    pub candidate_region: String,
    /// The decision
    pub kind: DecisionKind,
    /// Reason code
    pub reason: String,
    /// When the decision was made
    pub timestamp: Timestamp,
}

impl FailoverDecision {
    /// Record a promote decision.
    pub fn promote(group: &str, failed: &str, candidate: &str, reason: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            group: group.to_string(),
            failed_region: failed.to_string(),
            candidate_region: candidate.to_string(),
            kind: DecisionKind::Promote,
            reason: reason.to_string(),
            timestamp: now(),
        }
    }

    /// Record a rejection.
    pub fn reject(group: &str, failed: &str, candidate: &str, reason: &str) -> Self {
        Self {
            kind: DecisionKind::Reject,
            ..Self::promote(group, failed, candidate, reason)
        }
    }

    /// Record a deferral requiring operator action.
    pub fn defer(group: &str, failed: &str, candidate: &str, reason: &str) -> Self {
        Self {
            kind: DecisionKind::Defer,
            ..Self::promote(group, failed, candidate, reason)
        }
    }

    /// The (failed, candidate) pair this decision is about.
    pub fn pair(&self) -> (&str, &str) {
        (&self.failed_region, &self.candidate_region)
    }
}
