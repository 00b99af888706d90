//! Audit entry structure.
//!
//! Every verdict, decision, transition, and attempt outcome becomes one
//! entry. Entries are hash-chained so truncation or tampering of the backing
//! store is detectable.

use crate::core::{now, Hash256, Timestamp};
use crate::failover::coordinator::AttemptStatus;
use crate::failover::decision::FailoverDecision;
use crate::failover::state_machine::GroupState;
use crate::region::RegionRole;
use crate::signal::SignalDirection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// What an audit entry records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuditKind {
    /// The debouncer confirmed a stable verdict
    Verdict {
        /// Region the verdict refers to
        region_id: String,
        /// Confirmed direction
        direction: SignalDirection,
    },
    /// A failover decision was recorded
    Decision {
        /// The decision
        decision: FailoverDecision,
    },
    /// A promotion attempt changed status
    Attempt {
        /// Attempt ID
        attempt_id: Uuid,
        /// Decision that triggered it
        decision_id: Uuid,
        /// Failed region
        failed_region: String,
        /// Candidate region
        candidate_region: String,
        /// New status
        status: AttemptStatus,
        /// Failure detail, if any
        detail: Option<String>,
    },
    /// A committed group state transition
    Transition {
        /// State before
        from: GroupState,
        /// State after
        to: GroupState,
        /// Region roles after the transition
        roles: HashMap<String, RegionRole>,
    },
    /// An old primary recovered; failback left to the operator
    FailbackAdvisory {
        /// Recovered region
        recovered: String,
        /// Region currently serving as primary
        current_primary: String,
    },
}

impl AuditKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            AuditKind::Verdict { .. } => "verdict",
            AuditKind::Decision { .. } => "decision",
            AuditKind::Attempt { .. } => "attempt",
            AuditKind::Transition { .. } => "transition",
            AuditKind::FailbackAdvisory { .. } => "failback_advisory",
        }
    }

    /// The (failed, candidate) pair this entry is about, if any.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self {
            AuditKind::Decision { decision } => Some(decision.pair()),
            AuditKind::Attempt {
                failed_region,
                candidate_region,
                ..
            } => Some((failed_region, candidate_region)),
            _ => None,
        }
    }
}

/// One entry in the append-only audit log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic sequence number, starts at 1
    pub seq: u64,
    /// When the entry was appended
    pub timestamp: Timestamp,
    /// Failover group
    pub group: String,
    /// Recorded event
    pub kind: AuditKind,
    /// Hash of the previous entry (zero for the first)
    pub parent_hash: Hash256,
    /// Content hash of this entry
    pub hash: Hash256,
}

impl AuditEntry {
    /// Create a new entry chained to `parent_hash`.
    pub fn new(seq: u64, group: &str, kind: AuditKind, parent_hash: Hash256) -> Self {
        let timestamp = now();
        let hash = Self::content_hash(seq, timestamp, group, &kind, &parent_hash);
        Self {
            seq,
            timestamp,
            group: group.to_string(),
            kind,
            parent_hash,
            hash,
        }
    }

    fn content_hash(
        seq: u64,
        timestamp: Timestamp,
        group: &str,
        kind: &AuditKind,
        parent_hash: &Hash256,
    ) -> Hash256 {
        let kind_bytes = serde_json::to_vec(kind).unwrap_or_default();
        let ts = timestamp.timestamp_micros().to_be_bytes();
        Hash256::digest(&[
            &seq.to_be_bytes(),
            &ts,
            group.as_bytes(),
            &kind_bytes,
            parent_hash.as_bytes(),
        ])
    }

    /// Verify this entry against its expected parent hash.
    pub fn verify(&self, parent_hash: &Hash256) -> bool {
        self.parent_hash == *parent_hash
            && self.hash
                == Self::content_hash(
                    self.seq,
                    self.timestamp,
                    &self.group,
                    &self.kind,
                    &self.parent_hash,
                )
    }

    /// Serialize to a JSON line.
    pub fn to_json(&self) -> crate::core::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from a JSON line.
    pub fn from_json(json: &str) -> crate::core::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict_entry(seq: u64, parent: Hash256) -> AuditEntry {
        AuditEntry::new(
            seq,
            "pg-main",
            AuditKind::Verdict {
                region_id: "delhi".to_string(),
                direction: SignalDirection::Down,
            },
            parent,
        )
    }

    #[test]
    fn test_entry_hash_chains() {
        let first = verdict_entry(1, Hash256::zero());
        let second = verdict_entry(2, first.hash.clone());

        assert!(first.verify(&Hash256::zero()));
        assert!(second.verify(&first.hash));
        assert!(!second.verify(&Hash256::zero()));
    }

    #[test]
    fn test_tampered_entry_fails_verification() {
        let mut entry = verdict_entry(1, Hash256::zero());
        entry.group = "other-group".to_string();
        assert!(!entry.verify(&Hash256::zero()));
    }

    #[test]
    fn test_pair_extraction() {
        let kind = AuditKind::Attempt {
            attempt_id: Uuid::new_v4(),
            decision_id: Uuid::new_v4(),
            failed_region: "delhi".to_string(),
            candidate_region: "chennai".to_string(),
            status: AttemptStatus::Pending,
            detail: None,
        };
        assert_eq!(kind.pair(), Some(("delhi", "chennai")));

        let kind = AuditKind::FailbackAdvisory {
            recovered: "delhi".to_string(),
            current_primary: "chennai".to_string(),
        };
        assert_eq!(kind.pair(), None);
    }

    #[test]
    fn test_json_roundtrip() {
        let entry = verdict_entry(1, Hash256::zero());
        let json = entry.to_json().unwrap();
        let parsed = AuditEntry::from_json(&json).unwrap();
        assert_eq!(parsed, entry);
        assert!(parsed.verify(&Hash256::zero()));
    }
}
