//! The append-only audit log.
//!
//! Allocates sequence numbers, chains hashes, and answers the duplicate
//! guard query for the state machine. Appends go through the store before
//! any transition is considered committed.

use crate::audit::entry::{AuditEntry, AuditKind};
use crate::audit::filter::AuditFilter;
use crate::audit::store::AuditStore;
use crate::core::{Error, Hash256, Result, Timestamp};
use crate::failover::coordinator::AttemptStatus;
use crate::failover::decision::DecisionKind;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Chain head: next sequence number and the hash to chain from.
#[derive(Debug)]
struct Head {
    next_seq: u64,
    parent_hash: Hash256,
}

/// Append-only, hash-chained audit log over a pluggable store.
pub struct AuditLog {
    store: Arc<dyn AuditStore>,
    head: Mutex<Head>,
}

impl AuditLog {
    /// Open a log over a store, resuming the chain from its last entry.
    pub async fn open(store: Arc<dyn AuditStore>) -> Result<Self> {
        let entries = store.all().await?;
        let head = match entries.last() {
            Some(last) => Head {
                next_seq: last.seq + 1,
                parent_hash: last.hash.clone(),
            },
            None => Head {
                next_seq: 1,
                parent_hash: Hash256::zero(),
            },
        };
        Ok(Self {
            store,
            head: Mutex::new(head),
        })
    }

    /// Append an entry. Returns only after the store reports it durable.
    pub async fn record(&self, group: &str, kind: AuditKind) -> Result<AuditEntry> {
        let mut head = self.head.lock().await;
        let entry = AuditEntry::new(head.next_seq, group, kind, head.parent_hash.clone());
        self.store
            .append(&entry)
            .await
            .map_err(|e| Error::Durability(e.to_string()))?;
        head.next_seq += 1;
        head.parent_hash = entry.hash.clone();
        Ok(entry)
    }

    /// (failed, candidate) pairs with a pending or in-progress attempt.
    pub async fn in_flight_pairs(&self, group: &str) -> Result<HashSet<(String, String)>> {
        let attempts = self
            .store
            .query(&AuditFilter::new().by_group(group).attempts_only())
            .await?;

        // Last recorded status wins per attempt.
        let mut latest: HashMap<Uuid, (String, String, AttemptStatus)> = HashMap::new();
        for entry in attempts {
            if let AuditKind::Attempt {
                attempt_id,
                failed_region,
                candidate_region,
                status,
                ..
            } = entry.kind
            {
                latest.insert(attempt_id, (failed_region, candidate_region, status));
            }
        }

        Ok(latest
            .into_values()
            .filter(|(_, _, status)| status.in_flight())
            .map(|(failed, candidate, _)| (failed, candidate))
            .collect())
    }

    /// Is there an in-flight or completed promotion for this pair since `since`?
    pub async fn has_promotion_for_pair(
        &self,
        group: &str,
        failed: &str,
        candidate: &str,
        since: Option<Timestamp>,
    ) -> Result<bool> {
        let mut filter = AuditFilter::new().by_group(group).by_pair(failed, candidate);
        if let Some(since) = since {
            filter = filter.since(since);
        }
        let entries = self.store.query(&filter).await?;
        Ok(entries.iter().any(|e| match &e.kind {
            AuditKind::Attempt { status, .. } => {
                status.in_flight() || *status == AttemptStatus::Succeeded
            }
            AuditKind::Decision { decision } => decision.kind == DecisionKind::Promote,
            _ => false,
        }))
    }

    /// All entries in sequence order.
    pub async fn entries(&self) -> Result<Vec<AuditEntry>> {
        self.store.all().await
    }

    /// Query entries.
    pub async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>> {
        self.store.query(filter).await
    }

    /// Number of entries.
    pub async fn len(&self) -> Result<u64> {
        self.store.len().await
    }

    /// Walk the chain and verify every hash link.
    pub async fn verify_chain(&self) -> Result<bool> {
        let entries = self.store.all().await?;
        let mut parent = Hash256::zero();
        let mut expected_seq = 1;
        for entry in &entries {
            if entry.seq != expected_seq || !entry.verify(&parent) {
                return Ok(false);
            }
            parent = entry.hash.clone();
            expected_seq += 1;
        }
        Ok(true)
    }
}
