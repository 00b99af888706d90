//! Query filters for audit entries.

use crate::audit::entry::{AuditEntry, AuditKind};
use crate::core::Timestamp;
use serde::{Deserialize, Serialize};

/// Filter for querying audit entries.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Filter by group
    pub group: Option<String>,
    /// Filter by (failed, candidate) pair
    pub pair: Option<(String, String)>,
    /// Only entries at or after this time
    pub since: Option<Timestamp>,
    /// Only attempt entries
    pub attempts_only: bool,
    /// Maximum results
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by group.
    pub fn by_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    /// Filter by (failed, candidate) pair.
    pub fn by_pair(mut self, failed: &str, candidate: &str) -> Self {
        self.pair = Some((failed.to_string(), candidate.to_string()));
        self
    }

    /// Only entries at or after `since`.
    pub fn since(mut self, since: Timestamp) -> Self {
        self.since = Some(since);
        self
    }

    /// Only attempt entries.
    pub fn attempts_only(mut self) -> Self {
        self.attempts_only = true;
        self
    }

    /// Set result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if an entry matches this filter.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(group) = &self.group {
            if &entry.group != group {
                return false;
            }
        }

        if let Some((failed, candidate)) = &self.pair {
            match entry.kind.pair() {
                Some((f, c)) if f == failed && c == candidate => {}
                _ => return false,
            }
        }

        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }

        if self.attempts_only && !matches!(entry.kind, AuditKind::Attempt { .. }) {
            return false;
        }

        true
    }
}
