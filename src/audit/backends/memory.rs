//! In-memory audit store.
//!
//! Default store for tests and single-process runs. Entries are lost on
//! restart; use the JSONL store when recovery matters.

use crate::audit::entry::AuditEntry;
use crate::audit::filter::AuditFilter;
use crate::audit::store::AuditStore;
use crate::core::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Vec-backed audit store.
pub struct MemoryStore {
    entries: RwLock<Vec<AuditEntry>>,
    fail_appends: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            fail_appends: AtomicBool::new(false),
        }
    }

    /// Make appends fail, to exercise durability handling.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(Error::Durability("append rejected".to_string()));
        }
        self.entries.write().unwrap().push(entry.clone());
        Ok(())
    }

    async fn read(&self, seq: u64) -> Result<Option<AuditEntry>> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .iter()
            .find(|e| e.seq == seq)
            .cloned())
    }

    async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.read().unwrap();
        let mut results: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn all(&self) -> Result<Vec<AuditEntry>> {
        Ok(self.entries.read().unwrap().clone())
    }

    async fn len(&self) -> Result<u64> {
        Ok(self.entries.read().unwrap().len() as u64)
    }
}
