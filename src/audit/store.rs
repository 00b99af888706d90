//! AuditStore trait definition.
//!
//! The persistent store is a collaborator; the log only defines the
//! read/append contract. An append must be durable when it returns.

use crate::audit::entry::AuditEntry;
use crate::audit::filter::AuditFilter;
use crate::core::Result;
use async_trait::async_trait;

/// Append-only storage for audit entries.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an entry. Must not return until the entry is durable.
    async fn append(&self, entry: &AuditEntry) -> Result<()>;

    /// Read an entry by sequence number.
    async fn read(&self, seq: u64) -> Result<Option<AuditEntry>>;

    /// Query entries matching a filter, in sequence order.
    async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>>;

    /// All entries in sequence order (replay).
    async fn all(&self) -> Result<Vec<AuditEntry>>;

    /// Number of entries.
    async fn len(&self) -> Result<u64> {
        Ok(self.all().await?.len() as u64)
    }
}
