//! Control-plane collaborator traits.
//!
//! The database and routing control planes are external systems; the
//! coordinator only ever talks to them through these traits. Supplying
//! adapters is mandatory at construction, there are no silent no-op defaults.

use crate::core::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role reported by the database control plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DbRole {
    /// Instance accepts writes
    Primary,
    /// Read replica
    Replica,
}

impl std::fmt::Display for DbRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbRole::Primary => write!(f, "primary"),
            DbRole::Replica => write!(f, "replica"),
        }
    }
}

/// Response to a promote call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoteResponse {
    /// Role the instance holds after the call
    pub new_role: DbRole,
}

/// Database control plane: promotes and demotes instances.
///
/// `query_role` must be cheap; the coordinator queries before promoting so a
/// repeated promote on an already-promoted instance is a no-op success.
#[async_trait]
pub trait DatabaseControl: Send + Sync {
    /// Promote the replica in `region_id` to primary.
    async fn promote(&self, region_id: &str, instance_id: &str) -> Result<PromoteResponse>;

    /// Demote the instance in `region_id` back to replica (rollback path).
    async fn demote(&self, region_id: &str, instance_id: &str) -> Result<()>;

    /// Current role of the instance in `region_id`.
    async fn query_role(&self, region_id: &str) -> Result<DbRole>;
}

/// Routing control plane: points traffic at the primary.
#[async_trait]
pub trait RoutingControl: Send + Sync {
    /// Repoint routing at a new primary region.
    async fn repoint(&self, new_primary: &str) -> Result<()>;

    /// Region routing currently targets.
    async fn current_target(&self) -> Result<String>;
}
