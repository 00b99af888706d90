//! Region registry for a failover group.
//!
//! Tracks region roles and last-known health. Roles are mutated only through
//! guarded transitions so a promoting region can never slide back to standby
//! without an explicit rollback record.

use crate::config::GroupConfig;
use crate::core::{Error, Result, Timestamp};
use crate::signal::SignalDirection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role of a region within its failover group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionRole {
    /// Serving as primary
    Primary,
    /// Standby, eligible for promotion
    Standby,
    /// Promotion in progress
    Promoting,
    /// Confirmed unreachable
    Unreachable,
}

impl std::fmt::Display for RegionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionRole::Primary => write!(f, "primary"),
            RegionRole::Standby => write!(f, "standby"),
            RegionRole::Promoting => write!(f, "promoting"),
            RegionRole::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// A region record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    /// Region ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Database instance in this region
    pub db_instance_id: String,
    /// Current role
    pub role: RegionRole,
    /// Last confirmed health direction
    pub health: Option<SignalDirection>,
    /// When health was last confirmed
    pub last_health_at: Option<Timestamp>,
    /// When the region was last confirmed down
    pub last_down_at: Option<Timestamp>,
}

impl Region {
    /// Confirmed healthy.
    pub fn is_up(&self) -> bool {
        self.health == Some(SignalDirection::Up)
    }

    /// Was this region confirmed down within the given window before `at`?
    pub fn recently_down(&self, window_ms: u64, at: Timestamp) -> bool {
        match self.last_down_at {
            Some(down_at) => (at - down_at).num_milliseconds() <= window_ms as i64,
            None => false,
        }
    }
}

/// Registry of the regions in one failover group.
#[derive(Clone, Debug)]
pub struct RegionRegistry {
    regions: HashMap<String, Region>,
    /// Configured order, used for deterministic listing
    order: Vec<String>,
}

impl RegionRegistry {
    /// Build from a validated group config.
    pub fn from_group(group: &GroupConfig) -> Self {
        let mut regions = HashMap::new();
        let mut order = Vec::new();
        for rc in &group.regions {
            order.push(rc.id.clone());
            regions.insert(
                rc.id.clone(),
                Region {
                    id: rc.id.clone(),
                    name: rc.name.clone(),
                    db_instance_id: rc.db_instance_id.clone(),
                    role: if rc.is_primary {
                        RegionRole::Primary
                    } else {
                        RegionRole::Standby
                    },
                    health: None,
                    last_health_at: None,
                    last_down_at: None,
                },
            );
        }
        Self { regions, order }
    }

    /// Get a region.
    pub fn get(&self, region_id: &str) -> Result<&Region> {
        self.regions
            .get(region_id)
            .ok_or_else(|| Error::UnknownRegion(region_id.to_string()))
    }

    /// The current primary, if one is committed.
    pub fn primary(&self) -> Option<&Region> {
        self.iter().find(|r| r.role == RegionRole::Primary)
    }

    /// Regions in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.order.iter().filter_map(|id| self.regions.get(id))
    }

    /// Record a confirmed health verdict for a region.
    pub fn record_health(
        &mut self,
        region_id: &str,
        direction: SignalDirection,
        at: Timestamp,
    ) -> Result<()> {
        let region = self
            .regions
            .get_mut(region_id)
            .ok_or_else(|| Error::UnknownRegion(region_id.to_string()))?;
        region.health = Some(direction);
        region.last_health_at = Some(at);
        if direction == SignalDirection::Down {
            region.last_down_at = Some(at);
        }
        Ok(())
    }

    /// Apply a guarded role transition.
    ///
    /// `Promoting -> Standby` is rejected here; that path exists only as
    /// [`RegionRegistry::rollback_to_standby`].
    pub fn transition(&mut self, region_id: &str, to: RegionRole) -> Result<()> {
        let region = self
            .regions
            .get_mut(region_id)
            .ok_or_else(|| Error::UnknownRegion(region_id.to_string()))?;

        let allowed = matches!(
            (region.role, to),
            (RegionRole::Standby, RegionRole::Promoting)
                | (RegionRole::Promoting, RegionRole::Primary)
                | (RegionRole::Primary, RegionRole::Unreachable)
                | (RegionRole::Primary, RegionRole::Standby)
                | (RegionRole::Standby, RegionRole::Unreachable)
                | (RegionRole::Unreachable, RegionRole::Standby)
        );
        if !allowed {
            return Err(Error::InvalidTransition(format!(
                "{}: {} -> {}",
                region_id, region.role, to
            )));
        }

        region.role = to;
        Ok(())
    }

    /// Demote a promoting region back to standby after a recorded rollback.
    pub fn rollback_to_standby(&mut self, region_id: &str) -> Result<()> {
        let region = self
            .regions
            .get_mut(region_id)
            .ok_or_else(|| Error::UnknownRegion(region_id.to_string()))?;
        if region.role != RegionRole::Promoting {
            return Err(Error::InvalidTransition(format!(
                "{}: rollback from {}",
                region_id, region.role
            )));
        }
        region.role = RegionRole::Standby;
        Ok(())
    }

    /// Standbys eligible to replace `failed_id`: confirmed up and not seen
    /// down within the unreachable window (split-brain guard).
    pub fn eligible_candidates(
        &self,
        failed_id: &str,
        unreachable_window_ms: u64,
        at: Timestamp,
    ) -> Vec<&Region> {
        self.iter()
            .filter(|r| {
                r.id != failed_id
                    && r.role == RegionRole::Standby
                    && r.is_up()
                    && !r.recently_down(unreachable_window_ms, at)
            })
            .collect()
    }

    /// Verify the single-primary invariant.
    pub fn assert_single_primary(&self) -> Result<()> {
        let count = self
            .regions
            .values()
            .filter(|r| r.role == RegionRole::Primary)
            .count();
        if count != 1 {
            return Err(Error::InvalidTransition(format!(
                "{} regions hold primary",
                count
            )));
        }
        Ok(())
    }

    /// Snapshot of all roles, recorded with committed transitions.
    pub fn roles(&self) -> HashMap<String, RegionRole> {
        self.regions
            .iter()
            .map(|(id, r)| (id.clone(), r.role))
            .collect()
    }

    /// Restore roles from a committed snapshot (log replay).
    pub fn restore_roles(&mut self, roles: &HashMap<String, RegionRole>) {
        for (id, role) in roles {
            if let Some(region) = self.regions.get_mut(id) {
                region.role = *role;
            }
        }
    }
}
