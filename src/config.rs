//! Controller configuration.
//!
//! Loaded once at startup, validated at construction, immutable during a run.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single region definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Region ID
    pub id: String,
    /// Display name (matched against monitor names on ingestion)
    pub name: String,
    /// Database instance ID in this region
    pub db_instance_id: String,
    /// Is this the initial primary
    #[serde(default)]
    pub is_primary: bool,
}

impl RegionConfig {
    /// Create a new region config.
    pub fn new(id: &str, name: &str, db_instance_id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            db_instance_id: db_instance_id.to_string(),
            is_primary: false,
        }
    }

    /// Mark as initial primary.
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }
}

/// A failover group: one primary plus the standbys that can substitute for it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group name
    pub name: String,
    /// Regions in this group
    pub regions: Vec<RegionConfig>,
    /// Optional candidate priority order (region IDs, highest first).
    /// Without it, more than one eligible standby blocks the failover.
    #[serde(default)]
    pub priority: Option<Vec<String>>,
}

impl GroupConfig {
    /// Create a new group config.
    pub fn new(name: &str, regions: Vec<RegionConfig>) -> Self {
        Self {
            name: name.to_string(),
            regions,
            priority: None,
        }
    }

    /// Set candidate priority order.
    pub fn with_priority(mut self, order: &[&str]) -> Self {
        self.priority = Some(order.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// Debounce thresholds for health signals.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Minimum confirming signals before a verdict
    pub min_signals: u32,
    /// Minimum window duration before a verdict (ms)
    pub min_duration_ms: u64,
    /// Window within which a candidate seen down is still suspect (ms)
    pub unreachable_window_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            min_signals: 3,
            min_duration_ms: 30_000,
            unreachable_window_ms: 120_000,
        }
    }
}

/// Timeouts for the promotion sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromotionConfig {
    /// Timeout for the database promote call (ms)
    pub promote_timeout_ms: u64,
    /// Timeout for the routing repoint call (ms)
    pub repoint_timeout_ms: u64,
    /// Timeout for the rollback demote call (ms)
    pub rollback_timeout_ms: u64,
    /// Window for routing to confirm the new primary (ms)
    pub verification_window_ms: u64,
    /// Poll interval during verification (ms)
    pub verification_poll_ms: u64,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            promote_timeout_ms: 60_000,
            repoint_timeout_ms: 15_000,
            rollback_timeout_ms: 30_000,
            verification_window_ms: 30_000,
            verification_poll_ms: 1_000,
        }
    }
}

/// Top-level controller configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Failover groups
    pub groups: Vec<GroupConfig>,
    /// Debounce thresholds
    #[serde(default)]
    pub debounce: DebounceConfig,
    /// Promotion timeouts
    #[serde(default)]
    pub promotion: PromotionConfig,
}

impl ControllerConfig {
    /// Create a config with default thresholds.
    pub fn new(groups: Vec<GroupConfig>) -> Self {
        Self {
            groups,
            debounce: DebounceConfig::default(),
            promotion: PromotionConfig::default(),
        }
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(Error::Config("at least one failover group required".to_string()));
        }

        if self.debounce.min_signals < 2 {
            return Err(Error::Config(
                "min_signals must be at least 2, a single signal never confirms".to_string(),
            ));
        }

        if self.promotion.verification_poll_ms == 0
            || self.promotion.verification_poll_ms > self.promotion.verification_window_ms
        {
            return Err(Error::Config(
                "verification poll interval must be nonzero and fit the window".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for group in &self.groups {
            if group.regions.len() < 2 {
                return Err(Error::Config(format!(
                    "group {} needs a primary and at least one standby",
                    group.name
                )));
            }

            let primaries = group.regions.iter().filter(|r| r.is_primary).count();
            if primaries != 1 {
                return Err(Error::Config(format!(
                    "group {} must have exactly one primary, found {}",
                    group.name, primaries
                )));
            }

            for region in &group.regions {
                if !seen.insert(region.id.clone()) {
                    return Err(Error::Config(format!("duplicate region id: {}", region.id)));
                }
            }

            if let Some(priority) = &group.priority {
                for id in priority {
                    if !group.regions.iter().any(|r| &r.id == id) {
                        return Err(Error::Config(format!(
                            "priority entry {} is not a region of group {}",
                            id, group.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Find the group containing a region.
    pub fn group_of(&self, region_id: &str) -> Option<&GroupConfig> {
        self.groups
            .iter()
            .find(|g| g.regions.iter().any(|r| r.id == region_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_region_group() -> GroupConfig {
        GroupConfig::new(
            "pg-main",
            vec![
                RegionConfig::new("delhi", "Delhi", "db-del-1").primary(),
                RegionConfig::new("chennai", "Chennai", "db-chn-1"),
            ],
        )
    }

    #[test]
    fn test_valid_config() {
        let config = ControllerConfig::new(vec![two_region_group()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_two_primaries() {
        let group = GroupConfig::new(
            "pg-main",
            vec![
                RegionConfig::new("delhi", "Delhi", "db-1").primary(),
                RegionConfig::new("chennai", "Chennai", "db-2").primary(),
            ],
        );
        let config = ControllerConfig::new(vec![group]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_single_signal_threshold() {
        let mut config = ControllerConfig::new(vec![two_region_group()]);
        config.debounce.min_signals = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_priority_entry() {
        let group = two_region_group().with_priority(&["mumbai"]);
        let config = ControllerConfig::new(vec![group]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_group_of() {
        let config = ControllerConfig::new(vec![two_region_group()]);
        assert_eq!(config.group_of("chennai").unwrap().name, "pg-main");
        assert!(config.group_of("mumbai").is_none());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "groups": [{
                "name": "pg-main",
                "regions": [
                    {"id": "delhi", "name": "Delhi", "db_instance_id": "db-1", "is_primary": true},
                    {"id": "chennai", "name": "Chennai", "db_instance_id": "db-2"}
                ]
            }]
        }"#;
        let config = ControllerConfig::from_json(json).unwrap();
        assert_eq!(config.groups.len(), 1);
        assert_eq!(config.debounce.min_signals, 3);
    }
}
