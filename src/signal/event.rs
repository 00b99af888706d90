//! Health signal events and stable verdicts.

use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};

/// Direction of a raw health signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    /// Region reported reachable
    Up,
    /// Region reported unreachable
    Down,
}

impl std::fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalDirection::Up => write!(f, "up"),
            SignalDirection::Down => write!(f, "down"),
        }
    }
}

/// A raw health-check event as delivered by an external monitor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthSignal {
    /// Region the signal refers to
    pub region_id: String,
    /// Signal direction
    pub direction: SignalDirection,
    /// Source timestamp
    pub timestamp: Timestamp,
    /// Raw payload reference from the monitor
    pub payload: Option<serde_json::Value>,
}

impl HealthSignal {
    /// Create a new signal stamped now.
    pub fn new(region_id: &str, direction: SignalDirection) -> Self {
        Self {
            region_id: region_id.to_string(),
            direction,
            timestamp: now(),
            payload: None,
        }
    }

    /// Set the source timestamp.
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach the raw monitor payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// A stable verdict, emitted only once a debounce window fills.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    /// Region confirmed down
    RegionDownConfirmed {
        /// Region ID
        region_id: String,
        /// Confirming signals observed
        signal_count: u32,
        /// Timestamp of the confirming signal
        confirmed_at: Timestamp,
    },
    /// Region confirmed up
    RegionUpConfirmed {
        /// Region ID
        region_id: String,
        /// Confirming signals observed
        signal_count: u32,
        /// Timestamp of the confirming signal
        confirmed_at: Timestamp,
    },
}

impl Verdict {
    /// Region this verdict refers to.
    pub fn region_id(&self) -> &str {
        match self {
            Verdict::RegionDownConfirmed { region_id, .. } => region_id,
            Verdict::RegionUpConfirmed { region_id, .. } => region_id,
        }
    }

    /// Direction the verdict confirms.
    pub fn direction(&self) -> SignalDirection {
        match self {
            Verdict::RegionDownConfirmed { .. } => SignalDirection::Down,
            Verdict::RegionUpConfirmed { .. } => SignalDirection::Up,
        }
    }

    /// Timestamp of the confirming signal.
    pub fn confirmed_at(&self) -> Timestamp {
        match self {
            Verdict::RegionDownConfirmed { confirmed_at, .. } => *confirmed_at,
            Verdict::RegionUpConfirmed { confirmed_at, .. } => *confirmed_at,
        }
    }
}
