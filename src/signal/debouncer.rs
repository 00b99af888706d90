//! Signal debouncing.
//!
//! Aggregates noisy health events into stable verdicts. A verdict is only
//! emitted once enough confirming signals have accumulated over a minimum
//! duration; a contradicting signal resets the window.

use crate::config::DebounceConfig;
use crate::core::Timestamp;
use crate::signal::event::{HealthSignal, SignalDirection, Verdict};
use std::collections::HashMap;

/// An open per-region window of same-direction signals.
#[derive(Clone, Debug)]
struct Window {
    direction: SignalDirection,
    count: u32,
    first_at: Timestamp,
}

/// Debounces raw health signals into stable verdicts.
pub struct SignalDebouncer {
    config: DebounceConfig,
    /// Open windows per region
    windows: HashMap<String, Window>,
    /// Last confirmed direction per region
    stable: HashMap<String, SignalDirection>,
}

impl SignalDebouncer {
    /// Create a new debouncer.
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            windows: HashMap::new(),
            stable: HashMap::new(),
        }
    }

    /// Observe a raw signal. Returns a verdict once the window fills.
    ///
    /// Signals confirming the current stable state close any open window and
    /// emit nothing.
    pub fn observe(&mut self, signal: &HealthSignal) -> Option<Verdict> {
        let region = signal.region_id.as_str();

        // Re-confirmation of the stable state: discard any contradicting window.
        if self.stable.get(region) == Some(&signal.direction) {
            self.windows.remove(region);
            return None;
        }

        // Contradicting signal resets the window.
        let reset = !matches!(self.windows.get(region), Some(w) if w.direction == signal.direction);
        if reset {
            self.windows.insert(
                region.to_string(),
                Window {
                    direction: signal.direction,
                    count: 0,
                    first_at: signal.timestamp,
                },
            );
        }

        let mut filled = None;
        if let Some(window) = self.windows.get_mut(region) {
            window.count += 1;
            let elapsed_ms = (signal.timestamp - window.first_at).num_milliseconds();
            if window.count >= self.config.min_signals
                && elapsed_ms >= self.config.min_duration_ms as i64
            {
                filled = Some((window.direction, window.count));
            }
        }

        let (direction, count) = filled?;
        self.windows.remove(region);
        self.stable.insert(region.to_string(), direction);

        let verdict = match direction {
            SignalDirection::Down => Verdict::RegionDownConfirmed {
                region_id: region.to_string(),
                signal_count: count,
                confirmed_at: signal.timestamp,
            },
            SignalDirection::Up => Verdict::RegionUpConfirmed {
                region_id: region.to_string(),
                signal_count: count,
                confirmed_at: signal.timestamp,
            },
        };
        Some(verdict)
    }

    /// Last confirmed direction for a region, if any.
    pub fn stable_state(&self, region_id: &str) -> Option<SignalDirection> {
        self.stable.get(region_id).copied()
    }

    /// Drop all window state for a region.
    pub fn reset(&mut self, region_id: &str) {
        self.windows.remove(region_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn config() -> DebounceConfig {
        DebounceConfig {
            min_signals: 3,
            min_duration_ms: 10_000,
            unreachable_window_ms: 120_000,
        }
    }

    fn signal_at(region: &str, direction: SignalDirection, base: Timestamp, offset_s: i64) -> HealthSignal {
        HealthSignal::new(region, direction).at(base + Duration::seconds(offset_s))
    }

    #[test]
    fn test_no_verdict_from_single_signal() {
        let mut debouncer = SignalDebouncer::new(config());
        let signal = HealthSignal::new("delhi", SignalDirection::Down);
        assert!(debouncer.observe(&signal).is_none());
    }

    #[test]
    fn test_verdict_after_window_fills() {
        let mut debouncer = SignalDebouncer::new(config());
        let base = crate::core::now();

        assert!(debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 0)).is_none());
        assert!(debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 6)).is_none());
        let verdict = debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 12));

        match verdict {
            Some(Verdict::RegionDownConfirmed { region_id, signal_count, .. }) => {
                assert_eq!(region_id, "delhi");
                assert_eq!(signal_count, 3);
            }
            other => panic!("expected down verdict, got {:?}", other),
        }
        assert_eq!(debouncer.stable_state("delhi"), Some(SignalDirection::Down));
    }

    #[test]
    fn test_enough_signals_but_short_window() {
        let mut debouncer = SignalDebouncer::new(config());
        let base = crate::core::now();

        // Three signals inside two seconds: count satisfied, duration not.
        for offset in [0, 1, 2] {
            assert!(debouncer
                .observe(&signal_at("delhi", SignalDirection::Down, base, offset))
                .is_none());
        }
    }

    #[test]
    fn test_contradicting_signal_resets_window() {
        let mut debouncer = SignalDebouncer::new(config());
        let base = crate::core::now();

        debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 0));
        debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 6));
        // A flake in the middle discards the accumulated window.
        debouncer.observe(&signal_at("delhi", SignalDirection::Up, base, 8));
        assert!(debouncer
            .observe(&signal_at("delhi", SignalDirection::Down, base, 12))
            .is_none());
    }

    #[test]
    fn test_single_flap_never_flips_stable_verdict() {
        let mut debouncer = SignalDebouncer::new(config());
        let base = crate::core::now();

        debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 0));
        debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 6));
        assert!(debouncer
            .observe(&signal_at("delhi", SignalDirection::Down, base, 12))
            .is_some());

        // One isolated Up must not flip the confirmed Down state.
        assert!(debouncer
            .observe(&signal_at("delhi", SignalDirection::Up, base, 20))
            .is_none());
        assert_eq!(debouncer.stable_state("delhi"), Some(SignalDirection::Down));

        // A following Down re-confirms and clears the Up window.
        assert!(debouncer
            .observe(&signal_at("delhi", SignalDirection::Down, base, 25))
            .is_none());
        assert!(debouncer
            .observe(&signal_at("delhi", SignalDirection::Up, base, 30))
            .is_none());
    }

    #[test]
    fn test_recovery_needs_full_window_too() {
        let mut debouncer = SignalDebouncer::new(config());
        let base = crate::core::now();

        debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 0));
        debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 6));
        debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 12));

        debouncer.observe(&signal_at("delhi", SignalDirection::Up, base, 60));
        debouncer.observe(&signal_at("delhi", SignalDirection::Up, base, 66));
        let verdict = debouncer.observe(&signal_at("delhi", SignalDirection::Up, base, 72));
        assert!(matches!(verdict, Some(Verdict::RegionUpConfirmed { .. })));
    }

    #[test]
    fn test_regions_tracked_independently() {
        let mut debouncer = SignalDebouncer::new(config());
        let base = crate::core::now();

        debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 0));
        debouncer.observe(&signal_at("chennai", SignalDirection::Down, base, 1));
        debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 6));
        debouncer.observe(&signal_at("delhi", SignalDirection::Down, base, 12));

        assert_eq!(debouncer.stable_state("delhi"), Some(SignalDirection::Down));
        assert_eq!(debouncer.stable_state("chennai"), None);
    }
}
