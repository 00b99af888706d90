//! Per-group failover state machine.
//!
//! The single authority on whether a failover proceeds. All methods are pure
//! in-memory transitions: the machine mutates its own state and returns the
//! decision and notifications for the caller to commit and dispatch. It never
//! talks to collaborators itself.

use crate::config::GroupConfig;
use crate::control::notify::Notification;
use crate::core::{Error, Result, Timestamp};
use crate::failover::coordinator::{AttemptStatus, PromotionAttempt};
use crate::failover::decision::FailoverDecision;
use crate::region::{RegionRegistry, RegionRole};
use crate::signal::SignalDirection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// State of one failover group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GroupState {
    /// One healthy committed primary
    Stable {
        /// Current primary
        primary: String,
    },
    /// Primary confirmed down, selecting a candidate
    Evaluating {
        /// Failed primary
        failed: String,
    },
    /// Promotion sequence running
    Promoting {
        /// Failed primary
        failed: String,
        /// Candidate being promoted
        candidate: String,
    },
    /// Promotion committed, awaiting routing confirmation
    Promoted {
        /// New primary
        new_primary: String,
        /// The primary it replaced
        old_primary: String,
    },
    /// Requires operator action
    Blocked {
        /// Reason code
        reason: String,
    },
}

impl GroupState {
    /// Short name for logs and audit records.
    pub fn name(&self) -> &'static str {
        match self {
            GroupState::Stable { .. } => "stable",
            GroupState::Evaluating { .. } => "evaluating",
            GroupState::Promoting { .. } => "promoting",
            GroupState::Promoted { .. } => "promoted",
            GroupState::Blocked { .. } => "blocked",
        }
    }
}

/// A computed transition: new state plus everything the caller must commit
/// and dispatch.
#[derive(Clone, Debug)]
pub struct Transition {
    /// State before
    pub from: GroupState,
    /// State after
    pub to: GroupState,
    /// Decision recorded with this transition, if one was made
    pub decision: Option<FailoverDecision>,
    /// Notifications to dispatch after the transition is durably committed
    pub notifications: Vec<Notification>,
}

/// The authoritative state machine for one failover group.
#[derive(Clone, Debug)]
pub struct FailoverStateMachine {
    group: String,
    state: GroupState,
    registry: RegionRegistry,
    priority: Option<Vec<String>>,
    unreachable_window_ms: u64,
}

impl FailoverStateMachine {
    /// Build from a validated group config.
    pub fn new(config: &GroupConfig, unreachable_window_ms: u64) -> Self {
        let registry = RegionRegistry::from_group(config);
        let primary = registry
            .primary()
            .map(|r| r.id.clone())
            .unwrap_or_default();
        Self {
            group: config.name.clone(),
            state: GroupState::Stable { primary },
            registry,
            priority: config.priority.clone(),
            unreachable_window_ms,
        }
    }

    /// Group name.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Current state.
    pub fn state(&self) -> &GroupState {
        &self.state
    }

    /// Region registry (read-only).
    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    /// Record a confirmed-down verdict.
    ///
    /// Down on the committed primary opens an evaluation. Down on any other
    /// region only updates its health record, which removes it from candidate
    /// eligibility at decision time.
    pub fn on_down_confirmed(&mut self, region_id: &str, at: Timestamp) -> Result<Option<Transition>> {
        self.registry.record_health(region_id, SignalDirection::Down, at)?;

        let from = self.state.clone();
        match &self.state {
            GroupState::Stable { primary } if primary == region_id => {
                let to = GroupState::Evaluating {
                    failed: region_id.to_string(),
                };
                self.state = to.clone();
                info!(group = %self.group, region = %region_id, "primary confirmed down, evaluating failover");
                Ok(Some(Transition {
                    from,
                    to,
                    decision: None,
                    notifications: vec![],
                }))
            }
            _ => Ok(None),
        }
    }

    /// Record a confirmed-up verdict.
    ///
    /// Recovery of the failed primary cancels an open evaluation (promotion
    /// has not been issued yet, so the abort is safe). Recovery of an old
    /// primary after a completed failover is advisory only; failback is never
    /// automatic.
    pub fn on_up_confirmed(&mut self, region_id: &str, at: Timestamp) -> Result<Option<Transition>> {
        self.registry.record_health(region_id, SignalDirection::Up, at)?;

        let from = self.state.clone();
        match self.state.clone() {
            GroupState::Evaluating { failed } if failed == region_id => {
                let to = GroupState::Stable {
                    primary: failed.clone(),
                };
                self.state = to.clone();
                info!(group = %self.group, region = %region_id, "failed primary recovered, evaluation cancelled");
                Ok(Some(Transition {
                    from,
                    to,
                    decision: None,
                    notifications: vec![Notification::info(
                        "RecoveryDetected",
                        &format!("RECOVERY: {} is back online, failover cancelled", region_id),
                    )],
                }))
            }
            GroupState::Stable { primary } if primary != region_id => {
                // An old primary coming back while another region serves.
                let recovered = self.registry.get(region_id)?;
                if recovered.role != RegionRole::Unreachable {
                    return Ok(None);
                }
                self.registry.transition(region_id, RegionRole::Standby)?;
                Ok(Some(Transition {
                    from: from.clone(),
                    to: from,
                    decision: None,
                    notifications: vec![Notification::warning(
                        "FailbackAdvisory",
                        &format!(
                            "RECOVERY: {} is back online. Manual failback may be needed; current primary is {}",
                            region_id, primary
                        ),
                    )],
                }))
            }
            _ => Ok(None),
        }
    }

    /// Decide the open evaluation: pick a candidate and either enter
    /// `Promoting` or block.
    ///
    /// `in_flight` holds the (failed, candidate) pairs the audit log reports
    /// as pending or in progress.
    pub fn decide(
        &mut self,
        in_flight: &HashSet<(String, String)>,
        at: Timestamp,
    ) -> Result<Transition> {
        let failed = match &self.state {
            GroupState::Evaluating { failed } => failed.clone(),
            other => {
                return Err(Error::InvalidTransition(format!(
                    "decide from {}",
                    other.name()
                )))
            }
        };

        match self.select_candidate(&failed, in_flight, at) {
            Ok(candidate) => self.begin_promotion(&failed, &candidate),
            Err(err) if err.is_rejection() => Ok(self.block_on(&failed, err)),
            Err(err) => Err(err),
        }
    }

    /// Operator-requested promotion of an explicit candidate.
    ///
    /// Rejections surface as errors and leave the state untouched.
    pub fn request_promotion(
        &mut self,
        failed: &str,
        candidate: &str,
        in_flight: &HashSet<(String, String)>,
        at: Timestamp,
    ) -> Result<Transition> {
        if candidate == failed {
            return Err(Error::SelfFailover(candidate.to_string()));
        }
        let candidate_region = self.registry.get(candidate)?;
        if candidate_region.role == RegionRole::Primary {
            return Err(Error::AlreadyPrimary(candidate.to_string()));
        }
        if candidate_region.role != RegionRole::Standby {
            return Err(Error::NotStandby(candidate.to_string()));
        }
        if !candidate_region.is_up()
            || candidate_region.recently_down(self.unreachable_window_ms, at)
        {
            return Err(Error::CandidateUnhealthy(candidate.to_string()));
        }
        if in_flight.contains(&(failed.to_string(), candidate.to_string())) {
            return Err(Error::AlreadyInProgress {
                failed: failed.to_string(),
                candidate: candidate.to_string(),
            });
        }
        self.registry.get(failed)?;

        match &self.state {
            GroupState::Stable { primary } if primary != failed => {
                return Err(Error::InvalidTransition(format!(
                    "{} is not the current primary",
                    failed
                )));
            }
            GroupState::Promoting { .. } | GroupState::Promoted { .. } => {
                return Err(Error::InvalidTransition(format!(
                    "promotion request while {}",
                    self.state.name()
                )));
            }
            _ => {}
        }

        self.begin_promotion(failed, candidate)
    }

    /// Apply the coordinator's terminal attempt result.
    pub fn on_promotion_result(&mut self, attempt: &PromotionAttempt) -> Result<Transition> {
        let (failed, candidate) = match &self.state {
            GroupState::Promoting { failed, candidate } => (failed.clone(), candidate.clone()),
            other => {
                return Err(Error::InvalidTransition(format!(
                    "promotion result in {}",
                    other.name()
                )))
            }
        };

        let from = self.state.clone();
        match attempt.status {
            AttemptStatus::Succeeded => {
                self.registry.transition(&candidate, RegionRole::Primary)?;
                self.registry.assert_single_primary()?;
                let to = GroupState::Promoted {
                    new_primary: candidate.clone(),
                    old_primary: failed.clone(),
                };
                self.state = to.clone();
                Ok(Transition {
                    from,
                    to,
                    decision: None,
                    notifications: vec![Notification::info(
                        "Promoted",
                        &format!(
                            "FAILOVER: {} promoted to primary due to {} outage",
                            candidate, failed
                        ),
                    )],
                })
            }
            AttemptStatus::RolledBack => {
                self.registry.rollback_to_standby(&candidate)?;
                let reason_code = attempt
                    .failure_reason()
                    .unwrap_or("RolledBack")
                    .to_string();
                let detail = attempt
                    .failure_detail()
                    .unwrap_or("promotion failed")
                    .to_string();
                Ok(self.block_after_attempt(from, &failed, &candidate, &reason_code, &detail, false))
            }
            AttemptStatus::Failed => {
                let reason = attempt
                    .failure_detail()
                    .unwrap_or("promotion failed, rollback failed")
                    .to_string();
                Ok(self.block_after_attempt(from, &failed, &candidate, "RollbackFailed", &reason, true))
            }
            AttemptStatus::Pending | AttemptStatus::InProgress => {
                Err(Error::InvalidTransition("attempt is not terminal".to_string()))
            }
        }
    }

    /// Routing confirmed the new primary serves; commit `Stable`.
    pub fn confirm_serving(&mut self) -> Result<Transition> {
        let from = self.state.clone();
        match &self.state {
            GroupState::Promoted { new_primary, .. } => {
                let to = GroupState::Stable {
                    primary: new_primary.clone(),
                };
                self.state = to.clone();
                Ok(Transition {
                    from,
                    to,
                    decision: None,
                    notifications: vec![],
                })
            }
            other => Err(Error::InvalidTransition(format!(
                "confirm_serving from {}",
                other.name()
            ))),
        }
    }

    /// Block a promotion found in flight after a restart.
    ///
    /// The promote step may or may not have reached the database; the outcome
    /// is unknowable from the log alone, so the group parks in `Blocked` until
    /// an operator reconciles it.
    pub fn on_interrupted(&mut self) -> Result<Transition> {
        let (failed, candidate) = match &self.state {
            GroupState::Promoting { failed, candidate } => (failed.clone(), candidate.clone()),
            other => {
                return Err(Error::InvalidTransition(format!(
                    "interrupted in {}",
                    other.name()
                )))
            }
        };
        let from = self.state.clone();
        Ok(self.block_after_attempt(
            from,
            &failed,
            &candidate,
            "InterruptedPromotion",
            "process restarted mid-promotion, outcome unknown",
            true,
        ))
    }

    /// Operator re-entry from `Blocked` back to `Evaluating`.
    ///
    /// Blocked states are never retried silently; this is the explicit path.
    pub fn reenter_evaluation(&mut self, failed: &str) -> Result<Transition> {
        let from = self.state.clone();
        match &self.state {
            GroupState::Blocked { .. } => {
                self.registry.get(failed)?;
                let to = GroupState::Evaluating {
                    failed: failed.to_string(),
                };
                self.state = to.clone();
                Ok(Transition {
                    from,
                    to,
                    decision: None,
                    notifications: vec![],
                })
            }
            other => Err(Error::InvalidTransition(format!(
                "reenter_evaluation from {}",
                other.name()
            ))),
        }
    }

    /// Restore committed state from an audit snapshot (log replay).
    pub fn restore(&mut self, state: GroupState, roles: &std::collections::HashMap<String, RegionRole>) {
        self.state = state;
        self.registry.restore_roles(roles);
    }

    fn select_candidate(
        &self,
        failed: &str,
        in_flight: &HashSet<(String, String)>,
        at: Timestamp,
    ) -> Result<String> {
        let eligible = self
            .registry
            .eligible_candidates(failed, self.unreachable_window_ms, at);

        let candidate = if let Some(priority) = &self.priority {
            // Priority order resolves ties; first eligible entry wins.
            priority
                .iter()
                .find(|id| eligible.iter().any(|r| &r.id == *id))
                .cloned()
        } else {
            match eligible.len() {
                0 => None,
                1 => Some(eligible[0].id.clone()),
                // Ties are never auto-resolved.
                _ => {
                    return Err(Error::AmbiguousCandidate(failed.to_string()));
                }
            }
        };

        let candidate = candidate.ok_or_else(|| Error::NoCandidate(failed.to_string()))?;
        if in_flight.contains(&(failed.to_string(), candidate.clone())) {
            return Err(Error::AlreadyInProgress {
                failed: failed.to_string(),
                candidate,
            });
        }
        Ok(candidate)
    }

    fn begin_promotion(&mut self, failed: &str, candidate: &str) -> Result<Transition> {
        let from = self.state.clone();
        self.registry.transition(candidate, RegionRole::Promoting)?;
        if self.registry.get(failed)?.role == RegionRole::Primary {
            self.registry.transition(failed, RegionRole::Unreachable)?;
        }

        let decision = FailoverDecision::promote(&self.group, failed, candidate, "primary_down");
        let to = GroupState::Promoting {
            failed: failed.to_string(),
            candidate: candidate.to_string(),
        };
        self.state = to.clone();
        info!(group = %self.group, failed = %failed, candidate = %candidate, "promoting candidate");
        Ok(Transition {
            from,
            to,
            decision: Some(decision),
            notifications: vec![],
        })
    }

    fn block_on(&mut self, failed: &str, err: Error) -> Transition {
        let from = self.state.clone();
        let reason = err.reason_code().to_string();
        let decision = FailoverDecision::defer(&self.group, failed, "", &reason);
        let to = GroupState::Blocked {
            reason: reason.clone(),
        };
        self.state = to.clone();
        Transition {
            from,
            to,
            decision: Some(decision),
            notifications: vec![Notification::warning(
                &reason,
                &format!("failover for {} blocked: {}", failed, err),
            )],
        }
    }

    fn block_after_attempt(
        &mut self,
        from: GroupState,
        failed: &str,
        candidate: &str,
        reason_code: &str,
        detail: &str,
        critical: bool,
    ) -> Transition {
        let to = GroupState::Blocked {
            reason: reason_code.to_string(),
        };
        self.state = to.clone();
        let message = format!(
            "failover {} -> {} blocked: {}",
            failed, candidate, detail
        );
        let notification = if critical {
            Notification::critical(reason_code, &message)
        } else {
            Notification::warning(reason_code, &message)
        };
        Transition {
            from,
            to,
            decision: None,
            notifications: vec![notification],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GroupConfig, RegionConfig};
    use crate::core::now;

    fn group() -> GroupConfig {
        GroupConfig::new(
            "pg-main",
            vec![
                RegionConfig::new("delhi", "Delhi", "db-1").primary(),
                RegionConfig::new("chennai", "Chennai", "db-2"),
                RegionConfig::new("mumbai", "Mumbai", "db-3"),
            ],
        )
    }

    fn machine() -> FailoverStateMachine {
        FailoverStateMachine::new(&group(), 120_000)
    }

    fn no_inflight() -> HashSet<(String, String)> {
        HashSet::new()
    }

    #[test]
    fn test_initial_state_stable() {
        let machine = machine();
        assert_eq!(
            machine.state(),
            &GroupState::Stable {
                primary: "delhi".to_string()
            }
        );
    }

    #[test]
    fn test_primary_down_opens_evaluation() {
        let mut machine = machine();
        let transition = machine.on_down_confirmed("delhi", now()).unwrap().unwrap();
        assert_eq!(transition.to.name(), "evaluating");
    }

    #[test]
    fn test_standby_down_does_not_open_evaluation() {
        let mut machine = machine();
        assert!(machine.on_down_confirmed("chennai", now()).unwrap().is_none());
        assert_eq!(machine.state().name(), "stable");
    }

    #[test]
    fn test_decide_promotes_single_healthy_standby() {
        let mut machine = machine();
        let at = now();
        machine.on_up_confirmed("chennai", at).unwrap();
        machine.on_down_confirmed("delhi", at).unwrap();

        let transition = machine.decide(&no_inflight(), at).unwrap();
        assert_eq!(
            transition.to,
            GroupState::Promoting {
                failed: "delhi".to_string(),
                candidate: "chennai".to_string()
            }
        );
        let decision = transition.decision.unwrap();
        assert_eq!(decision.candidate_region, "chennai");
        assert_eq!(machine.registry().get("chennai").unwrap().role, RegionRole::Promoting);
        assert_eq!(machine.registry().get("delhi").unwrap().role, RegionRole::Unreachable);
    }

    #[test]
    fn test_decide_blocks_on_ambiguous_candidates() {
        let mut machine = machine();
        let at = now();
        machine.on_up_confirmed("chennai", at).unwrap();
        machine.on_up_confirmed("mumbai", at).unwrap();
        machine.on_down_confirmed("delhi", at).unwrap();

        let transition = machine.decide(&no_inflight(), at).unwrap();
        assert_eq!(
            transition.to,
            GroupState::Blocked {
                reason: "AmbiguousCandidate".to_string()
            }
        );
        assert_eq!(transition.notifications.len(), 1);
        // No region entered promotion.
        assert_eq!(machine.registry().get("chennai").unwrap().role, RegionRole::Standby);
    }

    #[test]
    fn test_priority_resolves_ties() {
        let config = group().with_priority(&["mumbai", "chennai"]);
        let mut machine = FailoverStateMachine::new(&config, 120_000);
        let at = now();
        machine.on_up_confirmed("chennai", at).unwrap();
        machine.on_up_confirmed("mumbai", at).unwrap();
        machine.on_down_confirmed("delhi", at).unwrap();

        let transition = machine.decide(&no_inflight(), at).unwrap();
        assert_eq!(
            transition.to,
            GroupState::Promoting {
                failed: "delhi".to_string(),
                candidate: "mumbai".to_string()
            }
        );
    }

    #[test]
    fn test_decide_blocks_without_healthy_candidate() {
        let mut machine = machine();
        let at = now();
        machine.on_down_confirmed("delhi", at).unwrap();

        let transition = machine.decide(&no_inflight(), at).unwrap();
        assert_eq!(
            transition.to,
            GroupState::Blocked {
                reason: "NoCandidate".to_string()
            }
        );
    }

    #[test]
    fn test_in_flight_pair_blocks_duplicate() {
        let mut machine = machine();
        let at = now();
        machine.on_up_confirmed("chennai", at).unwrap();
        machine.on_down_confirmed("delhi", at).unwrap();

        let mut in_flight = HashSet::new();
        in_flight.insert(("delhi".to_string(), "chennai".to_string()));
        let transition = machine.decide(&in_flight, at).unwrap();
        assert_eq!(
            transition.to,
            GroupState::Blocked {
                reason: "AlreadyInProgress".to_string()
            }
        );
    }

    #[test]
    fn test_recovery_during_evaluation_cancels() {
        let mut machine = machine();
        let at = now();
        machine.on_down_confirmed("delhi", at).unwrap();
        assert_eq!(machine.state().name(), "evaluating");

        let transition = machine.on_up_confirmed("delhi", at).unwrap().unwrap();
        assert_eq!(
            transition.to,
            GroupState::Stable {
                primary: "delhi".to_string()
            }
        );
    }

    #[test]
    fn test_promotion_success_path() {
        let mut machine = machine();
        let at = now();
        machine.on_up_confirmed("chennai", at).unwrap();
        machine.on_down_confirmed("delhi", at).unwrap();
        let transition = machine.decide(&no_inflight(), at).unwrap();
        let decision = transition.decision.unwrap();

        let mut attempt = PromotionAttempt::new(&decision);
        attempt.status = AttemptStatus::Succeeded;
        let transition = machine.on_promotion_result(&attempt).unwrap();

        assert_eq!(
            transition.to,
            GroupState::Promoted {
                new_primary: "chennai".to_string(),
                old_primary: "delhi".to_string()
            }
        );
        assert_eq!(transition.notifications.len(), 1);
        assert!(transition.notifications[0].message.contains("chennai promoted to primary"));

        let transition = machine.confirm_serving().unwrap();
        assert_eq!(
            transition.to,
            GroupState::Stable {
                primary: "chennai".to_string()
            }
        );
        assert!(machine.registry().assert_single_primary().is_ok());
    }

    #[test]
    fn test_rolled_back_attempt_blocks() {
        let mut machine = machine();
        let at = now();
        machine.on_up_confirmed("chennai", at).unwrap();
        machine.on_down_confirmed("delhi", at).unwrap();
        let decision = machine.decide(&no_inflight(), at).unwrap().decision.unwrap();

        let mut attempt = PromotionAttempt::new(&decision);
        attempt.record_failure("promote", &Error::CollaboratorTimeout(100));
        attempt.status = AttemptStatus::RolledBack;
        let transition = machine.on_promotion_result(&attempt).unwrap();

        // The blocked reason is the failure that triggered the rollback.
        assert_eq!(
            transition.to,
            GroupState::Blocked {
                reason: "CollaboratorTimeout".to_string()
            }
        );
        assert!(transition.notifications[0].message.contains("timed out"));
        // Candidate went back to standby through the explicit rollback path.
        assert_eq!(machine.registry().get("chennai").unwrap().role, RegionRole::Standby);
    }

    #[test]
    fn test_failed_rollback_is_critical() {
        let mut machine = machine();
        let at = now();
        machine.on_up_confirmed("chennai", at).unwrap();
        machine.on_down_confirmed("delhi", at).unwrap();
        let decision = machine.decide(&no_inflight(), at).unwrap().decision.unwrap();

        let mut attempt = PromotionAttempt::new(&decision);
        attempt.record("demote", false, "demote refused");
        attempt.status = AttemptStatus::Failed;
        let transition = machine.on_promotion_result(&attempt).unwrap();

        assert_eq!(
            transition.notifications[0].severity,
            crate::control::NotifySeverity::Critical
        );
    }

    #[test]
    fn test_no_automatic_failback() {
        let mut machine = machine();
        let at = now();
        machine.on_up_confirmed("chennai", at).unwrap();
        machine.on_down_confirmed("delhi", at).unwrap();
        let decision = machine.decide(&no_inflight(), at).unwrap().decision.unwrap();
        let mut attempt = PromotionAttempt::new(&decision);
        attempt.status = AttemptStatus::Succeeded;
        machine.on_promotion_result(&attempt).unwrap();
        machine.confirm_serving().unwrap();

        // Old primary comes back: advisory only, chennai stays primary.
        let transition = machine.on_up_confirmed("delhi", at).unwrap().unwrap();
        assert_eq!(transition.to.name(), "stable");
        assert_eq!(transition.notifications[0].reason_code, "FailbackAdvisory");
        assert_eq!(machine.registry().primary().unwrap().id, "chennai");
        assert_eq!(machine.registry().get("delhi").unwrap().role, RegionRole::Standby);
    }

    #[test]
    fn test_request_promotion_rejects_self_failover() {
        let mut machine = machine();
        let err = machine
            .request_promotion("delhi", "delhi", &no_inflight(), now())
            .unwrap_err();
        assert_eq!(err.reason_code(), "SelfFailover");
        assert_eq!(machine.state().name(), "stable");
    }

    #[test]
    fn test_request_promotion_rejects_current_primary() {
        let mut machine = machine();
        let at = now();
        let err = machine
            .request_promotion("chennai", "delhi", &no_inflight(), at)
            .unwrap_err();
        assert_eq!(err.reason_code(), "AlreadyPrimary");
    }

    #[test]
    fn test_request_promotion_rejects_unhealthy_candidate() {
        let mut machine = machine();
        let err = machine
            .request_promotion("delhi", "chennai", &no_inflight(), now())
            .unwrap_err();
        assert_eq!(err.reason_code(), "CandidateUnhealthy");
    }

    #[test]
    fn test_blocked_requires_explicit_reentry() {
        let mut machine = machine();
        let at = now();
        machine.on_down_confirmed("delhi", at).unwrap();
        machine.decide(&no_inflight(), at).unwrap(); // blocks, no candidate

        assert!(machine.decide(&no_inflight(), at).is_err());
        machine.reenter_evaluation("delhi").unwrap();
        assert_eq!(machine.state().name(), "evaluating");
    }

    #[test]
    fn test_restore_from_snapshot() {
        let mut machine = machine();
        let state = GroupState::Stable {
            primary: "chennai".to_string(),
        };
        let mut roles = std::collections::HashMap::new();
        roles.insert("chennai".to_string(), RegionRole::Primary);
        roles.insert("delhi".to_string(), RegionRole::Unreachable);
        machine.restore(state.clone(), &roles);

        assert_eq!(machine.state(), &state);
        assert_eq!(machine.registry().primary().unwrap().id, "chennai");
    }
}
