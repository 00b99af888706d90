//! The failover controller.
//!
//! Wires debouncer, state machine, coordinator, audit log, and notification
//! sink together. Holds no authoritative state of its own: everything it
//! decides is derived from the state machines and the audit log, and every
//! mutation of a group happens under that group's mutex.
//!
//! Write-ahead discipline: the audit entry for a transition is appended and
//! durable before the transition is considered committed, and notifications
//! are dispatched only after the commit.

use crate::audit::{AuditKind, AuditLog, AuditStore};
use crate::config::ControllerConfig;
use crate::control::notify::{Notification, NotificationSink};
use crate::control::plane::{DatabaseControl, RoutingControl};
use crate::core::{Error, Result, Timestamp};
use crate::failover::coordinator::{AttemptStatus, PromotionAttempt, PromotionCoordinator};
use crate::failover::state_machine::{FailoverStateMachine, GroupState, Transition};
use crate::signal::{HealthSignal, SignalDebouncer, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Outcome reported to the signal source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalOutcome {
    /// Signal absorbed, nothing to do
    NoAction,
    /// A promotion was started for the affected group
    FailoverInitiated,
    /// A region recovered; failback is left to the operator
    RecoveryDetected,
    /// The group is blocked and needs operator attention
    Blocked,
}

/// Mutable per-group runtime, guarded by one mutex per group.
struct GroupRuntime {
    machine: FailoverStateMachine,
    debouncer: SignalDebouncer,
}

/// Process-facing entry point for signals and operator requests.
pub struct Controller {
    config: ControllerConfig,
    groups: HashMap<String, Arc<Mutex<GroupRuntime>>>,
    region_to_group: HashMap<String, String>,
    /// (display name, region id) in config order, for monitor-name resolution
    region_names: Vec<(String, String)>,
    instances: HashMap<String, String>,
    audit: Arc<AuditLog>,
    coordinator: PromotionCoordinator,
    notifier: Arc<dyn NotificationSink>,
}

impl Controller {
    /// Build a controller and recover committed state from the audit log.
    pub async fn new(
        config: ControllerConfig,
        db: Arc<dyn DatabaseControl>,
        routing: Arc<dyn RoutingControl>,
        store: Arc<dyn AuditStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        config.validate()?;
        let audit = Arc::new(AuditLog::open(store).await?);

        let mut groups = HashMap::new();
        let mut region_to_group = HashMap::new();
        let mut region_names = Vec::new();
        let mut instances = HashMap::new();
        for group in &config.groups {
            let machine = FailoverStateMachine::new(group, config.debounce.unreachable_window_ms);
            let debouncer = SignalDebouncer::new(config.debounce.clone());
            groups.insert(
                group.name.clone(),
                Arc::new(Mutex::new(GroupRuntime { machine, debouncer })),
            );
            for region in &group.regions {
                region_to_group.insert(region.id.clone(), group.name.clone());
                region_names.push((region.name.clone(), region.id.clone()));
                instances.insert(region.id.clone(), region.db_instance_id.clone());
            }
        }

        let coordinator = PromotionCoordinator::new(db, routing, config.promotion.clone());
        let controller = Self {
            config,
            groups,
            region_to_group,
            region_names,
            instances,
            audit,
            coordinator,
            notifier,
        };
        controller.recover().await?;
        Ok(controller)
    }

    /// Configuration in effect.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// The audit log.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Committed state of a group.
    pub async fn state_of(&self, group: &str) -> Result<GroupState> {
        let runtime = self.group_runtime(group)?;
        let runtime = runtime.lock().await;
        Ok(runtime.machine.state().clone())
    }

    /// Resolve a monitor display name ("Delhi Frontend LB") to a region id.
    pub fn resolve_region(&self, monitor_name: &str) -> Option<&str> {
        self.region_names
            .iter()
            .find(|(name, _)| monitor_name.contains(name.as_str()))
            .map(|(_, id)| id.as_str())
    }

    /// Feed one raw health signal through debounce, decision, and promotion.
    pub async fn handle_signal(&self, signal: HealthSignal) -> Result<SignalOutcome> {
        let group_name = self
            .region_to_group
            .get(&signal.region_id)
            .cloned()
            .ok_or_else(|| Error::UnknownRegion(signal.region_id.clone()))?;
        let runtime = self.group_runtime(&group_name)?;
        let mut runtime = runtime.lock().await;

        let verdict = match runtime.debouncer.observe(&signal) {
            Some(verdict) => verdict,
            None => return Ok(SignalOutcome::NoAction),
        };

        self.audit
            .record(
                &group_name,
                AuditKind::Verdict {
                    region_id: verdict.region_id().to_string(),
                    direction: verdict.direction(),
                },
            )
            .await?;

        match verdict {
            Verdict::RegionDownConfirmed {
                region_id,
                confirmed_at,
                ..
            } => {
                self.handle_down(&group_name, &mut runtime, &region_id, confirmed_at)
                    .await
            }
            Verdict::RegionUpConfirmed {
                region_id,
                confirmed_at,
                ..
            } => {
                self.handle_up(&group_name, &mut runtime, &region_id, confirmed_at)
                    .await
            }
        }
    }

    /// Operator-requested promotion of an explicit candidate.
    ///
    /// Rejections produce a notification and surface as errors; the group
    /// state is untouched.
    pub async fn request_failover(&self, failed: &str, candidate: &str) -> Result<SignalOutcome> {
        let group_name = self
            .region_to_group
            .get(failed)
            .cloned()
            .ok_or_else(|| Error::UnknownRegion(failed.to_string()))?;
        let runtime = self.group_runtime(&group_name)?;
        let mut runtime = runtime.lock().await;

        let in_flight = self.audit.in_flight_pairs(&group_name).await?;
        let snapshot = runtime.machine.clone();
        match runtime
            .machine
            .request_promotion(failed, candidate, &in_flight, crate::core::now())
        {
            Ok(transition) => {
                self.run_promotion(&group_name, &mut runtime, snapshot, transition)
                    .await
            }
            Err(err) if err.is_rejection() => {
                self.dispatch(&[Notification::warning(
                    err.reason_code(),
                    &format!("failover request {} -> {} rejected: {}", failed, candidate, err),
                )])
                .await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Operator re-entry of a blocked group into evaluation.
    pub async fn reenter_evaluation(&self, group: &str, failed: &str) -> Result<()> {
        let runtime = self.group_runtime(group)?;
        let mut runtime = runtime.lock().await;
        let snapshot = runtime.machine.clone();
        let transition = runtime.machine.reenter_evaluation(failed)?;
        self.commit(group, &mut runtime, snapshot, &transition).await?;
        Ok(())
    }

    async fn handle_down(
        &self,
        group: &str,
        runtime: &mut GroupRuntime,
        region_id: &str,
        at: Timestamp,
    ) -> Result<SignalOutcome> {
        let snapshot = runtime.machine.clone();
        let transition = match runtime.machine.on_down_confirmed(region_id, at)? {
            Some(transition) => transition,
            None => return Ok(SignalOutcome::NoAction),
        };
        self.commit(group, runtime, snapshot, &transition).await?;

        // Evaluation opened; decide immediately off the same verdict.
        let in_flight = self.audit.in_flight_pairs(group).await?;
        let snapshot = runtime.machine.clone();
        let transition = runtime.machine.decide(&in_flight, at)?;
        self.run_promotion(group, runtime, snapshot, transition).await
    }

    async fn handle_up(
        &self,
        group: &str,
        runtime: &mut GroupRuntime,
        region_id: &str,
        at: Timestamp,
    ) -> Result<SignalOutcome> {
        let snapshot = runtime.machine.clone();
        let transition = match runtime.machine.on_up_confirmed(region_id, at)? {
            Some(transition) => transition,
            None => return Ok(SignalOutcome::NoAction),
        };

        let advisory = transition
            .notifications
            .iter()
            .any(|n| n.reason_code == "FailbackAdvisory");
        if advisory {
            if let GroupState::Stable { primary } = &transition.to {
                self.audit
                    .record(
                        group,
                        AuditKind::FailbackAdvisory {
                            recovered: region_id.to_string(),
                            current_primary: primary.clone(),
                        },
                    )
                    .await?;
            }
        }

        self.commit(group, runtime, snapshot, &transition).await?;
        Ok(SignalOutcome::RecoveryDetected)
    }

    /// Drive a transition into `Promoting` through the full promotion
    /// sequence, or finish a `Blocked` decision.
    async fn run_promotion(
        &self,
        group: &str,
        runtime: &mut GroupRuntime,
        snapshot: FailoverStateMachine,
        transition: Transition,
    ) -> Result<SignalOutcome> {
        let (candidate, decision) = match (&transition.to, &transition.decision) {
            (GroupState::Promoting { candidate, .. }, Some(decision)) => {
                (candidate.clone(), decision.clone())
            }
            _ => {
                // Decision blocked before promotion; record it and commit.
                if let Some(decision) = &transition.decision {
                    if let Err(err) = self
                        .audit
                        .record(group, AuditKind::Decision { decision: decision.clone() })
                        .await
                    {
                        runtime.machine = snapshot;
                        return Err(err);
                    }
                }
                self.commit(group, runtime, snapshot, &transition).await?;
                return Ok(match &transition.to {
                    GroupState::Blocked { .. } => SignalOutcome::Blocked,
                    _ => SignalOutcome::NoAction,
                });
            }
        };

        let instance_id = self
            .instances
            .get(&candidate)
            .cloned()
            .ok_or_else(|| Error::UnknownRegion(candidate.clone()))?;

        // Write-ahead: decision and pending attempt are durable before the
        // promote call can be issued.
        let attempt = PromotionAttempt::new(&decision);
        let prepared: Result<()> = async {
            self.audit
                .record(group, AuditKind::Decision { decision: decision.clone() })
                .await?;
            self.audit.record(group, attempt_record(&attempt)).await?;
            Ok(())
        }
        .await;
        if let Err(err) = prepared {
            runtime.machine = snapshot;
            return Err(err);
        }
        self.commit(group, runtime, snapshot, &transition).await?;

        let attempt = self.coordinator.execute(attempt, &instance_id).await;
        // The attempt ran against external systems; its outcome must land in
        // the log even if the controller errors afterwards.
        self.audit.record(group, attempt_record(&attempt)).await?;

        let snapshot = runtime.machine.clone();
        let result_transition = runtime.machine.on_promotion_result(&attempt)?;
        self.commit(group, runtime, snapshot, &result_transition).await?;

        if attempt.status == AttemptStatus::Succeeded {
            let snapshot = runtime.machine.clone();
            let confirm = runtime.machine.confirm_serving()?;
            self.commit(group, runtime, snapshot, &confirm).await?;
            info!(group = %group, candidate = %candidate, "failover committed");
            Ok(SignalOutcome::FailoverInitiated)
        } else {
            Ok(SignalOutcome::Blocked)
        }
    }

    /// Append the transition to the audit log, then dispatch its
    /// notifications. On append failure the machine is restored and the
    /// transition never happened.
    async fn commit(
        &self,
        group: &str,
        runtime: &mut GroupRuntime,
        snapshot: FailoverStateMachine,
        transition: &Transition,
    ) -> Result<()> {
        let kind = AuditKind::Transition {
            from: transition.from.clone(),
            to: transition.to.clone(),
            roles: runtime.machine.registry().roles(),
        };
        if let Err(err) = self.audit.record(group, kind).await {
            runtime.machine = snapshot;
            return Err(err);
        }
        self.dispatch(&transition.notifications).await;
        Ok(())
    }

    async fn dispatch(&self, notifications: &[Notification]) {
        let sends = notifications.iter().map(|notification| async move {
            if let Err(err) = self.notifier.notify(notification.clone()).await {
                warn!(
                    reason = %notification.reason_code,
                    error = %err,
                    "notification delivery failed"
                );
            }
        });
        futures::future::join_all(sends).await;
    }

    /// Rebuild committed state by replaying the log, then park any group
    /// that crashed mid-promotion.
    async fn recover(&self) -> Result<()> {
        let entries = self.audit.entries().await?;
        for entry in entries {
            if let AuditKind::Transition { to, roles, .. } = entry.kind {
                if let Some(runtime) = self.groups.get(&entry.group) {
                    runtime.lock().await.machine.restore(to, &roles);
                }
            }
        }

        for (name, runtime) in &self.groups {
            let mut runtime = runtime.lock().await;
            if matches!(runtime.machine.state(), GroupState::Promoting { .. }) {
                warn!(group = %name, "recovered mid-promotion, blocking for manual reconciliation");
                let snapshot = runtime.machine.clone();
                let transition = runtime.machine.on_interrupted()?;
                self.commit(name, &mut runtime, snapshot, &transition).await?;
            }
        }
        Ok(())
    }

    fn group_runtime(&self, group: &str) -> Result<&Arc<Mutex<GroupRuntime>>> {
        self.groups
            .get(group)
            .ok_or_else(|| Error::UnknownGroup(group.to_string()))
    }
}

fn attempt_record(attempt: &PromotionAttempt) -> AuditKind {
    AuditKind::Attempt {
        attempt_id: attempt.id,
        decision_id: attempt.decision_id,
        failed_region: attempt.failed_region.clone(),
        candidate_region: attempt.candidate_region.clone(),
        status: attempt.status,
        detail: attempt.failure_detail().map(|d| d.to_string()),
    }
}
