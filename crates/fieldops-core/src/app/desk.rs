//! DispatchDesk - 配車デスク
//!
//! The single mutation boundary of the dispatcher. Every write takes the
//! state lock once, runs the engine synchronously, records decisions and
//! publishes a fresh `DeskSnapshot` before the lock is released.
//!
//! Alerts are raised after the lock is dropped; a slow sink never blocks
//! other callers.

use std::slice;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use super::state::DeskState;
use super::{DeskBuilder, DeskSnapshot};
use crate::config::DispatchConfig;
use crate::domain::decision::policy;
use crate::domain::task::ensure_schedulable;
use crate::domain::{
    DecisionRecord, DispatchError, EngineerId, EngineerRecord, EngineerSpec, EngineerStatus, PersistedTask, TaskId,
    TaskRecord, TaskSpec, TaskStatus,
};
use crate::engine::{
    AssignmentEngine, AutoAssignReport, BatchDispatcher, DisplacementEffect, EmergencyOutcome, EmergencyPreemptor,
    WorkloadReporter, WorkloadStats,
};
use crate::ports::{AlertSink, Clock, DispatchAlert, IdGenerator};

pub struct DispatchDesk {
    state: Mutex<DeskState>,
    snapshot_tx: watch::Sender<Arc<DeskSnapshot>>,
    config: DispatchConfig,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    alerts: Arc<dyn AlertSink>,
    engine: AssignmentEngine,
    batch: BatchDispatcher,
    preemptor: EmergencyPreemptor,
    reporter: WorkloadReporter,
}

impl DispatchDesk {
    pub fn builder() -> DeskBuilder {
        DeskBuilder::new()
    }

    pub(crate) fn from_parts(
        config: DispatchConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(DeskSnapshot::default()));
        let engine = AssignmentEngine::new();
        Self {
            state: Mutex::new(DeskState::default()),
            snapshot_tx,
            reporter: WorkloadReporter::new(config.overload_ratio),
            config,
            clock,
            ids,
            alerts,
            engine,
            batch: BatchDispatcher::new(engine),
            preemptor: EmergencyPreemptor::new(engine),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ========================================================================
    // 取り込み (intake)
    // ========================================================================

    /// Replaces tasks, engineers and the ledger with a persisted snapshot.
    ///
    /// All or nothing: on error the desk is untouched.
    pub async fn load(&self, tasks: Vec<PersistedTask>, engineers: Vec<EngineerSpec>) -> Result<(), DispatchError> {
        let restored = DeskState::restore(tasks, engineers, &self.config, self.ids.as_ref())?;
        let mut state = self.state.lock().await;
        state.replace(restored);
        info!(
            tasks = state.tasks.len(),
            engineers = state.engineers.len(),
            "desk loaded from snapshot"
        );
        state.publish(&self.snapshot_tx);
        Ok(())
    }

    pub async fn submit_task(&self, spec: TaskSpec) -> Result<TaskId, DispatchError> {
        let id = spec.id.unwrap_or_else(|| self.ids.generate_task_id());
        let record = TaskRecord::from_spec(id, spec, self.config.travel_hours)?;

        let mut state = self.state.lock().await;
        if state.tasks.contains_key(&id) {
            return Err(DispatchError::DuplicateTask(id));
        }
        info!(
            task_id = %id,
            machine_model = %record.machine_model(),
            kind = ?record.kind(),
            date = %record.scheduled_date(),
            hours = %record.total_hours(),
            "task submitted"
        );
        state.tasks.insert(id, record);
        state.publish(&self.snapshot_tx);
        Ok(id)
    }

    pub async fn register_engineer(&self, spec: EngineerSpec) -> Result<EngineerId, DispatchError> {
        let id = spec.id.unwrap_or_else(|| self.ids.generate_engineer_id());
        let record = EngineerRecord::from_spec(
            id,
            spec,
            self.config.default_max_hours_per_day,
            self.config.default_max_hours_per_week,
        );

        let mut state = self.state.lock().await;
        info!(engineer_id = %id, name = %record.name, skills = record.skills.len(), "engineer registered");
        state.insert_engineer(record)?;
        state.publish(&self.snapshot_tx);
        Ok(id)
    }

    /// Existing assignments are kept; the status only affects future candidacy.
    pub async fn set_engineer_status(&self, engineer_id: EngineerId, status: EngineerStatus) -> Result<(), DispatchError> {
        let mut state = self.state.lock().await;
        let engineer = state
            .engineers
            .get_mut(&engineer_id)
            .ok_or(DispatchError::EngineerNotFound(engineer_id))?;
        engineer.status = status;
        info!(%engineer_id, ?status, "engineer status changed");
        state.publish(&self.snapshot_tx);
        Ok(())
    }

    // ========================================================================
    // 割り当て (assignment)
    // ========================================================================

    /// Runs the batch over every pending planned task under one hold of the
    /// lock. Pending emergencies are staffed by `handle_emergency` or
    /// `handle_pending_emergencies`.
    pub async fn auto_assign(&self) -> AutoAssignReport {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let roster = state.roster();
        let (report, steps) = self.batch.run(state.tasks.values_mut(), &roster, &mut state.ledger);

        for step in &steps {
            let record = match &step.result {
                Ok(assignment) => DecisionRecord::new(
                    step.task_id,
                    json!({ "engineer_id": assignment.engineer_id, "ranking": assignment.ranking }),
                    policy::AUTO_ASSIGN,
                    "assigned",
                    now,
                ),
                Err(reason) => DecisionRecord::new(
                    step.task_id,
                    json!({ "reason": reason }),
                    policy::AUTO_ASSIGN,
                    "rejected",
                    now,
                ),
            };
            state.decisions.push(record);
        }
        if !steps.is_empty() {
            state.publish(&self.snapshot_tx);
        }
        report
    }

    /// Assigns `task_id` to exactly `engineer_id`, through the same checks as
    /// auto-assign.
    pub async fn assign_manually(&self, task_id: TaskId, engineer_id: EngineerId) -> Result<EngineerId, DispatchError> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or(DispatchError::TaskNotFound(task_id))?;
        let engineer = state
            .engineers
            .get(&engineer_id)
            .ok_or(DispatchError::EngineerNotFound(engineer_id))?;

        match self
            .engine
            .try_assign(task, slice::from_ref(engineer), &mut state.ledger)
        {
            Ok(_) => {
                state.decisions.push(DecisionRecord::new(
                    task_id,
                    json!({ "engineer_id": engineer_id }),
                    policy::MANUAL_ASSIGN,
                    "assigned",
                    now,
                ));
                state.publish(&self.snapshot_tx);
                Ok(engineer_id)
            }
            Err(failure) => {
                let err = DispatchError::from_failure(
                    failure,
                    task_id,
                    task.machine_model(),
                    task.scheduled_date(),
                    task.status(),
                );
                state.decisions.push(DecisionRecord::new(
                    task_id,
                    json!({ "engineer_id": engineer_id, "reason": failure }),
                    policy::MANUAL_ASSIGN,
                    "rejected",
                    now,
                ));
                warn!(%task_id, %engineer_id, error = %err, "manual assignment rejected");
                Err(err)
            }
        }
    }

    /// Pins, displaces and fast-assigns an emergency.
    ///
    /// An emergency nobody can take is returned in the outcome and raised on
    /// the alert sink; it is never forced past a ceiling.
    pub async fn handle_emergency(&self, task_id: TaskId) -> Result<EmergencyOutcome, DispatchError> {
        let now = self.clock.now();
        let today = self.clock.today();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let roster = state.roster();
        let outcome = self
            .preemptor
            .handle(task_id, state.tasks.values_mut(), &roster, &mut state.ledger, today)?;
        let alert = Self::record_emergency(state, &outcome, now);
        state.publish(&self.snapshot_tx);
        drop(guard);

        if let Some(alert) = alert {
            self.alerts.raise(alert).await;
        }
        Ok(outcome)
    }

    /// Runs the emergency flow for every pending emergency, oldest
    /// `(scheduled_date, id)` first, under one hold of the lock.
    pub async fn handle_pending_emergencies(&self) -> Vec<EmergencyOutcome> {
        let now = self.clock.now();
        let today = self.clock.today();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let mut queue: Vec<(NaiveDate, TaskId)> = state
            .tasks
            .values()
            .filter(|t| t.is_emergency() && t.is_pending())
            .map(|t| (t.scheduled_date(), t.id()))
            .collect();
        queue.sort();

        let roster = state.roster();
        let mut outcomes = Vec::with_capacity(queue.len());
        let mut alerts = Vec::new();
        for (_, task_id) in queue {
            match self
                .preemptor
                .handle(task_id, state.tasks.values_mut(), &roster, &mut state.ledger, today)
            {
                Ok(outcome) => {
                    alerts.extend(Self::record_emergency(state, &outcome, now));
                    outcomes.push(outcome);
                }
                Err(err) => warn!(%task_id, error = %err, "pending emergency skipped"),
            }
        }
        if !outcomes.is_empty() {
            info!(
                handled = outcomes.len(),
                unstaffed = alerts.len(),
                "pending emergencies handled"
            );
            state.publish(&self.snapshot_tx);
        }
        drop(guard);

        for alert in alerts {
            self.alerts.raise(alert).await;
        }
        outcomes
    }

    /// Appends the displacement and emergency decisions; returns the alert to
    /// raise when the emergency stayed unstaffed.
    fn record_emergency(state: &mut DeskState, outcome: &EmergencyOutcome, now: DateTime<Utc>) -> Option<DispatchAlert> {
        let task_id = outcome.task_id;
        for displacement in &outcome.displaced {
            let decision = match displacement.effect {
                DisplacementEffect::Rescheduled => "rescheduled",
                DisplacementEffect::KeptEngineer { .. } => "rescheduled_kept_engineer",
                DisplacementEffect::Unassigned { .. } => "rescheduled_unassigned",
            };
            state.decisions.push(DecisionRecord::new(
                displacement.task_id,
                json!({ "emergency_id": task_id, "displacement": displacement }),
                policy::DISPLACEMENT,
                decision,
                now,
            ));
        }

        match &outcome.assignment {
            Ok(assignment) => {
                state.decisions.push(DecisionRecord::new(
                    task_id,
                    json!({
                        "engineer_id": assignment.engineer_id,
                        "ranking": assignment.ranking,
                        "displaced": outcome.displaced.len(),
                    }),
                    policy::EMERGENCY,
                    "assigned",
                    now,
                ));
                None
            }
            Err(reason) => {
                state.decisions.push(DecisionRecord::new(
                    task_id,
                    json!({ "reason": reason, "displaced": outcome.displaced.len() }),
                    policy::EMERGENCY,
                    "rejected",
                    now,
                ));
                state
                    .tasks
                    .get(&task_id)
                    .map(|task| DispatchAlert::for_task(task, *reason, now))
            }
        }
    }

    // ========================================================================
    // 運用イベント (operational events)
    // ========================================================================

    /// Releases an assigned task back to the pending queue.
    pub async fn unassign(&self, task_id: TaskId) -> Result<(), DispatchError> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or(DispatchError::TaskNotFound(task_id))?;
        let engineer_id = match (task.status(), task.assigned_engineer_id()) {
            (TaskStatus::Assigned, Some(engineer_id)) => engineer_id,
            (from, _) => {
                return Err(DispatchError::InvalidTransition {
                    task_id,
                    from,
                    action: "unassign",
                });
            }
        };

        state
            .ledger
            .release(engineer_id, task.scheduled_date(), task.total_hours());
        task.clear_assignment();
        info!(%task_id, %engineer_id, "task unassigned");

        state.decisions.push(DecisionRecord::new(
            task_id,
            json!({ "engineer_id": engineer_id }),
            policy::OPERATOR,
            "unassigned",
            now,
        ));
        state.publish(&self.snapshot_tx);
        Ok(())
    }

    /// Moves a task to `engineer_id`.
    ///
    /// The previous engineer's hours are released first. If the new engineer
    /// cannot take the task, the previous assignment is restored and the
    /// error is returned.
    pub async fn reassign(&self, task_id: TaskId, engineer_id: EngineerId) -> Result<EngineerId, DispatchError> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or(DispatchError::TaskNotFound(task_id))?;
        let engineer = state
            .engineers
            .get(&engineer_id)
            .ok_or(DispatchError::EngineerNotFound(engineer_id))?;
        if task.status().is_locked() {
            return Err(DispatchError::InvalidTransition {
                task_id,
                from: task.status(),
                action: "reassign",
            });
        }

        let previous = task.assigned_engineer_id();
        let date = task.scheduled_date();
        let hours = task.total_hours();
        if let Some(previous) = previous {
            state.ledger.release(previous, date, hours);
            task.clear_assignment();
        }

        let result = match self
            .engine
            .try_assign(task, slice::from_ref(engineer), &mut state.ledger)
        {
            Ok(_) => {
                info!(%task_id, from = ?previous, to = %engineer_id, "task reassigned");
                state.decisions.push(DecisionRecord::new(
                    task_id,
                    json!({ "from": previous, "to": engineer_id }),
                    policy::OPERATOR,
                    "reassigned",
                    now,
                ));
                Ok(engineer_id)
            }
            Err(failure) => {
                if let Some(previous) = previous {
                    state.ledger.reinstate(previous, date, hours);
                    task.mark_assigned(previous);
                }
                state.decisions.push(DecisionRecord::new(
                    task_id,
                    json!({ "from": previous, "to": engineer_id, "reason": failure }),
                    policy::OPERATOR,
                    "rejected",
                    now,
                ));
                Err(DispatchError::from_failure(
                    failure,
                    task_id,
                    task.machine_model(),
                    date,
                    task.status(),
                ))
            }
        };
        state.publish(&self.snapshot_tx);
        result
    }

    /// Moves a task to another date; an assigned task takes its hours along.
    ///
    /// Fails with `CapacityExceeded` when the assigned engineer has no room on
    /// `date`; the task then stays where it was.
    pub async fn reschedule(&self, task_id: TaskId, date: NaiveDate) -> Result<(), DispatchError> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or(DispatchError::TaskNotFound(task_id))?;
        if task.status().is_locked() {
            return Err(DispatchError::InvalidTransition {
                task_id,
                from: task.status(),
                action: "reschedule",
            });
        }

        ensure_schedulable(task_id, date)?;

        let from = task.scheduled_date();
        if let Some(engineer_id) = task.assigned_engineer_id()
            && let Err(exceeded) = state
                .ledger
                .transfer(engineer_id, from, date, task.total_hours())
        {
            warn!(%task_id, error = %exceeded, "reschedule rejected");
            return Err(DispatchError::CapacityExceeded { task_id, date });
        }
        task.reschedule(date);
        info!(%task_id, %from, to = %date, "task rescheduled");

        state.decisions.push(DecisionRecord::new(
            task_id,
            json!({ "from": from, "to": date }),
            policy::OPERATOR,
            "rescheduled",
            now,
        ));
        state.publish(&self.snapshot_tx);
        Ok(())
    }

    /// `Assigned -> InProgress`.
    pub async fn start_task(&self, task_id: TaskId) -> Result<(), DispatchError> {
        let mut state = self.state.lock().await;
        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or(DispatchError::TaskNotFound(task_id))?;
        if task.status() != TaskStatus::Assigned {
            return Err(DispatchError::InvalidTransition {
                task_id,
                from: task.status(),
                action: "start",
            });
        }
        task.mark_in_progress();
        info!(%task_id, "task started");
        state.publish(&self.snapshot_tx);
        Ok(())
    }

    /// Starts every `Assigned` task scheduled on `date`; returns them in id
    /// order.
    pub async fn start_scheduled(&self, date: NaiveDate) -> Vec<TaskId> {
        let mut state = self.state.lock().await;
        let started: Vec<TaskId> = state
            .tasks
            .values_mut()
            .filter(|t| t.status() == TaskStatus::Assigned && t.scheduled_date() == date)
            .map(|task| {
                task.mark_in_progress();
                task.id()
            })
            .collect();
        if !started.is_empty() {
            info!(%date, started = started.len(), "scheduled work started");
            state.publish(&self.snapshot_tx);
        }
        started
    }

    /// `Assigned | InProgress -> Completed`. The hours stay booked on the day
    /// the work happened.
    pub async fn complete_task(&self, task_id: TaskId) -> Result<(), DispatchError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let task = state
            .tasks
            .get_mut(&task_id)
            .ok_or(DispatchError::TaskNotFound(task_id))?;
        if !matches!(task.status(), TaskStatus::Assigned | TaskStatus::InProgress) {
            return Err(DispatchError::InvalidTransition {
                task_id,
                from: task.status(),
                action: "complete",
            });
        }
        task.mark_completed(now);
        info!(%task_id, "task completed");
        state.publish(&self.snapshot_tx);
        Ok(())
    }

    /// Deletes a task in any status and gives back the hours it held.
    pub async fn remove_task(&self, task_id: TaskId) -> Result<TaskRecord, DispatchError> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let task = state
            .tasks
            .remove(&task_id)
            .ok_or(DispatchError::TaskNotFound(task_id))?;
        if let Some(engineer_id) = task.assigned_engineer_id() {
            state
                .ledger
                .release(engineer_id, task.scheduled_date(), task.total_hours());
        }
        info!(%task_id, status = %task.status(), "task removed");

        state.decisions.push(DecisionRecord::new(
            task_id,
            json!({ "status": task.status(), "engineer_id": task.assigned_engineer_id() }),
            policy::OPERATOR,
            "removed",
            now,
        ));
        state.publish(&self.snapshot_tx);
        Ok(task)
    }

    // ========================================================================
    // 読み取り (reads)
    // ========================================================================

    /// Aggregates the latest published snapshot; never takes the lock.
    pub fn workload_stats(&self, date: NaiveDate) -> WorkloadStats {
        let snapshot = self.snapshot();
        self.reporter.stats(
            snapshot.engineers.values(),
            snapshot.tasks.values(),
            &snapshot.ledger,
            date,
        )
    }

    pub fn snapshot(&self) -> Arc<DeskSnapshot> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DeskSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Full audit trail, oldest first.
    pub async fn decisions(&self) -> Vec<DecisionRecord> {
        self.state.lock().await.decisions.clone()
    }

    pub async fn decisions_for(&self, task_id: TaskId) -> Vec<DecisionRecord> {
        self.state
            .lock()
            .await
            .decisions
            .iter()
            .filter(|d| d.task_id == task_id)
            .cloned()
            .collect()
    }
}
