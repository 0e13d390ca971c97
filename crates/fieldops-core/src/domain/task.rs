//! Maintenance task model.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EngineerId, Hours, MachineModel, TaskId};
use crate::domain::errors::DispatchError;

/// Planned maintenance or an unscheduled repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Planned,
    Emergency,
}

/// Task lifecycle.
///
/// State transitions:
/// - New -> Assigned (only through the assignment engine)
/// - Assigned -> New (unassign, or displacement without room on the next day)
/// - Assigned -> InProgress -> Completed (operational events)
/// - Assigned -> Completed
///
/// `scheduled_date` is orthogonal and can change without a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    Assigned,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Field work has started or finished; the task is frozen for dispatch.
    pub fn is_locked(self) -> bool {
        matches!(self, TaskStatus::InProgress | TaskStatus::Completed)
    }

    /// Holds capacity on the ledger.
    pub fn holds_capacity(self) -> bool {
        !matches!(self, TaskStatus::New)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::New => "new",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Dispatch priority. Lower is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub u32);

impl Priority {
    /// Emergencies are pinned here.
    pub const MOST_URGENT: Priority = Priority(0);
    pub const HIGH: Priority = Priority(10);
    pub const NORMAL: Priority = Priority(50);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

/// Intake payload for a new task, as handed over by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(default)]
    pub id: Option<TaskId>,
    pub title: String,
    pub machine_model: MachineModel,
    /// Inventory code of the vending machine (e.g. "TA-001").
    #[serde(default)]
    pub machine_code: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub kind: TaskKind,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub estimated_hours: Hours,
    /// Falls back to `DispatchConfig::travel_hours`.
    #[serde(default)]
    pub travel_hours: Option<Hours>,
    pub scheduled_date: NaiveDate,
}

impl TaskSpec {
    pub fn planned(
        title: impl Into<String>,
        machine_model: impl Into<MachineModel>,
        estimated_hours: Hours,
        scheduled_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            machine_model: machine_model.into(),
            machine_code: None,
            location: None,
            kind: TaskKind::Planned,
            priority: None,
            estimated_hours,
            travel_hours: None,
            scheduled_date,
        }
    }

    pub fn emergency(
        title: impl Into<String>,
        machine_model: impl Into<MachineModel>,
        estimated_hours: Hours,
        scheduled_date: NaiveDate,
    ) -> Self {
        Self {
            kind: TaskKind::Emergency,
            ..Self::planned(title, machine_model, estimated_hours, scheduled_date)
        }
    }

    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_travel_hours(mut self, travel: Hours) -> Self {
        self.travel_hours = Some(travel);
        self
    }

    pub fn with_machine_code(mut self, code: impl Into<String>) -> Self {
        self.machine_code = Some(code.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// A maintenance task as the engine sees it.
///
/// - `total_hours()` is derived, never stored.
/// - The engineer and the status only change through crate-internal methods,
///   so every assignment goes through the engine and the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    id: TaskId,
    title: String,
    machine_model: MachineModel,
    machine_code: Option<String>,
    location: Option<String>,
    kind: TaskKind,
    priority: Priority,
    estimated_hours: Hours,
    travel_hours: Hours,
    scheduled_date: NaiveDate,
    status: TaskStatus,
    assigned_engineer_id: Option<EngineerId>,
    completed_at: Option<DateTime<Utc>>,
}

/// A task may only sit on a day whose whole ISO week and following day exist
/// in the calendar; displacement and weekly accounting step across both.
pub(crate) fn ensure_schedulable(task_id: TaskId, date: NaiveDate) -> Result<(), DispatchError> {
    if date.checked_sub_days(Days::new(6)).is_some() && date.succ_opt().is_some() {
        return Ok(());
    }
    Err(DispatchError::InvalidTask {
        task_id,
        reason: format!("scheduled date {date} is outside the supported calendar"),
    })
}

impl TaskRecord {
    /// Builds a `New`, unassigned task from an intake payload.
    pub fn from_spec(id: TaskId, spec: TaskSpec, default_travel: Hours) -> Result<Self, DispatchError> {
        if spec.estimated_hours.is_zero() {
            return Err(DispatchError::InvalidTask {
                task_id: id,
                reason: "estimated hours must be greater than zero".to_string(),
            });
        }
        if spec.machine_model.is_empty() {
            return Err(DispatchError::InvalidTask {
                task_id: id,
                reason: "machine model is empty".to_string(),
            });
        }
        ensure_schedulable(id, spec.scheduled_date)?;
        let priority = match spec.kind {
            TaskKind::Emergency => Priority::MOST_URGENT,
            TaskKind::Planned => spec.priority.unwrap_or_default(),
        };
        Ok(Self {
            id,
            title: spec.title,
            machine_model: spec.machine_model,
            machine_code: spec.machine_code,
            location: spec.location,
            kind: spec.kind,
            priority,
            estimated_hours: spec.estimated_hours,
            travel_hours: spec.travel_hours.unwrap_or(default_travel),
            scheduled_date: spec.scheduled_date,
            status: TaskStatus::New,
            assigned_engineer_id: None,
            completed_at: None,
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn machine_model(&self) -> &MachineModel {
        &self.machine_model
    }

    pub fn machine_code(&self) -> Option<&str> {
        self.machine_code.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn is_emergency(&self) -> bool {
        self.kind == TaskKind::Emergency
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn estimated_hours(&self) -> Hours {
        self.estimated_hours
    }

    pub fn travel_hours(&self) -> Hours {
        self.travel_hours
    }

    /// On-site work plus round-trip travel.
    pub fn total_hours(&self) -> Hours {
        self.estimated_hours + self.travel_hours
    }

    pub fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_date
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn assigned_engineer_id(&self) -> Option<EngineerId> {
        self.assigned_engineer_id
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Unassigned and not yet worked on.
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::New && self.assigned_engineer_id.is_none()
    }

    /// Changing the estimate is only allowed while the task holds no capacity,
    /// otherwise the ledger would drift from the task's total.
    pub fn set_estimated_hours(&mut self, hours: Hours) -> Result<(), DispatchError> {
        if hours.is_zero() {
            return Err(DispatchError::InvalidTask {
                task_id: self.id,
                reason: "estimated hours must be greater than zero".to_string(),
            });
        }
        self.ensure_unbooked()?;
        self.estimated_hours = hours;
        Ok(())
    }

    pub fn set_travel_hours(&mut self, hours: Hours) -> Result<(), DispatchError> {
        self.ensure_unbooked()?;
        self.travel_hours = hours;
        Ok(())
    }

    fn ensure_unbooked(&self) -> Result<(), DispatchError> {
        if self.status.holds_capacity() {
            return Err(DispatchError::InvalidTransition {
                task_id: self.id,
                from: self.status,
                action: "change hours",
            });
        }
        Ok(())
    }

    pub(crate) fn mark_assigned(&mut self, engineer_id: EngineerId) {
        self.assigned_engineer_id = Some(engineer_id);
        self.status = TaskStatus::Assigned;
    }

    pub(crate) fn clear_assignment(&mut self) {
        self.assigned_engineer_id = None;
        self.status = TaskStatus::New;
    }

    pub(crate) fn mark_in_progress(&mut self) {
        self.status = TaskStatus::InProgress;
    }

    pub(crate) fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(at);
    }

    pub(crate) fn reschedule(&mut self, date: NaiveDate) {
        self.scheduled_date = date;
    }

    pub(crate) fn pin_as_emergency(&mut self, today: NaiveDate) {
        self.scheduled_date = today;
        self.priority = Priority::MOST_URGENT;
    }

    /// Rehydrates a persisted assignment. The caller must reserve the ledger.
    pub(crate) fn restore_state(
        &mut self,
        status: TaskStatus,
        engineer_id: Option<EngineerId>,
        completed_at: Option<DateTime<Utc>>,
    ) {
        self.status = status;
        self.assigned_engineer_id = engineer_id;
        self.completed_at = completed_at;
    }
}

/// A task as stored by the persistence layer, including its dispatch state.
///
/// Used to rebuild a desk (and its ledger) from a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTask {
    #[serde(flatten)]
    pub spec: TaskSpec,
    #[serde(default = "PersistedTask::default_status")]
    pub status: TaskStatus,
    #[serde(default)]
    pub assigned_engineer_id: Option<EngineerId>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PersistedTask {
    fn default_status() -> TaskStatus {
        TaskStatus::New
    }

    pub fn unassigned(spec: TaskSpec) -> Self {
        Self {
            spec,
            status: TaskStatus::New,
            assigned_engineer_id: None,
            completed_at: None,
        }
    }

    pub fn assigned_to(spec: TaskSpec, engineer_id: EngineerId) -> Self {
        Self {
            spec,
            status: TaskStatus::Assigned,
            assigned_engineer_id: Some(engineer_id),
            completed_at: None,
        }
    }
}
