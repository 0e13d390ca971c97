//! Errors - エラー型と分類
//!
//! - `AssignFailure`: why a single assignment attempt did not commit.
//!   Serializable, it ends up in batch reports and emergency alerts.
//! - `DispatchError`: everything the desk can return to a caller.
//!
//! All of them are local: nothing here aborts a batch or the process.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::{EngineerId, MachineModel, TaskId, TaskStatus};

/// Reason an assignment attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignFailure {
    /// Somebody is available, but nobody can service the machine model.
    SkillMismatch,
    /// Qualified engineers exist, but none has room on that day/week.
    CapacityExceeded,
    /// No candidate is available at all.
    NoAvailableEngineer,
    /// The task already has an engineer or is being worked on.
    AlreadyAssigned,
}

impl AssignFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignFailure::SkillMismatch => "skill_mismatch",
            AssignFailure::CapacityExceeded => "capacity_exceeded",
            AssignFailure::NoAvailableEngineer => "no_available_engineer",
            AssignFailure::AlreadyAssigned => "already_assigned",
        }
    }
}

impl fmt::Display for AssignFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("no available engineer can service {machine_model} for task {task_id}")]
    SkillMismatch {
        task_id: TaskId,
        machine_model: MachineModel,
    },

    #[error("capacity exceeded: no qualified engineer has room for task {task_id} on {date}")]
    CapacityExceeded { task_id: TaskId, date: NaiveDate },

    #[error("no available engineer for task {task_id}")]
    NoAvailableEngineer { task_id: TaskId },

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("engineer not found: {0}")]
    EngineerNotFound(EngineerId),

    #[error("task {task_id} is already {status}")]
    AlreadyAssigned { task_id: TaskId, status: TaskStatus },

    #[error("task {0} is not an emergency")]
    NotAnEmergency(TaskId),

    #[error("invalid task {task_id}: {reason}")]
    InvalidTask { task_id: TaskId, reason: String },

    #[error("cannot {action} task {task_id} in status {from}")]
    InvalidTransition {
        task_id: TaskId,
        from: TaskStatus,
        action: &'static str,
    },

    #[error("duplicate task id {0}")]
    DuplicateTask(TaskId),

    #[error("duplicate engineer id {0}")]
    DuplicateEngineer(EngineerId),

    #[error("snapshot puts engineer {engineer_id} over capacity on {date} (task {task_id})")]
    SnapshotOverCapacity {
        task_id: TaskId,
        engineer_id: EngineerId,
        date: NaiveDate,
    },
}

impl DispatchError {
    /// Lifts a per-attempt failure into the caller-facing error.
    pub fn from_failure(
        failure: AssignFailure,
        task_id: TaskId,
        machine_model: &MachineModel,
        date: NaiveDate,
        status: TaskStatus,
    ) -> Self {
        match failure {
            AssignFailure::SkillMismatch => DispatchError::SkillMismatch {
                task_id,
                machine_model: machine_model.clone(),
            },
            AssignFailure::CapacityExceeded => DispatchError::CapacityExceeded { task_id, date },
            AssignFailure::NoAvailableEngineer => DispatchError::NoAvailableEngineer { task_id },
            AssignFailure::AlreadyAssigned => DispatchError::AlreadyAssigned { task_id, status },
        }
    }

    /// The assignment-level reason behind this error, if it is one.
    pub fn assign_failure(&self) -> Option<AssignFailure> {
        match self {
            DispatchError::SkillMismatch { .. } => Some(AssignFailure::SkillMismatch),
            DispatchError::CapacityExceeded { .. } => Some(AssignFailure::CapacityExceeded),
            DispatchError::NoAvailableEngineer { .. } => Some(AssignFailure::NoAvailableEngineer),
            DispatchError::AlreadyAssigned { .. } => Some(AssignFailure::AlreadyAssigned),
            _ => None,
        }
    }
}
