//! Emergency preemption.
//!
//! Per emergency arrival:
//! 1. Pin: the emergency is scheduled today at the most urgent priority.
//! 2. Displace: every other planned task still open today moves to tomorrow
//!    and gives back today's capacity.
//! 3. Fast-assign: the emergency goes through the normal assignment engine.
//!
//! The capacity ceilings hold for emergencies too: if nobody has room after
//! displacement the emergency stays `New` and the failure is returned.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Assignment, AssignmentEngine};
use crate::domain::{
    AssignFailure, DispatchError, EngineerId, EngineerRecord, TaskId, TaskKind, TaskRecord, TaskStatus,
};
use crate::ledger::CapacityLedger;

/// What happened to a displaced task's engineer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DisplacementEffect {
    /// The task had no engineer; only its date moved.
    Rescheduled,
    /// The engineer had room on the new date and keeps the task.
    KeptEngineer { engineer_id: EngineerId },
    /// The engineer had no room on the new date; the task is `New` again.
    Unassigned { engineer_id: EngineerId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Displacement {
    pub task_id: TaskId,
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(flatten)]
    pub effect: DisplacementEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyOutcome {
    pub task_id: TaskId,
    pub displaced: Vec<Displacement>,
    pub assignment: Result<Assignment, AssignFailure>,
}

impl EmergencyOutcome {
    pub fn assigned_engineer(&self) -> Option<EngineerId> {
        self.assignment.as_ref().ok().map(|a| a.engineer_id)
    }

    pub fn failure(&self) -> Option<AssignFailure> {
        self.assignment.as_ref().err().copied()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmergencyPreemptor {
    engine: AssignmentEngine,
}

impl EmergencyPreemptor {
    pub fn new(engine: AssignmentEngine) -> Self {
        Self { engine }
    }

    /// Runs the pin / displace / fast-assign flow for `emergency_id`.
    ///
    /// Errors only when the emergency itself is unusable (unknown, planned, or
    /// already assigned) or `today` is the last day of the calendar; nothing
    /// has been touched in that case. An assignment
    /// failure after displacement is reported in the outcome, not as `Err`.
    pub fn handle<'a>(
        &self,
        emergency_id: TaskId,
        tasks: impl IntoIterator<Item = &'a mut TaskRecord>,
        engineers: &[EngineerRecord],
        ledger: &mut CapacityLedger,
        today: NaiveDate,
    ) -> Result<EmergencyOutcome, DispatchError> {
        let mut tasks: Vec<&mut TaskRecord> = tasks.into_iter().collect();
        let index = tasks
            .iter()
            .position(|t| t.id() == emergency_id)
            .ok_or(DispatchError::TaskNotFound(emergency_id))?;

        {
            let emergency = &tasks[index];
            if !emergency.is_emergency() {
                return Err(DispatchError::NotAnEmergency(emergency_id));
            }
            if !emergency.is_pending() {
                return Err(DispatchError::AlreadyAssigned {
                    task_id: emergency_id,
                    status: emergency.status(),
                });
            }
        }

        let tomorrow = today.succ_opt().ok_or_else(|| DispatchError::InvalidTask {
            task_id: emergency_id,
            reason: format!("no day after {today} to displace planned work to"),
        })?;

        tasks[index].pin_as_emergency(today);

        let mut displaced = Vec::new();
        for (i, task) in tasks.iter_mut().enumerate() {
            if i == index || !Self::is_displaceable(task, today) {
                continue;
            }
            let displacement = Self::displace(task, ledger, today, tomorrow);
            info!(
                task_id = %displacement.task_id,
                from = %displacement.from,
                to = %displacement.to,
                effect = ?displacement.effect,
                "planned task displaced by emergency"
            );
            displaced.push(displacement);
        }

        let emergency = &mut tasks[index];
        let assignment = self.engine.try_assign(emergency, engineers, ledger);
        if let Err(reason) = &assignment {
            warn!(
                task_id = %emergency_id,
                machine_model = %emergency.machine_model(),
                %reason,
                "emergency could not be assigned"
            );
        }

        Ok(EmergencyOutcome {
            task_id: emergency_id,
            displaced,
            assignment,
        })
    }

    fn is_displaceable(task: &TaskRecord, today: NaiveDate) -> bool {
        task.kind() == TaskKind::Planned && task.scheduled_date() == today && !task.status().is_locked()
    }

    fn displace(task: &mut TaskRecord, ledger: &mut CapacityLedger, today: NaiveDate, tomorrow: NaiveDate) -> Displacement {
        let hours = task.total_hours();
        let effect = match (task.status(), task.assigned_engineer_id()) {
            (TaskStatus::Assigned, Some(engineer_id)) => {
                ledger.release(engineer_id, today, hours);
                match ledger.reserve(engineer_id, tomorrow, hours) {
                    Ok(()) => DisplacementEffect::KeptEngineer { engineer_id },
                    Err(_) => {
                        task.clear_assignment();
                        DisplacementEffect::Unassigned { engineer_id }
                    }
                }
            }
            _ => DisplacementEffect::Rescheduled,
        };
        task.reschedule(tomorrow);
        Displacement {
            task_id: task.id(),
            from: today,
            to: tomorrow,
            effect,
        }
    }
}
