//! Batch auto-assignment over the pending queue.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Assignment, AssignmentEngine};
use crate::domain::{AssignFailure, EngineerId, EngineerRecord, Hours, TaskId, TaskKind, TaskRecord};
use crate::ledger::CapacityLedger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedTask {
    pub task_id: TaskId,
    pub engineer_id: EngineerId,
    pub date: NaiveDate,
    pub hours: Hours,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTask {
    pub task_id: TaskId,
    pub reason: AssignFailure,
}

/// Outcome of one auto-assign run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAssignReport {
    pub assigned: Vec<AssignedTask>,
    pub failed: Vec<FailedTask>,
}

impl AutoAssignReport {
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty() && self.failed.is_empty()
    }
}

/// One processed task, with the engine's answer.
#[derive(Debug, Clone)]
pub struct BatchStep {
    pub task_id: TaskId,
    pub result: Result<Assignment, AssignFailure>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchDispatcher {
    engine: AssignmentEngine,
}

impl BatchDispatcher {
    pub fn new(engine: AssignmentEngine) -> Self {
        Self { engine }
    }

    /// Runs the engine over every pending planned task.
    ///
    /// Emergencies are left `New` for `EmergencyPreemptor`, which pins them to
    /// today first. Tasks that are not `New`/unassigned are skipped, so running
    /// twice assigns nothing new. Processing order is `(priority,
    /// scheduled_date, id)` ascending. A failure never stops the batch.
    pub fn run<'a>(
        &self,
        tasks: impl IntoIterator<Item = &'a mut TaskRecord>,
        engineers: &[EngineerRecord],
        ledger: &mut CapacityLedger,
    ) -> (AutoAssignReport, Vec<BatchStep>) {
        let mut pending: Vec<&mut TaskRecord> = tasks
            .into_iter()
            .filter(|t| t.kind() == TaskKind::Planned && t.is_pending())
            .collect();
        pending.sort_by_key(|t| (t.priority(), t.scheduled_date(), t.id()));

        let mut report = AutoAssignReport::default();
        let mut steps = Vec::with_capacity(pending.len());
        for task in pending {
            let result = self.engine.try_assign(task, engineers, ledger);
            match &result {
                Ok(assignment) => report.assigned.push(AssignedTask {
                    task_id: task.id(),
                    engineer_id: assignment.engineer_id,
                    date: task.scheduled_date(),
                    hours: task.total_hours(),
                }),
                Err(reason) => {
                    warn!(task_id = %task.id(), %reason, "auto-assign left task unassigned");
                    report.failed.push(FailedTask {
                        task_id: task.id(),
                        reason: *reason,
                    });
                }
            }
            steps.push(BatchStep {
                task_id: task.id(),
                result,
            });
        }

        info!(
            assigned = report.assigned.len(),
            failed = report.failed.len(),
            "auto-assign batch finished"
        );
        (report, steps)
    }
}
