//! Single-task assignment.
//!
//! `try_assign` is the only code path that sets `assigned_engineer_id`.
//! It never looks at priority; ordering across tasks belongs to the callers.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, info};

use super::SkillMatcher;
use crate::domain::{AssignFailure, EngineerId, EngineerRecord, Hours, TaskRecord};
use crate::ledger::{CapacityLedger, CapacityLimits};

/// A candidate that passed the availability and skill filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub engineer_id: EngineerId,
    pub remaining_daily: Hours,
    pub remaining_weekly: Hours,
}

/// A committed assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub engineer_id: EngineerId,
    /// Ranking as seen when the decision was made, best first.
    pub ranking: Vec<RankedCandidate>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentEngine;

impl AssignmentEngine {
    pub fn new() -> Self {
        Self
    }

    /// Assigns `task` to the best candidate, or explains why nobody fits.
    ///
    /// Candidate ceilings are taken from the snapshot in `candidates` and
    /// written to the ledger before ranking.
    ///
    /// On success the ledger is debited and the task is `Assigned`, as one step.
    /// On failure neither the task nor the ledger has changed.
    pub fn try_assign(
        &self,
        task: &mut TaskRecord,
        candidates: &[EngineerRecord],
        ledger: &mut CapacityLedger,
    ) -> Result<Assignment, AssignFailure> {
        if !task.is_pending() {
            return Err(AssignFailure::AlreadyAssigned);
        }

        for engineer in candidates {
            ledger.set_limits(engineer.id, CapacityLimits::from(engineer));
        }
        let ranking = self.rank(task, candidates, ledger)?;

        let date = task.scheduled_date();
        let hours = task.total_hours();
        for candidate in &ranking {
            match ledger.reserve(candidate.engineer_id, date, hours) {
                Ok(()) => {
                    task.mark_assigned(candidate.engineer_id);
                    info!(
                        task_id = %task.id(),
                        engineer_id = %candidate.engineer_id,
                        %date,
                        %hours,
                        "task assigned"
                    );
                    return Ok(Assignment {
                        engineer_id: candidate.engineer_id,
                        ranking,
                    });
                }
                Err(exceeded) => {
                    debug!(task_id = %task.id(), error = %exceeded, "candidate rejected by ledger");
                }
            }
        }
        Err(AssignFailure::CapacityExceeded)
    }

    /// Filters and orders the candidates for `task`, best first.
    ///
    /// Order: remaining daily capacity desc, remaining weekly capacity desc,
    /// engineer id asc.
    pub fn rank(
        &self,
        task: &TaskRecord,
        candidates: &[EngineerRecord],
        ledger: &CapacityLedger,
    ) -> Result<Vec<RankedCandidate>, AssignFailure> {
        let available: Vec<&EngineerRecord> = candidates.iter().filter(|e| e.is_available()).collect();
        if available.is_empty() {
            return Err(AssignFailure::NoAvailableEngineer);
        }

        let date = task.scheduled_date();
        let mut ranking: Vec<RankedCandidate> = available
            .into_iter()
            .filter(|e| SkillMatcher::can_service(e, task.machine_model()))
            .map(|e| RankedCandidate {
                engineer_id: e.id,
                remaining_daily: e.max_hours_per_day.saturating_sub(ledger.daily_load(e.id, date)),
                remaining_weekly: e.max_hours_per_week.saturating_sub(ledger.weekly_load(e.id, date)),
            })
            .collect();
        if ranking.is_empty() {
            return Err(AssignFailure::SkillMismatch);
        }

        ranking.sort_by_key(|c| (Reverse(c.remaining_daily), Reverse(c.remaining_weekly), c.engineer_id));
        ranking.dedup_by_key(|c| c.engineer_id);
        debug!(task_id = %task.id(), ?ranking, "candidates ranked");
        Ok(ranking)
    }
}
