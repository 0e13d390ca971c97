//! WorkloadReporter - 負荷集計
//!
//! Pure aggregation over a task list, the engineer roster and the ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{EngineerId, EngineerRecord, Hours, TaskRecord, TaskStatus};
use crate::ledger::CapacityLedger;

/// Per-engineer load for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineerLoad {
    pub engineer_id: EngineerId,
    pub name: String,
    pub available: bool,
    pub daily_load: Hours,
    pub weekly_load: Hours,
    pub remaining_daily: Hours,
    pub remaining_weekly: Hours,
    /// `daily_load / max_hours_per_day`, 0.0 when the ceiling is zero.
    pub utilization: f64,
    pub overloaded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadStats {
    pub date: NaiveDate,
    pub total_tasks: usize,
    pub emergency_tasks: usize,
    pub assigned_tasks: usize,
    pub unassigned_tasks: usize,
    pub overloaded_engineers: usize,
    pub available_engineers: usize,
    pub engineers: Vec<EngineerLoad>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadReporter {
    overload_ratio: f64,
}

impl Default for WorkloadReporter {
    fn default() -> Self {
        Self { overload_ratio: 0.8 }
    }
}

impl WorkloadReporter {
    pub fn new(overload_ratio: f64) -> Self {
        Self { overload_ratio }
    }

    /// Task counts cover every task given; engineer loads are taken on `date`.
    ///
    /// `assigned_tasks` counts tasks that hold an engineer (assigned, in
    /// progress or completed), `unassigned_tasks` the `New` ones.
    pub fn stats<'a>(
        &self,
        engineers: impl IntoIterator<Item = &'a EngineerRecord>,
        tasks: impl IntoIterator<Item = &'a TaskRecord>,
        ledger: &CapacityLedger,
        date: NaiveDate,
    ) -> WorkloadStats {
        let mut total_tasks = 0;
        let mut emergency_tasks = 0;
        let mut assigned_tasks = 0;
        for task in tasks {
            total_tasks += 1;
            if task.is_emergency() {
                emergency_tasks += 1;
            }
            if task.status() != TaskStatus::New {
                assigned_tasks += 1;
            }
        }

        let loads: Vec<EngineerLoad> = engineers
            .into_iter()
            .map(|engineer| self.engineer_load(engineer, ledger, date))
            .collect();
        let overloaded_engineers = loads.iter().filter(|l| l.overloaded).count();
        let available_engineers = loads.iter().filter(|l| l.available && !l.overloaded).count();

        WorkloadStats {
            date,
            total_tasks,
            emergency_tasks,
            assigned_tasks,
            unassigned_tasks: total_tasks - assigned_tasks,
            overloaded_engineers,
            available_engineers,
            engineers: loads,
        }
    }

    fn engineer_load(&self, engineer: &EngineerRecord, ledger: &CapacityLedger, date: NaiveDate) -> EngineerLoad {
        let daily_load = ledger.daily_load(engineer.id, date);
        let weekly_load = ledger.weekly_load(engineer.id, date);
        let ceiling = engineer.max_hours_per_day;
        let utilization = if ceiling.is_zero() {
            0.0
        } else {
            daily_load.minutes() as f64 / ceiling.minutes() as f64
        };
        EngineerLoad {
            engineer_id: engineer.id,
            name: engineer.name.clone(),
            available: engineer.is_available(),
            daily_load,
            weekly_load,
            remaining_daily: ceiling.saturating_sub(daily_load),
            remaining_weekly: engineer.max_hours_per_week.saturating_sub(weekly_load),
            utilization,
            overloaded: daily_load > ceiling.scaled(self.overload_ratio),
        }
    }
}
