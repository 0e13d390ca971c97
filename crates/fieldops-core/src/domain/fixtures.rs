//! Shared test fixtures.

use chrono::NaiveDate;
use ulid::Ulid;

use super::{EngineerId, EngineerRecord, EngineerSpec, Hours, TaskId, TaskRecord, TaskSpec};
use crate::ledger::{CapacityLedger, CapacityLimits};

/// Deterministic task id; smaller `n` sorts first.
pub(crate) fn task_id(n: u64) -> TaskId {
    TaskId::from_ulid(Ulid::from_parts(0, n as u128))
}

/// Deterministic engineer id; smaller `n` sorts first.
pub(crate) fn engineer_id(n: u64) -> EngineerId {
    EngineerId::from_ulid(Ulid::from_parts(0, n as u128))
}

/// April 2024. The 15th is a Monday.
pub(crate) fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, d).expect("valid April 2024 date")
}

/// Engineer with the default 10h/day, 40h/week ceilings.
pub(crate) fn engineer(n: u64, skills: &[&str]) -> EngineerRecord {
    let spec = skills
        .iter()
        .fold(EngineerSpec::new(format!("engineer-{n}")), |spec, skill| {
            spec.with_skill(*skill)
        });
    EngineerRecord::from_spec(engineer_id(n), spec, Hours::whole(10), Hours::whole(40))
}

/// Planned task with 2h travel; total = `estimated + 2`.
pub(crate) fn planned(n: u64, model: &str, estimated: u32, date: NaiveDate) -> TaskRecord {
    TaskRecord::from_spec(
        task_id(n),
        TaskSpec::planned(format!("task-{n}"), model, Hours::whole(estimated), date),
        Hours::whole(2),
    )
    .expect("valid fixture task")
}

/// Emergency task with 2h travel.
pub(crate) fn emergency(n: u64, model: &str, estimated: u32, date: NaiveDate) -> TaskRecord {
    TaskRecord::from_spec(
        task_id(n),
        TaskSpec::emergency(format!("emergency-{n}"), model, Hours::whole(estimated), date),
        Hours::whole(2),
    )
    .expect("valid fixture task")
}

/// Ledger with every engineer's ceilings registered.
pub(crate) fn ledger_for(engineers: &[EngineerRecord]) -> CapacityLedger {
    let mut ledger = CapacityLedger::new();
    for engineer in engineers {
        ledger.set_limits(engineer.id, CapacityLimits::from(engineer));
    }
    ledger
}
