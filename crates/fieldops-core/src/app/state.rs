//! Desk state held under the mutation lock.

use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;

use tokio::sync::watch;

use super::DeskSnapshot;
use crate::config::DispatchConfig;
use crate::domain::{
    DecisionRecord, DispatchError, EngineerId, EngineerRecord, EngineerSpec, PersistedTask, TaskId, TaskRecord,
};
use crate::ledger::{CapacityLedger, CapacityLimits};
use crate::ports::IdGenerator;

/// Single source of truth for tasks, engineers and consumed capacity.
#[derive(Debug, Default)]
pub(crate) struct DeskState {
    pub(crate) tasks: BTreeMap<TaskId, TaskRecord>,
    pub(crate) engineers: BTreeMap<EngineerId, EngineerRecord>,
    pub(crate) ledger: CapacityLedger,
    pub(crate) decisions: Vec<DecisionRecord>,
    version: u64,
}

impl DeskState {
    /// Rebuilds tasks, engineers and the ledger from a persisted snapshot.
    ///
    /// Every task holding capacity is re-reserved in id order; the first one
    /// that does not fit fails the whole restore.
    pub(crate) fn restore(
        tasks: Vec<PersistedTask>,
        engineers: Vec<EngineerSpec>,
        config: &DispatchConfig,
        ids: &dyn IdGenerator,
    ) -> Result<Self, DispatchError> {
        let mut state = DeskState::default();

        for spec in engineers {
            let id = spec.id.unwrap_or_else(|| ids.generate_engineer_id());
            let record = EngineerRecord::from_spec(
                id,
                spec,
                config.default_max_hours_per_day,
                config.default_max_hours_per_week,
            );
            state.insert_engineer(record)?;
        }

        for persisted in tasks {
            let PersistedTask {
                spec,
                status,
                assigned_engineer_id,
                completed_at,
            } = persisted;
            let id = spec.id.unwrap_or_else(|| ids.generate_task_id());
            if state.tasks.contains_key(&id) {
                return Err(DispatchError::DuplicateTask(id));
            }
            let mut record = TaskRecord::from_spec(id, spec, config.travel_hours)?;
            match (status.holds_capacity(), assigned_engineer_id) {
                (false, None) => {}
                (true, Some(engineer_id)) => {
                    if !state.engineers.contains_key(&engineer_id) {
                        return Err(DispatchError::EngineerNotFound(engineer_id));
                    }
                    record.restore_state(status, Some(engineer_id), completed_at);
                }
                (true, None) => {
                    return Err(DispatchError::InvalidTask {
                        task_id: id,
                        reason: format!("{status} task has no engineer"),
                    });
                }
                (false, Some(_)) => {
                    return Err(DispatchError::InvalidTask {
                        task_id: id,
                        reason: "new task carries an engineer".to_string(),
                    });
                }
            }
            state.tasks.insert(id, record);
        }

        for task in state.tasks.values() {
            if let Some(engineer_id) = task.assigned_engineer_id() {
                state
                    .ledger
                    .reserve(engineer_id, task.scheduled_date(), task.total_hours())
                    .map_err(|_| DispatchError::SnapshotOverCapacity {
                        task_id: task.id(),
                        engineer_id,
                        date: task.scheduled_date(),
                    })?;
            }
        }

        Ok(state)
    }

    /// Swaps in a restored state. The decision log and version survive.
    pub(crate) fn replace(&mut self, restored: DeskState) {
        let decisions = mem::take(&mut self.decisions);
        let version = self.version;
        *self = restored;
        self.decisions = decisions;
        self.version = version;
    }

    pub(crate) fn insert_engineer(&mut self, record: EngineerRecord) -> Result<(), DispatchError> {
        if self.engineers.contains_key(&record.id) {
            return Err(DispatchError::DuplicateEngineer(record.id));
        }
        self.ledger.set_limits(record.id, CapacityLimits::from(&record));
        self.engineers.insert(record.id, record);
        Ok(())
    }

    /// Engineer snapshot handed to the engine, in id order.
    pub(crate) fn roster(&self) -> Vec<EngineerRecord> {
        self.engineers.values().cloned().collect()
    }

    pub(crate) fn publish(&mut self, tx: &watch::Sender<Arc<DeskSnapshot>>) {
        self.version += 1;
        tx.send_replace(Arc::new(DeskSnapshot {
            version: self.version,
            tasks: self.tasks.clone(),
            engineers: self.engineers.clone(),
            ledger: self.ledger.clone(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{day, engineer_id, task_id};
    use crate::domain::{Hours, TaskSpec, TaskStatus};
    use crate::ports::{FixedClock, UlidGenerator};
    use chrono::{TimeZone, Utc};

    fn ids() -> UlidGenerator<FixedClock> {
        UlidGenerator::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 4, 15, 8, 0, 0).unwrap()))
    }

    fn ivanov() -> EngineerSpec {
        EngineerSpec::new("Ivanov I.I.")
            .with_id(engineer_id(1))
            .with_skill("CoffeeMaster3000")
    }

    fn coffee(n: u64, estimated: u32) -> TaskSpec {
        TaskSpec::planned(format!("t{n}"), "CoffeeMaster3000", Hours::whole(estimated), day(15)).with_id(task_id(n))
    }

    #[test]
    fn restore_rebuilds_the_ledger() {
        let tasks = vec![
            PersistedTask::assigned_to(coffee(1, 3), engineer_id(1)),
            PersistedTask::unassigned(coffee(2, 3)),
        ];

        let state = DeskState::restore(tasks, vec![ivanov()], &DispatchConfig::default(), &ids()).unwrap();

        assert_eq!(state.ledger.daily_load(engineer_id(1), day(15)), Hours::whole(5));
        assert_eq!(state.tasks[&task_id(1)].status(), TaskStatus::Assigned);
        assert!(state.tasks[&task_id(2)].is_pending());
    }

    #[test]
    fn restore_rejects_a_snapshot_over_capacity() {
        let tasks = vec![
            PersistedTask::assigned_to(coffee(1, 4), engineer_id(1)),
            PersistedTask::assigned_to(coffee(2, 4), engineer_id(1)),
        ];

        let err = DeskState::restore(tasks, vec![ivanov()], &DispatchConfig::default(), &ids()).unwrap_err();

        assert_eq!(
            err,
            DispatchError::SnapshotOverCapacity {
                task_id: task_id(2),
                engineer_id: engineer_id(1),
                date: day(15),
            }
        );
    }

    #[test]
    fn restore_rejects_inconsistent_assignments() {
        let config = DispatchConfig::default();

        let ghost = vec![PersistedTask::assigned_to(coffee(1, 1), engineer_id(9))];
        let err = DeskState::restore(ghost, vec![ivanov()], &config, &ids()).unwrap_err();
        assert_eq!(err, DispatchError::EngineerNotFound(engineer_id(9)));

        let mut orphan = PersistedTask::unassigned(coffee(1, 1));
        orphan.status = TaskStatus::InProgress;
        let err = DeskState::restore(vec![orphan], vec![ivanov()], &config, &ids()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTask { .. }));

        let twice = vec![PersistedTask::unassigned(coffee(1, 1)), PersistedTask::unassigned(coffee(1, 2))];
        let err = DeskState::restore(twice, vec![ivanov()], &config, &ids()).unwrap_err();
        assert_eq!(err, DispatchError::DuplicateTask(task_id(1)));

        let err = DeskState::restore(vec![], vec![ivanov(), ivanov()], &config, &ids()).unwrap_err();
        assert_eq!(err, DispatchError::DuplicateEngineer(engineer_id(1)));
    }

    #[test]
    fn restore_fills_missing_ids_and_defaults() {
        let spec = EngineerSpec::new("Petrov P.P.").with_skill("SnackPro200");
        let task = TaskSpec::emergency("jammed coil", "SnackPro200", Hours::whole(2), day(15));

        let state = DeskState::restore(
            vec![PersistedTask::unassigned(task)],
            vec![spec],
            &DispatchConfig::default(),
            &ids(),
        )
        .unwrap();

        let engineer = state.engineers.values().next().unwrap();
        assert_eq!(engineer.max_hours_per_day, Hours::whole(10));
        let task = state.tasks.values().next().unwrap();
        assert_eq!(task.total_hours(), Hours::whole(4));
    }
}
