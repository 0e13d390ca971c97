//! DeskSnapshot - 読み取り専用ビュー
//!
//! Published through a `watch` channel after every mutation. Readers never
//! take the desk lock.

use std::collections::BTreeMap;

use crate::domain::{EngineerId, EngineerRecord, TaskId, TaskRecord};
use crate::ledger::CapacityLedger;

#[derive(Debug, Clone, Default)]
pub struct DeskSnapshot {
    /// Bumped on every publish; 0 is the empty desk before any mutation.
    pub version: u64,
    pub tasks: BTreeMap<TaskId, TaskRecord>,
    pub engineers: BTreeMap<EngineerId, EngineerRecord>,
    pub ledger: CapacityLedger,
}

impl DeskSnapshot {
    pub fn task(&self, task_id: TaskId) -> Option<&TaskRecord> {
        self.tasks.get(&task_id)
    }

    pub fn engineer(&self, engineer_id: EngineerId) -> Option<&EngineerRecord> {
        self.engineers.get(&engineer_id)
    }

    /// Tasks currently holding capacity on `engineer_id`, in id order.
    pub fn tasks_for(&self, engineer_id: EngineerId) -> impl Iterator<Item = &TaskRecord> {
        self.tasks
            .values()
            .filter(move |t| t.assigned_engineer_id() == Some(engineer_id))
    }

    /// Tasks waiting for an engineer, in id order.
    pub fn pending(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.values().filter(|t| t.is_pending())
    }
}
