//! Domain model (ids, hours, tasks, engineers, errors, decisions).

pub mod decision;
pub mod engineer;
pub mod errors;
pub mod hours;
pub mod ids;
pub mod task;

#[cfg(test)]
pub(crate) mod fixtures;

pub use decision::DecisionRecord;
pub use engineer::{EngineerRecord, EngineerSpec, EngineerStatus, MachineModel};
pub use errors::{AssignFailure, DispatchError};
pub use hours::{Hours, InvalidHours};
pub use ids::{EngineerId, TaskId};
pub use task::{PersistedTask, Priority, TaskKind, TaskRecord, TaskSpec, TaskStatus};
