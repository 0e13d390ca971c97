//! Engine - 割り当てロジック
//!
//! Synchronous and lock-free: every function takes the ledger explicitly, so
//! the caller decides the mutation boundary.

pub mod assign;
pub mod batch;
pub mod emergency;
pub mod report;
pub mod skill;

pub use self::assign::{Assignment, AssignmentEngine, RankedCandidate};
pub use self::batch::{AssignedTask, AutoAssignReport, BatchDispatcher, BatchStep, FailedTask};
pub use self::emergency::{Displacement, DisplacementEffect, EmergencyOutcome, EmergencyPreemptor};
pub use self::report::{EngineerLoad, WorkloadReporter, WorkloadStats};
pub use self::skill::SkillMatcher;
