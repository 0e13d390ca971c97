//! fieldops-core
//!
//! Dispatch and workload balancing for vending-machine field engineers.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, hours, task, engineer, errors, decision）
//! - **ledger**: 消費済みキャパシティ（日次・週次）
//! - **engine**: 割り当てロジック（skill, assign, batch, emergency, report）
//! - **app**: DispatchDesk（唯一のミューテーション境界）と builder
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, AlertSink）
//! - **impls**: ports の実装（LogAlertSink, InMemoryAlertSink）
//! - **config**: DispatchConfig
//!
//! Invariants kept after every mutation:
//! - per engineer and day, booked hours stay within `max_hours_per_day`
//! - per engineer and ISO week, booked hours stay within `max_hours_per_week`
//! - a task has at most one engineer, and holds capacity exactly while it has one

pub mod app;
pub mod config;
pub mod domain;
pub mod engine;
pub mod impls;
pub mod ledger;
pub mod ports;

pub use app::{DeskBuilder, DeskSnapshot, DispatchDesk};
pub use config::{ConfigError, DispatchConfig};
pub use domain::{
    AssignFailure, DecisionRecord, DispatchError, EngineerId, EngineerRecord, EngineerSpec, EngineerStatus, Hours,
    MachineModel, PersistedTask, Priority, TaskId, TaskKind, TaskRecord, TaskSpec, TaskStatus,
};
pub use engine::{AutoAssignReport, EmergencyOutcome, WorkloadStats};
