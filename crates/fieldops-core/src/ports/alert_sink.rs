//! AlertSink port - 運用アラートの通知
//!
//! An emergency that cannot be staffed is never dropped silently: the desk
//! raises a `DispatchAlert` here. Delivery (mail, push, Kafka) belongs to
//! the notification service; this crate ships a logging sink and an
//! in-memory sink for tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AssignFailure, MachineModel, TaskId, TaskRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchAlert {
    pub task_id: TaskId,
    pub machine_model: MachineModel,
    pub scheduled_date: NaiveDate,
    pub reason: AssignFailure,
    pub raised_at: DateTime<Utc>,
}

impl DispatchAlert {
    pub fn for_task(task: &TaskRecord, reason: AssignFailure, raised_at: DateTime<Utc>) -> Self {
        Self {
            task_id: task.id(),
            machine_model: task.machine_model().clone(),
            scheduled_date: task.scheduled_date(),
            reason,
            raised_at,
        }
    }
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn raise(&self, alert: DispatchAlert);
}
