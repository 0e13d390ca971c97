//! InMemoryAlertSink - 開発・テスト用

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::ports::{AlertSink, DispatchAlert};

/// Collects alerts. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAlertSink {
    alerts: Arc<Mutex<Vec<DispatchAlert>>>,
}

impl InMemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn alerts(&self) -> Vec<DispatchAlert> {
        self.alerts.lock().await.clone()
    }
}

#[async_trait]
impl AlertSink for InMemoryAlertSink {
    async fn raise(&self, alert: DispatchAlert) {
        self.alerts.lock().await.push(alert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{day, task_id};
    use crate::domain::{AssignFailure, MachineModel};
    use chrono::Utc;

    #[tokio::test]
    async fn clones_share_the_buffer() {
        let sink = InMemoryAlertSink::new();
        let other = sink.clone();

        other
            .raise(DispatchAlert {
                task_id: task_id(1),
                machine_model: MachineModel::new("SnackPro200"),
                scheduled_date: day(15),
                reason: AssignFailure::NoAvailableEngineer,
                raised_at: Utc::now(),
            })
            .await;

        let alerts = sink.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].reason, AssignFailure::NoAvailableEngineer);
    }
}
