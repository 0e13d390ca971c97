//! LogAlertSink - アラートを tracing に流すだけの実装

use async_trait::async_trait;
use tracing::warn;

use crate::ports::{AlertSink, DispatchAlert};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn raise(&self, alert: DispatchAlert) {
        warn!(
            task_id = %alert.task_id,
            machine_model = %alert.machine_model,
            date = %alert.scheduled_date,
            reason = %alert.reason,
            "emergency task could not be staffed"
        );
    }
}
