//! Decision records: the audit trail of the dispatcher.
//!
//! Every commit, rejection and displacement leaves one record so that
//! "why is this task on that engineer" can be answered later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskId;

/// Policy names used in `DecisionRecord::policy`.
pub mod policy {
    pub const AUTO_ASSIGN: &str = "auto_assign";
    pub const MANUAL_ASSIGN: &str = "manual_assign";
    pub const EMERGENCY: &str = "emergency_preemption";
    pub const DISPLACEMENT: &str = "emergency_displacement";
    pub const OPERATOR: &str = "operator";
}

/// A decision made by the dispatcher.
///
/// - `trigger`: what was looked at (candidates, loads, the failing reason)
/// - `policy`: which flow made the call
/// - `decision`: what happened ("assigned", "rejected", "moved", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub task_id: TaskId,
    pub trigger: serde_json::Value,
    pub policy: String,
    pub decision: String,
    pub decided_at: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn new(
        task_id: TaskId,
        trigger: serde_json::Value,
        policy: impl Into<String>,
        decision: impl Into<String>,
        decided_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            trigger,
            policy: policy.into(),
            decision: decision.into(),
            decided_at,
        }
    }
}
