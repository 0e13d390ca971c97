//! Field engineer model.
//!
//! An engineer is a read-only snapshot for the engine: skills, ceilings and
//! availability. Consumed hours live in the `CapacityLedger`, never here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{EngineerId, Hours};

/// Vending machine model name, also the skill needed to service it.
///
/// Surrounding whitespace is trimmed on construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MachineModel(String);

impl MachineModel {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self(name.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for MachineModel {
    fn from(value: String) -> Self {
        MachineModel::new(value)
    }
}

impl From<&str> for MachineModel {
    fn from(value: &str) -> Self {
        MachineModel::new(value)
    }
}

impl From<MachineModel> for String {
    fn from(value: MachineModel) -> Self {
        value.0
    }
}

impl fmt::Display for MachineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Availability flag from the personnel subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineerStatus {
    #[default]
    Available,
    /// On leave, sick, etc. Never a candidate.
    Unavailable,
}

/// Intake payload for an engineer. Missing ceilings take the configured defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineerSpec {
    #[serde(default)]
    pub id: Option<EngineerId>,
    pub name: String,
    #[serde(default)]
    pub skills: BTreeSet<MachineModel>,
    #[serde(default)]
    pub max_hours_per_day: Option<Hours>,
    #[serde(default)]
    pub max_hours_per_week: Option<Hours>,
    #[serde(default)]
    pub status: EngineerStatus,
}

impl EngineerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            skills: BTreeSet::new(),
            max_hours_per_day: None,
            max_hours_per_week: None,
            status: EngineerStatus::Available,
        }
    }

    pub fn with_id(mut self, id: EngineerId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_skill(mut self, model: impl Into<MachineModel>) -> Self {
        self.skills.insert(model.into());
        self
    }

    pub fn with_limits(mut self, per_day: Hours, per_week: Hours) -> Self {
        self.max_hours_per_day = Some(per_day);
        self.max_hours_per_week = Some(per_week);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.status = EngineerStatus::Unavailable;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineerRecord {
    pub id: EngineerId,
    pub name: String,
    pub skills: BTreeSet<MachineModel>,
    pub max_hours_per_day: Hours,
    pub max_hours_per_week: Hours,
    pub status: EngineerStatus,
}

impl EngineerRecord {
    pub fn from_spec(
        id: EngineerId,
        spec: EngineerSpec,
        default_per_day: Hours,
        default_per_week: Hours,
    ) -> Self {
        Self {
            id,
            name: spec.name,
            skills: spec.skills,
            max_hours_per_day: spec.max_hours_per_day.unwrap_or(default_per_day),
            max_hours_per_week: spec.max_hours_per_week.unwrap_or(default_per_week),
            status: spec.status,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == EngineerStatus::Available
    }
}
