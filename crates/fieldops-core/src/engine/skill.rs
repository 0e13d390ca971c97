//! Skill matching.

use crate::domain::{EngineerRecord, MachineModel};

/// Pure predicate shared by every assignment path.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkillMatcher;

impl SkillMatcher {
    /// True iff `model` is one of the engineer's skills.
    pub fn can_service(engineer: &EngineerRecord, model: &MachineModel) -> bool {
        engineer.skills.contains(model)
    }
}
