use serde::{Deserialize, Serialize};

/// How much a requirement counts towards a candidate's fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Core,
    Preferred,
}

impl Priority {
    /// Pinned weighting rule for fit scoring: Core 2, Preferred 1.
    pub fn weight(self) -> u32 {
        match self {
            Priority::Core => 2,
            Priority::Preferred => 1,
        }
    }
}

/// A single binary requirement extracted from a posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Yes/No question for the skill.
    pub question: String,
    /// Original snippet from the job posting.
    pub requirement: String,
    pub priority: Priority,
}

/// The ordered requirement list produced once per posting (`questions.json`).
pub type RequirementSet = Vec<Requirement>;
