use serde::{Deserialize, Serialize};

use crate::models::requirement::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceStrength {
    Strong,
    Moderate,
    Weak,
    #[serde(rename = "None")]
    Absent,
}

/// One candidate's answer to one requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub question: String,
    pub requirement: String,
    pub priority: Priority,
    pub answer: Answer,
    pub evidence_strength: EvidenceStrength,
    pub justification: String,
}
