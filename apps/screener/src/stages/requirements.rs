//! Requirement extraction: turns a raw posting into the ordered `RequirementSet`
//! every candidate evaluation is measured against.

use serde_json::Value;

use crate::artifacts::{PathResolver, Target};
use crate::errors::StageError;
use crate::inference::{Field, OutputContract, Shape};
use crate::models::{Priority, RequirementSet};
use crate::pipeline::stage::{
    Artifact, InputRole, InputSpec, LoadedInputs, Stage, StageKind, StagePlan,
};
use crate::stages::{decode_payload, pretty_json, REQUIREMENTS_TEMPLATE};

pub struct RequirementExtractionStage;

impl Stage for RequirementExtractionStage {
    fn kind(&self) -> StageKind {
        StageKind::RequirementExtraction
    }

    fn plan(&self, paths: &PathResolver, target: &Target) -> StagePlan {
        StagePlan {
            kind: self.kind(),
            template: paths.asset(REQUIREMENTS_TEMPLATE),
            inputs: vec![InputSpec::required(
                InputRole::PostingText,
                "JOB POSTING",
                paths.posting_text(target),
            )],
            trailer: None,
            output: paths.requirements(target),
        }
    }

    fn contract(&self) -> OutputContract {
        OutputContract::list_of(
            "requirements",
            vec![
                Field::new("question", Shape::Text).described("Yes/No question for the skill."),
                Field::new("requirement", Shape::Text)
                    .described("Original snippet from the job posting."),
                Field::new("priority", Shape::Enum(&["Core", "Preferred"])),
            ],
        )
    }

    fn finalize(&self, _inputs: &LoadedInputs, payload: Value) -> Result<Artifact, StageError> {
        let requirements: RequirementSet = decode_payload(payload)?;
        if requirements.is_empty() {
            return Err(StageError::schema(
                "inference payload",
                "no requirements were extracted from the posting",
            ));
        }

        let core = requirements
            .iter()
            .filter(|r| r.priority == Priority::Core)
            .count();
        let preferred = requirements.len() - core;

        Ok(Artifact {
            bytes: pretty_json(&requirements)?,
            note: Some(format!(
                "Extracted {} requirements ({core} Core, {preferred} Preferred).",
                requirements.len()
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finalize_keeps_extraction_order() {
        let payload = json!([
            {"question": "Has the candidate shipped Rust in production?", "requirement": "5+ years Rust", "priority": "Core"},
            {"question": "Has the candidate run Kafka?", "requirement": "Kafka a plus", "priority": "Preferred"},
            {"question": "Has the candidate built distributed systems?", "requirement": "Distributed systems", "priority": "Core"}
        ]);

        let artifact = RequirementExtractionStage
            .finalize(&LoadedInputs::default(), payload)
            .unwrap();
        let stored: RequirementSet = serde_json::from_slice(&artifact.bytes).unwrap();

        assert_eq!(stored.len(), 3);
        assert_eq!(stored[1].requirement, "Kafka a plus");
        assert_eq!(stored[2].priority, Priority::Core);
        assert_eq!(
            artifact.note.as_deref(),
            Some("Extracted 3 requirements (2 Core, 1 Preferred).")
        );
    }

    #[test]
    fn test_empty_extraction_is_a_schema_violation() {
        let err = RequirementExtractionStage
            .finalize(&LoadedInputs::default(), json!([]))
            .unwrap_err();
        assert_eq!(err.code(), "SCHEMA_VIOLATION");
    }

    #[test]
    fn test_unknown_priority_is_a_schema_violation() {
        let payload = json!([
            {"question": "Q", "requirement": "R", "priority": "Bonus"}
        ]);
        assert!(RequirementExtractionStage
            .finalize(&LoadedInputs::default(), payload)
            .is_err());
    }
}
