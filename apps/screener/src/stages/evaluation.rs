//! Candidate evaluation and role alignment.
//!
//! Both stages answer every extracted requirement for one candidate. Role
//! alignment differs only in that the STAR experiences are mandatory and the
//! result is filed under the candidate rather than the posting.

use serde_json::Value;

use crate::artifacts::{PathResolver, Target};
use crate::errors::StageError;
use crate::inference::{Field, OutputContract, Shape};
use crate::models::{Answer, EvaluationRecord, RequirementSet};
use crate::pipeline::stage::{
    Artifact, InputRole, InputSpec, LoadedInputs, Stage, StageKind, StagePlan,
};
use crate::stages::{decode_input, decode_payload, pretty_json, EVALUATION_TEMPLATE};

pub struct EvaluationStage {
    kind: StageKind,
}

impl EvaluationStage {
    pub fn candidate() -> Self {
        Self {
            kind: StageKind::CandidateEvaluation,
        }
    }

    pub fn role_alignment() -> Self {
        Self {
            kind: StageKind::RoleAlignment,
        }
    }
}

impl Stage for EvaluationStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    fn plan(&self, paths: &PathResolver, target: &Target) -> StagePlan {
        let experiences = match self.kind {
            StageKind::RoleAlignment => InputSpec::required(
                InputRole::Experiences,
                "DETAILED STAR EXPERIENCES",
                paths.experiences(target),
            ),
            _ => InputSpec::optional(
                InputRole::Experiences,
                "DETAILED STAR EXPERIENCES",
                paths.experiences(target),
                None,
            ),
        };
        let output = match self.kind {
            StageKind::RoleAlignment => paths.role_alignment(target),
            _ => paths.candidate_evaluation(target),
        };

        StagePlan {
            kind: self.kind,
            template: paths.asset(EVALUATION_TEMPLATE),
            inputs: vec![
                InputSpec::required(
                    InputRole::Requirements,
                    "REQUIREMENTS",
                    paths.requirements(target),
                ),
                InputSpec::required(InputRole::Resume, "RESUME", paths.resume(target)),
                experiences,
                InputSpec::required(
                    InputRole::PostingText,
                    "POSTING CONTEXT",
                    paths.posting_text(target),
                ),
            ],
            trailer: None,
            output,
        }
    }

    fn contract(&self) -> OutputContract {
        OutputContract::list_of(
            "evaluation",
            vec![
                Field::new("question", Shape::Text)
                    .described("The requirement question, copied verbatim."),
                Field::new("requirement", Shape::Text),
                Field::new("priority", Shape::Enum(&["Core", "Preferred"])),
                Field::new("answer", Shape::Enum(&["Yes", "No"])),
                Field::new(
                    "evidence_strength",
                    Shape::Enum(&["Strong", "Moderate", "Weak", "None"]),
                ),
                Field::new("justification", Shape::Text)
                    .described("Cite the resume or experience that supports the answer."),
            ],
        )
    }

    fn finalize(&self, inputs: &LoadedInputs, payload: Value) -> Result<Artifact, StageError> {
        let requirements: RequirementSet =
            decode_input(inputs.expect_role(InputRole::Requirements)?)?;
        let records: Vec<EvaluationRecord> = decode_payload(payload)?;
        check_alignment(&requirements, &records)?;

        let met = records.iter().filter(|r| r.answer == Answer::Yes).count();
        Ok(Artifact {
            bytes: pretty_json(&records)?,
            note: Some(format!("{met}/{} requirements met.", records.len())),
        })
    }
}

/// One record per requirement, in requirement order, carrying the same
/// question and priority.
pub fn check_alignment(
    requirements: &RequirementSet,
    records: &[EvaluationRecord],
) -> Result<(), StageError> {
    if records.len() != requirements.len() {
        return Err(StageError::schema(
            "inference payload",
            format!(
                "expected {} evaluation records, one per requirement, got {}",
                requirements.len(),
                records.len()
            ),
        ));
    }

    for (i, (req, rec)) in requirements.iter().zip(records).enumerate() {
        if req.question.trim() != rec.question.trim() {
            return Err(StageError::schema(
                "inference payload",
                format!(
                    "record {i} answers {:?} but requirement {i} asks {:?}",
                    rec.question, req.question
                ),
            ));
        }
        if req.priority != rec.priority {
            return Err(StageError::schema(
                "inference payload",
                format!(
                    "record {i} has priority {:?}, requirement is {:?}",
                    rec.priority, req.priority
                ),
            ));
        }
    }
    Ok(())
}
