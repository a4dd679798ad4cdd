use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifacts::{PathResolver, Target};
use crate::errors::StageError;
use crate::inference::{Field, OutputContract, Shape};
use crate::pipeline::stage::{
    Artifact, InputRole, InputSpec, LoadedInputs, Stage, StageKind, StagePlan,
};
use crate::stages::{decode_payload, pretty_json, PRODUCT_PROFILE_TEMPLATE};

const NO_CONTEXT: &str = "No additional context provided.";
const GROUNDING_TRAILER: &str = "INSTRUCTION: Use ONLY the provided Job Posting and Product Context. \
    If details are missing, state 'Not specified' rather than hallucinating.";

/// What the hiring team is building, as far as the posting reveals it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductProfile {
    pub product_name: String,
    pub target_audience: String,
    pub core_problem_solved: String,
    pub technical_stack_mentioned: Vec<String>,
    /// e.g. MVP, Scaling, Legacy, R&D
    pub product_maturity: String,
    pub markdown_summary: String,
}

pub struct ProductProfileStage;

impl Stage for ProductProfileStage {
    fn kind(&self) -> StageKind {
        StageKind::ProductProfile
    }

    fn plan(&self, paths: &PathResolver, target: &Target) -> StagePlan {
        StagePlan {
            kind: self.kind(),
            template: paths.asset(PRODUCT_PROFILE_TEMPLATE),
            inputs: vec![
                InputSpec::required(InputRole::PostingText, "JOB POSTING", paths.posting_text(target)),
                InputSpec::optional(
                    InputRole::ProductContext,
                    "USER-PROVIDED PRODUCT CONTEXT",
                    paths.product_context(target),
                    Some(NO_CONTEXT),
                ),
            ],
            trailer: Some(GROUNDING_TRAILER),
            output: paths.product_profile(target),
        }
    }

    fn contract(&self) -> OutputContract {
        OutputContract::record(
            "product_profile",
            vec![
                Field::new("product_name", Shape::Text),
                Field::new("target_audience", Shape::Text),
                Field::new("core_problem_solved", Shape::Text),
                Field::new("technical_stack_mentioned", Shape::List(Box::new(Shape::Text))),
                Field::new("product_maturity", Shape::Text)
                    .described("e.g., MVP, Scaling, Legacy, R&D"),
                Field::new("markdown_summary", Shape::Text)
                    .described("A concise 2-paragraph description of the product."),
            ],
        )
    }

    fn finalize(&self, inputs: &LoadedInputs, payload: Value) -> Result<Artifact, StageError> {
        let profile: ProductProfile = decode_payload(payload)?;
        let context = if inputs.get(InputRole::ProductContext).is_some() {
            "with operator context"
        } else {
            "from posting only"
        };

        Ok(Artifact {
            bytes: pretty_json(&profile)?,
            note: Some(format!(
                "Profiled {} ({}), {context}.",
                profile.product_name, profile.product_maturity
            )),
        })
    }
}
