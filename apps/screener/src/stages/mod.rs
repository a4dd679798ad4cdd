// The seven pipeline stages.
// Each stage declares its inputs and output key, and turns a validated
// inference payload into artifact bytes. None of them performs I/O.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::StageError;
use crate::pipeline::stage::{LoadedInput, Stage, StageKind};

pub mod evaluation;
pub mod product;
pub mod requirements;
pub mod screening;
pub mod summary;

// Static assets expected in the prompts directory.
pub const SCREENING_TEMPLATE: &str = "job-screening-prompt.txt";
pub const MASTER_QUESTIONS: &str = "screening_questions_master.json";
pub const SCREENING_SUMMARY_TEMPLATE: &str = "screening-summary-prompt.txt";
pub const PRODUCT_PROFILE_TEMPLATE: &str = "product-profiler-prompt.txt";
pub const REQUIREMENTS_TEMPLATE: &str = "job-requirement-analyzer-prompt.txt";
pub const EVALUATION_TEMPLATE: &str = "candidate-evaluator-prompt.txt";
pub const EXECUTIVE_SUMMARY_TEMPLATE: &str = "executive-summary-prompt.txt";

const PAYLOAD: &str = "inference payload";

pub fn for_kind(kind: StageKind) -> Box<dyn Stage> {
    match kind {
        StageKind::Screening => Box::new(screening::ScreeningStage),
        StageKind::ScreeningSummary => Box::new(screening::ScreeningSummaryStage),
        StageKind::ProductProfile => Box::new(product::ProductProfileStage),
        StageKind::RequirementExtraction => Box::new(requirements::RequirementExtractionStage),
        StageKind::CandidateEvaluation => Box::new(evaluation::EvaluationStage::candidate()),
        StageKind::RoleAlignment => Box::new(evaluation::EvaluationStage::role_alignment()),
        StageKind::ExecutiveSummary => Box::new(summary::ExecutiveSummaryStage),
    }
}

pub fn registry() -> Vec<Box<dyn Stage>> {
    StageKind::ALL.into_iter().map(for_kind).collect()
}

/// Decodes the adapter's value into the stage's typed record.
pub(crate) fn decode_payload<T: DeserializeOwned>(payload: Value) -> Result<T, StageError> {
    serde_json::from_value(payload).map_err(|e| StageError::schema(PAYLOAD, e.to_string()))
}

/// Decodes a previously persisted upstream artifact.
pub(crate) fn decode_input<T: DeserializeOwned>(input: &LoadedInput) -> Result<T, StageError> {
    serde_json::from_slice(&input.bytes)
        .map_err(|e| StageError::schema(input.key.to_string(), e.to_string()))
}

pub(crate) fn pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, StageError> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| StageError::schema("artifact serialization", e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Summary artifacts: one header line with the scalar verdict, then the narrative.
pub(crate) fn markdown_with_header(header: &str, narrative: &str) -> Vec<u8> {
    format!("{header}\n\n{}\n", narrative.trim()).into_bytes()
}
