//! Stage declarations: what a stage reads, in which order, and where it writes.

use std::fmt;

use bytes::Bytes;
use serde_json::Value;

use crate::artifacts::{ArtifactKey, PathResolver, Target};
use crate::errors::StageError;
use crate::inference::OutputContract;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    Screening,
    ScreeningSummary,
    ProductProfile,
    RequirementExtraction,
    CandidateEvaluation,
    RoleAlignment,
    ExecutiveSummary,
}

impl StageKind {
    pub const ALL: [StageKind; 7] = [
        StageKind::Screening,
        StageKind::ScreeningSummary,
        StageKind::ProductProfile,
        StageKind::RequirementExtraction,
        StageKind::CandidateEvaluation,
        StageKind::RoleAlignment,
        StageKind::ExecutiveSummary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StageKind::Screening => "screening",
            StageKind::ScreeningSummary => "screening-summary",
            StageKind::ProductProfile => "product-profile",
            StageKind::RequirementExtraction => "requirements",
            StageKind::CandidateEvaluation => "evaluate",
            StageKind::RoleAlignment => "role-alignment",
            StageKind::ExecutiveSummary => "executive-summary",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an input is, independent of where it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    PostingText,
    MasterQuestions,
    ScreeningReport,
    ProductContext,
    Requirements,
    Resume,
    Experiences,
    Evaluation,
}

impl InputRole {
    /// Static assets ship with the installation rather than being produced by
    /// the pipeline; they take no part in dependency queries.
    pub fn is_static_asset(self) -> bool {
        matches!(self, InputRole::MasterQuestions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    /// Absent optional inputs contribute `placeholder` as their section body,
    /// or drop the section entirely when there is none.
    Optional { placeholder: Option<&'static str> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub role: InputRole,
    /// Section header used when composing the request.
    pub label: &'static str,
    /// Candidate locations in preference order; the first present one is read.
    pub sources: Vec<ArtifactKey>,
    pub presence: Presence,
}

impl InputSpec {
    pub fn required(role: InputRole, label: &'static str, key: ArtifactKey) -> Self {
        Self {
            role,
            label,
            sources: vec![key],
            presence: Presence::Required,
        }
    }

    pub fn optional(
        role: InputRole,
        label: &'static str,
        key: ArtifactKey,
        placeholder: Option<&'static str>,
    ) -> Self {
        Self {
            role,
            label,
            sources: vec![key],
            presence: Presence::Optional { placeholder },
        }
    }

    pub fn first_of(role: InputRole, label: &'static str, sources: Vec<ArtifactKey>) -> Self {
        Self {
            role,
            label,
            sources,
            presence: Presence::Required,
        }
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }
}

/// Fully resolved plan for one invocation of a stage against one target.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePlan {
    pub kind: StageKind,
    pub template: ArtifactKey,
    pub inputs: Vec<InputSpec>,
    pub trailer: Option<&'static str>,
    pub output: ArtifactKey,
}

#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub role: InputRole,
    pub key: ArtifactKey,
    pub bytes: Bytes,
}

impl LoadedInput {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Inputs actually found during loading, in plan order.
#[derive(Debug, Clone, Default)]
pub struct LoadedInputs {
    items: Vec<LoadedInput>,
}

impl LoadedInputs {
    pub fn new(items: Vec<LoadedInput>) -> Self {
        Self { items }
    }

    pub fn get(&self, role: InputRole) -> Option<&LoadedInput> {
        self.items.iter().find(|i| i.role == role)
    }

    /// Looks up an input the plan declared as required. The runner has already
    /// failed with `MissingInput` if it was absent, so `None` here only happens
    /// when a stage asks for a role it never declared.
    pub fn expect_role(&self, role: InputRole) -> Result<&LoadedInput, StageError> {
        self.get(role).ok_or_else(|| {
            StageError::schema(
                "stage inputs",
                format!("input {role:?} was not loaded for this stage"),
            )
        })
    }
}

/// Serialized stage output plus an optional one-line note for the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub note: Option<String>,
}

/// A pipeline stage: a pure declaration plus a pure payload-to-bytes step.
/// All I/O is performed by the runner.
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    fn plan(&self, paths: &PathResolver, target: &Target) -> StagePlan;

    fn contract(&self) -> OutputContract;

    /// Decodes and validates the inference payload, then serializes the
    /// artifact. Any mismatch is a `SchemaViolation`.
    fn finalize(&self, inputs: &LoadedInputs, payload: Value) -> Result<Artifact, StageError>;
}
