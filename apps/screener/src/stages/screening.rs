//! Posting screening: red-flag questions and the GO / CAUTION / NO-GO summary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifacts::{PathResolver, Target};
use crate::errors::StageError;
use crate::inference::{Field, OutputContract, Shape};
use crate::models::Answer;
use crate::pipeline::stage::{
    Artifact, InputRole, InputSpec, LoadedInputs, Stage, StageKind, StagePlan,
};
use crate::stages::{
    decode_payload, markdown_with_header, pretty_json, MASTER_QUESTIONS,
    SCREENING_SUMMARY_TEMPLATE, SCREENING_TEMPLATE,
};

/// Answer to one master screening question. A "Yes" is a potential red flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub category: String,
    pub question: String,
    pub answer: Answer,
    /// Direct quote or specific observation from the posting.
    pub evidence: String,
    pub risk_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "CAUTION")]
    Caution,
    #[serde(rename = "NO-GO")]
    NoGo,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Go => "GO",
            Verdict::Caution => "CAUTION",
            Verdict::NoGo => "NO-GO",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningSummary {
    pub futility_score: f64,
    pub verdict: Verdict,
    pub markdown_content: String,
}

pub struct ScreeningStage;

impl Stage for ScreeningStage {
    fn kind(&self) -> StageKind {
        StageKind::Screening
    }

    fn plan(&self, paths: &PathResolver, target: &Target) -> StagePlan {
        StagePlan {
            kind: self.kind(),
            template: paths.asset(SCREENING_TEMPLATE),
            inputs: vec![
                InputSpec::required(
                    InputRole::MasterQuestions,
                    "MASTER SCREENING QUESTIONS (JSON)",
                    paths.asset(MASTER_QUESTIONS),
                ),
                InputSpec::required(
                    InputRole::PostingText,
                    "JOB POSTING TO ANALYZE",
                    paths.posting_text(target),
                ),
            ],
            trailer: None,
            output: paths.screening_report(target),
        }
    }

    fn contract(&self) -> OutputContract {
        OutputContract::list_of(
            "screening_report",
            vec![
                Field::new("category", Shape::Text),
                Field::new("question", Shape::Text),
                Field::new("answer", Shape::Enum(&["Yes", "No"])),
                Field::new("evidence", Shape::Text)
                    .described("Direct quote or specific observation from the posting."),
                Field::new("risk_level", Shape::Text),
            ],
        )
    }

    fn finalize(&self, _inputs: &LoadedInputs, payload: Value) -> Result<Artifact, StageError> {
        let results: Vec<ScreeningResult> = decode_payload(payload)?;
        let red_flags = results.iter().filter(|r| r.answer == Answer::Yes).count();

        Ok(Artifact {
            bytes: pretty_json(&results)?,
            note: Some(format!("{red_flags} potential red flags identified.")),
        })
    }
}

pub struct ScreeningSummaryStage;

impl Stage for ScreeningSummaryStage {
    fn kind(&self) -> StageKind {
        StageKind::ScreeningSummary
    }

    fn plan(&self, paths: &PathResolver, target: &Target) -> StagePlan {
        StagePlan {
            kind: self.kind(),
            template: paths.asset(SCREENING_SUMMARY_TEMPLATE),
            inputs: vec![InputSpec::required(
                InputRole::ScreeningReport,
                "SCREENING DATA",
                paths.screening_report(target),
            )],
            trailer: None,
            output: paths.screening_summary(target),
        }
    }

    fn contract(&self) -> OutputContract {
        OutputContract::record(
            "screening_summary",
            vec![
                Field::new("futility_score", Shape::Number),
                Field::new("verdict", Shape::Enum(&["GO", "CAUTION", "NO-GO"])),
                Field::new("markdown_content", Shape::Text)
                    .described("The full summary in Markdown format."),
            ],
        )
    }

    fn finalize(&self, _inputs: &LoadedInputs, payload: Value) -> Result<Artifact, StageError> {
        let summary: ScreeningSummary = decode_payload(payload)?;
        let verdict_line = format!(
            "{} (futility score {})",
            summary.verdict, summary.futility_score
        );

        Ok(Artifact {
            bytes: markdown_with_header(
                &format!("**Verdict:** {verdict_line}"),
                &summary.markdown_content,
            ),
            note: Some(format!("Verdict: {verdict_line}")),
        })
    }
}
