//! Executive summary: the hiring-manager view of one candidate against one
//! posting.
//!
//! The fit percentage is recomputed from the evaluation records rather than
//! trusted from the model:
//!
//!   fit = Σ weight(answer = Yes) / Σ weight × 100, rounded to one decimal
//!
//! with Core requirements weighted 2 and Preferred 1. The recommendation is
//! then derived from the fit: ≥ 80 Strong Fit, ≥ 50 Potential Fit, otherwise
//! Not a Match.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::artifacts::{PathResolver, Target};
use crate::errors::StageError;
use crate::inference::{Field, OutputContract, Shape};
use crate::models::{Answer, EvaluationRecord};
use crate::pipeline::stage::{
    Artifact, InputRole, InputSpec, LoadedInputs, Stage, StageKind, StagePlan,
};
use crate::stages::{
    decode_input, decode_payload, markdown_with_header, EXECUTIVE_SUMMARY_TEMPLATE,
};

const FIT_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Fit")]
    StrongFit,
    #[serde(rename = "Potential Fit")]
    PotentialFit,
    #[serde(rename = "Not a Match")]
    NotAMatch,
}

impl Recommendation {
    pub fn from_fit(fit: f64) -> Self {
        if fit >= 80.0 {
            Recommendation::StrongFit
        } else if fit >= 50.0 {
            Recommendation::PotentialFit
        } else {
            Recommendation::NotAMatch
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::StrongFit => "Strong Fit",
            Recommendation::PotentialFit => "Potential Fit",
            Recommendation::NotAMatch => "Not a Match",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessSummary {
    pub fit_percentage: f64,
    pub recommendation: Recommendation,
    pub markdown_content: String,
}

/// Weighted share of requirements answered "Yes". An empty set scores 0.
pub fn fit_percentage(records: &[EvaluationRecord]) -> f64 {
    let total: u32 = records.iter().map(|r| r.priority.weight()).sum();
    if total == 0 {
        return 0.0;
    }
    let met: u32 = records
        .iter()
        .filter(|r| r.answer == Answer::Yes)
        .map(|r| r.priority.weight())
        .sum();

    let fit = f64::from(met) / f64::from(total) * 100.0;
    (fit * 10.0).round() / 10.0
}

pub struct ExecutiveSummaryStage;

impl Stage for ExecutiveSummaryStage {
    fn kind(&self) -> StageKind {
        StageKind::ExecutiveSummary
    }

    fn plan(&self, paths: &PathResolver, target: &Target) -> StagePlan {
        StagePlan {
            kind: self.kind(),
            template: paths.asset(EXECUTIVE_SUMMARY_TEMPLATE),
            // Role alignment carries the STAR evidence, so it wins when present.
            inputs: vec![InputSpec::first_of(
                InputRole::Evaluation,
                "CANDIDATE EVALUATION DATA",
                vec![paths.role_alignment(target), paths.candidate_evaluation(target)],
            )],
            trailer: None,
            output: paths.executive_summary(target),
        }
    }

    fn contract(&self) -> OutputContract {
        OutputContract::record(
            "executive_summary",
            vec![
                Field::new("fit_percentage", Shape::Number),
                Field::new(
                    "recommendation",
                    Shape::Enum(&["Strong Fit", "Potential Fit", "Not a Match"]),
                ),
                Field::new("markdown_content", Shape::Text)
                    .described("The full executive summary in Markdown format."),
            ],
        )
    }

    fn finalize(&self, inputs: &LoadedInputs, payload: Value) -> Result<Artifact, StageError> {
        let evaluation = inputs.expect_role(InputRole::Evaluation)?;
        let records: Vec<EvaluationRecord> = decode_input(evaluation)?;
        let summary: FitnessSummary = decode_payload(payload)?;

        let fit = fit_percentage(&records);
        let recommendation = Recommendation::from_fit(fit);

        if (summary.fit_percentage - fit).abs() > FIT_TOLERANCE
            || summary.recommendation != recommendation
        {
            warn!(
                reported_fit = summary.fit_percentage,
                reported = %summary.recommendation,
                computed_fit = fit,
                computed = %recommendation,
                source = %evaluation.key,
                "Model fit disagrees with evaluation records; using computed value"
            );
        }

        let verdict = format!("{fit:.1}% ({recommendation})");
        Ok(Artifact {
            bytes: markdown_with_header(&format!("**Fit:** {verdict}"), &summary.markdown_content),
            note: Some(format!("Result: {recommendation} ({fit:.1}%)")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactKey;
    use crate::models::evaluation::EvidenceStrength;
    use crate::models::Priority;
    use crate::pipeline::stage::LoadedInput;
    use bytes::Bytes;
    use serde_json::json;
    use std::path::Path;

    fn rec(priority: Priority, answer: Answer) -> EvaluationRecord {
        EvaluationRecord {
            question: "Q".into(),
            requirement: "R".into(),
            priority,
            answer,
            evidence_strength: EvidenceStrength::Moderate,
            justification: "J".into(),
        }
    }

    fn inputs_with(records: &[EvaluationRecord]) -> LoadedInputs {
        LoadedInputs::new(vec![LoadedInput {
            role: InputRole::Evaluation,
            key: ArtifactKey::from("/work/postings/acme/evaluations/alice_evaluation.json"),
            bytes: Bytes::from(serde_json::to_vec(records).unwrap()),
        }])
    }

    #[test]
    fn test_fit_weights_core_double() {
        let records = [
            rec(Priority::Core, Answer::Yes),
            rec(Priority::Core, Answer::Yes),
            rec(Priority::Preferred, Answer::No),
        ];
        assert_eq!(fit_percentage(&records), 80.0);
    }

    #[test]
    fn test_fit_rounds_to_one_decimal() {
        let records = [
            rec(Priority::Preferred, Answer::Yes),
            rec(Priority::Preferred, Answer::No),
            rec(Priority::Preferred, Answer::No),
        ];
        assert_eq!(fit_percentage(&records), 33.3);
    }

    #[test]
    fn test_fit_of_empty_set_is_zero() {
        assert_eq!(fit_percentage(&[]), 0.0);
    }

    #[test]
    fn test_recommendation_thresholds() {
        assert_eq!(Recommendation::from_fit(80.0), Recommendation::StrongFit);
        assert_eq!(Recommendation::from_fit(79.9), Recommendation::PotentialFit);
        assert_eq!(Recommendation::from_fit(50.0), Recommendation::PotentialFit);
        assert_eq!(Recommendation::from_fit(49.9), Recommendation::NotAMatch);
    }

    #[test]
    fn test_header_uses_computed_fit_over_model_value() {
        let records = [
            rec(Priority::Core, Answer::Yes),
            rec(Priority::Core, Answer::Yes),
            rec(Priority::Preferred, Answer::No),
        ];
        let payload = json!({
            "fit_percentage": 95.0,
            "recommendation": "Potential Fit",
            "markdown_content": "## Alice\nSolid backend engineer."
        });

        let artifact = ExecutiveSummaryStage
            .finalize(&inputs_with(&records), payload)
            .unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.starts_with("**Fit:** 80.0% (Strong Fit)\n\n## Alice"));
        assert_eq!(artifact.note.as_deref(), Some("Result: Strong Fit (80.0%)"));
    }

    #[test]
    fn test_unknown_recommendation_is_a_schema_violation() {
        let payload = json!({
            "fit_percentage": 10.0,
            "recommendation": "Maybe",
            "markdown_content": "text"
        });
        let err = ExecutiveSummaryStage
            .finalize(&inputs_with(&[]), payload)
            .unwrap_err();
        assert_eq!(err.code(), "SCHEMA_VIOLATION");
    }

    #[test]
    fn test_plan_prefers_role_alignment() {
        let paths = PathResolver::new("/work", Some(Path::new("/work")), Path::new("prompts"));
        let target = paths.target(
            Path::new("postings/acme"),
            Some(Path::new("candidates/alice")),
        );
        let plan = ExecutiveSummaryStage.plan(&paths, &target);
        assert_eq!(
            plan.inputs[0].sources,
            vec![paths.role_alignment(&target), paths.candidate_evaluation(&target)]
        );
    }
}
