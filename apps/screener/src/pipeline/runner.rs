//! Stage runner: executes one stage against one target.
//!
//! State machine:
//!   NotStarted → Skipped                      (output already present)
//!   NotStarted → Loading → Requesting → Validating → Persisted
//!   any non-terminal state → Failed
//!   Validating → Skipped                      (lost the `put` race)
//!
//! Only the final `put` is durable, so a failed or killed invocation never
//! leaves a partial artifact.

use std::fmt;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::artifacts::{ArtifactKey, ArtifactStore, PathResolver, StoreError, Target};
use crate::errors::StageError;
use crate::inference::InferenceAdapter;
use crate::pipeline::stage::{LoadedInput, LoadedInputs, Presence, Stage, StageKind, StagePlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    NotStarted,
    Loading,
    Requesting,
    Validating,
    Persisted,
    Failed,
    Skipped,
}

impl StageState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StageState::Persisted | StageState::Failed | StageState::Skipped
        )
    }

    pub fn can_transition_to(self, next: StageState) -> bool {
        use StageState::*;
        match (self, next) {
            (NotStarted, Skipped) | (NotStarted, Loading) => true,
            (Loading, Requesting) => true,
            (Requesting, Validating) => true,
            (Validating, Persisted) | (Validating, Skipped) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The output existed before the invocation started.
    AlreadyPresent,
    /// Another invocation wrote the output first.
    LostRace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Persisted {
        key: ArtifactKey,
        note: Option<String>,
    },
    Skipped {
        key: ArtifactKey,
        reason: SkipReason,
    },
}

impl StageOutcome {
    pub fn key(&self) -> &ArtifactKey {
        match self {
            StageOutcome::Persisted { key, .. } | StageOutcome::Skipped { key, .. } => key,
        }
    }
}

/// Joins the instruction template and input sections in declared order.
pub fn compose_request(template: &str, sections: &[(&str, String)], trailer: Option<&str>) -> String {
    let mut parts = Vec::with_capacity(sections.len() + 2);
    parts.push(template.trim_end().to_string());
    for (label, body) in sections {
        parts.push(format!("### {label}:\n{body}"));
    }
    if let Some(trailer) = trailer {
        parts.push(trailer.to_string());
    }
    parts.join("\n\n")
}

pub struct StageRunner<'a> {
    store: &'a dyn ArtifactStore,
    adapter: &'a dyn InferenceAdapter,
    paths: &'a PathResolver,
}

struct Progress {
    kind: StageKind,
    state: StageState,
}

impl Progress {
    fn advance(&mut self, next: StageState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(stage = %self.kind, "{} -> {}", self.state, next);
        self.state = next;
    }
}

impl<'a> StageRunner<'a> {
    pub fn new(
        store: &'a dyn ArtifactStore,
        adapter: &'a dyn InferenceAdapter,
        paths: &'a PathResolver,
    ) -> Self {
        Self {
            store,
            adapter,
            paths,
        }
    }

    pub async fn run(&self, stage: &dyn Stage, target: &Target) -> Result<StageOutcome, StageError> {
        let plan = stage.plan(self.paths, target);
        let mut progress = Progress {
            kind: plan.kind,
            state: StageState::NotStarted,
        };

        let result = self.execute(stage, &plan, &mut progress).await;
        match &result {
            Ok(StageOutcome::Persisted { key, .. }) => {
                info!(stage = %plan.kind, "Wrote {key}");
            }
            Ok(StageOutcome::Skipped { key, reason }) => {
                info!(stage = %plan.kind, ?reason, "Skip - {key} already exists");
            }
            Err(err) => {
                progress.advance(StageState::Failed);
                warn!(stage = %plan.kind, code = err.code(), "{err}");
            }
        }
        result
    }

    async fn execute(
        &self,
        stage: &dyn Stage,
        plan: &StagePlan,
        progress: &mut Progress,
    ) -> Result<StageOutcome, StageError> {
        if self.store.exists(&plan.output).await? {
            progress.advance(StageState::Skipped);
            return Ok(StageOutcome::Skipped {
                key: plan.output.clone(),
                reason: SkipReason::AlreadyPresent,
            });
        }

        progress.advance(StageState::Loading);
        let template = self.read_required(&plan.template).await?;
        let (inputs, sections) = self.load_inputs(plan).await?;

        progress.advance(StageState::Requesting);
        let request = compose_request(&String::from_utf8_lossy(&template), &sections, plan.trailer);
        let payload = self
            .adapter
            .infer(&request, &stage.contract())
            .await
            .map_err(|e| StageError::InferenceFailure(e.0))?;

        progress.advance(StageState::Validating);
        let artifact = stage.finalize(&inputs, payload)?;

        match self.store.put(&plan.output, Bytes::from(artifact.bytes)).await {
            Ok(()) => {
                progress.advance(StageState::Persisted);
                if let Some(note) = &artifact.note {
                    info!(stage = %plan.kind, "{note}");
                }
                Ok(StageOutcome::Persisted {
                    key: plan.output.clone(),
                    note: artifact.note,
                })
            }
            Err(StoreError::AlreadyExists(key)) => {
                progress.advance(StageState::Skipped);
                Ok(StageOutcome::Skipped {
                    key,
                    reason: SkipReason::LostRace,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_required(&self, key: &ArtifactKey) -> Result<Bytes, StageError> {
        match self.store.get(key).await {
            Ok(bytes) => Ok(bytes),
            Err(StoreError::NotFound(key)) => Err(StageError::MissingInput { key }),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_first(&self, sources: &[ArtifactKey]) -> Result<Option<(ArtifactKey, Bytes)>, StageError> {
        for key in sources {
            match self.store.get(key).await {
                Ok(bytes) => return Ok(Some((key.clone(), bytes))),
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    /// Reads every declared input before anything is sent to the adapter.
    async fn load_inputs(
        &self,
        plan: &StagePlan,
    ) -> Result<(LoadedInputs, Vec<(&'static str, String)>), StageError> {
        let mut loaded = Vec::with_capacity(plan.inputs.len());
        let mut sections = Vec::with_capacity(plan.inputs.len());

        for spec in &plan.inputs {
            match self.read_first(&spec.sources).await? {
                Some((key, bytes)) => {
                    debug!(stage = %plan.kind, "Loaded {:?} from {key}", spec.role);
                    let input = LoadedInput {
                        role: spec.role,
                        key,
                        bytes,
                    };
                    sections.push((spec.label, input.text()));
                    loaded.push(input);
                }
                None => match spec.presence {
                    Presence::Required => {
                        let key = spec
                            .sources
                            .first()
                            .cloned()
                            .unwrap_or_else(|| plan.output.clone());
                        return Err(StageError::MissingInput { key });
                    }
                    Presence::Optional {
                        placeholder: Some(text),
                    } => sections.push((spec.label, text.to_string())),
                    Presence::Optional { placeholder: None } => {}
                },
            }
        }

        Ok((LoadedInputs::new(loaded), sections))
    }
}
