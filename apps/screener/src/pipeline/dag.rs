//! Dependency graph between stages.
//!
//! The graph is advisory: it never runs anything. A scheduler built on top asks
//! which stages are runnable for a target given the artifacts already present,
//! and each stage invocation still fails fast on its own if an input is absent.

use std::collections::{BTreeSet, HashSet};

use crate::artifacts::{ArtifactKey, ArtifactStore, PathResolver, StoreResult, Target};
use crate::pipeline::stage::{Stage, StageKind, StagePlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependencies {
    /// Needs only the raw posting/candidate files.
    Root,
    AllOf(&'static [StageKind]),
    AnyOf(&'static [StageKind]),
}

impl Dependencies {
    pub fn stages(self) -> &'static [StageKind] {
        match self {
            Dependencies::Root => &[],
            Dependencies::AllOf(stages) | Dependencies::AnyOf(stages) => stages,
        }
    }
}

pub fn dependencies(kind: StageKind) -> Dependencies {
    match kind {
        StageKind::Screening | StageKind::ProductProfile | StageKind::RequirementExtraction => {
            Dependencies::Root
        }
        StageKind::ScreeningSummary => Dependencies::AllOf(&[StageKind::Screening]),
        StageKind::CandidateEvaluation | StageKind::RoleAlignment => {
            Dependencies::AllOf(&[StageKind::RequirementExtraction])
        }
        StageKind::ExecutiveSummary => {
            Dependencies::AnyOf(&[StageKind::CandidateEvaluation, StageKind::RoleAlignment])
        }
    }
}

/// Every stage, dependencies first. Ties keep declaration order.
pub fn topological_order() -> Vec<StageKind> {
    let mut ordered: Vec<StageKind> = Vec::with_capacity(StageKind::ALL.len());
    let mut placed: BTreeSet<StageKind> = BTreeSet::new();

    while ordered.len() < StageKind::ALL.len() {
        let before = ordered.len();
        for kind in StageKind::ALL {
            if placed.contains(&kind) {
                continue;
            }
            if dependencies(kind).stages().iter().all(|d| placed.contains(d)) {
                ordered.push(kind);
                placed.insert(kind);
            }
        }
        // The dependency table is static and acyclic; this only trips if an
        // edit introduces a cycle.
        assert!(ordered.len() > before, "stage dependency cycle detected");
    }
    ordered
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Done,
    Runnable,
    Blocked { missing: Vec<ArtifactKey> },
}

/// The stage plans for one target, queried against a set of present keys.
pub struct PipelineDag {
    plans: Vec<StagePlan>,
}

impl PipelineDag {
    pub fn for_target(stages: &[Box<dyn Stage>], paths: &PathResolver, target: &Target) -> Self {
        let mut plans: Vec<StagePlan> = stages.iter().map(|s| s.plan(paths, target)).collect();
        let order = topological_order();
        plans.sort_by_key(|p| order.iter().position(|k| *k == p.kind));
        Self { plans }
    }

    pub fn plans(&self) -> &[StagePlan] {
        &self.plans
    }

    /// Keys whose presence decides the status of some stage.
    pub fn tracked_keys(&self) -> Vec<ArtifactKey> {
        let mut keys = BTreeSet::new();
        for plan in &self.plans {
            keys.insert(plan.output.clone());
            for spec in plan.inputs.iter().filter(|s| !s.role.is_static_asset()) {
                keys.extend(spec.sources.iter().cloned());
            }
        }
        keys.into_iter().collect()
    }

    /// Checks every tracked key against the store.
    pub async fn present_keys(&self, store: &dyn ArtifactStore) -> StoreResult<HashSet<ArtifactKey>> {
        let mut present = HashSet::new();
        for key in self.tracked_keys() {
            if store.exists(&key).await? {
                present.insert(key);
            }
        }
        Ok(present)
    }

    fn status_of(plan: &StagePlan, available: &HashSet<ArtifactKey>) -> StageStatus {
        if available.contains(&plan.output) {
            return StageStatus::Done;
        }

        let missing: Vec<ArtifactKey> = plan
            .inputs
            .iter()
            .filter(|spec| spec.is_required() && !spec.role.is_static_asset())
            .filter(|spec| !spec.sources.iter().any(|k| available.contains(k)))
            .flat_map(|spec| spec.sources.iter().cloned())
            .collect();

        if missing.is_empty() {
            StageStatus::Runnable
        } else {
            StageStatus::Blocked { missing }
        }
    }

    pub fn status(&self, available: &HashSet<ArtifactKey>) -> Vec<(StageKind, StageStatus)> {
        self.plans
            .iter()
            .map(|plan| (plan.kind, Self::status_of(plan, available)))
            .collect()
    }

    /// Stages whose output is absent and whose inputs are all present.
    pub fn runnable(&self, available: &HashSet<ArtifactKey>) -> Vec<StageKind> {
        self.status(available)
            .into_iter()
            .filter(|(_, status)| *status == StageStatus::Runnable)
            .map(|(kind, _)| kind)
            .collect()
    }
}
