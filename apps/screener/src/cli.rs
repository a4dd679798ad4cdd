use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::artifacts::{ArtifactStore, FsArtifactStore, PathResolver, Target};
use crate::config::Config;
use crate::llm_client::{self, LazyLlmClient};
use crate::pipeline::{PipelineDag, StageKind, StageRunner, StageStatus};
use crate::stages;

#[derive(Parser, Debug)]
#[command(
    name = "screener",
    about = "Screen job postings and evaluate candidates, one stage at a time",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer the master screening questions against a posting
    Screening(PostingArgs),
    /// Condense the screening report into a GO / CAUTION / NO-GO verdict
    ScreeningSummary(PostingArgs),
    /// Describe the product behind a posting
    ProductProfile(PostingArgs),
    /// Extract the weighted requirement questions from a posting
    Requirements(PostingArgs),
    /// Evaluate a candidate's resume against the posting requirements
    Evaluate(TargetArgs),
    /// Evaluate a candidate using their STAR experiences as well
    RoleAlignment(TargetArgs),
    /// Write the hiring-manager summary for a candidate
    ExecutiveSummary(TargetArgs),
    /// Show which stages are done, runnable or blocked
    Status(TargetArgs),
}

#[derive(Args, Debug)]
pub struct PostingArgs {
    /// Directory holding posting.txt
    pub posting_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Directory holding posting.txt
    pub posting_dir: PathBuf,
    /// Directory holding resume.md (defaults to the posting directory)
    pub candidate_dir: Option<PathBuf>,
}

impl Command {
    /// The stage this subcommand runs; `None` for `status`.
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            Command::Screening(_) => Some(StageKind::Screening),
            Command::ScreeningSummary(_) => Some(StageKind::ScreeningSummary),
            Command::ProductProfile(_) => Some(StageKind::ProductProfile),
            Command::Requirements(_) => Some(StageKind::RequirementExtraction),
            Command::Evaluate(_) => Some(StageKind::CandidateEvaluation),
            Command::RoleAlignment(_) => Some(StageKind::RoleAlignment),
            Command::ExecutiveSummary(_) => Some(StageKind::ExecutiveSummary),
            Command::Status(_) => None,
        }
    }

    pub fn dirs(&self) -> (&Path, Option<&Path>) {
        match self {
            Command::Screening(a)
            | Command::ScreeningSummary(a)
            | Command::ProductProfile(a)
            | Command::Requirements(a) => (a.posting_dir.as_path(), None),
            Command::Evaluate(a)
            | Command::RoleAlignment(a)
            | Command::ExecutiveSummary(a)
            | Command::Status(a) => (a.posting_dir.as_path(), a.candidate_dir.as_deref()),
        }
    }
}

pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let paths = PathResolver::new(cwd, config.root.as_deref(), &config.prompts_dir);
    let (posting_dir, candidate_dir) = cli.command.dirs();
    let target = paths.target(posting_dir, candidate_dir);
    let store = FsArtifactStore::new();

    match cli.command.stage() {
        Some(kind) => run_stage(kind, config, &store, &paths, &target).await,
        None => print_status(&store, &paths, &target).await,
    }
}

async fn run_stage(
    kind: StageKind,
    config: &Config,
    store: &dyn ArtifactStore,
    paths: &PathResolver,
    target: &Target,
) -> Result<()> {
    let llm = LazyLlmClient::new(config.anthropic_api_key.clone());
    info!(stage = %kind, model = llm_client::MODEL, "Starting");

    let stage = stages::for_kind(kind);
    let outcome = StageRunner::new(store, &llm, paths)
        .run(stage.as_ref(), target)
        .await
        .with_context(|| format!("Stage '{kind}' failed"))?;

    println!("{}", outcome.key());
    Ok(())
}

async fn print_status(store: &dyn ArtifactStore, paths: &PathResolver, target: &Target) -> Result<()> {
    let dag = PipelineDag::for_target(&stages::registry(), paths, target);
    let available = dag
        .present_keys(store)
        .await
        .context("Failed to inspect artifacts")?;

    println!("posting:   {}", paths.relative_identity(&target.posting));
    println!("candidate: {}", paths.relative_identity(&target.candidate));
    for (plan, (kind, status)) in dag.plans().iter().zip(dag.status(&available)) {
        match status {
            StageStatus::Done => println!("  done      {kind:<18} {}", plan.output),
            StageStatus::Runnable => println!("  runnable  {kind}"),
            StageStatus::Blocked { missing } => {
                let missing: Vec<String> = missing.iter().map(|k| k.to_string()).collect();
                println!("  blocked   {kind:<18} missing {}", missing.join(" or "));
            }
        }
    }

    let next: Vec<&str> = dag.runnable(&available).into_iter().map(StageKind::name).collect();
    if !next.is_empty() {
        println!("next:      {}", next.join(", "));
    }
    Ok(())
}
