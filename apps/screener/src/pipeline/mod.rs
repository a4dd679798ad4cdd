//! Pipeline orchestration: stage declarations, the runner, and the dependency graph.

pub mod dag;
pub mod runner;
pub mod stage;

pub use dag::{PipelineDag, StageStatus};
pub use runner::StageRunner;
pub use stage::StageKind;
