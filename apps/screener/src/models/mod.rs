// Records shared between stages. Stage-local payloads live next to their stage.

pub mod evaluation;
pub mod requirement;

pub use evaluation::{Answer, EvaluationRecord};
pub use requirement::{Priority, RequirementSet};
