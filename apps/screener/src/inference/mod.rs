//! Inference boundary: the contract every model backend implements.
//!
//! Stages hand over composed text plus an [`OutputContract`] and get back an
//! untyped JSON value. Decoding that value into typed records is the stage's
//! job; backends never retry and never interpret their own failures.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod contract;
#[cfg(test)]
pub mod stub;

pub use contract::{Field, OutputContract, Shape};

/// Opaque adapter failure, reported verbatim by the runner.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InferenceFailure(pub String);

#[async_trait]
pub trait InferenceAdapter: Send + Sync {
    async fn infer(&self, request: &str, contract: &OutputContract)
        -> Result<Value, InferenceFailure>;
}
