//! Artifact storage: keys, the create-or-fail store contract, and its backends.
//!
//! Presence of a key is the only coordination signal in the pipeline. No
//! backend exposes update or delete; removing an artifact is an operator action
//! performed outside the process.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod fs;
#[cfg(test)]
pub mod memory;
pub mod paths;

pub use fs::FsArtifactStore;
pub use paths::{PathResolver, Target};

/// Address of a single artifact. For the filesystem backend this is the
/// absolute, lexically normalized file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey(PathBuf);

impl ArtifactKey {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl From<&str> for ArtifactKey {
    fn from(value: &str) -> Self {
        Self(PathBuf::from(value))
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Artifact not found: {0}")]
    NotFound(ArtifactKey),

    #[error("Artifact already exists: {0}")]
    AlreadyExists(ArtifactKey),

    #[error("I/O error on {key}: {source}")]
    Io {
        key: ArtifactKey,
        #[source]
        source: std::io::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key/bytes store injected into the stage runner.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn exists(&self, key: &ArtifactKey) -> StoreResult<bool>;

    async fn get(&self, key: &ArtifactKey) -> StoreResult<Bytes>;

    /// Writes `bytes` under `key`. Fails with `AlreadyExists` instead of
    /// overwriting; at most one of several concurrent writers succeeds.
    async fn put(&self, key: &ArtifactKey, bytes: Bytes) -> StoreResult<()>;
}
