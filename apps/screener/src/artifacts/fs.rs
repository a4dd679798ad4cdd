use std::io::{ErrorKind, Write};

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::debug;

use super::{ArtifactKey, ArtifactStore, StoreError, StoreResult};

/// Artifact store over the local directory tree. Keys are file paths.
///
/// `put` stages the payload in a temporary file next to the target and links it
/// into place with a no-clobber persist, so readers never observe a partial
/// artifact and an interrupted write leaves nothing behind.
#[derive(Debug, Clone, Default)]
pub struct FsArtifactStore;

impl FsArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(key: &ArtifactKey, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.clone(),
        source,
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn exists(&self, key: &ArtifactKey) -> StoreResult<bool> {
        fs::try_exists(key.as_path())
            .await
            .map_err(|e| io_error(key, e))
    }

    async fn get(&self, key: &ArtifactKey) -> StoreResult<Bytes> {
        match fs::read(key.as_path()).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(key.clone())),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn put(&self, key: &ArtifactKey, bytes: Bytes) -> StoreResult<()> {
        let target = key.as_path().to_path_buf();
        let parent = target
            .parent()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| io_error(key, std::io::Error::other("artifact key has no parent")))?;

        fs::create_dir_all(&parent)
            .await
            .map_err(|e| io_error(key, e))?;

        let owned_key = key.clone();
        let result = tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let mut staged = NamedTempFile::new_in(&parent).map_err(|e| io_error(&owned_key, e))?;
            staged
                .write_all(&bytes)
                .and_then(|_| staged.as_file().sync_all())
                .map_err(|e| io_error(&owned_key, e))?;

            match staged.persist_noclobber(&target) {
                Ok(_) => Ok(()),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    Err(StoreError::AlreadyExists(owned_key))
                }
                Err(e) => Err(io_error(&owned_key, e.error)),
            }
        })
        .await
        .map_err(|e| io_error(key, std::io::Error::other(e)))?;

        if result.is_ok() {
            debug!("Persisted artifact {key}");
        }
        result
    }
}
