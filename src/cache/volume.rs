//! Directory-backed cache store
//!
//! A volume cache is a plain directory, typically a mounted volume,
//! with three subdirectories:
//!
//! - `staging`: writes land here, wiped on every startup
//! - `committed`: what readers see
//! - `committed-backup`: previous state held during a commit swap
//!
//! Commit renames `committed` aside, renames `staging` into place, and
//! restores the backup if the swap fails, so readers always find a
//! complete state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::fs;

use super::Cache;
use crate::error::{CairnError, CairnResult};
use crate::metadata::{label, CacheMetadata};

/// File inside the cache directory holding the metadata document
pub const CACHE_METADATA_FILE: &str = "io.buildpacks.lifecycle.cache.metadata";

/// Cache store backed by a local directory
pub struct VolumeCache {
    name: String,
    staging_dir: PathBuf,
    committed_dir: PathBuf,
    backup_dir: PathBuf,
    committed: AtomicBool,
}

impl VolumeCache {
    /// Open the cache at `dir`, preparing it for a new build
    ///
    /// Leftover staging content and backup directories from a crashed
    /// earlier build are discarded; committed state is preserved.
    pub async fn new(dir: impl AsRef<Path>) -> CairnResult<Self> {
        let dir = dir.as_ref();
        let cache = Self {
            name: dir.display().to_string(),
            staging_dir: dir.join("staging"),
            committed_dir: dir.join("committed"),
            backup_dir: dir.join("committed-backup"),
            committed: AtomicBool::new(false),
        };

        remove_dir_if_present(&cache.staging_dir).await?;
        fs::create_dir_all(&cache.staging_dir)
            .await
            .map_err(|e| CairnError::io(format!("creating {}", cache.staging_dir.display()), e))?;
        remove_dir_if_present(&cache.backup_dir).await?;
        fs::create_dir_all(&cache.committed_dir)
            .await
            .map_err(|e| CairnError::io(format!("creating {}", cache.committed_dir.display()), e))?;

        Ok(cache)
    }
}

#[async_trait]
impl Cache for VolumeCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self) -> bool {
        fs::metadata(&self.committed_dir).await.is_ok()
    }

    async fn set_metadata(&self, metadata: &CacheMetadata) -> CairnResult<()> {
        let path = self.staging_dir.join(CACHE_METADATA_FILE);
        let content = serde_json::to_string(metadata)?;
        fs::write(&path, content)
            .await
            .map_err(|e| CairnError::io(format!("staging cache metadata {}", path.display()), e))
    }

    async fn metadata(&self) -> CairnResult<CacheMetadata> {
        let path = self.committed_dir.join(CACHE_METADATA_FILE);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CacheMetadata::default());
            }
            Err(err) => {
                return Err(CairnError::io(
                    format!("reading cache metadata {}", path.display()),
                    err,
                ));
            }
        };
        Ok(label::decode_or_default(&content, "cache metadata"))
    }

    async fn commit(&self) -> CairnResult<()> {
        if self.committed.swap(true, Ordering::SeqCst) {
            return Err(CairnError::CacheCommit {
                name: self.name.clone(),
                reason: "cache already committed".to_string(),
            });
        }

        fs::rename(&self.committed_dir, &self.backup_dir)
            .await
            .map_err(|e| CairnError::CacheCommit {
                name: self.name.clone(),
                reason: format!("backing up committed state: {e}"),
            })?;

        if let Err(err) = fs::rename(&self.staging_dir, &self.committed_dir).await {
            // Put the previous state back before reporting the failure.
            fs::rename(&self.backup_dir, &self.committed_dir)
                .await
                .map_err(|roll| CairnError::CacheCommit {
                    name: self.name.clone(),
                    reason: format!("rolling back failed commit ({err}): {roll}"),
                })?;
            return Err(CairnError::CacheCommit {
                name: self.name.clone(),
                reason: format!("publishing staged state: {err}"),
            });
        }

        let _ = fs::remove_dir_all(&self.backup_dir).await;
        Ok(())
    }
}

async fn remove_dir_if_present(dir: &Path) -> CairnResult<()> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(CairnError::io(format!("removing {}", dir.display()), err)),
    }
}
