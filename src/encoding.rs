//! Atomic file writing helpers
//!
//! Descriptor and analysis files are read back by later build phases,
//! so writers serialize to a uniquely named temporary file in the
//! destination directory and rename it into place. Readers never
//! observe partial content, and the rename stays on one filesystem.

use std::path::Path;

use serde::Serialize;
use tokio::fs;
use uuid::Uuid;

use crate::error::{CairnError, CairnResult};

/// Serialize `value` as TOML and atomically write it to `path`
pub async fn write_toml<T: Serialize>(path: &Path, value: &T) -> CairnResult<()> {
    let content = toml::to_string(value)?;
    write_atomic(path, content.as_bytes()).await
}

/// Atomically write `contents` to `path`, creating parent directories
pub async fn write_atomic(path: &Path, contents: &[u8]) -> CairnResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| CairnError::io(format!("creating directory {}", parent.display()), e))?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    fs::write(&tmp, contents)
        .await
        .map_err(|e| CairnError::io(format!("writing {}", tmp.display()), e))?;

    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(CairnError::io(format!("renaming {} into place", path.display()), err));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        sha: String,
        cache: bool,
    }

    #[tokio::test]
    async fn write_toml_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layer.toml");
        let sample = Sample {
            sha: "sha256:abc".to_string(),
            cache: true,
        };

        write_toml(&path, &sample).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Sample = toml::from_str(&content).unwrap();
        assert_eq!(parsed, sample);
    }

    #[tokio::test]
    async fn write_atomic_creates_parents_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.txt");

        write_atomic(&path, b"contents").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"contents");
        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["out.txt"]);
    }

    #[tokio::test]
    async fn write_atomic_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");

        write_atomic(&path, b"old").await.unwrap();
        write_atomic(&path, b"new").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }
}
