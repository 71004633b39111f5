//! Buildpack group handling
//!
//! The detect phase writes `group.toml`, the ordered set of buildpacks
//! participating in the current build. Later phases only consider layer
//! metadata belonging to buildpacks in this set.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{CairnError, CairnResult};

/// One buildpack participating in the current build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupBuildpack {
    pub id: String,

    #[serde(default)]
    pub version: String,

    /// Buildpack API version the buildpack declares
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub homepage: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl GroupBuildpack {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            ..Self::default()
        }
    }
}

/// The ordered buildpack group selected by the detect phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildpackGroup {
    #[serde(default)]
    pub group: Vec<GroupBuildpack>,
}

impl BuildpackGroup {
    /// Read a `group.toml` written by the detect phase
    pub async fn read_file(path: &Path) -> CairnResult<Self> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CairnError::GroupNotFound(path.to_path_buf()));
            }
            Err(err) => {
                return Err(CairnError::io(
                    format!("reading buildpack group {}", path.display()),
                    err,
                ));
            }
        };
        Ok(toml::from_str(&content)?)
    }
}

/// Escape a buildpack identifier for use as a path segment
///
/// Identifiers may contain `/`, which cannot appear in a single path
/// segment. The encoding rewrites `%` to `%25` and `/` to `%2F` and is
/// exactly reversed by [`unescape_id`], so distinct identifiers always
/// map to distinct directories.
pub fn escape_id(id: &str) -> String {
    id.replace('%', "%25").replace('/', "%2F")
}

/// Reverse [`escape_id`]
pub fn unescape_id(escaped: &str) -> String {
    escaped.replace("%2F", "/").replace("%25", "%")
}
