//! Analysis result persistence
//!
//! The analyze phase hands its result to the build and export phases
//! through `analyzed.toml`. Both image references are optional; the
//! metadata section is always present, defaulting to empty.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use super::layers::LayersMetadata;
use crate::encoding;
use crate::error::{CairnError, CairnResult};

/// Reference to a concrete image, by digest or daemon identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageIdentifier {
    pub reference: String,
}

impl ImageIdentifier {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// Output of the analyze phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedMetadata {
    /// The previous image, when one was found
    #[serde(default, rename = "image", skip_serializing_if = "Option::is_none")]
    pub previous_image: Option<ImageIdentifier>,

    /// Layer metadata decoded from the previous image's label
    #[serde(default)]
    pub metadata: LayersMetadata,

    /// The run image the new image will be built on
    #[serde(default, rename = "run-image", skip_serializing_if = "Option::is_none")]
    pub run_image: Option<ImageIdentifier>,
}

impl AnalyzedMetadata {
    /// Read a previously written `analyzed.toml`
    pub async fn read_file(path: &Path) -> CairnResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CairnError::io(format!("reading analysis file {}", path.display()), e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Atomically write this result as `analyzed.toml`
    pub async fn write_file(&self, path: &Path) -> CairnResult<()> {
        encoding::write_toml(path, self).await
    }
}
