//! Error types for Cairn
//!
//! All modules use `CairnResult<T>` as their return type. Absence of a
//! previous image or of cache contents is not an error; these variants
//! cover genuine failures such as unreachable collaborators and
//! filesystem problems.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Cairn operations
pub type CairnResult<T> = Result<T, CairnError>;

/// All errors that can occur in Cairn
#[derive(Error, Debug)]
pub enum CairnError {
    // Platform API errors
    #[error("Invalid platform API version {value:?}: {reason}")]
    InvalidPlatformApi { value: String, reason: String },

    // Image errors
    #[error("Failed to access image {image}: {reason}")]
    ImageAccess { image: String, reason: String },

    // Cache errors
    #[error("Failed to access cache {name}: {reason}")]
    CacheAccess { name: String, reason: String },

    #[error("Failed to commit cache {name}: {reason}")]
    CacheCommit { name: String, reason: String },

    // Buildpack group errors
    #[error("Buildpack group file not found: {0}")]
    GroupNotFound(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CairnError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an image access error
    pub fn image(image: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImageAccess {
            image: image.into(),
            reason: reason.into(),
        }
    }

    /// Create a cache access error
    pub fn cache(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CacheAccess {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
