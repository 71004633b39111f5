//! Cache collaborator interface
//!
//! Builds may bring a cache store holding layer data from earlier
//! builds. The analyze phase only ever reads committed metadata; the
//! export phase stages new metadata and commits it in one step.
//!
//! # Commit model
//!
//! | Phase | Visible to readers |
//! |-------|--------------------|
//! | Staged | No |
//! | Committed | Yes |
//!
//! Metadata written with [`Cache::set_metadata`] stays invisible until
//! [`Cache::commit`] swaps it in. A crashed build therefore leaves the
//! previously committed metadata intact.

pub mod volume;

use async_trait::async_trait;

use crate::error::CairnResult;
use crate::metadata::CacheMetadata;

pub use volume::{VolumeCache, CACHE_METADATA_FILE};

/// Abstract cache store interface
///
/// Backends decide where layer data actually lives; this crate only
/// depends on the metadata contract.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Identifier for log and error messages
    fn name(&self) -> &str;

    /// Whether the store has any committed state at all
    async fn exists(&self) -> bool;

    /// Stage metadata describing the layers the current build cached
    async fn set_metadata(&self, metadata: &CacheMetadata) -> CairnResult<()>;

    /// Read the committed metadata, empty when none was ever committed
    async fn metadata(&self) -> CairnResult<CacheMetadata>;

    /// Atomically publish staged state, replacing the committed state
    async fn commit(&self) -> CairnResult<()>;
}
