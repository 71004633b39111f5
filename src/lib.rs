//! Cairn - Buildpack layer analysis
//!
//! Recovers layer metadata from a previous image and a layer cache so
//! a new build can reuse unchanged layers instead of rebuilding them.

pub mod analyzer;
pub mod api;
pub mod buildpack;
pub mod cache;
pub mod encoding;
pub mod error;
pub mod fakes;
pub mod image;
pub mod metadata;
pub mod platform;
pub mod restore;

pub use analyzer::Analyzer;
pub use api::PlatformApi;
pub use error::{CairnError, CairnResult};
pub use metadata::AnalyzedMetadata;
pub use platform::{Platform, Restoration};
