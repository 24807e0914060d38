//! Asset pipeline infrastructure for Vellum: resource groups with
//! dependency ordering, incremental image-variant regeneration, and
//! combine orchestration for scripts and stylesheets.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! # Architecture
//!
//! Resources (ordered source lists plus options) register into named
//! groups with declared inter-group dependencies. Rendering walks the
//! groups in dependency order; each resource resolves its output URLs
//! through the [`UrlManager`] collaborator, triggering its combine
//! collaborator at most once per render cycle. Image resources compare
//! their declarative variant list against persisted [`BuildRecord`]
//! provenance so unchanged variants are never reprocessed.

mod combine;
mod error;
mod groups;
mod html;
pub mod image;
mod manager;
mod resource;
mod script;
mod stylesheet;
mod url;

pub use combine::{CombineFiles, OutputStrategy};
pub use error::{AssetError, Result, ValidationFailure};
pub use groups::{GroupEntry, ResourceGroups};
pub use image::options::{CompareMode, CropMode, ImageFormat, ImageOptions, VariantSpec};
pub use image::staleness::{BuildRecord, EncodeOptions, InputRecord, OutputRecord, is_stale};
pub use image::storage::{BuildRecords, RasterImageStorage};
pub use image::{ImageResource, ImageSet, ImageSetEntry};
pub use manager::{
    ImageResources, ManifestEntry, Rendered, ScriptManifest, ScriptResources, StylesheetResources,
};
pub use resource::is_valid_name;
pub use script::{ScriptOptions, ScriptResource};
pub use stylesheet::{StylesheetOptions, StylesheetResource};
pub use url::{PlainUrlManager, UrlManager};
