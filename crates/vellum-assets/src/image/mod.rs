//! Image resources with responsive-variant support.
//!
//! Copyright (c) 2025 Posit, PBC

pub mod options;
pub mod staleness;
pub mod storage;

use std::collections::BTreeMap;

use crate::error::{AssetError, Result};
use crate::image::options::{ImageOptions, VariantSpec};
use crate::image::storage::{BuildRecords, RasterImageStorage};
use crate::resource::filter_ignored_sources;
use crate::url::UrlManager;

/// One produced variant paired with its resolved URL.
#[derive(Debug, Clone)]
pub struct ImageSetEntry {
    pub url: String,
    pub variant: VariantSpec,
}

/// The variant metadata renderers consume, grouped by media query.
///
/// The default bucket holds `srcset`-style entries (media index -1); the
/// per-media buckets each become one `<source>` element.
#[derive(Debug, Clone)]
pub struct ImageSet {
    pub sizes: String,
    pub media: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub src_index: usize,
    pub default: Vec<ImageSetEntry>,
    pub by_media: BTreeMap<usize, Vec<ImageSetEntry>>,
}

impl ImageSet {
    /// How many distinct non-default media groups exist. Renderers use
    /// this to decide `<picture>` versus plain `<img>`.
    pub fn media_group_count(&self) -> usize {
        self.by_media.len()
    }
}

/// A named image resource: source files plus the declarative variant
/// list, validated once at construction.
pub struct ImageResource {
    name: String,
    sources: Vec<String>,
    options: ImageOptions,
    urls: Option<Vec<String>>,
}

impl ImageResource {
    pub fn new(name: &str, sources: Vec<String>, options: ImageOptions) -> Result<Self> {
        options
            .validate(&sources)
            .map_err(AssetError::Validation)?;

        Ok(Self {
            name: name.to_string(),
            sources,
            options,
            urls: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn options(&self) -> &ImageOptions {
        &self.options
    }

    pub fn filter_ignored(&mut self, ignored: &[String]) {
        filter_ignored_sources(&mut self.sources, ignored);
    }

    pub fn storage(&self) -> RasterImageStorage<'_> {
        RasterImageStorage::new(&self.options, &self.sources)
    }

    /// Build every stale variant; see [`RasterImageStorage::save`].
    pub fn save(&self, previous: Option<&BuildRecords>) -> Result<BuildRecords> {
        self.storage().save(previous)
    }

    /// Remove produced outputs; see [`RasterImageStorage::cleanup`].
    pub fn cleanup(&self) -> Result<Vec<std::path::PathBuf>> {
        self.storage().cleanup()
    }

    /// One URL per variant, produced once and memoized.
    pub fn urls(&mut self, url_manager: &dyn UrlManager) -> &[String] {
        if self.urls.is_none() {
            self.urls = Some(self.storage().urls(url_manager));
        }
        self.urls.as_deref().unwrap_or_default()
    }

    /// Group the variants by media index for rendering.
    pub fn image_set(&mut self, url_manager: &dyn UrlManager) -> ImageSet {
        let urls = self.urls(url_manager).to_vec();

        let mut set = ImageSet {
            sizes: self.options.sizes.clone(),
            media: self.options.media.clone(),
            attributes: self.options.attributes.clone(),
            src_index: self.options.src_index,
            default: Vec::new(),
            by_media: BTreeMap::new(),
        };

        for (i, variant) in self.options.variants.iter().enumerate() {
            let entry = ImageSetEntry {
                url: urls.get(i).cloned().unwrap_or_default(),
                variant: variant.clone(),
            };
            if variant.media_index < 0 {
                set.default.push(entry);
            } else {
                set.by_media
                    .entry(variant.media_index as usize)
                    .or_default()
                    .push(entry);
            }
        }

        set
    }
}
