//! Declarative image-variant specifications.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ValidationFailure;

/// Output encoding for a produced image variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Png,
    Gif,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// How a source image is fitted into the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Fit within the bounds, preserving aspect ratio (letterbox).
    Inset,
    /// Fill the bounds, cropping overflow.
    #[default]
    Outbound,
}

/// How much the staleness check trusts the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Compare build intent only; no filesystem stats.
    #[default]
    Simple,
    /// Additionally verify the output still exists and the source is
    /// unmodified.
    Full,
}

/// One desired output rendition of a source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSpec {
    /// Which source the variant is produced from.
    pub source_index: usize,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub crop_mode: CropMode,
    pub jpeg_quality: u8,
    pub png_compression_level: u8,
    /// `w` descriptor for the srcset entry, 0 = omitted.
    pub srcset_width: u32,
    /// `h` descriptor, 0 = omitted.
    pub srcset_height: u32,
    /// `x` density descriptor, 0 = omitted.
    pub srcset_density: u32,
    /// -1 targets the default bucket; 0 and up index the resource's
    /// declared media query list.
    pub media_index: i32,
    /// Disambiguates same-dimension variants in the output filename.
    pub suffix: String,
    /// Resize to the exact target width and derive the height from the
    /// source aspect ratio.
    pub use_only_width: bool,
}

impl VariantSpec {
    pub fn new(width: u32, height: u32, format: ImageFormat) -> Self {
        Self {
            source_index: 0,
            width,
            height,
            format,
            crop_mode: CropMode::default(),
            jpeg_quality: 80,
            png_compression_level: 9,
            srcset_width: 0,
            srcset_height: 0,
            srcset_density: 0,
            media_index: -1,
            suffix: String::new(),
            use_only_width: false,
        }
    }
}

/// Resource-level image options: where outputs go and which variants to
/// produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageOptions {
    /// Filesystem root all other paths are relative to.
    pub root_dir: PathBuf,
    /// Output directory relative to `root_dir`.
    pub output_dir: PathBuf,
    pub variants: Vec<VariantSpec>,
    /// `sizes` attribute for responsive rendering, empty = omitted.
    pub sizes: String,
    /// Declared media query strings, indexed by `media_index`.
    pub media: Vec<String>,
    /// Extra HTML attributes, emitted in declaration order.
    pub attributes: Vec<(String, String)>,
    /// Which variant provides the non-responsive `src` fallback.
    pub src_index: usize,
    pub compare_mode: CompareMode,
}

impl ImageOptions {
    pub fn new(root_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            output_dir: output_dir.into(),
            variants: Vec::new(),
            sizes: String::new(),
            media: Vec::new(),
            attributes: Vec::new(),
            src_index: 0,
            compare_mode: CompareMode::default(),
        }
    }

    /// Check the whole specification against the resource's source list,
    /// reporting every violated field.
    pub fn validate(&self, sources: &[String]) -> Result<(), ValidationFailure> {
        let mut failure = ValidationFailure::new();

        if self.variants.is_empty() {
            failure.push("variant list cannot be empty");
        }

        for (i, variant) in self.variants.iter().enumerate() {
            if variant.width == 0 {
                failure.push(format!("variant {i}: width must be positive"));
            }
            if variant.height == 0 && !variant.use_only_width {
                failure.push(format!("variant {i}: height must be positive"));
            }
            if variant.source_index >= sources.len() {
                failure.push(format!(
                    "variant {i}: no source with index {}",
                    variant.source_index
                ));
            }
            if variant.media_index < -1 {
                failure.push(format!(
                    "variant {i}: media index must be greater than or equal to -1"
                ));
            } else if variant.media_index >= 0
                && self.media.get(variant.media_index as usize).is_none()
            {
                failure.push(format!(
                    "variant {i}: no media query with index {}",
                    variant.media_index
                ));
            }
            if variant.jpeg_quality > 100 {
                failure.push(format!("variant {i}: jpeg quality must be 0-100"));
            }
            if variant.png_compression_level > 9 {
                failure.push(format!("variant {i}: png compression level must be 0-9"));
            }
        }

        if !self.variants.is_empty() && self.src_index >= self.variants.len() {
            failure.push(format!("no variant with index {}", self.src_index));
        }

        failure.into_result()
    }
}
