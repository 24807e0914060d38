//! Image variant building and on-disk lifecycle.
//!
//! Copyright (c) 2025 Posit, PBC

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{self, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, Frame};

use crate::error::Result;
use crate::image::options::{CropMode, ImageFormat, ImageOptions, VariantSpec};
use crate::image::staleness::{
    BuildRecord, EncodeOptions, InputRecord, OutputRecord, file_size, is_stale, mtime_seconds,
};
use crate::url::UrlManager;

/// Build records keyed by output path, the shape the external provenance
/// store persists.
pub type BuildRecords = BTreeMap<PathBuf, BuildRecord>;

/// Executes resize/crop/encode for every stale variant of one image
/// resource and records provenance.
pub struct RasterImageStorage<'a> {
    options: &'a ImageOptions,
    sources: &'a [String],
}

impl<'a> RasterImageStorage<'a> {
    pub fn new(options: &'a ImageOptions, sources: &'a [String]) -> Self {
        Self { options, sources }
    }

    /// Deterministic output filename:
    /// `{sourceBaseName}[_{suffix}]_{W}x{H}.{format}`.
    pub fn filename(&self, variant: &VariantSpec) -> String {
        let base = self
            .sources
            .get(variant.source_index)
            .map(|s| {
                Path::new(s)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .unwrap_or_default();

        let suffix = if variant.suffix.is_empty() {
            String::new()
        } else {
            format!("_{}", variant.suffix)
        };

        format!(
            "{base}{suffix}_{}x{}.{}",
            variant.width, variant.height, variant.format
        )
    }

    fn output_dir(&self) -> PathBuf {
        self.options.root_dir.join(&self.options.output_dir)
    }

    fn output_path(&self, variant: &VariantSpec) -> PathBuf {
        self.output_dir().join(self.filename(variant))
    }

    fn source_path(&self, variant: &VariantSpec) -> Option<PathBuf> {
        self.sources
            .get(variant.source_index)
            .filter(|s| !s.is_empty())
            .map(|s| self.options.root_dir.join(s))
    }

    /// Build every stale variant, skipping fresh ones entirely (zero
    /// filesystem writes for a non-stale variant).
    ///
    /// `previous` is the provenance recorded by an earlier build; `None`
    /// means first build, everything regenerates. One variant's failure
    /// does not abort the others. Returns updated records for the
    /// variants that were (re)built.
    pub fn save(&self, previous: Option<&BuildRecords>) -> Result<BuildRecords> {
        let mut records = BuildRecords::new();

        for variant in &self.options.variants {
            let output = self.output_path(variant);

            let stale = match previous {
                None => true,
                Some(prior) => is_stale(
                    prior.get(&output),
                    &self.source_path(variant).unwrap_or_default(),
                    variant,
                    self.options.compare_mode,
                ),
            };
            if !stale {
                tracing::debug!(output = %output.display(), "variant fresh, skipping");
                continue;
            }

            let Some(source) = self.source_path(variant) else {
                tracing::warn!(
                    source_index = variant.source_index,
                    "variant has no usable source, skipping"
                );
                continue;
            };
            if !source.exists() {
                tracing::warn!(source = %source.display(), "source file missing, skipping variant");
                continue;
            }

            match self.build_variant(variant, &source, &output) {
                Ok(record) => {
                    records.insert(output, record);
                }
                Err(e) => {
                    tracing::warn!(
                        output = %output.display(),
                        error = %e,
                        "variant build failed, continuing with remaining variants"
                    );
                }
            }
        }

        Ok(records)
    }

    fn build_variant(
        &self,
        variant: &VariantSpec,
        source: &Path,
        output: &Path,
    ) -> Result<BuildRecord> {
        let dir = self.output_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }

        let img = image::open(source)?;
        let resized = resize(&img, variant);
        encode(&resized, variant, output)?;

        Ok(BuildRecord {
            input: InputRecord {
                path: source.to_path_buf(),
                mtime: mtime_seconds(source),
                size: file_size(source),
            },
            output: OutputRecord {
                path: output.to_path_buf(),
                width: variant.width,
                height: variant.height,
                crop_mode: variant.crop_mode,
                format: variant.format,
                encode_options: EncodeOptions::for_variant(variant),
            },
        })
    }

    /// Delete every variant's current output file and the output
    /// directory if it becomes empty. Returns the removed paths.
    pub fn cleanup(&self) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();

        for variant in &self.options.variants {
            let output = self.output_path(variant);
            if output.exists() {
                std::fs::remove_file(&output)?;
                removed.push(output);
            }
        }

        let dir = self.output_dir();
        if dir.exists() && dir.read_dir()?.next().is_none() {
            std::fs::remove_dir(&dir)?;
        }

        Ok(removed)
    }

    /// One URL per variant, resolved through the URL manager.
    pub fn urls(&self, url_manager: &dyn UrlManager) -> Vec<String> {
        self.options
            .variants
            .iter()
            .map(|variant| {
                let path = self.options.output_dir.join(self.filename(variant));
                url_manager.url(&path.to_string_lossy(), true, false)
            })
            .collect()
    }
}

fn resize(img: &DynamicImage, variant: &VariantSpec) -> DynamicImage {
    if variant.use_only_width {
        // exact target width, height derived from the source aspect ratio
        let derived = ((img.height() as f64) * (variant.width as f64) / (img.width() as f64))
            .round()
            .max(1.0) as u32;
        img.resize_exact(variant.width, derived, FilterType::Lanczos3)
    } else {
        match variant.crop_mode {
            CropMode::Inset => img.resize(variant.width, variant.height, FilterType::Lanczos3),
            CropMode::Outbound => {
                img.resize_to_fill(variant.width, variant.height, FilterType::Lanczos3)
            }
        }
    }
}

fn encode(img: &DynamicImage, variant: &VariantSpec, output: &Path) -> Result<()> {
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);

    match variant.format {
        ImageFormat::Jpg => {
            let encoder = JpegEncoder::new_with_quality(&mut writer, variant.jpeg_quality);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut writer,
                png_compression(variant.png_compression_level),
                png::FilterType::Adaptive,
            );
            img.write_with_encoder(encoder)?;
        }
        ImageFormat::Gif => {
            let mut encoder = GifEncoder::new(&mut writer);
            encoder.encode_frame(Frame::new(img.to_rgba8()))?;
        }
    }

    Ok(())
}

/// Map the 0-9 compression knob onto the codec's tiers.
fn png_compression(level: u8) -> png::CompressionType {
    match level {
        0..=2 => png::CompressionType::Fast,
        3..=6 => png::CompressionType::Default,
        _ => png::CompressionType::Best,
    }
}
