//! Per-variant staleness decisions against recorded build provenance.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::image::options::{CompareMode, CropMode, ImageFormat, VariantSpec};

/// What the variant was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    pub path: PathBuf,
    /// Source mtime in seconds at build time.
    pub mtime: u64,
    /// Source size in bytes at build time.
    pub size: u64,
}

/// Encoder knobs recorded per format so option changes invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodeOptions {
    JpegQuality(u8),
    PngCompressionLevel(u8),
    None,
}

impl EncodeOptions {
    pub fn for_variant(variant: &VariantSpec) -> Self {
        match variant.format {
            ImageFormat::Jpg => EncodeOptions::JpegQuality(variant.jpeg_quality),
            ImageFormat::Png => EncodeOptions::PngCompressionLevel(variant.png_compression_level),
            ImageFormat::Gif => EncodeOptions::None,
        }
    }
}

/// What the build produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub crop_mode: CropMode,
    pub format: ImageFormat,
    pub encode_options: EncodeOptions,
}

/// Provenance for one produced output file. Persisted by the caller and
/// compared against a freshly computed [`VariantSpec`] to decide
/// regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub input: InputRecord,
    pub output: OutputRecord,
}

/// Whether a variant's cached output must be regenerated.
///
/// The intent checks (source path, dimensions, crop mode, format, encode
/// options) always run. [`CompareMode::Full`] additionally stats the
/// filesystem: a missing output or a modified source also forces a
/// rebuild. No prior record means a first build, always stale.
pub fn is_stale(
    previous: Option<&BuildRecord>,
    source_path: &Path,
    variant: &VariantSpec,
    mode: CompareMode,
) -> bool {
    let Some(record) = previous else {
        return true;
    };

    if record.input.path != source_path {
        return true;
    }
    if record.output.width != variant.width || record.output.height != variant.height {
        return true;
    }
    if record.output.crop_mode != variant.crop_mode {
        return true;
    }
    if record.output.format != variant.format {
        return true;
    }
    if record.output.encode_options != EncodeOptions::for_variant(variant) {
        return true;
    }

    if mode == CompareMode::Full {
        if !record.output.path.exists() {
            return true;
        }
        if record.input.mtime != mtime_seconds(source_path)
            || record.input.size != file_size(source_path)
        {
            return true;
        }
    }

    false
}

pub(crate) fn mtime_seconds(path: &Path) -> u64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub(crate) fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(variant: &VariantSpec, source: &Path, output: &Path) -> BuildRecord {
        BuildRecord {
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
        }
    }

    #[test]
    fn test_no_record_is_stale() {
        let variant = VariantSpec::new(300, 150, ImageFormat::Png);
        assert!(is_stale(
            None,
            Path::new("img/a.png"),
            &variant,
            CompareMode::Simple
        ));
    }

    #[test]
    fn test_matching_record_is_fresh() {
        let variant = VariantSpec::new(300, 150, ImageFormat::Png);
        let source = Path::new("img/a.png");
        let rec = record(&variant, source, Path::new("out/a_300x150.png"));
        assert!(!is_stale(Some(&rec), source, &variant, CompareMode::Simple));
    }

    #[test]
    fn test_format_change_is_stale() {
        let mut variant = VariantSpec::new(300, 150, ImageFormat::Png);
        let source = Path::new("img/a.png");
        let rec = record(&variant, source, Path::new("out/a_300x150.png"));

        variant.format = ImageFormat::Jpg;
        assert!(is_stale(Some(&rec), source, &variant, CompareMode::Simple));
    }

    #[test]
    fn test_dimension_change_is_stale() {
        let variant = VariantSpec::new(300, 150, ImageFormat::Png);
        let source = Path::new("img/a.png");
        let rec = record(&variant, source, Path::new("out/a_300x150.png"));

        let mut wider = variant.clone();
        wider.width = 400;
        assert!(is_stale(Some(&rec), source, &wider, CompareMode::Simple));
    }

    #[test]
    fn test_crop_mode_change_is_stale() {
        let variant = VariantSpec::new(300, 150, ImageFormat::Png);
        let source = Path::new("img/a.png");
        let rec = record(&variant, source, Path::new("out/a_300x150.png"));

        let mut inset = variant.clone();
        inset.crop_mode = CropMode::Inset;
        assert!(is_stale(Some(&rec), source, &inset, CompareMode::Simple));
    }

    #[test]
    fn test_encode_option_change_is_stale() {
        let variant = VariantSpec::new(300, 150, ImageFormat::Jpg);
        let source = Path::new("img/a.jpg");
        let rec = record(&variant, source, Path::new("out/a_300x150.jpg"));

        let mut requality = variant.clone();
        requality.jpeg_quality = 60;
        assert!(is_stale(Some(&rec), source, &requality, CompareMode::Simple));
    }

    #[test]
    fn test_source_path_change_is_stale() {
        let variant = VariantSpec::new(300, 150, ImageFormat::Png);
        let rec = record(&variant, Path::new("img/a.png"), Path::new("out/a.png"));
        assert!(is_stale(
            Some(&rec),
            Path::new("img/b.png"),
            &variant,
            CompareMode::Simple
        ));
    }

    #[test]
    fn test_full_mode_detects_missing_output() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.png");
        std::fs::write(&source, b"x").unwrap();

        let variant = VariantSpec::new(300, 150, ImageFormat::Png);
        let rec = record(&variant, &source, &temp.path().join("gone.png"));

        // intent unchanged, so simple mode trusts the cache
        assert!(!is_stale(Some(&rec), &source, &variant, CompareMode::Simple));
        assert!(is_stale(Some(&rec), &source, &variant, CompareMode::Full));
    }

    #[test]
    fn test_full_mode_detects_source_modification() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.png");
        std::fs::write(&source, b"x").unwrap();
        let output = temp.path().join("a_out.png");
        std::fs::write(&output, b"o").unwrap();

        let variant = VariantSpec::new(300, 150, ImageFormat::Png);
        let mut rec = record(&variant, &source, &output);
        rec.input.size += 1;

        assert!(is_stale(Some(&rec), &source, &variant, CompareMode::Full));
    }

    #[test]
    fn test_simple_fresh_implies_full_fresh_on_identical_state() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.png");
        std::fs::write(&source, b"x").unwrap();
        let output = temp.path().join("a_out.png");
        std::fs::write(&output, b"o").unwrap();

        let variant = VariantSpec::new(300, 150, ImageFormat::Png);
        let rec = record(&variant, &source, &output);

        assert!(!is_stale(Some(&rec), &source, &variant, CompareMode::Simple));
        assert!(!is_stale(Some(&rec), &source, &variant, CompareMode::Full));
    }

    #[test]
    fn test_record_round_trips_through_serde() {
        let variant = VariantSpec::new(300, 150, ImageFormat::Jpg);
        let rec = record(&variant, Path::new("a.jpg"), Path::new("out.jpg"));
        let json = serde_json::to_string(&rec).unwrap();
        let back: BuildRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}
