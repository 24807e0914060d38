//! The compilation strategy contract.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::Path;

use crate::error::Result;
use crate::types::{CompileOutput, ParsedFiles};

/// One stylesheet compilation strategy.
///
/// `path` is the absolute location of the source file; `relative_path` is
/// the path the stylesheet is imported by (used by engines that resolve
/// the file through their own import machinery). Every strategy must apply
/// caller-supplied variable overrides identically, so switching strategies
/// never changes visual output for files that don't use the overridden
/// variables.
pub trait CssCompiler {
    /// Name used in logs and fallback diagnostics.
    fn name(&self) -> &'static str;

    fn compile(&self, path: &Path, relative_path: &str) -> Result<CompileOutput>;
}

/// Directory a stylesheet's import path is resolved against: `path` with
/// the trailing `relative_path` removed, falling back to the file's parent
/// directory when the suffix doesn't line up.
pub(crate) fn import_base_dir(path: &Path, relative_path: &str) -> Option<std::path::PathBuf> {
    let full = path.to_string_lossy();
    let relative = relative_path.trim_start_matches('/');
    full.strip_suffix(relative)
        .map(|base| std::path::PathBuf::from(base.trim_end_matches(['/', '\\'])))
        .or_else(|| path.parent().map(Path::to_path_buf))
}

/// Passthrough for plain `.css` sources: raw bytes, no dependencies.
#[derive(Debug, Default)]
pub struct PassthroughCompiler;

impl PassthroughCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl CssCompiler for PassthroughCompiler {
    fn name(&self) -> &'static str {
        "none"
    }

    fn compile(&self, path: &Path, _relative_path: &str) -> Result<CompileOutput> {
        let css = std::fs::read_to_string(path)?;
        Ok(CompileOutput::new(css, ParsedFiles::Files(Vec::new())))
    }
}
