//! Core types for stylesheet compilation results.
//!
//! Copyright (c) 2025 Posit, PBC

use std::collections::BTreeMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

/// The files a compiler actually read while producing its output.
///
/// `Untrusted` means the dependency list could not be determined and the
/// compiled output must be treated as always stale by the caller's cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFiles {
    /// Dependency tracking failed or is unsupported for this compiler.
    Untrusted,
    /// Ordered list of absolute paths read during compilation.
    Files(Vec<PathBuf>),
}

impl ParsedFiles {
    /// Number of tracked files, zero when untrusted.
    pub fn len(&self) -> usize {
        match self {
            ParsedFiles::Untrusted => 0,
            ParsedFiles::Files(files) => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of compiling one stylesheet source.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The compiled CSS.
    pub css: String,
    /// Every file read during compilation, for cache invalidation.
    pub parsed_files: ParsedFiles,
}

impl CompileOutput {
    pub fn new(css: String, parsed_files: ParsedFiles) -> Self {
        Self { css, parsed_files }
    }

    /// Stamp each parsed file with its current mtime (seconds since epoch).
    ///
    /// An untrusted dependency list stamps the given source path with 0,
    /// which the external cache treats as "always rebuild".
    pub fn cache_stamps(&self, source_path: &std::path::Path) -> CacheStamps {
        let mut stamps = BTreeMap::new();
        match &self.parsed_files {
            ParsedFiles::Untrusted => {
                stamps.insert(source_path.to_path_buf(), 0);
            }
            ParsedFiles::Files(files) => {
                for file in files {
                    stamps.insert(file.clone(), mtime_seconds(file));
                }
            }
        }
        stamps
    }
}

/// Map of file path to mtime-in-seconds. A stamp of 0 marks a file whose
/// dependency information is untrusted.
pub type CacheStamps = BTreeMap<PathBuf, u64>;

/// Variable overrides applied on top of a stylesheet's own defaults.
///
/// Order is preserved so later assignments win, matching the textual
/// prepending used by the embedded engines.
pub type Variables = Vec<(String, String)>;

/// Render `$name: value;` assignment lines for the embedded engines.
pub fn variable_prelude(variables: &Variables) -> String {
    let mut code = String::new();
    for (name, value) in variables {
        code.push_str(&format!("${name}: {value};\n"));
    }
    code
}

static SOURCEMAP_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)(/\*#\s*sourceMappingURL=).*(\*/)").unwrap());

/// Strip the trailing sourcemap comment an external compiler appends.
pub fn strip_sourcemap_comment(css: &str) -> String {
    SOURCEMAP_COMMENT.replace_all(css, "").trim().to_string()
}

/// Current mtime of a file in whole seconds, 0 when unavailable.
pub fn mtime_seconds(path: &std::path::Path) -> u64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
