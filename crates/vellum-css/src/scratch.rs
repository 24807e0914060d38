//! Scratch files and sourcemap handling for external compilers.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;

use crate::error::{CssError, Result};

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique basename for a set of scratch files, so concurrent renders in
/// the same directory never collide.
pub(crate) fn scratch_token(stem: &str) -> String {
    let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{stem}-{:x}-{n:x}", std::process::id())
}

/// The `.scss`/`.css`/`.map` trio an external compiler works through.
///
/// Removal happens on drop, so the files are cleaned up on every exit
/// path, success and failure alike.
pub(crate) struct ScratchFiles {
    pub source: PathBuf,
    pub output: PathBuf,
    pub map: PathBuf,
}

impl ScratchFiles {
    pub fn in_dir(dir: &Path, stem: &str) -> Self {
        let token = scratch_token(stem);
        let output = dir.join(format!("{token}.css"));
        Self {
            source: dir.join(format!("{token}.scss")),
            map: PathBuf::from(format!("{}.map", output.display())),
            output,
        }
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in [&self.source, &self.output, &self.map] {
            if path.exists() {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SourceMap {
    #[serde(default)]
    sources: Vec<String>,
}

/// Read the `sources` entries out of a compiler-emitted sourcemap.
///
/// A missing map after an otherwise-successful external compile is fatal.
pub(crate) fn read_map_sources(map_path: &Path) -> Result<Vec<String>> {
    if !map_path.exists() {
        return Err(CssError::MapNotFound {
            path: map_path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(map_path)?;
    let map: SourceMap = serde_json::from_str(&raw).map_err(|e| CssError::InvalidMap {
        path: map_path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(map.sources)
}

/// Resolve sourcemap `sources` entries to absolute, deduplicated paths.
///
/// The compiled file itself is always first. Entries are resolved against
/// `dir`; an entry that doesn't exist on disk is fatal because the cache
/// would otherwise silently miss an invalidation.
pub(crate) fn resolve_map_sources(
    dir: &Path,
    compiled: &Path,
    sources: &[String],
) -> Result<Vec<PathBuf>> {
    let mut parsed = vec![compiled.to_path_buf()];
    for source in sources {
        let candidate = if Path::new(source).is_absolute() {
            PathBuf::from(source)
        } else {
            dir.join(source)
        };
        let resolved = candidate
            .canonicalize()
            .map_err(|_| CssError::SourceNotFound {
                path: candidate.clone(),
            })?;
        if !parsed.contains(&resolved) {
            parsed.push(resolved);
        }
    }
    Ok(parsed)
}
