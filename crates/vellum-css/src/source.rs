//! Fault-tolerant entry point for combine-file callers.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::Path;
use std::sync::Arc;

use crate::chain::StylesheetConfig;
use crate::compiler::import_base_dir;
use crate::process::{ProcessRunner, SystemProcessRunner};
use crate::types::CacheStamps;

/// Placeholder substituted for the on-disk server directory in error
/// text, so diagnostics don't leak absolute filesystem layout.
pub const SERVER_DIRECTORY_PLACEHOLDER: &str = "{SERVER_DIRECTORY}";

/// What a combine-file collaborator gets back for one source.
#[derive(Debug, Clone)]
pub struct SourceOutput {
    /// Compiled CSS, or the compile error text when compilation failed.
    pub css: String,
    /// Path to mtime-seconds stamps; 0 marks an untrusted entry that the
    /// cache must treat as always stale.
    pub stamps: CacheStamps,
}

/// Compiles one stylesheet source for the combine step.
///
/// Never fails: a compile error puts the error text inline where the CSS
/// would have gone (so the breakage is visible in the rendered document)
/// and stamps the source untrusted so the next build retries.
pub struct StylesheetSourceCompiler {
    config: StylesheetConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl StylesheetSourceCompiler {
    pub fn new(config: StylesheetConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    pub fn with_system_runner(config: StylesheetConfig) -> Self {
        Self::new(config, Arc::new(SystemProcessRunner::new()))
    }

    pub fn compile_source(&self, path: &Path, relative_path: &str) -> SourceOutput {
        let chain = self.config.chain_for(path, self.runner.clone());

        match chain.compile(path, relative_path) {
            Ok(output) => SourceOutput {
                stamps: output.cache_stamps(path),
                css: output.css,
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "stylesheet compile failed, emitting error text inline"
                );

                let mut message = e.to_string();
                if let Some(base) = import_base_dir(path, relative_path) {
                    let server_dir = base.to_string_lossy().into_owned();
                    if !server_dir.is_empty() {
                        message = message.replace(&server_dir, SERVER_DIRECTORY_PLACEHOLDER);
                    }
                }

                let mut stamps = CacheStamps::new();
                stamps.insert(path.to_path_buf(), 0);
                SourceOutput {
                    css: message,
                    stamps,
                }
            }
        }
    }
}
