//! SCSS compilation through an external Grunt task.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Grunt's documented exit codes 1 through 6 (fatal error, missing
//! gruntfile, task error, template error, invalid autocomplete, warning)
//! are genuine task failures and surface to the caller; only 127 means
//! the binary is absent and the chain may degrade.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;

use crate::compiler::{CssCompiler, import_base_dir};
use crate::error::{CssError, Result};
use crate::node_sass::NodeSassCompiler;
use crate::process::ProcessRunner;
use crate::scratch::{ScratchFiles, read_map_sources, resolve_map_sources};
use crate::types::{CompileOutput, ParsedFiles, Variables, strip_sourcemap_comment, variable_prelude};

const GRUNT_ERROR_CODES: std::ops::RangeInclusive<i32> = 1..=6;

/// External Grunt-driven SCSS compiler.
pub struct GruntCompiler {
    variables: Variables,
    import_dirs: Vec<PathBuf>,
    task: String,
    runner: Arc<dyn ProcessRunner>,
}

impl GruntCompiler {
    pub fn new(
        variables: Variables,
        import_dirs: Vec<PathBuf>,
        task: impl Into<String>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            variables,
            import_dirs,
            task: task.into(),
            runner,
        }
    }
}

impl CssCompiler for GruntCompiler {
    fn name(&self) -> &'static str {
        "grunt"
    }

    fn compile(&self, path: &Path, relative_path: &str) -> Result<CompileOutput> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        if !dir.join("node_modules").exists() {
            NodeSassCompiler::ensure_npm_install(self.runner.as_ref(), dir)?;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stylesheet".to_string());
        let scratch = ScratchFiles::in_dir(dir, &stem);

        let relative = relative_path.trim_start_matches('/');
        let mut content = variable_prelude(&self.variables);
        content.push_str(&format!("@import \"{relative}\";\n"));
        std::fs::write(&scratch.source, content)?;

        let mut load_paths = self.import_dirs.clone();
        if let Some(base) = import_base_dir(path, relative_path) {
            if !load_paths.contains(&base) {
                load_paths.push(base);
            }
        }

        let options = json!({
            "src": scratch.source.to_string_lossy().replace('\\', "/"),
            "output": scratch.output.to_string_lossy().replace('\\', "/"),
            "loadPath": load_paths
                .iter()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .collect::<Vec<_>>(),
        });
        let args = vec![self.task.clone(), format!("-options={options}")];

        let out = self.runner.run("grunt", &args, dir)?;
        if out.not_found() {
            return Err(CssError::ToolchainUnavailable {
                tool: "grunt".to_string(),
            });
        }
        if GRUNT_ERROR_CODES.contains(&out.code) {
            return Err(CssError::ToolFailed {
                tool: format!("grunt {}", self.task),
                code: out.code,
                stderr: out.stderr,
            });
        }
        if !out.success() {
            return Err(CssError::ToolFailed {
                tool: "grunt".to_string(),
                code: out.code,
                stderr: out.stderr,
            });
        }

        let sources: Vec<String> = read_map_sources(&scratch.map)?
            .into_iter()
            .map(|s| s.trim_start_matches("file://").to_string())
            .collect();
        let parsed = resolve_map_sources(dir, path, &sources)?;

        let css = std::fs::read_to_string(&scratch.output)?;
        Ok(CompileOutput::new(
            strip_sourcemap_comment(&css),
            ParsedFiles::Files(parsed),
        ))
    }
}
