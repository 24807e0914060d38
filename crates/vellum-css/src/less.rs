//! LESS compilation through the external lessc toolchain.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Variable overrides use lessc's native `--modify-var` mechanism, which
//! applies them after the stylesheet's own definitions - the same
//! semantics as the textual prepending the SCSS engines use.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compiler::{CssCompiler, import_base_dir};
use crate::error::{CssError, Result};
use crate::process::ProcessRunner;
use crate::scratch::{ScratchFiles, read_map_sources, resolve_map_sources};
use crate::types::{CompileOutput, ParsedFiles, Variables, strip_sourcemap_comment};

/// External lessc compiler.
pub struct LessCompiler {
    variables: Variables,
    import_dirs: Vec<PathBuf>,
    runner: Arc<dyn ProcessRunner>,
}

impl LessCompiler {
    pub fn new(
        variables: Variables,
        import_dirs: Vec<PathBuf>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            variables,
            import_dirs,
            runner,
        }
    }
}

impl CssCompiler for LessCompiler {
    fn name(&self) -> &'static str {
        "less"
    }

    fn compile(&self, path: &Path, relative_path: &str) -> Result<CompileOutput> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stylesheet".to_string());
        let scratch = ScratchFiles::in_dir(dir, &stem);

        let mut include_paths = self.import_dirs.clone();
        if let Some(base) = import_base_dir(path, relative_path) {
            if !include_paths.contains(&base) {
                include_paths.push(base);
            }
        }

        let mut args = vec!["--compress".to_string()];
        if !include_paths.is_empty() {
            let joined = include_paths
                .iter()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .collect::<Vec<_>>()
                .join(":");
            args.push(format!("--include-path={joined}"));
        }
        for (name, value) in &self.variables {
            args.push(format!("--modify-var={name}={value}"));
        }
        args.push(format!(
            "--source-map={}",
            scratch.map.to_string_lossy().replace('\\', "/")
        ));
        args.push(path.to_string_lossy().replace('\\', "/"));
        args.push(scratch.output.to_string_lossy().replace('\\', "/"));

        let out = self.runner.run("lessc", &args, dir)?;
        if out.not_found() {
            return Err(CssError::ToolchainUnavailable {
                tool: "lessc".to_string(),
            });
        }
        if !out.success() {
            return Err(CssError::ToolFailed {
                tool: "lessc".to_string(),
                code: out.code,
                stderr: out.stderr,
            });
        }

        let sources = read_map_sources(&scratch.map)?;
        let parsed = resolve_map_sources(dir, path, &sources)?;

        let css = std::fs::read_to_string(&scratch.output)?;
        Ok(CompileOutput::new(
            strip_sourcemap_comment(&css),
            ParsedFiles::Files(parsed),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EXIT_NOT_FOUND;
    use crate::process::testing::ScriptedRunner;

    #[test]
    fn test_missing_lessc_degrades() {
        let temp = tempfile::tempdir().unwrap();
        let main = temp.path().join("main.less");
        std::fs::write(&main, ".a { color: red; }").unwrap();

        let runner = Arc::new(ScriptedRunner::new(vec![ScriptedRunner::exit(
            EXIT_NOT_FOUND,
        )]));
        let compiler = LessCompiler::new(Vec::new(), Vec::new(), runner);

        let result = compiler.compile(&main, "main.less");
        assert!(matches!(
            result,
            Err(CssError::ToolchainUnavailable { ref tool }) if tool == "lessc"
        ));
    }

    #[test]
    fn test_modify_var_arguments() {
        let temp = tempfile::tempdir().unwrap();
        let main = temp.path().join("main.less");
        std::fs::write(&main, ".a { color: @foo; }").unwrap();

        let runner = Arc::new(ScriptedRunner::new(vec![ScriptedRunner::exit(
            EXIT_NOT_FOUND,
        )]));
        let compiler = LessCompiler::new(
            vec![("foo".to_string(), "red".to_string())],
            Vec::new(),
            runner.clone(),
        );
        let _ = compiler.compile(&main, "main.less");

        let calls = runner.calls.lock().unwrap();
        assert!(calls[0].starts_with("lessc --compress"));
        assert!(calls[0].contains("--modify-var=foo=red"));
        assert!(calls[0].contains("--source-map="));
    }

    #[test]
    fn test_compile_failure_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let main = temp.path().join("main.less");
        std::fs::write(&main, ".a {").unwrap();

        let runner = Arc::new(ScriptedRunner::new(vec![ScriptedRunner::exit(2)]));
        let compiler = LessCompiler::new(Vec::new(), Vec::new(), runner);

        let result = compiler.compile(&main, "main.less");
        assert!(matches!(result, Err(CssError::ToolFailed { code: 2, .. })));
    }
}
