//! SCSS compilation through the external node-sass toolchain.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compiler::{CssCompiler, import_base_dir};
use crate::error::{CssError, Result};
use crate::process::ProcessRunner;
use crate::scratch::{ScratchFiles, read_map_sources, resolve_map_sources};
use crate::types::{CompileOutput, ParsedFiles, Variables, strip_sourcemap_comment, variable_prelude};

/// How the node-sass binary is invoked.
///
/// Chosen at construction time so two configurations can coexist in one
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeInvocation {
    /// `npm run node-sass -- ...` through the package's npm script.
    NpmScript,
    /// `node ./node_modules/.bin/node-sass ...` directly.
    DirectBinary,
}

/// External node-sass compiler.
///
/// Writes a scratch `.scss` with the variable prelude and an `@import` of
/// the target, shells out with a sourcemap enabled, and reconstructs the
/// dependency list from the sourcemap's `sources`. Scratch files are
/// removed regardless of outcome.
pub struct NodeSassCompiler {
    variables: Variables,
    import_dirs: Vec<PathBuf>,
    invocation: NodeInvocation,
    runner: Arc<dyn ProcessRunner>,
}

impl NodeSassCompiler {
    pub fn new(
        variables: Variables,
        import_dirs: Vec<PathBuf>,
        invocation: NodeInvocation,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            variables,
            import_dirs,
            invocation,
            runner,
        }
    }

    /// Run `npm install` in the package directory, degrading to the next
    /// chain entry when npm itself is missing.
    pub(crate) fn ensure_npm_install(runner: &dyn ProcessRunner, dir: &Path) -> Result<()> {
        let out = runner.run("npm", &["install".to_string()], dir)?;
        if out.not_found() {
            return Err(CssError::ToolchainUnavailable {
                tool: "npm".to_string(),
            });
        }
        if !out.success() {
            return Err(CssError::ToolFailed {
                tool: "npm install".to_string(),
                code: out.code,
                stderr: out.stderr,
            });
        }
        Ok(())
    }

    fn command(&self, scratch: &ScratchFiles, include_paths: &[PathBuf]) -> (String, Vec<String>) {
        let mut args: Vec<String> = match self.invocation {
            NodeInvocation::NpmScript => {
                vec!["run".into(), "node-sass".into(), "--".into()]
            }
            NodeInvocation::DirectBinary => {
                vec!["./node_modules/.bin/node-sass".into()]
            }
        };
        args.extend([
            "--source-map".into(),
            "true".into(),
            "--output-style".into(),
            "compressed".into(),
        ]);
        for dir in include_paths {
            args.push("--include-path".into());
            args.push(dir.to_string_lossy().replace('\\', "/"));
        }
        args.push(scratch.source.to_string_lossy().replace('\\', "/"));
        args.push(scratch.output.to_string_lossy().replace('\\', "/"));

        let program = match self.invocation {
            NodeInvocation::NpmScript => "npm",
            NodeInvocation::DirectBinary => "node",
        };
        (program.to_string(), args)
    }
}

impl CssCompiler for NodeSassCompiler {
    fn name(&self) -> &'static str {
        "node-sass"
    }

    fn compile(&self, path: &Path, relative_path: &str) -> Result<CompileOutput> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::ensure_npm_install(self.runner.as_ref(), dir)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stylesheet".to_string());
        let scratch = ScratchFiles::in_dir(dir, &stem);

        let relative = relative_path.trim_start_matches('/');
        let mut content = variable_prelude(&self.variables);
        content.push_str(&format!("@import \"{relative}\";\n"));
        std::fs::write(&scratch.source, content)?;

        let mut include_paths = self.import_dirs.clone();
        if let Some(base) = import_base_dir(path, relative_path) {
            if !include_paths.contains(&base) {
                include_paths.push(base);
            }
        }

        let (program, args) = self.command(&scratch, &include_paths);
        let out = self.runner.run(&program, &args, dir)?;
        if out.not_found() {
            return Err(CssError::ToolchainUnavailable {
                tool: "node-sass".to_string(),
            });
        }
        if !out.success() {
            return Err(CssError::ToolFailed {
                tool: "node-sass".to_string(),
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
    use crate::process::testing::ScriptedRunner;
    use crate::process::{EXIT_NOT_FOUND, ProcessOutput};

    #[test]
    fn test_missing_npm_degrades() {
        let runner = Arc::new(ScriptedRunner::new(vec![ScriptedRunner::exit(
            EXIT_NOT_FOUND,
        )]));
        let compiler = NodeSassCompiler::new(
            Vec::new(),
            Vec::new(),
            NodeInvocation::NpmScript,
            runner.clone(),
        );

        let temp = tempfile::tempdir().unwrap();
        let main = temp.path().join("main.scss");
        std::fs::write(&main, ".a{}").unwrap();

        let result = compiler.compile(&main, "main.scss");
        assert!(matches!(
            result,
            Err(CssError::ToolchainUnavailable { ref tool }) if tool == "npm"
        ));
    }

    #[test]
    fn test_missing_node_sass_degrades_and_cleans_scratch() {
        let runner = Arc::new(ScriptedRunner::new(vec![
            ScriptedRunner::exit(0),
            ScriptedRunner::exit(EXIT_NOT_FOUND),
        ]));
        let compiler = NodeSassCompiler::new(
            Vec::new(),
            Vec::new(),
            NodeInvocation::DirectBinary,
            runner.clone(),
        );

        let temp = tempfile::tempdir().unwrap();
        let main = temp.path().join("main.scss");
        std::fs::write(&main, ".a{}").unwrap();

        let result = compiler.compile(&main, "main.scss");
        assert!(matches!(
            result,
            Err(CssError::ToolchainUnavailable { ref tool }) if tool == "node-sass"
        ));

        // only the original source survives
        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec!["main.scss"]);
    }

    #[test]
    fn test_genuine_failure_is_fatal() {
        let runner = Arc::new(ScriptedRunner::new(vec![
            ScriptedRunner::exit(0),
            ProcessOutput {
                code: 1,
                stdout: String::new(),
                stderr: "invalid property".to_string(),
            },
        ]));
        let compiler = NodeSassCompiler::new(
            Vec::new(),
            Vec::new(),
            NodeInvocation::NpmScript,
            runner,
        );

        let temp = tempfile::tempdir().unwrap();
        let main = temp.path().join("main.scss");
        std::fs::write(&main, ".a{}").unwrap();

        let result = compiler.compile(&main, "main.scss");
        assert!(matches!(
            result,
            Err(CssError::ToolFailed { code: 1, .. })
        ));
    }

    #[test]
    fn test_missing_map_after_success_is_fatal() {
        // both npm install and node-sass "succeed" but no map is written
        let runner = Arc::new(ScriptedRunner::new(vec![
            ScriptedRunner::exit(0),
            ScriptedRunner::exit(0),
        ]));
        let compiler = NodeSassCompiler::new(
            Vec::new(),
            Vec::new(),
            NodeInvocation::NpmScript,
            runner,
        );

        let temp = tempfile::tempdir().unwrap();
        let main = temp.path().join("main.scss");
        std::fs::write(&main, ".a{}").unwrap();

        let result = compiler.compile(&main, "main.scss");
        assert!(matches!(result, Err(CssError::MapNotFound { .. })));
    }

    #[test]
    fn test_command_shape_npm_script() {
        let runner = Arc::new(ScriptedRunner::new(Vec::new()));
        let compiler = NodeSassCompiler::new(
            Vec::new(),
            vec![PathBuf::from("/lib")],
            NodeInvocation::NpmScript,
            runner,
        );
        let temp = tempfile::tempdir().unwrap();
        let scratch = ScratchFiles::in_dir(temp.path(), "main");
        let (program, args) = compiler.command(&scratch, &[PathBuf::from("/lib")]);
        assert_eq!(program, "npm");
        assert_eq!(args[0..3], ["run", "node-sass", "--"]);
        assert!(args.contains(&"--include-path".to_string()));
        assert!(args.contains(&"/lib".to_string()));
    }
}
