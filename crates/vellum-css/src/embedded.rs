//! Embedded SCSS compilation using the grass crate.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Compiles in-process, with a recording `grass::Fs` adapter so every file
//! the engine reads lands in the dependency list for cache invalidation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use grass::{Options, OutputStyle};

use crate::compiler::{CssCompiler, import_base_dir};
use crate::error::{CssError, Result};
use crate::types::{CompileOutput, ParsedFiles, Variables, variable_prelude};

/// Adapter implementing `grass::Fs` that records every file read.
#[derive(Debug, Default)]
struct RecordingFs {
    reads: Mutex<Vec<PathBuf>>,
}

impl RecordingFs {
    fn new() -> Self {
        Self::default()
    }

    fn into_parsed_files(self) -> Vec<PathBuf> {
        self.reads.into_inner().unwrap_or_default()
    }
}

impl grass::Fs for RecordingFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Ok(mut reads) = self.reads.lock() {
            if !reads.contains(&absolute) {
                reads.push(absolute);
            }
        }
        std::fs::read(path)
    }
}

/// In-process SCSS compiler.
///
/// Variable overrides are prepended as `$name: value;` assignment lines,
/// followed by an `@import` of the target file, so the overrides always
/// win over the stylesheet's own defaults.
pub struct EmbeddedScssCompiler {
    variables: Variables,
    import_dirs: Vec<PathBuf>,
}

impl EmbeddedScssCompiler {
    pub fn new(variables: Variables, import_dirs: Vec<PathBuf>) -> Self {
        Self {
            variables,
            import_dirs,
        }
    }
}

impl CssCompiler for EmbeddedScssCompiler {
    fn name(&self) -> &'static str {
        "scss"
    }

    fn compile(&self, path: &Path, relative_path: &str) -> Result<CompileOutput> {
        let relative = relative_path.trim_start_matches('/');

        let mut load_paths = self.import_dirs.clone();
        if let Some(base) = import_base_dir(path, relative_path) {
            if !load_paths.contains(&base) {
                load_paths.push(base);
            }
        }

        let mut content = variable_prelude(&self.variables);
        content.push_str(&format!("@import \"{relative}\";\n"));

        let fs = RecordingFs::new();
        let options = Options::default()
            .fs(&fs)
            .load_paths(&load_paths)
            .style(OutputStyle::Compressed);

        let css = grass::from_string(content, &options).map_err(|e| {
            CssError::CompilationFailed {
                message: e.to_string(),
            }
        })?;

        Ok(CompileOutput::new(
            css,
            ParsedFiles::Files(fs.into_parsed_files()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_compile_records_parsed_files() {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "_colors.scss", "$accent: blue;");
        let main = write(
            temp.path(),
            "main.scss",
            "@import \"colors\";\n.btn { color: $accent; }",
        );

        let compiler = EmbeddedScssCompiler::new(Vec::new(), Vec::new());
        let output = compiler.compile(&main, "main.scss").unwrap();

        assert!(output.css.contains(".btn"));
        assert!(output.css.contains("blue"));
        match output.parsed_files {
            ParsedFiles::Files(files) => {
                assert_eq!(files.len(), 2);
                assert!(files.iter().any(|f| f.ends_with("main.scss")));
                assert!(files.iter().any(|f| f.ends_with("_colors.scss")));
            }
            ParsedFiles::Untrusted => panic!("expected tracked files"),
        }
    }

    #[test]
    fn test_variable_override_wins() {
        let temp = tempfile::tempdir().unwrap();
        let main = write(temp.path(), "style.scss", ".box { color: $foo; }");

        let compiler = EmbeddedScssCompiler::new(
            vec![("foo".to_string(), "red".to_string())],
            Vec::new(),
        );
        let output = compiler.compile(&main, "style.scss").unwrap();
        assert!(output.css.contains("red"));
    }

    #[test]
    fn test_override_on_top_of_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let main = write(
            temp.path(),
            "style.scss",
            "$foo: green !default;\n.box { color: $foo; }",
        );

        let compiler = EmbeddedScssCompiler::new(
            vec![("foo".to_string(), "red".to_string())],
            Vec::new(),
        );
        let output = compiler.compile(&main, "style.scss").unwrap();
        assert!(output.css.contains("red"));
        assert!(!output.css.contains("green"));
    }

    #[test]
    fn test_compile_error_surfaces() {
        let temp = tempfile::tempdir().unwrap();
        let main = write(temp.path(), "bad.scss", ".box { color: $undefined; }");

        let compiler = EmbeddedScssCompiler::new(Vec::new(), Vec::new());
        let result = compiler.compile(&main, "bad.scss");
        assert!(matches!(
            result,
            Err(CssError::CompilationFailed { .. })
        ));
    }

    #[test]
    fn test_base_dir_strips_relative_suffix() {
        let base = import_base_dir(Path::new("/srv/web/style/main.scss"), "style/main.scss");
        assert_eq!(base, Some(PathBuf::from("/srv/web")));
    }

    #[test]
    fn test_import_dirs_are_searched() {
        let temp = tempfile::tempdir().unwrap();
        let lib = temp.path().join("lib");
        std::fs::create_dir(&lib).unwrap();
        write(&lib, "_shared.scss", ".shared { margin: 0; }");
        let main = write(temp.path(), "main.scss", "@import \"shared\";");

        let compiler = EmbeddedScssCompiler::new(Vec::new(), vec![lib]);
        let output = compiler.compile(&main, "main.scss").unwrap();
        assert!(output.css.contains(".shared"));
    }
}
