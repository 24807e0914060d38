//! Compiler selection and fallback composition.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The fallback policy is data: an ordered list of strategies. A
//! toolchain-unavailable failure (subprocess exit 127) degrades to the
//! next strategy in the list; any other failure is fatal immediately.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::compiler::{CssCompiler, PassthroughCompiler};
use crate::embedded::EmbeddedScssCompiler;
use crate::error::{CssError, Result};
use crate::grunt::GruntCompiler;
use crate::less::LessCompiler;
use crate::node_sass::{NodeInvocation, NodeSassCompiler};
use crate::process::ProcessRunner;
use crate::types::{CompileOutput, Variables};

/// Ordered list of compilation strategies tried in sequence.
pub struct CompilerChain {
    compilers: Vec<Box<dyn CssCompiler>>,
}

impl CompilerChain {
    pub fn new(compilers: Vec<Box<dyn CssCompiler>>) -> Self {
        Self { compilers }
    }

    /// Compile with the first strategy whose toolchain is present.
    ///
    /// Exhausting the list surfaces the last unavailable error as fatal.
    pub fn compile(&self, path: &Path, relative_path: &str) -> Result<CompileOutput> {
        let mut last_unavailable = None;

        for compiler in &self.compilers {
            match compiler.compile(path, relative_path) {
                Ok(output) => return Ok(output),
                Err(CssError::ToolchainUnavailable { tool }) => {
                    tracing::warn!(
                        %tool,
                        compiler = compiler.name(),
                        "toolchain unavailable, degrading to next compiler"
                    );
                    last_unavailable = Some(CssError::ToolchainUnavailable { tool });
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_unavailable.unwrap_or(CssError::CompilationFailed {
            message: "no compiler configured".to_string(),
        }))
    }
}

/// Which toolchain handles `.scss` sources.
///
/// The external variants degrade to the embedded engine when their binary
/// is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScssPipeline {
    #[default]
    Embedded,
    NodeSass(NodeInvocation),
    Grunt,
}

/// Per-language compiler settings for one stylesheet collection.
#[derive(Default)]
pub struct StylesheetConfig {
    pub scss_variables: Variables,
    pub scss_import_dirs: Vec<PathBuf>,
    pub less_variables: Variables,
    pub less_import_dirs: Vec<PathBuf>,
    pub scss_pipeline: ScssPipeline,
    /// Grunt task invoked by the [`ScssPipeline::Grunt`] pipeline.
    pub grunt_task: Option<String>,
}

impl StylesheetConfig {
    const DEFAULT_GRUNT_TASK: &'static str = "vellum-scss";

    /// Build the fallback chain for a source file, selected by extension.
    pub fn chain_for(&self, path: &Path, runner: Arc<dyn ProcessRunner>) -> CompilerChain {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        let compilers: Vec<Box<dyn CssCompiler>> = match extension.as_str() {
            "scss" => {
                let embedded = Box::new(EmbeddedScssCompiler::new(
                    self.scss_variables.clone(),
                    self.scss_import_dirs.clone(),
                ));
                match self.scss_pipeline {
                    ScssPipeline::Embedded => vec![embedded],
                    ScssPipeline::NodeSass(invocation) => vec![
                        Box::new(NodeSassCompiler::new(
                            self.scss_variables.clone(),
                            self.scss_import_dirs.clone(),
                            invocation,
                            runner,
                        )),
                        embedded,
                    ],
                    ScssPipeline::Grunt => vec![
                        Box::new(GruntCompiler::new(
                            self.scss_variables.clone(),
                            self.scss_import_dirs.clone(),
                            self.grunt_task
                                .clone()
                                .unwrap_or_else(|| Self::DEFAULT_GRUNT_TASK.to_string()),
                            runner,
                        )),
                        embedded,
                    ],
                }
            }
            "less" => vec![Box::new(LessCompiler::new(
                self.less_variables.clone(),
                self.less_import_dirs.clone(),
                runner,
            ))],
            _ => vec![Box::new(PassthroughCompiler::new())],
        };

        CompilerChain::new(compilers)
    }
}
