//! Stylesheet preprocessing infrastructure for Vellum.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This crate provides:
//! - A polymorphic compiler contract ([`CssCompiler`]) with strategies
//!   for embedded SCSS (grass), external node-sass, lessc, a Grunt task,
//!   and raw passthrough
//! - Fallback chaining: a missing toolchain binary (exit 127) degrades to
//!   the next configured strategy instead of failing the build
//! - Dependency tracking: every compile reports the transitive set of
//!   files actually read, for external cache invalidation

mod chain;
mod compiler;
mod embedded;
mod error;
mod grunt;
mod less;
mod node_sass;
mod process;
mod scratch;
mod source;
mod types;

pub use chain::{CompilerChain, ScssPipeline, StylesheetConfig};
pub use compiler::{CssCompiler, PassthroughCompiler};
pub use embedded::EmbeddedScssCompiler;
pub use error::{CssError, Result};
pub use grunt::GruntCompiler;
pub use less::LessCompiler;
pub use node_sass::{NodeInvocation, NodeSassCompiler};
pub use process::{EXIT_NOT_FOUND, ProcessOutput, ProcessRunner, SystemProcessRunner};
pub use source::{SERVER_DIRECTORY_PLACEHOLDER, SourceOutput, StylesheetSourceCompiler};
pub use types::{
    CacheStamps, CompileOutput, ParsedFiles, Variables, mtime_seconds, strip_sourcemap_comment,
    variable_prelude,
};
