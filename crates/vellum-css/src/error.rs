//! Error types for stylesheet preprocessing.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while compiling stylesheet sources.
#[derive(Debug, Error)]
pub enum CssError {
    /// The compiler itself rejected the input.
    #[error("CSS compilation failed: {message}")]
    CompilationFailed { message: String },

    /// An external tool's binary was not found (subprocess exit code 127).
    ///
    /// This is the only error a compiler chain recovers from: the next
    /// strategy in the chain is tried. It becomes fatal when the chain
    /// is exhausted.
    #[error("toolchain unavailable: {tool} not found")]
    ToolchainUnavailable { tool: String },

    /// An external tool exited with a genuine failure.
    #[error("{tool} exited with code {code}: {stderr}")]
    ToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    /// An external compile succeeded but left no sourcemap behind.
    #[error("sourcemap not found: {}", path.display())]
    MapNotFound { path: PathBuf },

    /// A sourcemap referenced a file that does not exist.
    #[error("sourcemap references missing file: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// A sourcemap could not be parsed.
    #[error("invalid sourcemap {}: {message}", path.display())]
    InvalidMap { path: PathBuf, message: String },

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CssError>;
