//! Error types for asset pipeline operations.
//!
//! Copyright (c) 2025 Posit, PBC

use thiserror::Error;

/// A malformed resource or variant specification.
///
/// Validation runs once, before any I/O, and reports every violated
/// field rather than stopping at the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub violations: Vec<String>,
}

impl ValidationFailure {
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    pub fn push(&mut self, violation: impl Into<String>) {
        self.violations.push(violation.into());
    }

    /// `Ok(())` when nothing was violated, otherwise self as the error.
    pub fn into_result(self) -> std::result::Result<(), ValidationFailure> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Default for ValidationFailure {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid specification: {}", self.violations.join("; "))
    }
}

impl std::error::Error for ValidationFailure {}

#[derive(Debug, Error)]
pub enum AssetError {
    /// A name failed the `^[A-Za-z0-9_-]*$` identifier pattern.
    #[error("invalid name: {name}")]
    InvalidName { name: String },

    /// A group dependency chain loops back on itself.
    #[error("cyclic group dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A group depends on a name that was never declared.
    #[error("group {group} depends on undeclared group {dependency}")]
    UnknownDependency { group: String, dependency: String },

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// A render format outside the resource kind's fixed set.
    #[error("unsupported render format {format} for {kind} resources")]
    UnsupportedFormat { format: String, kind: &'static str },

    /// Merging a combine collaborator's pending sources failed.
    #[error("combine failed: {message}")]
    CombineFailed { message: String },

    #[error("image operation failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AssetError>;
