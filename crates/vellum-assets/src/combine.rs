//! Combine-files collaborator contract.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The on-disk combine/cache store lives outside this crate; resources
//! only need the operations below to register sources, steer output
//! naming, and trigger the merge.

use crate::error::Result;

/// How the combined artifact's output file is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStrategy {
    /// Use the name set through `set_output_file_name`.
    #[default]
    Manual,
    /// Derive a collision-free name (content hash or similar). Chosen
    /// automatically when two resources resolve to the same name.
    Auto,
}

/// A collaborator that merges several same-type sources into one
/// physical output file.
///
/// Post-processing of the merged content (e.g. script minification) is
/// the implementation's concern; implementations are expected to keep
/// the unminified content when a minifier fails rather than erroring
/// the whole combine.
pub trait CombineFiles {
    /// Queue one more source for the merge.
    fn add_source(&mut self, source: &str);

    fn set_output_file_name(&mut self, name: &str);

    fn set_output_strategy(&mut self, strategy: OutputStrategy);

    /// Produce the combined artifact. Callers memoize; implementations
    /// may assume at most one call per render cycle.
    fn combine(&mut self) -> Result<()>;

    /// Path of the combined artifact, relative to the public root.
    fn path(&self) -> String;
}
