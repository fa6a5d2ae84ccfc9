//! Stowage - reproducible static-library archive rules
//!
//! This crate provides the library behind the `stowage` command: an archive
//! build rule that turns an ordered list of object files into a `.a`
//! library, the steps that build it, and the tooling to run them.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities for stowage unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests.
#[cfg(test)]
pub mod test_support;

pub use builder::{ArchiveContents, ArchiveError, ArchiveRule, Step};
pub use crate::core::{BuildTarget, ProjectFilesystem, SourcePath};
