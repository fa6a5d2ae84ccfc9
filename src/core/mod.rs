//! Core data structures for stowage.
//!
//! This module contains the build-graph vocabulary the archive rule is
//! expressed in:
//! - Build targets and their parameters
//! - Source paths and their resolution
//! - The project filesystem

pub mod buildable;
pub mod filesystem;
pub mod params;
pub mod source_path;
pub mod target;

pub use buildable::{BuildableContext, RecordingBuildableContext};
pub use filesystem::ProjectFilesystem;
pub use params::BuildRuleParams;
pub use source_path::{SourcePath, SourcePathError, SourcePathResolver};
pub use target::BuildTarget;
