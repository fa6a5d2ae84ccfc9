//! High-level operations.
//!
//! This module contains the implementation of stowage commands.

pub mod archive;
pub mod toolchain;

pub use archive::{archive, archive_rule_key, prepare, ArchiveOptions, ArchiveOutcome};
pub use toolchain::{set_override, toolchain_report, OverrideOptions, ToolchainReport};
