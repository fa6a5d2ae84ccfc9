//! Archive rule error types.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::source_path::SourcePathError;
use crate::core::target::BuildTarget;

/// Error constructing or running an archive rule.
#[derive(Debug, Error, Diagnostic)]
pub enum ArchiveError {
    #[error("{target}: archive tool for this platform does not support thin archives")]
    #[diagnostic(
        code(stowage::archive::unsupported_contents),
        help("use normal contents, or configure a GNU-compatible archiver (`archiver = \"gnu\"`)")
    )]
    UnsupportedPackagingMode { target: BuildTarget },

    #[error(
        "{target}: input `{}` is under filesystem root `{}`, but the archive is written under `{}`",
        input.display(),
        input_root.display(),
        output_root.display()
    )]
    #[diagnostic(
        code(stowage::archive::cross_filesystem_input),
        help("archive members are stored relative to the output, so every input must share its build root")
    )]
    CrossFilesystemInput {
        target: BuildTarget,
        input: PathBuf,
        input_root: PathBuf,
        output_root: PathBuf,
    },

    #[error("step `{step}` failed: {message}")]
    #[diagnostic(code(stowage::step::failed))]
    StepExecutionFailure { step: String, message: String },

    #[error(transparent)]
    #[diagnostic(code(stowage::resolve::unknown_target))]
    UnresolvedSourcePath(#[from] SourcePathError),
}

impl ArchiveError {
    /// The short name of the failing step, for execution failures.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            ArchiveError::StepExecutionFailure { step, .. } => Some(step),
            _ => None,
        }
    }
}
