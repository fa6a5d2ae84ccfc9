//! References to build inputs.
//!
//! A [`SourcePath`] is either a file checked into a project filesystem or the
//! output of another build rule. The [`SourcePathResolver`] turns either form
//! into concrete paths and reports which rule, if any, produces it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::filesystem::ProjectFilesystem;
use crate::core::target::BuildTarget;

/// Error resolving a [`SourcePath`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourcePathError {
    #[error("no output registered for build target `{target}`")]
    UnknownTarget { target: BuildTarget },
}

/// A path to a file that exists in a project filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSourcePath {
    filesystem: ProjectFilesystem,
    relative_path: PathBuf,
}

impl PathSourcePath {
    pub fn new(filesystem: ProjectFilesystem, relative_path: impl Into<PathBuf>) -> Self {
        PathSourcePath {
            filesystem,
            relative_path: relative_path.into(),
        }
    }

    pub fn filesystem(&self) -> &ProjectFilesystem {
        &self.filesystem
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }
}

/// The output of a build rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildTargetSourcePath {
    target: BuildTarget,
}

impl BuildTargetSourcePath {
    pub fn new(target: BuildTarget) -> Self {
        BuildTargetSourcePath { target }
    }

    pub fn target(&self) -> &BuildTarget {
        &self.target
    }
}

/// A reference to a build input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourcePath {
    Path(PathSourcePath),
    BuildTarget(BuildTargetSourcePath),
}

impl SourcePath {
    /// A checked-in file.
    pub fn path(filesystem: ProjectFilesystem, relative_path: impl Into<PathBuf>) -> Self {
        SourcePath::Path(PathSourcePath::new(filesystem, relative_path))
    }

    /// The output of `target`.
    pub fn target(target: BuildTarget) -> Self {
        SourcePath::BuildTarget(BuildTargetSourcePath::new(target))
    }

    /// The rule producing this path, if any.
    pub fn rule(&self) -> Option<&BuildTarget> {
        match self {
            SourcePath::Path(_) => None,
            SourcePath::BuildTarget(p) => Some(p.target()),
        }
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourcePath::Path(p) => write!(f, "{}", p.relative_path.display()),
            SourcePath::BuildTarget(p) => write!(f, "{}", p.target),
        }
    }
}

#[derive(Debug, Clone)]
struct RuleOutput {
    filesystem: ProjectFilesystem,
    path: PathBuf,
}

/// Resolves [`SourcePath`]s to filesystem locations.
///
/// Rule outputs must be registered before paths naming them can be resolved.
#[derive(Debug, Clone, Default)]
pub struct SourcePathResolver {
    outputs: BTreeMap<BuildTarget, RuleOutput>,
}

impl SourcePathResolver {
    pub fn new() -> Self {
        SourcePathResolver::default()
    }

    /// Record where `target` writes its output.
    pub fn register_output(
        &mut self,
        target: BuildTarget,
        filesystem: ProjectFilesystem,
        path: impl Into<PathBuf>,
    ) {
        self.outputs.insert(
            target,
            RuleOutput {
                filesystem,
                path: path.into(),
            },
        );
    }

    fn output(&self, target: &BuildTarget) -> Result<&RuleOutput, SourcePathError> {
        self.outputs
            .get(target)
            .ok_or_else(|| SourcePathError::UnknownTarget {
                target: target.clone(),
            })
    }

    /// The filesystem `path` lives in.
    pub fn filesystem<'a>(
        &'a self,
        path: &'a SourcePath,
    ) -> Result<&'a ProjectFilesystem, SourcePathError> {
        match path {
            SourcePath::Path(p) => Ok(&p.filesystem),
            SourcePath::BuildTarget(p) => Ok(&self.output(&p.target)?.filesystem),
        }
    }

    /// `path` relative to the root of its own filesystem.
    pub fn relative_path(&self, path: &SourcePath) -> Result<PathBuf, SourcePathError> {
        match path {
            SourcePath::Path(p) => Ok(p.relative_path.clone()),
            SourcePath::BuildTarget(p) => Ok(self.output(&p.target)?.path.clone()),
        }
    }

    /// `path` as an absolute location.
    pub fn absolute_path(&self, path: &SourcePath) -> Result<PathBuf, SourcePathError> {
        let relative = self.relative_path(path)?;
        Ok(self.filesystem(path)?.resolve(&relative))
    }
}
