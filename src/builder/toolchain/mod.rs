//! Archiver and indexer tool adapters.
//!
//! This module provides a uniform interface over the external `ar`-style
//! tools used to build static libraries. An [`Archiver`] knows its command
//! prefix, the flags selecting normal or thin packaging, whether it can
//! produce thin archives at all, and which scrubbers make its output
//! reproducible.
//!
//! Tool detection priority:
//! 1. Command-line overrides
//! 2. Toolchain config file (`.stowage/toolchain.toml` or `~/.stowage/toolchain.toml`)
//! 3. Environment variables (AR, RANLIB)
//! 4. Auto-detection (searching PATH for common archivers)

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::builder::archive::ArchiveContents;
use crate::builder::scrub::ArchiveScrubber;
use crate::core::source_path::{SourcePath, SourcePathError, SourcePathResolver};
use crate::core::target::BuildTarget;

mod bsd;
mod detect;
mod gnu;

pub use bsd::BsdArchiver;
pub use detect::{detect_tools, infer_flavor, DetectedTools, ToolOverrides};
pub use gnu::GnuArchiver;

/// The executable a tool runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolProgram {
    /// A binary found on the host.
    System(PathBuf),
    /// A binary produced by another build rule.
    Built(SourcePath),
}

/// A command-line tool: program, leading arguments and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTool {
    program: ToolProgram,
    args: Vec<String>,
    env: BTreeMap<String, String>,
}

impl CommandTool {
    /// A tool that runs a host binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandTool {
            program: ToolProgram::System(program.into()),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// A tool whose binary is built by the graph.
    pub fn built(program: SourcePath) -> Self {
        CommandTool {
            program: ToolProgram::Built(program),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Add a leading argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple leading arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn program(&self) -> &ToolProgram {
        &self.program
    }

    /// Program followed by the leading arguments.
    pub fn command_prefix(
        &self,
        resolver: &SourcePathResolver,
    ) -> Result<Vec<String>, SourcePathError> {
        let program = match &self.program {
            ToolProgram::System(path) => path.display().to_string(),
            ToolProgram::Built(source) => resolver.absolute_path(source)?.display().to_string(),
        };

        let mut prefix = Vec::with_capacity(self.args.len() + 1);
        prefix.push(program);
        prefix.extend(self.args.iter().cloned());
        Ok(prefix)
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Rules that must run before this tool is usable.
    pub fn deps(&self) -> BTreeSet<BuildTarget> {
        match &self.program {
            ToolProgram::System(_) => BTreeSet::new(),
            ToolProgram::Built(source) => source.rule().cloned().into_iter().collect(),
        }
    }

    /// A machine-independent description used for rule keys.
    pub fn key_parts(&self) -> Vec<String> {
        let program = match &self.program {
            ToolProgram::System(path) => path.display().to_string(),
            ToolProgram::Built(source) => format!("built:{}", source),
        };
        std::iter::once(program).chain(self.args.iter().cloned()).collect()
    }
}

/// The family of an archiver, which fixes its flags and header conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiverFlavor {
    /// GNU binutils `ar`, `gcc-ar` and `llvm-ar`
    Gnu,
    /// BSD / Apple `ar`
    Bsd,
}

impl ArchiverFlavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiverFlavor::Gnu => "gnu",
            ArchiverFlavor::Bsd => "bsd",
        }
    }
}

impl fmt::Display for ArchiverFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiverFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gnu" => Ok(ArchiverFlavor::Gnu),
            "bsd" => Ok(ArchiverFlavor::Bsd),
            other => Err(format!("unknown archiver flavor `{}` (expected gnu or bsd)", other)),
        }
    }
}

/// An external static-library archiver.
pub trait Archiver: Send + Sync + fmt::Debug {
    /// The archiver family.
    fn flavor(&self) -> ArchiverFlavor;

    /// Whether the archiver can write archives that reference their members by path.
    fn supports_thin_archives(&self) -> bool;

    /// The underlying command-line tool.
    fn tool(&self) -> &CommandTool;

    /// Flags selecting how members are packaged; placed after the command prefix.
    fn archive_options(&self, contents: ArchiveContents) -> Vec<String>;

    /// Scrubbers that strip non-deterministic header data from the output.
    fn scrubbers(&self) -> Vec<ArchiveScrubber>;

    fn command_prefix(
        &self,
        resolver: &SourcePathResolver,
    ) -> Result<Vec<String>, SourcePathError> {
        self.tool().command_prefix(resolver)
    }

    fn environment(&self) -> BTreeMap<String, String> {
        self.tool().environment().clone()
    }

    /// Rules the archiver itself depends on (e.g. a toolchain download).
    fn deps(&self) -> BTreeSet<BuildTarget> {
        self.tool().deps()
    }
}
