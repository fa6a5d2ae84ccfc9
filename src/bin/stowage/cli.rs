//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use stowage::builder::{ArchiveContents, ArchiverFlavor, ToolOverrides};

/// Stowage - reproducible static-library archives
#[derive(Parser)]
#[command(name = "stowage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package object files into a static library
    Archive(ArchiveArgs),

    /// Print the rule key of an archive
    RuleKey(ArchiveArgs),

    /// Show or override the archiver toolchain
    Toolchain(ToolchainArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for build messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MessageFormat {
    #[default]
    Human,
    Json,
}

#[derive(Args)]
pub struct ToolArgs {
    /// Archiver to use (overrides config, AR and PATH)
    #[arg(long)]
    pub ar: Option<PathBuf>,

    /// Archive indexer to use (overrides config, RANLIB and PATH)
    #[arg(long)]
    pub ranlib: Option<PathBuf>,

    /// Archiver flavor: gnu or bsd (inferred from the archiver name if omitted)
    #[arg(long)]
    pub flavor: Option<ArchiverFlavor>,
}

impl ToolArgs {
    pub fn overrides(&self) -> ToolOverrides {
        ToolOverrides {
            ar: self.ar.clone(),
            ranlib: self.ranlib.clone(),
            flavor: self.flavor,
        }
    }
}

#[derive(Args)]
pub struct ArchiveArgs {
    /// Object files in member order; globs and `//pkg:rule=path` are accepted
    pub inputs: Vec<String>,

    /// Archive to write, relative to the root
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write a thin archive that references its members by path
    #[arg(long)]
    pub thin: bool,

    /// Packaging mode: normal or thin
    #[arg(long, conflicts_with = "thin")]
    pub contents: Option<ArchiveContents>,

    /// Build target name (e.g. //lib:foo); derived from the output if omitted
    #[arg(long)]
    pub target: Option<String>,

    /// Project root that inputs and the output are relative to
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Print the build steps as JSON instead of running them
    #[arg(long)]
    pub plan: bool,

    /// Output format for build messages
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

impl ArchiveArgs {
    pub fn contents(&self) -> Option<ArchiveContents> {
        if self.thin {
            Some(ArchiveContents::Thin)
        } else {
            self.contents
        }
    }
}

#[derive(Args)]
pub struct ToolchainArgs {
    #[command(subcommand)]
    pub command: Option<ToolchainCommands>,

    /// Project root whose config is consulted
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

#[derive(Subcommand)]
pub enum ToolchainCommands {
    /// Show the detected toolchain (the default)
    Show,

    /// Persist toolchain settings in a config file
    Override(ToolchainOverrideArgs),
}

#[derive(Args)]
pub struct ToolchainOverrideArgs {
    /// Archiver path
    #[arg(long)]
    pub ar: Option<PathBuf>,

    /// Archive indexer path
    #[arg(long)]
    pub ranlib: Option<PathBuf>,

    /// Archiver flavor: gnu or bsd
    #[arg(long)]
    pub flavor: Option<ArchiverFlavor>,

    /// Default packaging mode: normal or thin
    #[arg(long)]
    pub contents: Option<ArchiveContents>,

    /// Extra archiver argument placed before the mode flags (repeatable)
    #[arg(long = "ar-flag", allow_hyphen_values = true)]
    pub ar_flags: Vec<String>,

    /// Write ~/.stowage/toolchain.toml instead of the project config
    #[arg(long)]
    pub global: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
