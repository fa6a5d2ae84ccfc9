//! Test utilities for stowage unit tests.
//!
//! Provides shorthand constructors for rule inputs, a scriptable archiver
//! that stands in for a real `ar`, and byte-level archive fixtures.

pub mod fixtures;

use std::sync::Arc;

use crate::builder::archive::ArchiveContents;
use crate::builder::scrub::{ArchiveScrubber, PaddingStyle};
use crate::builder::toolchain::{Archiver, ArchiverFlavor, CommandTool, GnuArchiver};
use crate::core::filesystem::ProjectFilesystem;
use crate::core::source_path::SourcePath;
use crate::core::target::BuildTarget;

pub use fixtures::*;

/// Parse a target, panicking on malformed input.
pub fn target(s: &str) -> BuildTarget {
    BuildTarget::parse(s).unwrap_or_else(|e| panic!("bad test target `{}`: {}", s, e))
}

/// A filesystem rooted at `/repo`; never touched on disk.
pub fn repo_fs() -> ProjectFilesystem {
    ProjectFilesystem::new("/repo")
}

/// A GNU archiver whose binary is the output of `tool`.
pub fn gnu_with_dep(tool: BuildTarget) -> Arc<dyn Archiver> {
    Arc::new(GnuArchiver::new(CommandTool::built(SourcePath::target(tool))))
}

/// An archiver backed by a shell script instead of a real `ar`.
///
/// The script sees the archive options as `$1`, the output as `$2` and the
/// inputs after that.
#[derive(Debug, Clone)]
pub struct ScriptArchiver {
    tool: CommandTool,
}

impl ScriptArchiver {
    pub fn new(script: &str) -> Self {
        ScriptArchiver {
            tool: CommandTool::new("sh").args(["-c", script, "sh"]),
        }
    }

    /// Writes an archive with no members.
    pub fn empty_archive() -> Self {
        ScriptArchiver::new(r#"printf '!<arch>\n' > "$2""#)
    }

    /// Runs the `ar` on PATH in non-deterministic mode, so member headers
    /// carry real dates and owners.
    pub fn stamping_ar() -> Self {
        ScriptArchiver::new(
            r#"mode=qcU; [ "$1" = thin ] && mode=qcTU; out="$2"; shift 2; exec ar "$mode" "$out" "$@""#,
        )
    }

    /// Like [`ScriptArchiver::empty_archive`] but fails unless `key=value`
    /// is set in its environment.
    pub fn requiring_env(key: &str, value: &str) -> Self {
        let script = format!(
            r#"[ "${key}" = "{value}" ] || exit 3; printf '!<arch>\n' > "$2""#,
            key = key,
            value = value
        );
        let mut archiver = ScriptArchiver::new(&script);
        archiver.tool = archiver.tool.env(key, value);
        archiver
    }
}

impl Archiver for ScriptArchiver {
    fn flavor(&self) -> ArchiverFlavor {
        ArchiverFlavor::Gnu
    }

    fn supports_thin_archives(&self) -> bool {
        true
    }

    fn tool(&self) -> &CommandTool {
        &self.tool
    }

    fn archive_options(&self, contents: ArchiveContents) -> Vec<String> {
        vec![contents.as_str().to_string()]
    }

    fn scrubbers(&self) -> Vec<ArchiveScrubber> {
        vec![ArchiveScrubber::date_uid_gid(PaddingStyle::Right)]
    }
}
