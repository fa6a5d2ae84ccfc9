//! Build steps emitted by the archive rule.
//!
//! Steps are plain data so an executor can log, serialize or replay them.
//! All paths are relative to the rule's filesystem root, which is also the
//! working directory for subprocesses.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::builder::archive::ArchiveContents;
use crate::builder::scrub::ArchiveScrubber;

/// The kind of a [`Step`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Mkdir,
    RemoveIfExists,
    CreateArchive,
    RunIndexer,
    ScrubOutput,
}

/// One atomic operation in an archive build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Create a directory and its parents; succeeds if it already exists.
    Mkdir { path: PathBuf },

    /// Delete a file, ignoring a missing one.
    RemoveIfExists { path: PathBuf },

    /// Run the archiver over the inputs.
    CreateArchive {
        environment: BTreeMap<String, String>,
        command_prefix: Vec<String>,
        contents: ArchiveContents,
        archive_options: Vec<String>,
        output: PathBuf,
        inputs: Vec<PathBuf>,
    },

    /// Run the symbol indexer on the archive.
    RunIndexer {
        name: String,
        command_prefix: Vec<String>,
        output: PathBuf,
    },

    /// Strip non-deterministic metadata from the archive.
    ScrubOutput {
        path: PathBuf,
        scrubbers: Vec<ArchiveScrubber>,
    },
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Mkdir { .. } => StepKind::Mkdir,
            Step::RemoveIfExists { .. } => StepKind::RemoveIfExists,
            Step::CreateArchive { .. } => StepKind::CreateArchive,
            Step::RunIndexer { .. } => StepKind::RunIndexer,
            Step::ScrubOutput { .. } => StepKind::ScrubOutput,
        }
    }

    /// The name reported for this step in logs and failures.
    pub fn short_name(&self) -> &str {
        match self {
            Step::Mkdir { .. } => "mkdir",
            Step::RemoveIfExists { .. } => "rm",
            Step::CreateArchive { .. } => "archive",
            Step::RunIndexer { name, .. } => name,
            Step::ScrubOutput { .. } => "scrub",
        }
    }

    /// The subprocess command line, for steps that run one.
    pub fn command_line(&self) -> Option<Vec<String>> {
        match self {
            Step::CreateArchive {
                command_prefix,
                archive_options,
                output,
                inputs,
                ..
            } => {
                let mut cmd = command_prefix.clone();
                cmd.extend(archive_options.iter().cloned());
                cmd.push(output.display().to_string());
                cmd.extend(inputs.iter().map(|i| i.display().to_string()));
                Some(cmd)
            }
            Step::RunIndexer {
                command_prefix,
                output,
                ..
            } => {
                let mut cmd = command_prefix.clone();
                cmd.push(output.display().to_string());
                Some(cmd)
            }
            _ => None,
        }
    }

    /// Environment variables for the subprocess, if any.
    pub fn environment(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Step::CreateArchive { environment, .. } => Some(environment),
            _ => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Mkdir { path } => write!(f, "mkdir -p {}", path.display()),
            Step::RemoveIfExists { path } => write!(f, "rm -f {}", path.display()),
            Step::ScrubOutput { path, scrubbers } => {
                write!(f, "scrub {} ({} scrubbers)", path.display(), scrubbers.len())
            }
            Step::CreateArchive { .. } | Step::RunIndexer { .. } => {
                let cmd = self.command_line().unwrap_or_default();
                write!(f, "{}", cmd.join(" "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::scrub::PaddingStyle;

    fn create_archive() -> Step {
        Step::CreateArchive {
            environment: BTreeMap::from([("ZERO_AR_DATE".to_string(), "1".to_string())]),
            command_prefix: vec!["ar".to_string()],
            contents: ArchiveContents::Normal,
            archive_options: vec!["qc".to_string()],
            output: PathBuf::from("out/libfoo.a"),
            inputs: vec![PathBuf::from("a.o"), PathBuf::from("b.o")],
        }
    }

    #[test]
    fn test_short_names() {
        assert_eq!(Step::Mkdir { path: "out".into() }.short_name(), "mkdir");
        assert_eq!(
            Step::RemoveIfExists { path: "out/libfoo.a".into() }.short_name(),
            "rm"
        );
        assert_eq!(create_archive().short_name(), "archive");
        assert_eq!(
            Step::RunIndexer {
                name: "index-archive".to_string(),
                command_prefix: vec!["ranlib".to_string()],
                output: "out/libfoo.a".into(),
            }
            .short_name(),
            "index-archive"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(create_archive().to_string(), "ar qc out/libfoo.a a.o b.o");
        assert_eq!(
            Step::Mkdir { path: "out".into() }.to_string(),
            "mkdir -p out"
        );
        assert!(Step::Mkdir { path: "out".into() }.command_line().is_none());
    }

    #[test]
    fn test_environment() {
        let step = create_archive();
        assert_eq!(
            step.environment().unwrap().get("ZERO_AR_DATE").map(String::as_str),
            Some("1")
        );
        assert!(Step::Mkdir { path: "out".into() }.environment().is_none());
    }

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(Step::ScrubOutput {
            path: "out/libfoo.a".into(),
            scrubbers: vec![ArchiveScrubber::date_uid_gid(PaddingStyle::Right)],
        })
        .unwrap();

        assert_eq!(json["type"], "scrub_output");
        assert_eq!(json["path"], "out/libfoo.a");
        assert_eq!(json["scrubbers"][0]["padding"], "right");
    }
}
