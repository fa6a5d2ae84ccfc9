//! Build event types for JSON output.
//!
//! These events are emitted, one JSON object per line, when using
//! `--message-format=json`.
//!
//! # Event Types
//!
//! - `rule-started`: An archive rule is about to run its steps
//! - `step-started` / `step-finished`: One step of the sequence
//! - `artifact-recorded`: The rule declared its cacheable output
//! - `build-finished`: Build completed (success or failure)
//! - `diagnostic`: A free-form message
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::builder::archive::ArchiveContents;

/// A build event emitted while an archive rule runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    #[serde(rename = "rule-started")]
    RuleStarted {
        /// Rule being built (e.g., "//lib:foo")
        target: String,
        contents: ArchiveContents,
        /// Number of steps in the sequence
        steps: usize,
    },

    #[serde(rename = "artifact-recorded")]
    ArtifactRecorded { target: String, path: PathBuf },

    #[serde(rename = "step-started")]
    StepStarted {
        target: String,
        step: String,
        index: usize,
        /// Human-readable form of the step
        description: String,
    },

    #[serde(rename = "step-finished")]
    StepFinished {
        target: String,
        step: String,
        index: usize,
        success: bool,
        duration_ms: u64,
    },

    #[serde(rename = "build-finished")]
    BuildFinished {
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        rule_key: Option<String>,
    },

    #[serde(rename = "diagnostic")]
    Diagnostic {
        /// Severity level ("error", "warning", "note")
        level: String,
        message: String,
    },
}

impl BuildEvent {
    /// Create a build finished event.
    pub fn finished(success: bool, duration_ms: u64) -> Self {
        BuildEvent::BuildFinished {
            success,
            duration_ms,
            rule_key: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        BuildEvent::Diagnostic {
            level: "error".to_string(),
            message: message.into(),
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
