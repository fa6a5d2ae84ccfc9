//! Artifact recording for the caching layer.

use std::path::{Path, PathBuf};

/// Receives the outputs a rule wants cached.
pub trait BuildableContext {
    /// Declare `path` (relative to the rule's filesystem root) as a cacheable output.
    fn record_artifact(&mut self, path: &Path);
}

/// A [`BuildableContext`] that remembers what was recorded.
#[derive(Debug, Clone, Default)]
pub struct RecordingBuildableContext {
    artifacts: Vec<PathBuf>,
}

impl RecordingBuildableContext {
    pub fn new() -> Self {
        RecordingBuildableContext::default()
    }

    /// Recorded paths, in recording order.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }
}

impl BuildableContext for RecordingBuildableContext {
    fn record_artifact(&mut self, path: &Path) {
        tracing::debug!("Recording artifact {}", path.display());
        self.artifacts.push(path.to_path_buf());
    }
}
