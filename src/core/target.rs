//! Build target identifiers.
//!
//! A build target names one node of the build graph using the
//! `//base/path:name` syntax. Targets are totally ordered so that dependency
//! sets iterate deterministically.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a build target string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetParseError {
    #[error("build target `{0}` must start with `//`")]
    MissingRoot(String),

    #[error("build target `{0}` is missing a `:name` suffix")]
    MissingName(String),

    #[error("build target `{0}` has an empty name")]
    EmptyName(String),
}

/// A fully qualified build target, e.g. `//lib/foo:foo`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuildTarget {
    base_path: String,
    name: String,
}

impl BuildTarget {
    /// Create a target from its base path (without the leading `//`) and name.
    pub fn new(base_path: impl Into<String>, name: impl Into<String>) -> Self {
        BuildTarget {
            base_path: base_path.into().trim_matches('/').to_string(),
            name: name.into(),
        }
    }

    /// Parse a `//base/path:name` string.
    pub fn parse(s: &str) -> Result<Self, TargetParseError> {
        let rest = s
            .strip_prefix("//")
            .ok_or_else(|| TargetParseError::MissingRoot(s.to_string()))?;

        let (base, name) = rest
            .rsplit_once(':')
            .ok_or_else(|| TargetParseError::MissingName(s.to_string()))?;

        if name.is_empty() {
            return Err(TargetParseError::EmptyName(s.to_string()));
        }

        Ok(BuildTarget::new(base, name))
    }

    /// The package path of the target, without the leading `//`.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The short name after the colon.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `//base/path:name`
    pub fn fully_qualified_name(&self) -> String {
        format!("//{}:{}", self.base_path, self.name)
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//{}:{}", self.base_path, self.name)
    }
}

impl FromStr for BuildTarget {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildTarget::parse(s)
    }
}

impl TryFrom<String> for BuildTarget {
    type Error = TargetParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BuildTarget::parse(&value)
    }
}

impl From<BuildTarget> for String {
    fn from(target: BuildTarget) -> Self {
        target.fully_qualified_name()
    }
}
