//! Configuration file support for Stowage.
//!
//! Toolchain overrides live in two locations:
//! - Global: `~/.stowage/toolchain.toml` - User-wide defaults
//! - Project: `.stowage/toolchain.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, field by field.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::archive::ArchiveContents;
use crate::builder::toolchain::ArchiverFlavor;

/// Toolchain configuration for archiver overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Toolchain settings
    pub toolchain: ToolchainSettings,
}

/// Archiver and indexer settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Path to the archiver (e.g., /usr/bin/llvm-ar)
    pub ar: Option<PathBuf>,

    /// Path to the archive indexer (e.g., /usr/bin/ranlib)
    pub ranlib: Option<PathBuf>,

    /// Archiver flavor ("gnu" or "bsd"); inferred from the tool name if unset
    pub archiver: Option<String>,

    /// Default packaging mode ("normal" or "thin")
    pub contents: Option<String>,

    /// Extra archiver arguments placed before the mode flags
    #[serde(default)]
    pub ar_flags: Vec<String>,
}

impl ToolchainConfig {
    /// Load toolchain configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read toolchain config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse toolchain config: {}", path.display()))
    }

    /// Load toolchain configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to load toolchain config from {}: {:#}",
                    path.display(),
                    e
                );
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Save toolchain configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .with_context(|| "failed to serialize toolchain config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("failed to write toolchain config: {}", path.display()))?;

        Ok(())
    }

    /// Check if any toolchain settings are configured.
    pub fn has_overrides(&self) -> bool {
        self.toolchain.ar.is_some()
            || self.toolchain.ranlib.is_some()
            || self.toolchain.archiver.is_some()
            || self.toolchain.contents.is_some()
            || !self.toolchain.ar_flags.is_empty()
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ToolchainConfig) {
        if other.toolchain.ar.is_some() {
            self.toolchain.ar = other.toolchain.ar;
        }
        if other.toolchain.ranlib.is_some() {
            self.toolchain.ranlib = other.toolchain.ranlib;
        }
        if other.toolchain.archiver.is_some() {
            self.toolchain.archiver = other.toolchain.archiver;
        }
        if other.toolchain.contents.is_some() {
            self.toolchain.contents = other.toolchain.contents;
        }
        if !other.toolchain.ar_flags.is_empty() {
            self.toolchain.ar_flags = other.toolchain.ar_flags;
        }
    }

    /// Parse the configured archiver flavor.
    pub fn flavor(&self) -> Result<Option<ArchiverFlavor>> {
        self.toolchain
            .archiver
            .as_deref()
            .map(|s| s.parse::<ArchiverFlavor>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("invalid `archiver` in toolchain config: {}", e))
    }

    /// Parse the configured packaging mode.
    pub fn contents(&self) -> Result<Option<ArchiveContents>> {
        self.toolchain
            .contents
            .as_deref()
            .map(|s| s.parse::<ArchiveContents>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("invalid `contents` in toolchain config: {}", e))
    }
}

/// Load merged toolchain configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.stowage/toolchain.toml)
/// 2. Global config (~/.stowage/toolchain.toml)
/// 3. Defaults
pub fn load_toolchain_config(global_path: Option<&Path>, project_path: &Path) -> ToolchainConfig {
    let mut config = ToolchainConfig::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(ToolchainConfig::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(ToolchainConfig::load_or_default(project_path));
    }

    config
}

/// Get the global stowage config directory (~/.stowage).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".stowage"))
}

/// Get the global toolchain config path (~/.stowage/toolchain.toml).
pub fn global_toolchain_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("toolchain.toml"))
}

/// Get the project toolchain config path (.stowage/toolchain.toml).
pub fn project_toolchain_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".stowage").join("toolchain.toml")
}
