//! Implementation of `stowage toolchain`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Serialize;

use crate::builder::archive::ArchiveContents;
use crate::builder::toolchain::{detect_tools, ArchiverFlavor, ToolOverrides};
use crate::util::config::{
    global_toolchain_config_path, load_toolchain_config, project_toolchain_config_path,
    ToolchainConfig,
};

/// The tools a build in a project would use.
#[derive(Debug, Clone, Serialize)]
pub struct ToolchainReport {
    /// Archiver command prefix
    pub archiver: Vec<String>,
    pub flavor: ArchiverFlavor,
    pub thin_archives: bool,
    /// Indexer command prefix
    pub ranlib: Vec<String>,
    pub contents: ArchiveContents,
    /// Config files that exist and were merged, lowest precedence first
    pub config_files: Vec<PathBuf>,
}

/// Detect the toolchain for the project at `root`.
pub fn toolchain_report(root: &Path, overrides: &ToolOverrides) -> Result<ToolchainReport> {
    let global = global_toolchain_config_path();
    let project = project_toolchain_config_path(root);
    let config = load_toolchain_config(global.as_deref(), &project);

    let tools = detect_tools(overrides, &config)?;
    let contents = config.contents()?.unwrap_or_default();

    let config_files = global
        .into_iter()
        .chain(std::iter::once(project))
        .filter(|p| p.exists())
        .collect();

    Ok(ToolchainReport {
        archiver: tools.archiver.tool().key_parts(),
        flavor: tools.archiver.flavor(),
        thin_archives: tools.archiver.supports_thin_archives(),
        ranlib: tools.ranlib.key_parts(),
        contents,
        config_files,
    })
}

/// Settings to persist with [`set_override`].
#[derive(Debug, Clone, Default)]
pub struct OverrideOptions {
    pub ar: Option<PathBuf>,
    pub ranlib: Option<PathBuf>,
    pub flavor: Option<ArchiverFlavor>,
    pub contents: Option<ArchiveContents>,
    pub ar_flags: Vec<String>,
}

/// Merge `opts` into the toolchain config at `path` and save it.
///
/// Unset options keep their current value. An existing file that cannot be
/// read or parsed is an error and is left untouched.
pub fn set_override(path: &Path, opts: &OverrideOptions) -> Result<ToolchainConfig> {
    let mut update = ToolchainConfig::default();
    update.toolchain.ar = opts.ar.clone();
    update.toolchain.ranlib = opts.ranlib.clone();
    update.toolchain.archiver = opts.flavor.map(|f| f.as_str().to_string());
    update.toolchain.contents = opts.contents.map(|c| c.as_str().to_string());
    update.toolchain.ar_flags = opts.ar_flags.clone();
    if !update.has_overrides() {
        bail!("no toolchain settings given");
    }

    let mut config = if path.exists() {
        ToolchainConfig::load(path)?
    } else {
        ToolchainConfig::default()
    };
    config.merge(update);

    config.save(path)?;
    tracing::debug!("Wrote toolchain config {}", path.display());
    Ok(config)
}
