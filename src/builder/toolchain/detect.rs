//! Archiver and indexer detection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::util::config::ToolchainConfig;
use crate::util::process::{find_ar, find_ranlib};

use super::{Archiver, ArchiverFlavor, BsdArchiver, CommandTool, GnuArchiver};

/// Tool choices given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ToolOverrides {
    pub ar: Option<PathBuf>,
    pub ranlib: Option<PathBuf>,
    pub flavor: Option<ArchiverFlavor>,
}

/// The archiver and indexer a build will use.
#[derive(Debug, Clone)]
pub struct DetectedTools {
    pub archiver: Arc<dyn Archiver>,
    pub ranlib: CommandTool,
}

/// Guess the archiver family from its file name and the host.
pub fn infer_flavor(ar: &Path) -> ArchiverFlavor {
    let name = ar
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if name.contains("llvm-ar") || name.contains("gcc-ar") || name.contains("-linux-") {
        return ArchiverFlavor::Gnu;
    }

    if cfg!(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd"
    )) {
        ArchiverFlavor::Bsd
    } else {
        ArchiverFlavor::Gnu
    }
}

/// Pick the archiver and indexer.
///
/// Each tool is taken from the first of: command-line override, toolchain
/// config, environment variable (`AR` / `RANLIB`), PATH search. Without an
/// indexer, `ar s` is used to write the symbol index.
pub fn detect_tools(overrides: &ToolOverrides, config: &ToolchainConfig) -> Result<DetectedTools> {
    let tc = &config.toolchain;

    let Some(ar) = overrides
        .ar
        .clone()
        .or_else(|| tc.ar.clone())
        .or_else(find_ar)
    else {
        bail!(
            "no archiver found\n\
             \n\
             Stowage requires an `ar`-compatible archiver (ar, llvm-ar).\n\
             Set the AR environment variable, pass --ar, or configure `ar` in .stowage/toolchain.toml."
        )
    };

    let flavor = match overrides.flavor {
        Some(flavor) => flavor,
        None => config.flavor()?.unwrap_or_else(|| infer_flavor(&ar)),
    };

    let tool = CommandTool::new(&ar).args(tc.ar_flags.iter().cloned());
    let archiver: Arc<dyn Archiver> = match flavor {
        ArchiverFlavor::Gnu => Arc::new(GnuArchiver::new(tool)),
        ArchiverFlavor::Bsd => Arc::new(BsdArchiver::new(tool)),
    };

    let ranlib = match overrides
        .ranlib
        .clone()
        .or_else(|| tc.ranlib.clone())
        .or_else(find_ranlib)
    {
        Some(ranlib) => CommandTool::new(ranlib),
        None => {
            tracing::debug!("No ranlib found, indexing with `{} s`", ar.display());
            CommandTool::new(&ar).arg("s")
        }
    };

    tracing::debug!(
        "Using archiver {} ({}), indexer {:?}",
        ar.display(),
        flavor,
        ranlib.key_parts()
    );

    Ok(DetectedTools { archiver, ranlib })
}
