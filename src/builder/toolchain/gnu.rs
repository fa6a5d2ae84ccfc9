//! GNU-compatible archiver (binutils `ar`, `gcc-ar`, `llvm-ar`).

use crate::builder::archive::ArchiveContents;
use crate::builder::scrub::{ArchiveScrubber, PaddingStyle};

use super::{Archiver, ArchiverFlavor, CommandTool};

/// GNU `ar`. Supports thin archives via the `T` modifier.
#[derive(Debug, Clone)]
pub struct GnuArchiver {
    tool: CommandTool,
}

impl GnuArchiver {
    pub fn new(tool: CommandTool) -> Self {
        GnuArchiver { tool }
    }
}

impl Archiver for GnuArchiver {
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
        // Quick-append into a freshly removed file, creating it silently
        match contents {
            ArchiveContents::Normal => vec!["qc".to_string()],
            ArchiveContents::Thin => vec!["qcT".to_string()],
        }
    }

    fn scrubbers(&self) -> Vec<ArchiveScrubber> {
        vec![ArchiveScrubber::date_uid_gid(PaddingStyle::Right)]
    }
}
