//! BSD / Apple archiver.

use crate::builder::archive::ArchiveContents;
use crate::builder::scrub::{ArchiveScrubber, PaddingStyle};

use super::{Archiver, ArchiverFlavor, CommandTool};

/// BSD `ar`. Has no thin-archive mode.
#[derive(Debug, Clone)]
pub struct BsdArchiver {
    tool: CommandTool,
}

impl BsdArchiver {
    pub fn new(tool: CommandTool) -> Self {
        BsdArchiver { tool }
    }
}

impl Archiver for BsdArchiver {
    fn flavor(&self) -> ArchiverFlavor {
        ArchiverFlavor::Bsd
    }

    fn supports_thin_archives(&self) -> bool {
        false
    }

    fn tool(&self) -> &CommandTool {
        &self.tool
    }

    fn archive_options(&self, _contents: ArchiveContents) -> Vec<String> {
        vec!["qc".to_string()]
    }

    fn scrubbers(&self) -> Vec<ArchiveScrubber> {
        vec![ArchiveScrubber::date_uid_gid(PaddingStyle::Left)]
    }
}
