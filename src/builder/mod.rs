//! Static-library archive rules.
//!
//! This module implements the archive rule, its build steps, the archiver
//! adapters and the step executor.

pub mod archive;
pub mod arg;
pub mod errors;
pub mod events;
pub mod executor;
pub mod rule_key;
pub mod scrub;
pub mod step;
pub mod toolchain;

pub use archive::{archive_deps, ArchiveContents, ArchiveRule};
pub use arg::{Arg, SourcePathArg, ThinArchiveArg};
pub use errors::ArchiveError;
pub use events::BuildEvent;
pub use executor::StepRunner;
pub use rule_key::rule_key;
pub use scrub::{ArchiveScrubber, PaddingStyle, ScrubError};
pub use step::{Step, StepKind};
pub use toolchain::{
    detect_tools, Archiver, ArchiverFlavor, BsdArchiver, CommandTool, DetectedTools, GnuArchiver,
    ToolOverrides,
};
