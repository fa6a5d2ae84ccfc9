//! `stowage archive` command

use anyhow::Result;

use stowage::ops::archive;
use stowage::util::shell::Status;
use stowage::util::Shell;

use crate::cli::{ArchiveArgs, MessageFormat};
use crate::commands::archive_options;

pub fn execute(args: ArchiveArgs, verbose: bool, quiet: bool) -> Result<()> {
    let json = args.message_format == MessageFormat::Json;
    let shell = Shell::from_flags(quiet, verbose, json);

    let outcome = match archive(&archive_options(&args), &shell) {
        Ok(outcome) => outcome,
        Err(e) => {
            if shell.is_json() {
                shell.error(format!("{:#}", e));
            }
            return Err(e);
        }
    };

    if args.plan {
        if json {
            println!("{}", serde_json::to_string(&outcome)?);
        } else {
            println!("{} ({}) -> {}", outcome.target, outcome.contents, outcome.output.display());
            for (i, step) in outcome.steps.iter().enumerate() {
                println!("  {}. [{}] {}", i + 1, step.short_name(), step);
            }
            shell.status(
                Status::Planned,
                format!("{} steps for `{}`, nothing written", outcome.steps.len(), outcome.target),
            );
        }
    }

    Ok(())
}
