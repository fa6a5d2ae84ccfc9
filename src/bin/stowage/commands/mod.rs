//! Command implementations

pub mod archive;
pub mod completions;
pub mod rule_key;
pub mod toolchain;

use stowage::ops::ArchiveOptions;

use crate::cli::ArchiveArgs;

/// Options shared by `archive` and `rule-key`.
pub fn archive_options(args: &ArchiveArgs) -> ArchiveOptions {
    ArchiveOptions {
        root: args.root.clone(),
        output: args.output.clone(),
        inputs: args.inputs.clone(),
        target: args.target.clone(),
        contents: args.contents(),
        tools: args.tools.overrides(),
        plan: args.plan,
    }
}
