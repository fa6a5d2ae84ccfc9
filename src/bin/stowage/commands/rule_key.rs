//! `stowage rule-key` command

use anyhow::Result;

use stowage::ops::archive_rule_key;

use crate::cli::{ArchiveArgs, MessageFormat};
use crate::commands::archive_options;

pub fn execute(args: ArchiveArgs) -> Result<()> {
    let key = archive_rule_key(&archive_options(&args))?;

    match args.message_format {
        MessageFormat::Human => println!("{}", key),
        MessageFormat::Json => println!("{}", serde_json::json!({ "rule_key": key })),
    }

    Ok(())
}
