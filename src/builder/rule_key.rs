//! Input-based rule keys for archive rules.
//!
//! The key covers everything that can change the archive bytes: the tools,
//! their flags and environment, the packaging mode, the output location, and
//! the path and content of every input in member order. Absolute roots never
//! enter the key, so the same checkout on two machines hashes identically.

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::builder::archive::ArchiveRule;
use crate::core::source_path::SourcePathResolver;
use crate::util::hash::{sha256_file, KeyHasher};

/// Compute the rule key of `rule`.
///
/// Every input must exist on disk.
pub fn rule_key(rule: &ArchiveRule, resolver: &SourcePathResolver) -> Result<String> {
    let archiver = rule.archiver();

    let inputs: Vec<(String, String)> = rule
        .inputs()
        .par_iter()
        .map(|input| -> Result<(String, String)> {
            let relative = resolver.relative_path(input)?;
            let absolute = resolver.absolute_path(input)?;
            let hash = sha256_file(&absolute)
                .with_context(|| format!("failed to hash archive input `{}`", input))?;
            Ok((relative.display().to_string(), hash))
        })
        .collect::<Result<Vec<_>>>()?;

    let archiver_tool = archiver.tool().key_parts();
    let ranlib_tool = rule.ranlib().key_parts();
    let env: Vec<String> = archiver
        .environment()
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    let options = archiver.archive_options(rule.contents());
    let scrubbers: Vec<String> = archiver
        .scrubbers()
        .iter()
        .map(|s| format!("{:?}", s.padding()))
        .collect();

    let mut hasher = KeyHasher::new();
    hasher
        .field("rule", "archive")
        .field("archiver.flavor", archiver.flavor().as_str())
        .list("archiver.tool", archiver_tool.iter().map(String::as_str))
        .list("archiver.env", env.iter().map(String::as_str))
        .list("archiver.options", options.iter().map(String::as_str))
        .list("archiver.scrubbers", scrubbers.iter().map(String::as_str))
        .list("ranlib", ranlib_tool.iter().map(String::as_str))
        .field("contents", rule.contents().as_str())
        .field("output", &rule.path_to_output().display().to_string());

    hasher.field("inputs", &inputs.len().to_string());
    for (path, hash) in &inputs {
        hasher.field("input.path", path).field("input.hash", hash);
    }

    let key = hasher.finish();
    tracing::debug!("Rule key for {}: {}", rule.target(), key);
    Ok(key)
}
