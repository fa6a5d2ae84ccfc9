//! Implementation of `stowage archive` and `stowage rule-key`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::builder::archive::{ArchiveContents, ArchiveRule};
use crate::builder::events::BuildEvent;
use crate::builder::executor::StepRunner;
use crate::builder::rule_key::rule_key;
use crate::builder::step::Step;
use crate::builder::toolchain::{detect_tools, ToolOverrides};
use crate::core::buildable::RecordingBuildableContext;
use crate::core::filesystem::ProjectFilesystem;
use crate::core::params::BuildRuleParams;
use crate::core::source_path::{SourcePath, SourcePathResolver};
use crate::core::target::BuildTarget;
use crate::util::config::{
    global_toolchain_config_path, load_toolchain_config, project_toolchain_config_path,
};
use crate::util::fs::{expand_inputs, normalize_path};
use crate::util::shell::{format_duration, Shell, Status};

/// Options for the archive command.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Project root; relative paths resolve against it
    pub root: PathBuf,

    /// Archive to write
    pub output: PathBuf,

    /// Input files, glob patterns, or `//pkg:rule=path` rule outputs, in member order
    pub inputs: Vec<String>,

    /// Target name (defaults to one derived from the output path)
    pub target: Option<String>,

    /// Packaging mode (CLI > config > normal)
    pub contents: Option<ArchiveContents>,

    /// Tool overrides from the command line
    pub tools: ToolOverrides,

    /// Generate the steps but do not run them
    pub plan: bool,
}

/// An archive rule together with everything needed to build it.
#[derive(Debug)]
pub struct PreparedArchive {
    pub rule: ArchiveRule,
    pub resolver: SourcePathResolver,
}

/// What `archive` did, and the steps it generated.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveOutcome {
    pub target: BuildTarget,
    pub contents: ArchiveContents,
    /// Output relative to the project root
    pub output: PathBuf,
    pub deps: BTreeSet<BuildTarget>,
    pub artifacts: Vec<PathBuf>,
    pub steps: Vec<Step>,
    #[serde(skip)]
    pub executed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_key: Option<String>,
}

/// Resolve options into an archive rule.
pub fn prepare(opts: &ArchiveOptions) -> Result<PreparedArchive> {
    let root = absolute_root(&opts.root)?;
    if !root.is_dir() {
        bail!("project root `{}` is not a directory", root.display());
    }

    let config = load_toolchain_config(
        global_toolchain_config_path().as_deref(),
        &project_toolchain_config_path(&root),
    );

    let contents = match opts.contents {
        Some(contents) => contents,
        None => config.contents()?.unwrap_or_default(),
    };
    let tools = detect_tools(&opts.tools, &config)?;

    let filesystem = ProjectFilesystem::new(&root);
    let output = output_path(&root, &opts.output)?;
    let target = match &opts.target {
        Some(t) => BuildTarget::parse(t)?,
        None => default_target(&output)?,
    };

    let mut resolver = SourcePathResolver::new();
    let inputs = resolve_inputs(&filesystem, &opts.inputs, &mut resolver)?;
    let base_params = BuildRuleParams::new(target.clone(), filesystem);

    let rule = ArchiveRule::from(
        target,
        &base_params,
        tools.archiver,
        tools.ranlib,
        contents,
        output,
        inputs,
    )?;

    Ok(PreparedArchive { rule, resolver })
}

/// Build (or with `plan`, only plan) an archive.
pub fn archive(opts: &ArchiveOptions, shell: &Shell) -> Result<ArchiveOutcome> {
    let start = Instant::now();
    let PreparedArchive { rule, resolver } = prepare(opts)?;
    let target = rule.target().clone();
    if rule.inputs().is_empty() {
        shell.warn(format!("{} has no inputs; the archive will be empty", target));
    }

    let mut buildable = RecordingBuildableContext::new();
    let steps = rule.build_steps(&resolver, &mut buildable);

    // The artifact is known even when step generation is rejected
    if !opts.plan {
        for path in buildable.artifacts() {
            shell.event(&BuildEvent::ArtifactRecorded {
                target: target.to_string(),
                path: path.clone(),
            });
        }
    }
    let steps = steps?;

    let mut outcome = ArchiveOutcome {
        target: target.clone(),
        contents: rule.contents(),
        output: rule.path_to_output().to_path_buf(),
        deps: rule.deps(),
        artifacts: buildable.artifacts().to_vec(),
        steps,
        executed: false,
        rule_key: None,
    };

    if opts.plan {
        return Ok(outcome);
    }

    shell.event(&BuildEvent::RuleStarted {
        target: target.to_string(),
        contents: outcome.contents,
        steps: outcome.steps.len(),
    });
    shell.status(
        Status::Archiving,
        format!(
            "{} ({} inputs, {})",
            target,
            rule.inputs().len(),
            outcome.contents
        ),
    );

    let listener = |event: &BuildEvent| shell.event(event);
    let result = StepRunner::new(rule.params().filesystem(), &target)
        .with_listener(&listener)
        .progress(shell.show_progress())
        .run(&outcome.steps);

    let elapsed = start.elapsed();
    let duration_ms = elapsed.as_millis() as u64;

    if let Err(e) = result {
        shell.event(&BuildEvent::finished(false, duration_ms));
        return Err(e.into());
    }

    outcome.executed = true;
    outcome.rule_key = match rule_key(&rule, &resolver) {
        Ok(key) => Some(key),
        Err(e) => {
            shell.warn(format!("could not compute rule key for {}: {:#}", target, e));
            None
        }
    };

    shell.event(&BuildEvent::BuildFinished {
        success: true,
        duration_ms,
        rule_key: outcome.rule_key.clone(),
    });
    shell.status(
        Status::Finished,
        format!(
            "`{}` -> {} in {}",
            target,
            outcome.output.display(),
            format_duration(elapsed)
        ),
    );

    Ok(outcome)
}

/// Compute the rule key of the archive described by `opts`.
pub fn archive_rule_key(opts: &ArchiveOptions) -> Result<String> {
    let prepared = prepare(opts)?;
    rule_key(&prepared.rule, &prepared.resolver)
}

fn absolute_root(root: &Path) -> Result<PathBuf> {
    let root = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to determine current directory")?
            .join(root)
    };
    Ok(normalize_path(&root))
}

/// The output path relative to `root`; it must lie under the root.
fn output_path(root: &Path, output: &Path) -> Result<PathBuf> {
    let absolute = normalize_path(&root.join(output));
    match absolute.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => Ok(relative.to_path_buf()),
        _ => bail!(
            "output `{}` must be a file under the project root `{}`",
            output.display(),
            root.display()
        ),
    }
}

/// `out/libfoo.a` -> `//out:libfoo`
fn default_target(output: &Path) -> Result<BuildTarget> {
    let Some(stem) = output.file_stem() else {
        bail!("cannot derive a target name from `{}`", output.display());
    };

    let base = output
        .parent()
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();

    Ok(BuildTarget::new(base, stem.to_string_lossy()))
}

/// Place `path` in the filesystem that holds it.
///
/// Paths under the project root belong to `filesystem`. Anything else gets a
/// filesystem rooted at its own directory.
fn locate(filesystem: &ProjectFilesystem, path: &Path) -> Result<(ProjectFilesystem, PathBuf)> {
    let absolute = normalize_path(&filesystem.resolve(path));

    if filesystem.contains(&absolute) {
        return Ok((filesystem.clone(), filesystem.relativize(&absolute)));
    }

    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => Ok((ProjectFilesystem::new(parent), PathBuf::from(name))),
        _ => bail!("input `{}` does not name a file", path.display()),
    }
}

fn resolve_inputs(
    filesystem: &ProjectFilesystem,
    patterns: &[String],
    resolver: &mut SourcePathResolver,
) -> Result<Vec<SourcePath>> {
    let mut inputs: Vec<SourcePath> = Vec::new();

    for pattern in patterns {
        if pattern.starts_with("//") {
            let Some((target, path)) = pattern.split_once('=') else {
                bail!(
                    "rule input `{}` must have the form `//pkg:rule=path/to/output`",
                    pattern
                );
            };
            let target = BuildTarget::parse(target)?;
            let (fs, relative) = locate(filesystem, Path::new(path))?;
            resolver.register_output(target.clone(), fs, relative);
            inputs.push(SourcePath::target(target));
            continue;
        }

        for path in expand_inputs(filesystem.root_path(), std::slice::from_ref(pattern))? {
            let (fs, relative) = locate(filesystem, &path)?;
            inputs.push(SourcePath::path(fs, relative));
        }
    }

    Ok(inputs)
}
