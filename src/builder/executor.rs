//! Step executor with progress reporting.
//!
//! Runs an archive rule's steps strictly in order on the calling thread and
//! stops at the first failure. There are no retries and no timeouts.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::errors::ArchiveError;
use crate::builder::events::BuildEvent;
use crate::builder::step::Step;
use crate::core::filesystem::ProjectFilesystem;
use crate::core::target::BuildTarget;
use crate::util::process::ProcessBuilder;

/// Executes steps against a project filesystem.
///
/// Relative paths in steps resolve against the filesystem root, which is
/// also the working directory of every subprocess.
pub struct StepRunner<'a> {
    filesystem: &'a ProjectFilesystem,
    target: &'a BuildTarget,
    listener: Option<&'a dyn Fn(&BuildEvent)>,
    progress: bool,
}

impl<'a> StepRunner<'a> {
    pub fn new(filesystem: &'a ProjectFilesystem, target: &'a BuildTarget) -> Self {
        StepRunner {
            filesystem,
            target,
            listener: None,
            progress: false,
        }
    }

    /// Receive a [`BuildEvent`] before and after every step.
    pub fn with_listener(mut self, listener: &'a dyn Fn(&BuildEvent)) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Show a progress bar on stderr.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn emit(&self, event: BuildEvent) {
        if let Some(listener) = self.listener {
            listener(&event);
        }
    }

    /// Run `steps` in order, aborting on the first failure.
    pub fn run(&self, steps: &[Step]) -> Result<(), ArchiveError> {
        let pb = if self.progress {
            let pb = ProgressBar::new(steps.len() as u64);
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} [{bar:20.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        for (index, step) in steps.iter().enumerate() {
            let name = step.short_name().to_string();
            if let Some(ref pb) = pb {
                pb.set_message(name.clone());
            }

            self.emit(BuildEvent::StepStarted {
                target: self.target.to_string(),
                step: name.clone(),
                index,
                description: step.to_string(),
            });

            let start = Instant::now();
            let result = self.run_step(step);
            let duration_ms = start.elapsed().as_millis() as u64;

            self.emit(BuildEvent::StepFinished {
                target: self.target.to_string(),
                step: name.clone(),
                index,
                success: result.is_ok(),
                duration_ms,
            });

            if let Err(e) = result {
                if let Some(ref pb) = pb {
                    pb.abandon_with_message(format!("{} failed", name));
                }
                tracing::debug!("Step `{}` of {} failed: {:#}", name, self.target, e);
                return Err(ArchiveError::StepExecutionFailure {
                    step: name,
                    message: format!("{:#}", e),
                });
            }

            if let Some(ref pb) = pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        Ok(())
    }

    /// Run a single step.
    pub fn run_step(&self, step: &Step) -> Result<()> {
        tracing::debug!("[{}] {}", step.short_name(), step);

        match step {
            Step::Mkdir { path } => self.filesystem.mkdirs(path),
            Step::RemoveIfExists { path } => self.filesystem.delete_file_if_exists(path),
            Step::CreateArchive { .. } | Step::RunIndexer { .. } => self.run_command(step),
            Step::ScrubOutput { path, scrubbers } => {
                let path = self.filesystem.resolve(path);
                for scrubber in scrubbers {
                    scrubber
                        .scrub_file(&path)
                        .with_context(|| format!("failed to scrub {}", path.display()))?;
                }
                Ok(())
            }
        }
    }

    fn run_command(&self, step: &Step) -> Result<()> {
        let Some(command) = step.command_line() else {
            bail!("step `{}` has no command line", step.short_name());
        };

        let mut process =
            ProcessBuilder::from_command_line(&command)?.cwd(self.filesystem.root_path());
        if let Some(env) = step.environment() {
            process = process.envs(env);
        }
        process.exec_and_check()?;
        Ok(())
    }
}
