//! The static-library archive rule.
//!
//! An [`ArchiveRule`] packages an ordered list of object files into a single
//! `ar` archive. It depends only on the rules producing its inputs and on
//! the archiver itself, and its output is scrubbed so that identical inputs
//! always produce identical bytes.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::arg::{Arg, SourcePathArg, ThinArchiveArg};
use crate::builder::errors::ArchiveError;
use crate::builder::step::Step;
use crate::builder::toolchain::{Archiver, CommandTool};
use crate::core::buildable::BuildableContext;
use crate::core::params::BuildRuleParams;
use crate::core::source_path::{SourcePath, SourcePathResolver};
use crate::core::target::BuildTarget;

/// Short name of the indexing step.
pub const INDEX_STEP_NAME: &str = "index-archive";

/// How an archive packages its members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveContents {
    /// A copy of every input; usable on its own.
    #[default]
    Normal,
    /// Only relative paths to the inputs, which must stay on disk.
    Thin,
}

impl ArchiveContents {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveContents::Normal => "normal",
            ArchiveContents::Thin => "thin",
        }
    }

    pub fn is_thin(&self) -> bool {
        matches!(self, ArchiveContents::Thin)
    }
}

impl fmt::Display for ArchiveContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveContents {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(ArchiveContents::Normal),
            "thin" => Ok(ArchiveContents::Thin),
            other => Err(format!(
                "unknown archive contents `{}` (expected normal or thin)",
                other
            )),
        }
    }
}

/// The rules an archive must wait on: the producers of its inputs plus the
/// archiver's own dependencies, and nothing else.
pub fn archive_deps<'a>(
    inputs: impl IntoIterator<Item = &'a SourcePath>,
    archiver_deps: impl IntoIterator<Item = BuildTarget>,
) -> BTreeSet<BuildTarget> {
    inputs
        .into_iter()
        .filter_map(SourcePath::rule)
        .cloned()
        .chain(archiver_deps)
        .collect()
}

/// A build rule producing a static library from object files.
#[derive(Debug, Clone)]
pub struct ArchiveRule {
    params: BuildRuleParams,
    archiver: Arc<dyn Archiver>,
    ranlib: CommandTool,
    contents: ArchiveContents,
    output: PathBuf,
    inputs: Vec<SourcePath>,
}

impl ArchiveRule {
    /// Construct an archive rule for `target`.
    ///
    /// The dependencies carried by `base_params` are discarded: the rule only
    /// depends on what [`archive_deps`] returns. Fails if thin contents are
    /// requested from an archiver that cannot write them.
    pub fn from(
        target: BuildTarget,
        base_params: &BuildRuleParams,
        archiver: Arc<dyn Archiver>,
        ranlib: CommandTool,
        contents: ArchiveContents,
        output: impl Into<PathBuf>,
        inputs: Vec<SourcePath>,
    ) -> Result<Self, ArchiveError> {
        if contents.is_thin() && !archiver.supports_thin_archives() {
            return Err(ArchiveError::UnsupportedPackagingMode { target });
        }

        let deps = archive_deps(&inputs, archiver.deps());
        let params = base_params.copy_with_changes(target, BTreeSet::new(), deps);

        tracing::debug!(
            "Archive rule {} ({}, {} inputs, {} deps)",
            params.target(),
            contents,
            inputs.len(),
            params.extra_deps().len()
        );

        Ok(ArchiveRule {
            params,
            archiver,
            ranlib,
            contents,
            output: output.into(),
            inputs,
        })
    }

    pub fn target(&self) -> &BuildTarget {
        self.params.target()
    }

    pub fn params(&self) -> &BuildRuleParams {
        &self.params
    }

    /// The trimmed dependency set.
    pub fn deps(&self) -> BTreeSet<BuildTarget> {
        self.params.deps()
    }

    pub fn archiver(&self) -> &dyn Archiver {
        self.archiver.as_ref()
    }

    pub fn ranlib(&self) -> &CommandTool {
        &self.ranlib
    }

    pub fn contents(&self) -> ArchiveContents {
        self.contents
    }

    /// The archive path, relative to the rule's filesystem root.
    pub fn path_to_output(&self) -> &Path {
        &self.output
    }

    /// Inputs in member order.
    pub fn inputs(&self) -> &[SourcePath] {
        &self.inputs
    }

    /// Check that every input shares the output's filesystem root.
    ///
    /// Thin archives embed paths relative to the output, so an input from
    /// another root would produce an archive that silently points nowhere.
    pub fn check_input_filesystems(
        &self,
        resolver: &SourcePathResolver,
    ) -> Result<(), ArchiveError> {
        let output_root = self.params.filesystem().root_path();

        for input in &self.inputs {
            let filesystem = resolver.filesystem(input)?;
            if filesystem.root_path() != output_root {
                return Err(ArchiveError::CrossFilesystemInput {
                    target: self.target().clone(),
                    input: resolver.relative_path(input)?,
                    input_root: filesystem.root_path().to_path_buf(),
                    output_root: output_root.to_path_buf(),
                });
            }
        }

        Ok(())
    }

    /// Generate the steps that build the archive.
    ///
    /// The output is recorded with `buildable` before any validation, so the
    /// cache knows the intended artifact even when a later stage fails.
    pub fn build_steps(
        &self,
        resolver: &SourcePathResolver,
        buildable: &mut dyn BuildableContext,
    ) -> Result<Vec<Step>, ArchiveError> {
        buildable.record_artifact(&self.output);

        self.check_input_filesystems(resolver)?;

        let inputs = self
            .inputs
            .iter()
            .map(|input| resolver.relative_path(input))
            .collect::<Result<Vec<_>, _>>()?;

        let parent = self
            .output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(vec![
            Step::Mkdir { path: parent },
            Step::RemoveIfExists {
                path: self.output.clone(),
            },
            Step::CreateArchive {
                environment: self.archiver.environment(),
                command_prefix: self.archiver.command_prefix(resolver)?,
                contents: self.contents,
                archive_options: self.archiver.archive_options(self.contents),
                output: self.output.clone(),
                inputs,
            },
            Step::RunIndexer {
                name: INDEX_STEP_NAME.to_string(),
                command_prefix: self.ranlib.command_prefix(resolver)?,
                output: self.output.clone(),
            },
            Step::ScrubOutput {
                path: self.output.clone(),
                scrubbers: self.archiver.scrubbers(),
            },
        ])
    }

    /// The argument downstream rules use to link against this archive.
    ///
    /// Thin archives carry their inputs along so consumers depend on them too.
    pub fn to_arg(&self) -> Arg {
        let archive = SourcePath::target(self.target().clone());
        match self.contents {
            ArchiveContents::Normal => Arg::SourcePath(SourcePathArg::new(archive)),
            ArchiveContents::Thin => {
                Arg::ThinArchive(ThinArchiveArg::new(archive, self.inputs.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::step::StepKind;
    use crate::builder::toolchain::{BsdArchiver, GnuArchiver};
    use crate::core::buildable::RecordingBuildableContext;
    use crate::core::filesystem::ProjectFilesystem;
    use crate::test_support::{gnu_with_dep, repo_fs, target};

    fn gnu() -> Arc<dyn Archiver> {
        Arc::new(GnuArchiver::new(CommandTool::new("ar")))
    }

    fn ranlib() -> CommandTool {
        CommandTool::new("ranlib")
    }

    fn base_params() -> BuildRuleParams {
        BuildRuleParams::new(target("//lib:foo"), repo_fs()).copy_with_changes(
            target("//lib:foo"),
            BTreeSet::from([target("//other:unrelated"), target("//lib:headers")]),
            BTreeSet::new(),
        )
    }

    fn object_inputs(resolver: &mut SourcePathResolver) -> Vec<SourcePath> {
        resolver.register_output(target("//lib:a"), repo_fs(), "buck-out/lib/liba.o");
        resolver.register_output(target("//lib:b"), repo_fs(), "buck-out/lib/libb.o");
        vec![
            SourcePath::target(target("//lib:a")),
            SourcePath::target(target("//lib:b")),
        ]
    }

    #[test]
    fn test_contents_parse() {
        assert_eq!("thin".parse::<ArchiveContents>().unwrap(), ArchiveContents::Thin);
        assert_eq!("Normal".parse::<ArchiveContents>().unwrap(), ArchiveContents::Normal);
        assert!("fat".parse::<ArchiveContents>().is_err());
        assert_eq!(ArchiveContents::default(), ArchiveContents::Normal);
    }

    #[test]
    fn test_thin_requires_capable_archiver() {
        let bsd: Arc<dyn Archiver> = Arc::new(BsdArchiver::new(CommandTool::new("ar")));
        let err = ArchiveRule::from(
            target("//lib:foo#static"),
            &base_params(),
            bsd,
            ranlib(),
            ArchiveContents::Thin,
            "out/libfoo.a",
            vec![],
        )
        .unwrap_err();

        assert!(matches!(err, ArchiveError::UnsupportedPackagingMode { .. }));
    }

    #[test]
    fn test_normal_on_bsd_archiver_is_fine() {
        let bsd: Arc<dyn Archiver> = Arc::new(BsdArchiver::new(CommandTool::new("ar")));
        let rule = ArchiveRule::from(
            target("//lib:foo#static"),
            &base_params(),
            bsd,
            ranlib(),
            ArchiveContents::Normal,
            "out/libfoo.a",
            vec![],
        )
        .unwrap();
        assert_eq!(rule.contents(), ArchiveContents::Normal);
    }

    #[test]
    fn test_deps_are_trimmed_to_inputs_and_archiver() {
        let mut resolver = SourcePathResolver::new();
        let mut inputs = object_inputs(&mut resolver);
        inputs.push(SourcePath::path(repo_fs(), "prebuilt/libc.o"));

        let rule = ArchiveRule::from(
            target("//lib:foo#static"),
            &base_params(),
            gnu_with_dep(target("//toolchains:ar")),
            ranlib(),
            ArchiveContents::Normal,
            "out/libfoo.a",
            inputs,
        )
        .unwrap();

        let expected = BTreeSet::from([
            target("//lib:a"),
            target("//lib:b"),
            target("//toolchains:ar"),
        ]);
        assert_eq!(rule.deps(), expected);
        assert!(rule.params().declared_deps().is_empty());
        assert_eq!(rule.target(), &target("//lib:foo#static"));
    }

    #[test]
    fn test_archive_deps_pure_function() {
        let inputs = vec![
            SourcePath::target(target("//lib:b")),
            SourcePath::path(repo_fs(), "x.o"),
            SourcePath::target(target("//lib:a")),
            SourcePath::target(target("//lib:b")),
        ];

        let deps = archive_deps(&inputs, [target("//tools:ar"), target("//lib:a")]);
        let names: Vec<String> = deps.iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["//lib:a", "//lib:b", "//tools:ar"]);

        assert!(archive_deps(&[], []).is_empty());
    }

    #[test]
    fn test_step_sequence_end_to_end() {
        let fs = repo_fs();
        let inputs = vec![
            SourcePath::path(fs.clone(), "liba.o"),
            SourcePath::path(fs.clone(), "libb.o"),
        ];
        let rule = ArchiveRule::from(
            target("//:foo"),
            &BuildRuleParams::new(target("//:foo"), fs),
            gnu(),
            ranlib(),
            ArchiveContents::Normal,
            "out/libfoo.a",
            inputs,
        )
        .unwrap();

        let mut buildable = RecordingBuildableContext::new();
        let steps = rule
            .build_steps(&SourcePathResolver::new(), &mut buildable)
            .unwrap();

        let kinds: Vec<StepKind> = steps.iter().map(Step::kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Mkdir,
                StepKind::RemoveIfExists,
                StepKind::CreateArchive,
                StepKind::RunIndexer,
                StepKind::ScrubOutput,
            ]
        );

        assert_eq!(steps[0], Step::Mkdir { path: PathBuf::from("out") });
        assert_eq!(
            steps[1],
            Step::RemoveIfExists {
                path: PathBuf::from("out/libfoo.a")
            }
        );
        assert_eq!(
            steps[2].command_line().unwrap(),
            vec!["ar", "qc", "out/libfoo.a", "liba.o", "libb.o"]
        );
        assert_eq!(
            steps[3].command_line().unwrap(),
            vec!["ranlib", "out/libfoo.a"]
        );
        assert_eq!(steps[3].short_name(), "index-archive");
        match &steps[4] {
            Step::ScrubOutput { path, scrubbers } => {
                assert_eq!(path, &PathBuf::from("out/libfoo.a"));
                assert_eq!(scrubbers, &rule.archiver().scrubbers());
            }
            other => panic!("unexpected step {:?}", other),
        }

        assert_eq!(buildable.artifacts(), [PathBuf::from("out/libfoo.a")]);
    }

    #[test]
    fn test_thin_steps_use_relative_rule_outputs() {
        let mut resolver = SourcePathResolver::new();
        let inputs = object_inputs(&mut resolver);
        let rule = ArchiveRule::from(
            target("//lib:foo#static"),
            &base_params(),
            gnu(),
            ranlib(),
            ArchiveContents::Thin,
            "buck-out/lib/libfoo.a",
            inputs,
        )
        .unwrap();

        let steps = rule
            .build_steps(&resolver, &mut RecordingBuildableContext::new())
            .unwrap();

        assert_eq!(
            steps[2].command_line().unwrap(),
            vec![
                "ar",
                "qcT",
                "buck-out/lib/libfoo.a",
                "buck-out/lib/liba.o",
                "buck-out/lib/libb.o"
            ]
        );
    }

    #[test]
    fn test_output_in_root_directory() {
        let fs = repo_fs();
        let rule = ArchiveRule::from(
            target("//:foo"),
            &BuildRuleParams::new(target("//:foo"), fs),
            gnu(),
            ranlib(),
            ArchiveContents::Normal,
            "libfoo.a",
            vec![],
        )
        .unwrap();

        let steps = rule
            .build_steps(&SourcePathResolver::new(), &mut RecordingBuildableContext::new())
            .unwrap();
        assert_eq!(steps[0], Step::Mkdir { path: PathBuf::new() });
    }

    #[test]
    fn test_cross_filesystem_input_rejected_after_recording() {
        let other = ProjectFilesystem::new("/elsewhere");
        let inputs = vec![
            SourcePath::path(repo_fs(), "a.o"),
            SourcePath::path(other, "b.o"),
        ];
        let rule = ArchiveRule::from(
            target("//lib:foo"),
            &base_params(),
            gnu(),
            ranlib(),
            ArchiveContents::Thin,
            "out/libfoo.a",
            inputs,
        )
        .unwrap();

        let mut buildable = RecordingBuildableContext::new();
        let err = rule
            .build_steps(&SourcePathResolver::new(), &mut buildable)
            .unwrap_err();

        match err {
            ArchiveError::CrossFilesystemInput {
                input, input_root, ..
            } => {
                assert_eq!(input, PathBuf::from("b.o"));
                assert_eq!(input_root, PathBuf::from("/elsewhere"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(buildable.artifacts(), [PathBuf::from("out/libfoo.a")]);
    }

    #[test]
    fn test_unregistered_input_is_an_error() {
        let rule = ArchiveRule::from(
            target("//lib:foo"),
            &base_params(),
            gnu(),
            ranlib(),
            ArchiveContents::Normal,
            "out/libfoo.a",
            vec![SourcePath::target(target("//lib:ghost"))],
        )
        .unwrap();

        let err = rule
            .build_steps(&SourcePathResolver::new(), &mut RecordingBuildableContext::new())
            .unwrap_err();
        assert!(matches!(err, ArchiveError::UnresolvedSourcePath(_)));
    }

    #[test]
    fn test_to_arg_normal() {
        let rule = ArchiveRule::from(
            target("//lib:foo"),
            &base_params(),
            gnu(),
            ranlib(),
            ArchiveContents::Normal,
            "out/libfoo.a",
            vec![SourcePath::path(repo_fs(), "x.o")],
        )
        .unwrap();

        let arg = rule.to_arg();
        assert_eq!(arg.archive(), &SourcePath::target(target("//lib:foo")));
        assert!(arg.inputs().is_empty());
        assert_eq!(arg.deps(), BTreeSet::from([target("//lib:foo")]));
    }

    #[test]
    fn test_to_arg_thin_carries_inputs() {
        let x = SourcePath::target(target("//lib:x"));
        let y = SourcePath::target(target("//lib:y"));
        let rule = ArchiveRule::from(
            target("//lib:foo"),
            &base_params(),
            gnu(),
            ranlib(),
            ArchiveContents::Thin,
            "out/libfoo.a",
            vec![x.clone(), y.clone()],
        )
        .unwrap();

        let arg = rule.to_arg();
        assert_eq!(arg.archive(), &SourcePath::target(target("//lib:foo")));
        assert_eq!(arg.inputs(), [x, y]);
        assert_eq!(
            arg.deps(),
            BTreeSet::from([target("//lib:foo"), target("//lib:x"), target("//lib:y")])
        );
    }
}
