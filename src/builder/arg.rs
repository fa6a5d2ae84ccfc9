//! Arguments handed to rules that consume an archive.

use std::collections::BTreeSet;

use crate::core::source_path::{SourcePath, SourcePathError, SourcePathResolver};
use crate::core::target::BuildTarget;

/// A single path on a downstream command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePathArg {
    path: SourcePath,
}

impl SourcePathArg {
    pub fn new(path: SourcePath) -> Self {
        SourcePathArg { path }
    }

    pub fn path(&self) -> &SourcePath {
        &self.path
    }
}

/// A thin archive together with the members it points to.
///
/// Only the archive appears on the command line; the inputs exist so that
/// consumers take a build-time dependency on every member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinArchiveArg {
    archive: SourcePath,
    inputs: Vec<SourcePath>,
}

impl ThinArchiveArg {
    pub fn new(archive: SourcePath, inputs: Vec<SourcePath>) -> Self {
        ThinArchiveArg { archive, inputs }
    }

    pub fn archive(&self) -> &SourcePath {
        &self.archive
    }

    pub fn inputs(&self) -> &[SourcePath] {
        &self.inputs
    }
}

/// How a downstream rule references an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    SourcePath(SourcePathArg),
    ThinArchive(ThinArchiveArg),
}

impl Arg {
    /// The archive itself.
    pub fn archive(&self) -> &SourcePath {
        match self {
            Arg::SourcePath(arg) => arg.path(),
            Arg::ThinArchive(arg) => arg.archive(),
        }
    }

    /// Members that must also be present; empty for normal archives.
    pub fn inputs(&self) -> &[SourcePath] {
        match self {
            Arg::SourcePath(_) => &[],
            Arg::ThinArchive(arg) => arg.inputs(),
        }
    }

    /// Every path a consumer reads through this argument.
    pub fn source_paths(&self) -> Vec<&SourcePath> {
        std::iter::once(self.archive()).chain(self.inputs()).collect()
    }

    /// The build rules a consumer must depend on.
    pub fn deps(&self) -> BTreeSet<BuildTarget> {
        self.source_paths()
            .into_iter()
            .filter_map(SourcePath::rule)
            .cloned()
            .collect()
    }

    /// Append the command-line form (the absolute archive path).
    pub fn append_to_command_line(
        &self,
        resolver: &SourcePathResolver,
        command: &mut Vec<String>,
    ) -> Result<(), SourcePathError> {
        command.push(resolver.absolute_path(self.archive())?.display().to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{repo_fs, target};

    #[test]
    fn test_thin_arg_command_line_lists_archive_only() {
        let mut resolver = SourcePathResolver::new();
        resolver.register_output(target("//lib:foo"), repo_fs(), "out/libfoo.a");

        let arg = Arg::ThinArchive(ThinArchiveArg::new(
            SourcePath::target(target("//lib:foo")),
            vec![SourcePath::path(repo_fs(), "a.o"), SourcePath::path(repo_fs(), "b.o")],
        ));

        let mut cmd = vec!["cc".to_string()];
        arg.append_to_command_line(&resolver, &mut cmd).unwrap();
        assert_eq!(cmd, vec!["cc", "/repo/out/libfoo.a"]);
        assert_eq!(arg.source_paths().len(), 3);
        // Checked-in inputs contribute no rule deps
        assert_eq!(arg.deps(), BTreeSet::from([target("//lib:foo")]));
    }

    #[test]
    fn test_normal_arg() {
        let arg = Arg::SourcePath(SourcePathArg::new(SourcePath::target(target("//lib:foo"))));
        assert!(arg.inputs().is_empty());
        assert_eq!(arg.source_paths(), vec![&SourcePath::target(target("//lib:foo"))]);
    }

    #[test]
    fn test_unregistered_archive() {
        let arg = Arg::SourcePath(SourcePathArg::new(SourcePath::target(target("//lib:foo"))));
        let mut cmd = Vec::new();
        assert!(arg
            .append_to_command_line(&SourcePathResolver::new(), &mut cmd)
            .is_err());
        assert!(cmd.is_empty());
    }
}
