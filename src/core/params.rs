//! Graph-node parameters shared by all build rules.

use std::collections::BTreeSet;

use crate::core::filesystem::ProjectFilesystem;
use crate::core::target::BuildTarget;

/// The identity, filesystem and dependencies of a build-graph node.
///
/// Declared deps come from the target definition; extra deps are added by
/// the rule itself. The scheduler waits on the union of both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRuleParams {
    target: BuildTarget,
    filesystem: ProjectFilesystem,
    declared_deps: BTreeSet<BuildTarget>,
    extra_deps: BTreeSet<BuildTarget>,
}

impl BuildRuleParams {
    pub fn new(target: BuildTarget, filesystem: ProjectFilesystem) -> Self {
        BuildRuleParams {
            target,
            filesystem,
            declared_deps: BTreeSet::new(),
            extra_deps: BTreeSet::new(),
        }
    }

    /// Derive params for a different node, replacing both dependency sets.
    pub fn copy_with_changes(
        &self,
        target: BuildTarget,
        declared_deps: BTreeSet<BuildTarget>,
        extra_deps: BTreeSet<BuildTarget>,
    ) -> Self {
        BuildRuleParams {
            target,
            filesystem: self.filesystem.clone(),
            declared_deps,
            extra_deps,
        }
    }

    pub fn target(&self) -> &BuildTarget {
        &self.target
    }

    pub fn filesystem(&self) -> &ProjectFilesystem {
        &self.filesystem
    }

    pub fn declared_deps(&self) -> &BTreeSet<BuildTarget> {
        &self.declared_deps
    }

    pub fn extra_deps(&self) -> &BTreeSet<BuildTarget> {
        &self.extra_deps
    }

    /// Every rule this node waits on.
    pub fn deps(&self) -> BTreeSet<BuildTarget> {
        self.declared_deps
            .union(&self.extra_deps)
            .cloned()
            .collect()
    }
}
