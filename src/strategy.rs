//! Upgrade path strategies.
//!
//! A strategy walks a [`VersionCatalog`] from a cluster's current version
//! and records the versions the control plane has to transit. Strategies
//! are injected into the resolver, so new policies only need to implement
//! [`UpgradeStrategy`].

use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use serde::Serialize;
use tracing::debug;

use crate::catalog::VersionCatalog;
use crate::error::AksverError;
use crate::version::Version;

/// One hop of an upgrade path. Steps are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeStep {
    pub step: usize,
    pub version: Version,
}

/// Ordered upgrade hops. Insertion order is traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UpgradePath {
    steps: Vec<UpgradeStep>,
}

impl UpgradePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next hop, numbering it after the previous one.
    pub fn push(&mut self, version: Version) {
        let step = self.steps.len() + 1;
        self.steps.push(UpgradeStep { step, version });
    }

    pub fn steps(&self) -> &[UpgradeStep] {
        &self.steps
    }

    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.steps.iter().map(|s| &s.version)
    }

    pub fn last(&self) -> Option<&Version> {
        self.steps.last().map(|s| &s.version)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for UpgradePath {
    /// Renders as `1:1.26.0 -> 2:1.27.1`, or `-` when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("-");
        }
        let rendered: Vec<String> = self
            .steps
            .iter()
            .map(|s| format!("{}:{}", s.step, s.version))
            .collect();
        f.write_str(&rendered.join(" -> "))
    }
}

/// Result of a path computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOutcome {
    pub path: UpgradePath,
    /// Version reached after the last hop, or the current version.
    pub final_version: Version,
}

/// Policy that turns a current version and a catalog into an upgrade path.
pub trait UpgradeStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    fn compute_path(
        &self,
        current: &Version,
        catalog: &VersionCatalog,
        is_outdated: bool,
    ) -> Result<PathOutcome, AksverError>;
}

/// Jumps to the newest available upgrade at each hop.
///
/// An outdated cluster is first moved to the reference version at index 0.
/// The catalog is then scanned in order: a node newer than the running
/// version is taken, and on the node equal to the running version the
/// furthest upgrade target is taken and the scan stops. At most one
/// upgrade hop is taken per call, so reaching a version more than one hop
/// past the matched node needs another call with the new version.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggressivePolicy;

impl UpgradeStrategy for AggressivePolicy {
    fn name(&self) -> &'static str {
        "aggressive"
    }

    fn compute_path(
        &self,
        current: &Version,
        catalog: &VersionCatalog,
        is_outdated: bool,
    ) -> Result<PathOutcome, AksverError> {
        let mut path = UpgradePath::new();
        let mut version = current.clone();

        if is_outdated && let Some(reference) = catalog.first() {
            version = reference.version.clone();
            path.push(version.clone());
        }

        for node in catalog.nodes() {
            if version.try_lt(&node.version)? {
                version = node.version.clone();
                path.push(version.clone());
            }

            if version == node.version {
                if let Some(target) = node.furthest_upgrade() {
                    if version.try_lt(&target.version)? {
                        version = target.version.clone();
                        path.push(version.clone());
                    } else {
                        debug!(
                            "Ignoring upgrade target {} of {}: not newer",
                            target.version, node.version
                        );
                    }
                }
                break;
            }
        }

        Ok(PathOutcome {
            path,
            final_version: version,
        })
    }
}

/// Moves one upgrade at a time, always to the smallest newer GA target.
///
/// Unlike [`AggressivePolicy`] it follows the graph transitively until no
/// further hop exists. A running version that is not a catalog node hops
/// to the first newer GA node. Preview versions are never hopped to.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservativePolicy;

impl ConservativePolicy {
    fn next_hop(
        version: &Version,
        catalog: &VersionCatalog,
    ) -> Result<Option<Version>, AksverError> {
        if let Some(node) = catalog.lookup_node(version) {
            for target in node.upgrades.iter().filter(|t| !t.is_preview) {
                if version.try_lt(&target.version)? {
                    return Ok(Some(target.version.clone()));
                }
            }
            return Ok(None);
        }

        for node in catalog.nodes().iter().filter(|n| !n.is_preview) {
            if version.try_lt(&node.version)? {
                return Ok(Some(node.version.clone()));
            }
        }
        Ok(None)
    }
}

impl UpgradeStrategy for ConservativePolicy {
    fn name(&self) -> &'static str {
        "conservative"
    }

    fn compute_path(
        &self,
        current: &Version,
        catalog: &VersionCatalog,
        is_outdated: bool,
    ) -> Result<PathOutcome, AksverError> {
        let mut path = UpgradePath::new();
        let mut version = current.clone();

        if is_outdated && let Some(reference) = catalog.first() {
            version = reference.version.clone();
            path.push(version.clone());
        }

        // Every hop is strictly newer and versions come from a finite set
        while let Some(next) = Self::next_hop(&version, catalog)? {
            version = next;
            path.push(version.clone());
        }

        Ok(PathOutcome {
            path,
            final_version: version,
        })
    }
}

/// Strategy selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StrategyKind {
    #[default]
    Aggressive,
    Conservative,
}

impl StrategyKind {
    pub fn build(self) -> Arc<dyn UpgradeStrategy> {
        match self {
            StrategyKind::Aggressive => Arc::new(AggressivePolicy),
            StrategyKind::Conservative => Arc::new(ConservativePolicy),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Aggressive => f.write_str("aggressive"),
            StrategyKind::Conservative => f.write_str("conservative"),
        }
    }
}
