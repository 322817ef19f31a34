//! Per-cluster version resolution.
//!
//! The resolver checks a cluster against its region's catalog, asks the
//! injected strategy for an upgrade path and packages the result. Each
//! cluster is resolved independently: a failure is recorded on that
//! cluster's outcome and the rest of the batch carries on.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogSet, VersionCatalog};
use crate::error::AksverError;
use crate::strategy::{UpgradePath, UpgradeStrategy};
use crate::version::Version;

/// A cluster as read from the inventory files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    #[serde(rename = "Name")]
    pub name: String,

    /// Region key used to select the catalog.
    #[serde(rename = "Location")]
    pub location: String,

    /// Control plane version, unparsed so one bad record cannot fail the file.
    #[serde(rename = "k8sversion")]
    pub version: String,

    #[serde(
        rename = "ResourceGroup",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_group: Option<String>,

    /// Filled in from the inventory file name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subscription: String,
}

impl ClusterRecord {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            version: version.into(),
            resource_group: None,
            subscription: String::new(),
        }
    }
}

/// Resolved version state of one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterVersionState {
    pub cluster: ClusterRecord,
    pub current_version: Version,
    pub is_outdated: bool,
    /// Zero or one step in the path counts as latest.
    pub is_latest: bool,
    pub upgrade_path: UpgradePath,
    /// Version reached at the end of the path.
    pub latest_ga_version: Version,
    /// Upgrades the platform lists for the current version.
    pub next_available: Vec<Version>,
    /// The regional catalog listed no versions, so nothing was compared.
    pub empty_catalog: bool,
}

/// Result of resolving one cluster within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterOutcome {
    Resolved(ClusterVersionState),
    Failed {
        cluster: ClusterRecord,
        error: AksverError,
    },
}

impl ClusterOutcome {
    pub fn cluster(&self) -> &ClusterRecord {
        match self {
            ClusterOutcome::Resolved(state) => &state.cluster,
            ClusterOutcome::Failed { cluster, .. } => cluster,
        }
    }

    pub fn state(&self) -> Option<&ClusterVersionState> {
        match self {
            ClusterOutcome::Resolved(state) => Some(state),
            ClusterOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AksverError> {
        match self {
            ClusterOutcome::Resolved(_) => None,
            ClusterOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ClusterOutcome::Failed { .. })
    }
}

/// Counters over a batch of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub outdated: usize,
    pub latest: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[ClusterOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut summary, outcome| {
            summary.total += 1;
            match outcome.state() {
                Some(state) => {
                    summary.outdated += usize::from(state.is_outdated);
                    summary.latest += usize::from(state.is_latest);
                }
                None => summary.failed += 1,
            }
            summary
        })
    }
}

/// Resolves clusters with an injected upgrade strategy.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    strategy: Arc<dyn UpgradeStrategy>,
}

impl VersionResolver {
    pub fn new(strategy: Arc<dyn UpgradeStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &dyn UpgradeStrategy {
        self.strategy.as_ref()
    }

    /// Resolve one cluster against a catalog.
    pub fn resolve(
        &self,
        cluster: ClusterRecord,
        catalog: &VersionCatalog,
    ) -> Result<ClusterVersionState, AksverError> {
        let current = Version::parse(&cluster.version)?;
        let is_outdated = catalog.is_outdated(&current)?;
        let outcome = self.strategy.compute_path(&current, catalog, is_outdated)?;
        let next_available = catalog.next_available_upgrades(&current, is_outdated)?;
        let is_latest = outcome.path.len() <= 1;
        let empty_catalog = catalog.reference_version().is_err();

        debug!(
            "{}: {} outdated={} latest={} path={} ({})",
            cluster.name,
            current,
            is_outdated,
            is_latest,
            outcome.path,
            self.strategy.name()
        );

        Ok(ClusterVersionState {
            cluster,
            current_version: current,
            is_outdated,
            is_latest,
            upgrade_path: outcome.path,
            latest_ga_version: outcome.final_version,
            next_available,
            empty_catalog,
        })
    }

    /// Look up the cluster's regional catalog and resolve it.
    /// Failures are captured on the outcome.
    pub fn resolve_in(&self, cluster: ClusterRecord, catalogs: &CatalogSet) -> ClusterOutcome {
        let result = catalogs
            .get(&cluster.location)
            .and_then(|catalog| self.resolve(cluster.clone(), &catalog));

        match result {
            Ok(state) => ClusterOutcome::Resolved(state),
            Err(error) => {
                warn!("Failed to resolve cluster {}: {}", cluster.name, error);
                ClusterOutcome::Failed { cluster, error }
            }
        }
    }

    /// Resolve a batch with at most `concurrency` clusters in flight.
    ///
    /// Outcomes are returned in input order, one per cluster.
    pub async fn resolve_all(
        &self,
        clusters: Vec<ClusterRecord>,
        catalogs: Arc<CatalogSet>,
        concurrency: usize,
    ) -> Vec<ClusterOutcome> {
        let concurrency = concurrency.max(1);
        info!(
            "Resolving {} clusters with {} strategy ({} at a time)",
            clusters.len(),
            self.strategy.name(),
            concurrency
        );

        let tasks = clusters.into_iter().enumerate().map(|(index, cluster)| {
            let resolver = self.clone();
            let catalogs = Arc::clone(&catalogs);

            async move {
                let fallback = cluster.clone();
                let handle = tokio::spawn(async move { resolver.resolve_in(cluster, &catalogs) });

                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Resolution task for {} failed: {}", fallback.name, e);
                        ClusterOutcome::Failed {
                            cluster: fallback,
                            error: AksverError::TaskFailed(e.to_string()),
                        }
                    }
                };
                (index, outcome)
            }
        });

        let mut outcomes: Vec<(usize, ClusterOutcome)> = stream::iter(tasks)
            .buffer_unordered(concurrency)
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}
