//! Regional catalogs of supported orchestrator versions.
//!
//! A catalog is the ordered upgrade graph for one location: each node is a
//! supported version plus the versions reachable from it in one upgrade.
//! Index 0 is the staleness reference, exactly as the data producer put it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AksverError;
use crate::version::Version;

/// Catalog document as produced by `az aks get-versions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalog {
    #[serde(default)]
    pub orchestrators: Vec<RawOrchestrator>,
}

/// One orchestrator entry of a raw catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrchestrator {
    pub orchestrator_version: String,
    #[serde(default)]
    pub is_preview: Option<bool>,
    /// `null` in the source data when no upgrade exists.
    #[serde(default)]
    pub upgrades: Option<Vec<RawUpgrade>>,
}

/// One upgrade target of a raw orchestrator entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUpgrade {
    pub orchestrator_version: String,
    #[serde(default)]
    pub is_preview: Option<bool>,
}

/// A version directly reachable as the next upgrade from a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeTarget {
    pub version: Version,
    pub is_preview: bool,
}

impl UpgradeTarget {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            is_preview: false,
        }
    }
}

/// One supported version and its ascending list of upgrade targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorVersionNode {
    pub version: Version,
    pub is_preview: bool,
    pub upgrades: Vec<UpgradeTarget>,
}

impl OrchestratorVersionNode {
    pub fn new(version: Version, upgrades: Vec<Version>) -> Self {
        Self {
            version,
            is_preview: false,
            upgrades: upgrades.into_iter().map(UpgradeTarget::new).collect(),
        }
    }

    /// The furthest single-hop upgrade available from this node.
    pub fn furthest_upgrade(&self) -> Option<&UpgradeTarget> {
        self.upgrades.last()
    }

    fn from_raw(raw: RawOrchestrator) -> Result<Self, AksverError> {
        let upgrades = raw
            .upgrades
            .unwrap_or_default()
            .into_iter()
            .map(|up| {
                Ok(UpgradeTarget {
                    version: Version::parse(&up.orchestrator_version)?,
                    is_preview: up.is_preview.unwrap_or(false),
                })
            })
            .collect::<Result<Vec<_>, AksverError>>()?;

        Ok(Self {
            version: Version::parse(&raw.orchestrator_version)?,
            is_preview: raw.is_preview.unwrap_or(false),
            upgrades,
        })
    }
}

/// Ordered upgrade graph of one region.
///
/// Immutable after construction and shared read-only between resolutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCatalog {
    location: String,
    nodes: Vec<OrchestratorVersionNode>,
}

impl VersionCatalog {
    /// Build a catalog from nodes, keeping their order.
    pub fn new(location: impl Into<String>, nodes: Vec<OrchestratorVersionNode>) -> Self {
        Self {
            location: location.into(),
            nodes,
        }
    }

    /// Build a catalog from its raw document. Fails on the first malformed version.
    pub fn from_raw(location: impl Into<String>, raw: RawCatalog) -> Result<Self, AksverError> {
        let nodes = raw
            .orchestrators
            .into_iter()
            .map(OrchestratorVersionNode::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(location, nodes))
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn nodes(&self) -> &[OrchestratorVersionNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at index 0.
    pub fn first(&self) -> Option<&OrchestratorVersionNode> {
        self.nodes.first()
    }

    /// The version staleness is measured against (index 0).
    pub fn reference_version(&self) -> Result<&Version, AksverError> {
        self.first()
            .map(|node| &node.version)
            .ok_or_else(|| AksverError::EmptyCatalog(self.location.clone()))
    }

    /// True iff `current` is strictly older than the node at index 0.
    ///
    /// This compares against index 0, not against the maximum element.
    /// An empty catalog cannot make anything outdated.
    pub fn is_outdated(&self, current: &Version) -> Result<bool, AksverError> {
        match self.first() {
            Some(reference) => current.try_lt(&reference.version),
            None => Ok(false),
        }
    }

    /// Find the node whose version equals `version`.
    pub fn lookup_node(&self, version: &Version) -> Option<&OrchestratorVersionNode> {
        self.nodes.iter().find(|node| &node.version == version)
    }

    /// Upgrades offered to a cluster at `current`, as listed by the platform.
    ///
    /// Outdated clusters get the targets of the reference node. Otherwise
    /// the first node equal to `current` yields its targets, or the first
    /// node newer than `current` yields itself followed by its targets.
    pub fn next_available_upgrades(
        &self,
        current: &Version,
        is_outdated: bool,
    ) -> Result<Vec<Version>, AksverError> {
        if is_outdated {
            return Ok(self
                .first()
                .map(|node| node.upgrades.iter().map(|u| u.version.clone()).collect())
                .unwrap_or_default());
        }

        for node in &self.nodes {
            let targets = node.upgrades.iter().map(|u| u.version.clone());
            match current.try_cmp(&node.version)? {
                std::cmp::Ordering::Equal => return Ok(targets.collect()),
                std::cmp::Ordering::Less => {
                    return Ok(std::iter::once(node.version.clone()).chain(targets).collect());
                }
                std::cmp::Ordering::Greater => {}
            }
        }

        Ok(Vec::new())
    }

    /// True when node versions strictly increase from index 0.
    pub fn is_ascending(&self) -> bool {
        self.nodes
            .windows(2)
            .all(|pair| matches!(pair[0].version.try_lt(&pair[1].version), Ok(true)))
    }
}

/// Catalogs keyed by region/location.
///
/// A location whose catalog could not be built keeps its error, so clusters
/// in that region report why instead of a missing catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogSet {
    catalogs: BTreeMap<String, Arc<VersionCatalog>>,
    rejected: BTreeMap<String, AksverError>,
}

impl CatalogSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog under its location, replacing any previous one.
    pub fn insert(&mut self, catalog: VersionCatalog) {
        if catalog.is_empty() {
            warn!("Version catalog for {} has no versions", catalog.location());
        } else if !catalog.is_ascending() {
            warn!(
                "Version catalog for {} is not in ascending order, index 0 is still used as reference",
                catalog.location()
            );
        }
        self.rejected.remove(catalog.location());
        self.catalogs
            .insert(catalog.location().to_string(), Arc::new(catalog));
    }

    /// Record that the catalog for `location` exists but is unusable.
    pub fn reject(&mut self, location: impl Into<String>, error: AksverError) {
        let location = location.into();
        self.catalogs.remove(&location);
        self.rejected.insert(location, error);
    }

    /// Catalog for a region, or the error its catalog was rejected with.
    pub fn get(&self, region: &str) -> Result<Arc<VersionCatalog>, AksverError> {
        if let Some(error) = self.rejected.get(region) {
            return Err(error.clone());
        }
        self.catalogs
            .get(region)
            .cloned()
            .ok_or_else(|| AksverError::CatalogNotFound(region.to_string()))
    }

    /// Catalogs sorted by location.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<VersionCatalog>> {
        self.catalogs.values()
    }

    /// Rejected locations with their errors, sorted by location.
    pub fn rejected(&self) -> impl Iterator<Item = (&str, &AksverError)> {
        self.rejected.iter().map(|(location, error)| (location.as_str(), error))
    }

    /// Number of usable catalogs.
    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}

impl FromIterator<VersionCatalog> for CatalogSet {
    fn from_iter<I: IntoIterator<Item = VersionCatalog>>(iter: I) -> Self {
        let mut set = CatalogSet::new();
        for catalog in iter {
            set.insert(catalog);
        }
        set
    }
}
