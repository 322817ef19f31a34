//! aksver - AKS control plane version report.
//!
//! Resolves, for every cluster in an inventory:
//! - whether its Kubernetes version is outdated against its region's catalog
//! - an ordered upgrade path computed by a pluggable strategy
//! - the latest generally available version that path reaches

pub mod catalog;
pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod resolver;
pub mod strategy;
pub mod version;

pub use catalog::{CatalogSet, OrchestratorVersionNode, UpgradeTarget, VersionCatalog};
pub use error::AksverError;
pub use resolver::{ClusterOutcome, ClusterRecord, ClusterVersionState, VersionResolver};
pub use strategy::{
    AggressivePolicy, ConservativePolicy, PathOutcome, StrategyKind, UpgradePath, UpgradeStep,
    UpgradeStrategy,
};
pub use version::{Version, compare};
