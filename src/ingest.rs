//! Reads cluster inventories and version catalogs from JSON files.
//!
//! Cluster files are named `<prefix><subscription>.json` and hold an array
//! of cluster records. Catalog files are named `<prefix><location>.json`
//! and hold the `az aks get-versions` document for that location.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogSet, RawCatalog, VersionCatalog};
use crate::error::AksverError;
use crate::resolver::ClusterRecord;

/// Where input files live and how they are named.
#[derive(Debug, Clone)]
pub struct SourceLayout {
    pub clusters_dir: PathBuf,
    pub clusters_prefix: String,
    pub catalogs_dir: PathBuf,
    pub catalogs_prefix: String,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            clusters_dir: PathBuf::from("files"),
            clusters_prefix: "sub_".to_string(),
            catalogs_dir: PathBuf::from("files"),
            catalogs_prefix: "loc_".to_string(),
        }
    }
}

/// Cluster records and catalogs loaded from one layout.
#[derive(Debug, Default)]
pub struct Inventory {
    pub clusters: Vec<ClusterRecord>,
    pub catalogs: CatalogSet,
}

/// Load clusters and catalogs.
pub fn load(layout: &SourceLayout) -> Result<Inventory> {
    let clusters = read_clusters(&layout.clusters_dir, &layout.clusters_prefix)?;
    let catalogs = read_catalogs(&layout.catalogs_dir, &layout.catalogs_prefix)?;

    info!(
        "Loaded {} clusters and {} catalogs ({} rejected)",
        clusters.len(),
        catalogs.len(),
        catalogs.rejected().count()
    );

    Ok(Inventory { clusters, catalogs })
}

/// Read every cluster file in `dir`. The file key becomes the subscription.
pub fn read_clusters(dir: &Path, prefix: &str) -> Result<Vec<ClusterRecord>> {
    let mut clusters = Vec::new();

    for (subscription, path) in matching_files(dir, prefix)? {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cluster file: {}", path.display()))?;
        let records: Vec<ClusterRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cluster file: {}", path.display()))?;

        if records.is_empty() {
            debug!("No clusters in subscription {}", subscription);
            continue;
        }

        debug!(
            "Read {} clusters for subscription {}",
            records.len(),
            subscription
        );
        clusters.extend(records.into_iter().map(|mut record| {
            record.subscription = subscription.clone();
            record
        }));
    }

    Ok(clusters)
}

/// Read every catalog file in `dir`. The file key becomes the location.
///
/// A catalog with a malformed version is kept as rejected, so clusters in
/// that location fail with the parse error.
pub fn read_catalogs(dir: &Path, prefix: &str) -> Result<CatalogSet> {
    let mut catalogs = CatalogSet::new();

    for (location, path) in matching_files(dir, prefix)? {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        let raw: RawCatalog = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?;

        match VersionCatalog::from_raw(location.as_str(), raw) {
            Ok(catalog) => {
                debug!("Read {} versions for {}", catalog.len(), location);
                catalogs.insert(catalog);
            }
            Err(e) => {
                warn!("Rejecting catalog {}: {}", path.display(), e);
                catalogs.reject(location, e);
            }
        }
    }

    Ok(catalogs)
}

/// List `<prefix><key>.json` files in `dir` as `(key, path)`, sorted by file name.
fn matching_files(dir: &Path, prefix: &str) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(AksverError::SourceNotFound(dir.display().to_string()).into());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(key) = file_key(name, prefix) {
            files.push((key.to_string(), path.clone()));
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

/// Key between `prefix` and the `.json` extension.
fn file_key<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix)?.strip_suffix(".json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_file_key() {
        assert_eq!(file_key("sub_prod.json", "sub_"), Some("prod"));
        assert_eq!(file_key("loc_australiaeast.json", "loc_"), Some("australiaeast"));
        assert_eq!(file_key("sub_prod.yaml", "sub_"), None);
        assert_eq!(file_key("loc_eastus.json", "sub_"), None);
    }

    #[test]
    fn test_read_clusters_sets_subscription() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "sub_prod.json",
            r#"[{"Name": "aks-prod", "Location": "eastus", "k8sversion": "1.26.0"}]"#,
        );
        write(
            dir.path(),
            "sub_dev.json",
            r#"[{"Name": "aks-dev", "Location": "eastus", "k8sversion": "1.25.0"}]"#,
        );
        write(dir.path(), "sub_empty.json", "[]");
        write(dir.path(), "loc_eastus.json", r#"{"orchestrators": []}"#);

        let clusters = read_clusters(dir.path(), "sub_").unwrap();
        assert_eq!(clusters.len(), 2);
        // Sorted by file name: sub_dev before sub_prod
        assert_eq!(clusters[0].name, "aks-dev");
        assert_eq!(clusters[0].subscription, "dev");
        assert_eq!(clusters[1].subscription, "prod");
    }

    #[test]
    fn test_read_clusters_invalid_json() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "sub_prod.json", "{not json");

        let err = read_clusters(dir.path(), "sub_").unwrap_err();
        assert!(err.to_string().contains("Failed to parse cluster file"));
    }

    #[test]
    fn test_read_clusters_missing_dir() {
        let err = read_clusters(Path::new("/nonexistent/aksver"), "sub_").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AksverError>(),
            Some(AksverError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_read_catalogs_rejects_malformed() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "loc_eastus.json",
            r#"{"orchestrators": [{"orchestratorVersion": "1.26.0", "upgrades": [{"orchestratorVersion": "1.27.1"}]}]}"#,
        );
        write(
            dir.path(),
            "loc_westeurope.json",
            r#"{"orchestrators": [{"orchestratorVersion": "latest"}]}"#,
        );

        let catalogs = read_catalogs(dir.path(), "loc_").unwrap();
        assert_eq!(catalogs.len(), 1);
        assert_eq!(catalogs.get("eastus").unwrap().len(), 1);
        assert_eq!(
            catalogs.get("westeurope").unwrap_err(),
            AksverError::MalformedVersion("latest".to_string())
        );
        assert!(catalogs.get("northeurope").is_err());
    }

    #[test]
    fn test_load_from_separate_dirs() {
        let clusters_dir = TempDir::new().unwrap();
        let catalogs_dir = TempDir::new().unwrap();
        write(
            clusters_dir.path(),
            "sub_shared.json",
            r#"[{"Name": "aks-shared", "Location": "eastus", "k8sversion": "1.26.0"}]"#,
        );
        write(
            catalogs_dir.path(),
            "loc_eastus.json",
            r#"{"orchestrators": [{"orchestratorVersion": "1.26.0"}]}"#,
        );

        let layout = SourceLayout {
            clusters_dir: clusters_dir.path().to_path_buf(),
            catalogs_dir: catalogs_dir.path().to_path_buf(),
            ..Default::default()
        };
        let inventory = load(&layout).unwrap();
        assert_eq!(inventory.clusters.len(), 1);
        assert_eq!(inventory.catalogs.len(), 1);
    }
}
