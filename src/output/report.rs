//! JSON and CSV report export.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::catalog::{CatalogSet, VersionCatalog};
use crate::config::OutputFormat;
use crate::resolver::{BatchSummary, ClusterOutcome};
use crate::strategy::UpgradePath;

/// Full report document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub generated_at: String,
    pub strategy: String,
    pub summary: BatchSummary,
    pub clusters: Vec<ClusterReport>,
    pub catalogs: Vec<CatalogReport>,
}

/// Report entry for one cluster. Version fields are absent on failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterReport {
    pub name: String,
    pub subscription: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
    pub location: String,
    pub current_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_outdated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_latest: Option<bool>,
    pub upgrade_path: UpgradePath,
    #[serde(rename = "latestGAVersion", skip_serializing_if = "Option::is_none")]
    pub latest_ga_version: Option<String>,
    pub next_available_upgrades: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub empty_catalog: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report entry for one location's catalog.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogReport {
    pub location: String,
    pub reference_version: Option<String>,
    pub versions: Vec<CatalogEntryReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntryReport {
    pub version: String,
    pub upgrades: Vec<String>,
    pub is_preview: bool,
}

impl From<&ClusterOutcome> for ClusterReport {
    fn from(outcome: &ClusterOutcome) -> Self {
        let cluster = outcome.cluster();
        let mut report = ClusterReport {
            name: cluster.name.clone(),
            subscription: cluster.subscription.clone(),
            resource_group: cluster.resource_group.clone(),
            location: cluster.location.clone(),
            current_version: cluster.version.clone(),
            is_outdated: None,
            is_latest: None,
            upgrade_path: UpgradePath::new(),
            latest_ga_version: None,
            next_available_upgrades: Vec::new(),
            empty_catalog: false,
            error: None,
        };

        match outcome {
            ClusterOutcome::Resolved(state) => {
                report.is_outdated = Some(state.is_outdated);
                report.is_latest = Some(state.is_latest);
                report.upgrade_path = state.upgrade_path.clone();
                report.latest_ga_version = Some(state.latest_ga_version.to_string());
                report.next_available_upgrades =
                    state.next_available.iter().map(|v| v.to_string()).collect();
                report.empty_catalog = state.empty_catalog;
            }
            ClusterOutcome::Failed { error, .. } => {
                report.error = Some(error.to_string());
            }
        }

        report
    }
}

impl From<&VersionCatalog> for CatalogReport {
    fn from(catalog: &VersionCatalog) -> Self {
        CatalogReport {
            location: catalog.location().to_string(),
            reference_version: catalog.reference_version().ok().map(|v| v.to_string()),
            versions: catalog
                .nodes()
                .iter()
                .map(|node| CatalogEntryReport {
                    version: node.version.to_string(),
                    upgrades: node.upgrades.iter().map(|u| u.version.to_string()).collect(),
                    is_preview: node.is_preview,
                })
                .collect(),
        }
    }
}

/// Assemble report data from resolution outcomes.
pub fn build_report(
    outcomes: &[ClusterOutcome],
    catalogs: &CatalogSet,
    strategy: &str,
) -> ReportData {
    ReportData {
        generated_at: Local::now().to_rfc3339(),
        strategy: strategy.to_string(),
        summary: BatchSummary::from_outcomes(outcomes),
        clusters: outcomes.iter().map(ClusterReport::from).collect(),
        catalogs: catalogs.iter().map(|c| CatalogReport::from(&**c)).collect(),
    }
}

/// Render the report as pretty-printed JSON.
pub fn render_json(data: &ReportData) -> Result<String> {
    serde_json::to_string_pretty(data).context("Failed to serialize report")
}

/// Render one CSV row per cluster.
pub fn render_csv(data: &ReportData) -> Result<String> {
    let mut csv = String::with_capacity(256 * (data.clusters.len() + 1));

    writeln!(
        csv,
        "INDEX,CLUSTER,SUBSCRIPTION,RESOURCE_GROUP,LOCATION,CURRENT_VERSION,IS_OUTDATED,IS_LATEST,UPGRADE_PATH,LATEST_GA_VERSION,NEXT_AVAILABLE_UPGRADES,ERROR"
    )?;

    for (index, cluster) in data.clusters.iter().enumerate() {
        let fields = [
            (index + 1).to_string(),
            cluster.name.clone(),
            cluster.subscription.clone(),
            cluster.resource_group.clone().unwrap_or_default(),
            cluster.location.clone(),
            cluster.current_version.clone(),
            cluster.is_outdated.map(|b| b.to_string()).unwrap_or_default(),
            cluster.is_latest.map(|b| b.to_string()).unwrap_or_default(),
            if cluster.upgrade_path.is_empty() {
                String::new()
            } else {
                cluster.upgrade_path.to_string()
            },
            cluster.latest_ga_version.clone().unwrap_or_default(),
            cluster.next_available_upgrades.join(" "),
            cluster.error.clone().unwrap_or_default(),
        ];

        let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        writeln!(csv, "{}", line.join(","))?;
    }

    Ok(csv)
}

/// Write the report to `path` in the given format.
pub fn save_report(data: &ReportData, path: &Path, format: OutputFormat) -> Result<PathBuf> {
    let content = match format {
        OutputFormat::Json => render_json(data)?,
        OutputFormat::Csv => render_csv(data)?,
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    Ok(path)
}

/// Quote a CSV field, doubling embedded quotes.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OrchestratorVersionNode;
    use crate::error::AksverError;
    use crate::resolver::{ClusterRecord, VersionResolver};
    use crate::strategy::AggressivePolicy;
    use crate::version::Version;
    use std::sync::Arc;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn sample_data() -> ReportData {
        let catalog = VersionCatalog::new(
            "australiaeast",
            vec![
                OrchestratorVersionNode::new(v("1.25.0"), vec![v("1.26.0")]),
                OrchestratorVersionNode::new(v("1.26.0"), vec![v("1.27.1")]),
                OrchestratorVersionNode::new(v("1.27.1"), vec![]),
            ],
        );
        let resolver = VersionResolver::new(Arc::new(AggressivePolicy));

        let mut cluster = ClusterRecord::new("aks-prod", "australiaeast", "1.24.0");
        cluster.subscription = "prod".to_string();
        cluster.resource_group = Some("rg-prod".to_string());

        let outcomes = vec![
            ClusterOutcome::Resolved(resolver.resolve(cluster, &catalog).unwrap()),
            ClusterOutcome::Failed {
                cluster: ClusterRecord::new("aks \"quoted\"", "westus", "abc"),
                error: AksverError::MalformedVersion("abc".to_string()),
            },
        ];
        let catalogs: CatalogSet = vec![catalog].into_iter().collect();

        build_report(&outcomes, &catalogs, "aggressive")
    }

    #[test]
    fn test_render_json_field_names() {
        let json = render_json(&sample_data()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        let cluster = &parsed["clusters"][0];
        assert_eq!(cluster["name"], "aks-prod");
        assert_eq!(cluster["isOutdated"], true);
        assert_eq!(cluster["isLatest"], false);
        assert_eq!(cluster["latestGAVersion"], "1.26.0");
        assert_eq!(cluster["upgradePath"][0]["step"], 1);
        assert_eq!(cluster["upgradePath"][0]["version"], "1.25.0");
        assert_eq!(cluster["upgradePath"][1]["version"], "1.26.0");
        assert_eq!(cluster["resourceGroup"], "rg-prod");
        assert!(cluster.get("emptyCatalog").is_none());

        let failed = &parsed["clusters"][1];
        assert!(failed.get("isOutdated").is_none());
        assert_eq!(failed["error"], "Malformed version: \"abc\"");

        assert_eq!(parsed["strategy"], "aggressive");
        assert_eq!(parsed["summary"]["failed"], 1);
        assert_eq!(parsed["catalogs"][0]["location"], "australiaeast");
        assert_eq!(parsed["catalogs"][0]["referenceVersion"], "1.25.0");
    }

    #[test]
    fn test_render_csv() {
        let csv = render_csv(&sample_data()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("INDEX,CLUSTER,"));
        assert!(lines[1].starts_with(r#""1","aks-prod","prod","rg-prod","australiaeast","1.24.0","true","false""#));
        assert!(lines[1].contains(r#""1:1.25.0 -> 2:1.26.0""#));
        assert!(lines[2].starts_with(r#""2","aks ""quoted""","#));
        assert!(lines[2].contains("Malformed version"));
    }

    #[test]
    fn test_csv_field_escaping() {
        assert_eq!(csv_field("plain"), "\"plain\"");
        assert_eq!(csv_field("a\"b"), "\"a\"\"b\"");
    }
}
