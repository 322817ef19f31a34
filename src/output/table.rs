//! Version report and catalog tables for the console.

use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::catalog::{CatalogSet, VersionCatalog};
use crate::resolver::{BatchSummary, ClusterOutcome};
use crate::version::Version;

/// Row for the cluster version table.
#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "CLUSTER")]
    cluster: String,
    #[tabled(rename = "SUBSCRIPTION")]
    subscription: String,
    #[tabled(rename = "LOCATION")]
    location: String,
    #[tabled(rename = "CURRENT")]
    current: String,
    #[tabled(rename = "OUTDATED")]
    outdated: String,
    #[tabled(rename = "LATEST")]
    latest: String,
    #[tabled(rename = "UPGRADE PATH")]
    upgrade_path: String,
    #[tabled(rename = "LATEST GA")]
    latest_ga: String,
    #[tabled(rename = "NEXT AVAILABLE")]
    next_available: String,
}

/// Row for a location's version catalog.
#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "KUBERNETES VERSION")]
    version: String,
    #[tabled(rename = "UPGRADES")]
    upgrades: String,
    #[tabled(rename = "PREVIEW")]
    preview: String,
}

/// Print the cluster version table followed by a summary line.
pub fn print_version_report(outcomes: &[ClusterOutcome], only_outdated: bool, strategy: &str) {
    if outcomes.is_empty() {
        println!("No clusters found.");
        return;
    }

    let rows = build_cluster_rows(outcomes, only_outdated);
    let summary = BatchSummary::from_outcomes(outcomes);

    println!(
        "{} (strategy: {}, {} clusters):",
        "Control Plane Versions".bold(),
        strategy,
        summary.total
    );

    if rows.is_empty() {
        println!("  {} No outdated clusters", "✓".green());
    } else {
        let mut table = Table::new(&rows);
        apply_table_style(&mut table);
        println!("{}", table);
    }

    println!();
    print_summary(&summary);
}

/// Print one catalog table per location.
pub fn print_catalogs(catalogs: &CatalogSet) {
    if catalogs.is_empty() {
        println!("No version catalogs found.");
        return;
    }

    for catalog in catalogs.iter() {
        println!();
        let reference = catalog
            .reference_version()
            .map(|v| v.to_string())
            .unwrap_or_else(|_| "-".to_string());
        println!(
            "{} (reference: {}, {} versions):",
            format!("Upgrades/{}", catalog.location()).bold(),
            reference,
            catalog.len()
        );

        if catalog.is_empty() {
            println!("  {}", "No versions listed".dimmed());
            continue;
        }

        let mut table = Table::new(build_catalog_rows(catalog));
        apply_table_style(&mut table);
        println!("{}", table);
    }
}

fn print_summary(summary: &BatchSummary) {
    println!("Summary:");
    println!("  Total: {}", summary.total);
    if summary.outdated > 0 {
        println!(
            "  {} Outdated: {}",
            "✗".red(),
            summary.outdated.to_string().red()
        );
    }
    println!("  {} Latest: {}", "✓".green(), summary.latest);
    if summary.failed > 0 {
        println!(
            "  {} Failed: {}",
            "⚠".yellow(),
            summary.failed.to_string().yellow()
        );
    }
}

fn build_cluster_rows(outcomes: &[ClusterOutcome], only_outdated: bool) -> Vec<ClusterRow> {
    outcomes
        .iter()
        .filter(|outcome| {
            !only_outdated || outcome.state().is_none_or(|state| state.is_outdated)
        })
        .map(|outcome| {
            let cluster = outcome.cluster();
            let mut row = ClusterRow {
                cluster: cluster.name.clone(),
                subscription: or_dash(&cluster.subscription),
                location: cluster.location.clone(),
                current: cluster.version.clone(),
                outdated: "-".to_string(),
                latest: "-".to_string(),
                upgrade_path: "-".to_string(),
                latest_ga: "-".to_string(),
                next_available: "-".to_string(),
            };

            match outcome {
                ClusterOutcome::Resolved(state) => {
                    row.outdated = if state.is_outdated {
                        "yes".red().to_string()
                    } else {
                        "no".to_string()
                    };
                    row.latest = if state.is_latest {
                        "yes".green().to_string()
                    } else {
                        "no".yellow().to_string()
                    };
                    row.upgrade_path = state.upgrade_path.to_string();
                    row.latest_ga = state.latest_ga_version.to_string();
                    row.next_available = join_versions(&state.next_available);
                    if state.empty_catalog {
                        let marker = "(empty catalog)".dimmed();
                        row.latest = format!("{} {}", row.latest, marker);
                        row.latest_ga = format!("{} {}", row.latest_ga, marker);
                    }
                }
                ClusterOutcome::Failed { error, .. } => {
                    row.upgrade_path = format!("error: {}", error).red().to_string();
                }
            }

            row
        })
        .collect()
}

fn build_catalog_rows(catalog: &VersionCatalog) -> Vec<CatalogRow> {
    catalog
        .nodes()
        .iter()
        .map(|node| {
            let upgrades: Vec<Version> = node.upgrades.iter().map(|u| u.version.clone()).collect();
            CatalogRow {
                version: node.version.to_string(),
                upgrades: join_versions(&upgrades),
                preview: if node.is_preview { "yes" } else { "-" }.to_string(),
            }
        })
        .collect()
}

fn join_versions(versions: &[Version]) -> String {
    if versions.is_empty() {
        return "-".to_string();
    }
    versions
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// Apply kubectl-style borderless table style.
fn apply_table_style(table: &mut Table) {
    use tabled::settings::object::Columns;
    use tabled::settings::themes::Theme;
    use tabled::settings::{Modify, Padding};

    let mut theme = Theme::from_style(Style::empty());
    theme.remove_horizontal_lines();
    table.with(theme);
    table.with(Modify::new(Columns::new(..)).with(Padding::new(0, 2, 0, 0)));
}
