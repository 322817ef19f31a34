//! aksver - AKS control plane version report CLI tool.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::{debug, error, info};

use aksver::config::{Args, Config};
use aksver::ingest;
use aksver::output::{self, build_report, save_report};
use aksver::resolver::VersionResolver;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = Config::from_args(args);

    // Initialize logging
    if let Err(e) = init_tracing(&config.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    debug!("Starting aksver - AKS Version Report Tool");

    if let Err(e) = run(&config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(config: &Config) -> Result<()> {
    let inventory = ingest::load(&config.layout)?;
    let catalogs = Arc::new(inventory.catalogs);

    let resolver = VersionResolver::new(config.strategy.build());
    let outcomes = resolver
        .resolve_all(inventory.clusters, Arc::clone(&catalogs), config.concurrency)
        .await;

    output::print_version_report(&outcomes, config.only_outdated, resolver.strategy().name());

    if config.show_catalogs {
        output::print_catalogs(&catalogs);
    }

    if let Some((path, format)) = &config.output {
        let data = build_report(&outcomes, &catalogs, resolver.strategy().name());
        let saved = save_report(&data, path, *format)?;
        info!("Report written to {}", saved.display());
        println!();
        println!("Report saved: {}", saved.display().to_string().bold());
    }

    Ok(())
}

/// Initialize tracing subscriber. Logs go to stderr, the report to stdout.
fn init_tracing(log_level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to initialize log filter: {}", e))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
