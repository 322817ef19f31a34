//! CLI configuration and argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::ingest::SourceLayout;
use crate::strategy::StrategyKind;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = env!("BUILD_COMMIT");
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// AKS control plane version report CLI tool.
///
/// Reads cluster inventories and regional version catalogs, flags clusters
/// running an outdated Kubernetes version and computes an upgrade path to
/// the newest generally available version.
#[derive(Parser, Debug, Clone)]
#[command(name = "aksver")]
#[command(about = "AKS control plane version report and upgrade path CLI tool")]
#[command(version = const_format::formatcp!(
    "{} (commit: {}, build date: {})",
    VERSION, COMMIT, BUILD_DATE
))]
#[command(after_help = r#"Examples:
  aksver                                   Read files/sub_*.json and files/loc_*.json
  aksver --strategy conservative           One upgrade at a time, all the way up
  aksver --only-outdated --show-catalogs   Outdated clusters plus regional catalogs
  aksver -o report.csv                     Also write a CSV report"#)]
pub struct Args {
    /// Directory containing cluster inventory files
    #[arg(long, default_value = "files", env = "AKSVER_CLUSTERS_DIR")]
    pub clusters_dir: PathBuf,

    /// File name prefix of cluster inventory files (<prefix><subscription>.json)
    #[arg(long, default_value = "sub_")]
    pub clusters_prefix: String,

    /// Directory containing regional version catalog files
    #[arg(long, default_value = "files", env = "AKSVER_CATALOGS_DIR")]
    pub catalogs_dir: PathBuf,

    /// File name prefix of catalog files (<prefix><location>.json)
    #[arg(long, default_value = "loc_")]
    pub catalogs_prefix: String,

    /// Upgrade path strategy
    #[arg(short, long, value_enum, default_value_t = StrategyKind::Aggressive)]
    pub strategy: StrategyKind,

    /// Maximum number of clusters resolved concurrently
    #[arg(short, long, default_value_t = 8)]
    pub concurrency: usize,

    /// Write the report to a file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report file format [default: from the output extension, else json]
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Print the version catalog of every location
    #[arg(long, default_value = "false")]
    pub show_catalogs: bool,

    /// Only list outdated or failed clusters in the console table
    #[arg(long, default_value = "false")]
    pub only_outdated: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "AKSVER_LOG_LEVEL")]
    pub log_level: String,
}

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    /// Infer the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputFormat::Csv,
            _ => OutputFormat::Json,
        }
    }
}

/// Application configuration derived from CLI args.
#[derive(Debug, Clone)]
pub struct Config {
    pub layout: SourceLayout,
    pub strategy: StrategyKind,
    pub concurrency: usize,
    pub output: Option<(PathBuf, OutputFormat)>,
    pub show_catalogs: bool,
    pub only_outdated: bool,
    pub log_level: String,
}

impl Config {
    /// Create config from CLI arguments.
    pub fn from_args(args: Args) -> Self {
        let output = args.output.map(|path| {
            let format = args.format.unwrap_or_else(|| OutputFormat::from_path(&path));
            (path, format)
        });

        Self {
            layout: SourceLayout {
                clusters_dir: args.clusters_dir,
                clusters_prefix: args.clusters_prefix,
                catalogs_dir: args.catalogs_dir,
                catalogs_prefix: args.catalogs_prefix,
            },
            strategy: args.strategy,
            concurrency: args.concurrency.max(1),
            output,
            show_catalogs: args.show_catalogs,
            only_outdated: args.only_outdated,
            log_level: args.log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let args = Args::try_parse_from(std::iter::once("aksver").chain(args.iter().copied()))
            .unwrap();
        Config::from_args(args)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.layout.clusters_dir, PathBuf::from("files"));
        assert_eq!(config.layout.clusters_prefix, "sub_");
        assert_eq!(config.layout.catalogs_dir, PathBuf::from("files"));
        assert_eq!(config.layout.catalogs_prefix, "loc_");
        assert_eq!(config.strategy, StrategyKind::Aggressive);
        assert_eq!(config.concurrency, 8);
        assert!(config.output.is_none());
        assert!(!config.show_catalogs);
        assert!(!config.only_outdated);
    }

    #[test]
    fn test_strategy_selection() {
        let config = parse(&["--strategy", "conservative"]);
        assert_eq!(config.strategy, StrategyKind::Conservative);
    }

    #[test]
    fn test_concurrency_clamped() {
        let config = parse(&["--concurrency", "0"]);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_output_format_inferred() {
        let config = parse(&["-o", "report.csv"]);
        assert_eq!(
            config.output,
            Some((PathBuf::from("report.csv"), OutputFormat::Csv))
        );

        let config = parse(&["-o", "report.json"]);
        assert_eq!(config.output.unwrap().1, OutputFormat::Json);

        let config = parse(&["-o", "report"]);
        assert_eq!(config.output.unwrap().1, OutputFormat::Json);
    }

    #[test]
    fn test_output_format_explicit_wins() {
        let config = parse(&["-o", "report.txt", "--format", "csv"]);
        assert_eq!(config.output.unwrap().1, OutputFormat::Csv);
    }

    #[test]
    fn test_invalid_strategy_rejected() {
        assert!(Args::try_parse_from(["aksver", "--strategy", "yolo"]).is_err());
    }
}
