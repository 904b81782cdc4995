use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Calculates wind-resuspension dose fields from a scenario JSON file.
#[derive(Debug, Parser)]
#[command(name = "codiri-core", version, about)]
pub struct Cli {
    /// Scenario input JSON (classified raster, basins, measurements,
    /// constraints and receptor points).
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Report output directory. Defaults to a temporary directory when
    /// omitted.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Installs the crate's default tracing subscriber: an env-filter layer
/// (`RUST_LOG`, falling back to `codiri_core=info`) plus a plain fmt layer.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("codiri_core=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_input_flag() {
        let cli = Cli::parse_from(["codiri-core", "--input", "scenario.json"]);
        assert_eq!(cli.input, PathBuf::from("scenario.json"));
        assert!(cli.output.is_none());
    }

    #[test]
    fn parses_output_flag() {
        let cli = Cli::parse_from([
            "codiri-core",
            "-i",
            "scenario.json",
            "-o",
            "report_dir",
        ]);
        assert_eq!(cli.output, Some(PathBuf::from("report_dir")));
    }
}
