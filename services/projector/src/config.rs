//! Command-line and environment configuration.
//!
//! Every option can also be supplied through a `BCM_*` environment variable
//! (or a `.env` file). Defaults reproduce the Central Valley watershed run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bcm_pipeline::{DatasetCatalog, FetchConfig, GdalConfig, RunConfig};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "projector")]
#[command(about = "Split yearly CA-BCM projection files into clipped monthly rasters")]
pub struct Cli {
    /// Configuration directory (contains datasets/*.yaml)
    #[arg(long, global = true, env = "BCM_CONFIG_DIR", default_value = "config")]
    pub config_dir: PathBuf,

    /// Log level
    #[arg(long, global = true, env = "BCM_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch and process a range of years for one dataset
    Run(RunArgs),
    /// List the configured datasets
    Datasets,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Dataset name from the catalog
    #[arg(short, long, env = "BCM_DATASET", default_value = "GISS_26")]
    pub dataset: String,

    /// Climate variable (e.g. aet, ppt, tmn)
    #[arg(short, long, env = "BCM_VARIABLE", default_value = "aet")]
    pub variable: String,

    /// First nominal year (inclusive)
    #[arg(long, env = "BCM_START_YEAR", default_value = "2007")]
    pub start_year: i32,

    /// Last nominal year (inclusive)
    #[arg(long, env = "BCM_END_YEAR", default_value = "2099")]
    pub end_year: i32,

    /// Root directory for downloads and outputs
    #[arg(long, env = "BCM_DATA_ROOT", default_value = "../data/CA_BCM")]
    pub data_root: PathBuf,

    /// Watershed boundary vector file
    #[arg(long, env = "BCM_BOUNDARY", default_value = "../shape/cvws.shp")]
    pub boundary: PathBuf,

    /// Target coordinate reference system
    #[arg(long, env = "BCM_TARGET_CRS", default_value = bcm_pipeline::config::DEFAULT_TARGET_CRS)]
    pub target_crs: String,

    /// Extension of the output rasters
    #[arg(long, default_value = bcm_pipeline::config::DEFAULT_RASTER_EXTENSION)]
    pub raster_extension: String,

    /// Directory containing gdal_translate, gdalwarp and gdalinfo (default: PATH)
    #[arg(long, env = "GDAL_BIN_DIR")]
    pub gdal_bin_dir: Option<PathBuf>,

    /// HTTP timeout per yearly file, in seconds
    #[arg(long, default_value = "600")]
    pub request_timeout_secs: u64,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

impl RunArgs {
    pub fn run_config(&self) -> Result<RunConfig> {
        let config = RunConfig::new(
            self.dataset.clone(),
            self.variable.clone(),
            self.start_year..=self.end_year,
            self.data_root.clone(),
            self.boundary.clone(),
        )?
        .with_target_crs(self.target_crs.clone())?
        .with_extensions(
            bcm_pipeline::config::DEFAULT_SOURCE_EXTENSION,
            self.raster_extension.clone(),
        )?;
        Ok(config)
    }

    pub fn gdal_config(&self) -> GdalConfig {
        let mut config = GdalConfig::default();
        if let Some(dir) = &self.gdal_bin_dir {
            config.gdal_translate = dir.join("gdal_translate");
            config.gdalwarp = dir.join("gdalwarp");
            config.gdalinfo = dir.join("gdalinfo");
        }
        config
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..FetchConfig::default()
        }
    }
}

/// Load the dataset catalog from the configuration directory.
pub fn load_catalog(config_dir: &std::path::Path) -> Result<DatasetCatalog> {
    DatasetCatalog::load(config_dir)
        .with_context(|| format!("Failed to load datasets from {}", config_dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("projector").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_run_defaults_match_central_valley_run() {
        let cli = parse(&["run"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        let config = args.run_config().unwrap();
        assert_eq!(config.dataset(), "GISS_26");
        assert_eq!(config.variable(), "aet");
        assert_eq!(config.years(), 2007..=2099);
        assert_eq!(config.target_crs(), "EPSG:4326");
        assert_eq!(config.raster_extension(), "tiff");
    }

    #[test]
    fn test_run_overrides() {
        let cli = parse(&[
            "run",
            "--dataset",
            "MPI_26",
            "-v",
            "ppt",
            "--start-year",
            "2010",
            "--end-year",
            "2012",
            "--gdal-bin-dir",
            "/opt/gdal/bin",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        let config = args.run_config().unwrap();
        assert_eq!(config.years().count(), 3);
        assert_eq!(
            args.gdal_config().gdalwarp,
            PathBuf::from("/opt/gdal/bin/gdalwarp")
        );
    }

    #[test]
    fn test_inverted_year_range_rejected() {
        let cli = parse(&["run", "--start-year", "2012", "--end-year", "2010"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.run_config().is_err());
    }

    #[test]
    fn test_datasets_command() {
        let cli = parse(&["--config-dir", "/etc/bcm", "datasets"]);
        assert!(matches!(cli.command, Command::Datasets));
        assert_eq!(cli.config_dir, PathBuf::from("/etc/bcm"));
    }
}
