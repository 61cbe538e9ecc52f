//! Raster processing service interface.
//!
//! The pipeline needs three file-in/file-out operations: pull one band out
//! of a multi-band file, reproject a raster, and clip a raster to a vector
//! boundary. [`GdalCliEngine`] implements them with the GDAL command-line
//! utilities, passing typed argument vectors rather than shell strings and
//! turning non-zero exits into stage-specific errors.
//!
//! `gdalwarp` happily writes an all-nodata raster when the cutline misses the
//! source extent, so a clip is followed by a `gdalinfo -stats` probe and an
//! output without valid pixels is reported as a [`PipelineError::ClipError`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Raster conversion, reprojection and clipping.
#[async_trait]
pub trait RasterEngine: Send + Sync {
    /// Write band `band` of `source` to `dest` as a single-band raster.
    ///
    /// Fails with [`PipelineError::FormatError`].
    async fn extract_band(&self, source: &Path, band: u32, dest: &Path) -> Result<()>;

    /// Reproject `source` into `target_crs`, writing `dest`.
    ///
    /// Fails with [`PipelineError::TransformError`].
    async fn reproject(&self, source: &Path, target_crs: &str, dest: &Path) -> Result<()>;

    /// Crop `source` to the boundary's extent and mask to its interior.
    ///
    /// Fails with [`PipelineError::ClipError`].
    async fn clip(&self, source: &Path, boundary: &Path, dest: &Path) -> Result<()>;
}

/// Locations and output format for the GDAL utilities.
#[derive(Debug, Clone)]
pub struct GdalConfig {
    pub gdal_translate: PathBuf,
    pub gdalwarp: PathBuf,
    pub gdalinfo: PathBuf,
    /// GDAL driver short name for every written raster
    pub output_format: String,
    /// Value written outside the boundary polygon
    pub nodata: f64,
}

impl Default for GdalConfig {
    fn default() -> Self {
        Self {
            gdal_translate: PathBuf::from("gdal_translate"),
            gdalwarp: PathBuf::from("gdalwarp"),
            gdalinfo: PathBuf::from("gdalinfo"),
            output_format: "GTiff".to_string(),
            nodata: -9999.0,
        }
    }
}

/// [`RasterEngine`] backed by `gdal_translate`, `gdalwarp` and `gdalinfo`.
#[derive(Debug, Clone, Default)]
pub struct GdalCliEngine {
    config: GdalConfig,
}

impl GdalCliEngine {
    pub fn new(config: GdalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GdalConfig {
        &self.config
    }

    fn extract_args(&self, source: &Path, band: u32, dest: &Path) -> Vec<OsString> {
        vec![
            "-q".into(),
            "-of".into(),
            self.config.output_format.clone().into(),
            "-b".into(),
            band.to_string().into(),
            source.into(),
            dest.into(),
        ]
    }

    fn reproject_args(&self, source: &Path, target_crs: &str, dest: &Path) -> Vec<OsString> {
        vec![
            "-q".into(),
            "-overwrite".into(),
            "-of".into(),
            self.config.output_format.clone().into(),
            "-t_srs".into(),
            target_crs.into(),
            source.into(),
            dest.into(),
        ]
    }

    fn clip_args(&self, source: &Path, boundary: &Path, dest: &Path) -> Vec<OsString> {
        vec![
            "-q".into(),
            "-overwrite".into(),
            "-of".into(),
            self.config.output_format.clone().into(),
            "-dstnodata".into(),
            self.config.nodata.to_string().into(),
            "-cutline".into(),
            boundary.into(),
            "-crop_to_cutline".into(),
            source.into(),
            dest.into(),
        ]
    }
}

/// Run a tool to completion, returning its captured output.
async fn run_tool(program: &Path, args: &[OsString]) -> std::io::Result<Output> {
    debug!(program = %program.display(), args = ?args, "Running GDAL utility");
    Command::new(program).args(args).output().await
}

/// Map a finished tool run to `Ok(())` or a stage error built by `stage`.
async fn check_run<F>(program: &Path, args: &[OsString], dest: &Path, stage: F) -> Result<()>
where
    F: Fn(String) -> PipelineError,
{
    let output = run_tool(program, args)
        .await
        .map_err(|e| stage(format!("failed to run {}: {}", program.display(), e)))?;

    if !output.status.success() {
        // Tools may leave a partial file on failure
        tokio::fs::remove_file(dest).await.ok();
        return Err(stage(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    if !tokio::fs::try_exists(dest).await.unwrap_or(false) {
        return Err(stage(format!(
            "{} produced no output at {}",
            program.display(),
            dest.display()
        )));
    }

    Ok(())
}

/// Whether `gdalinfo -json -stats` output reports any valid pixel.
fn has_valid_pixels(info: &Value) -> bool {
    let Some(bands) = info.get("bands").and_then(Value::as_array) else {
        return false;
    };
    bands.iter().any(|band| {
        let valid_percent = band
            .pointer("/metadata//STATISTICS_VALID_PERCENT")
            .and_then(Value::as_str)
            .and_then(|v| v.parse::<f64>().ok());
        match valid_percent {
            Some(percent) => percent > 0.0,
            None => band.get("mean").is_some_and(Value::is_number),
        }
    })
}

impl GdalCliEngine {
    /// Fail with `ClipError` when the clipped raster holds no data.
    async fn ensure_not_empty(&self, dest: &Path) -> Result<()> {
        let program = &self.config.gdalinfo;
        let output = Command::new(program)
            .args(["-json", "-stats"])
            .arg(dest)
            // Keeps gdalinfo from writing a .aux.xml next to the output
            .env("GDAL_PAM_ENABLED", "NO")
            .output()
            .await
            .map_err(|e| {
                PipelineError::ClipError(format!("failed to run {}: {}", program.display(), e))
            })?;

        let info: Value = serde_json::from_slice(&output.stdout).unwrap_or(Value::Null);
        if output.status.success() && has_valid_pixels(&info) {
            return Ok(());
        }

        tokio::fs::remove_file(dest).await.ok();
        Err(PipelineError::ClipError(format!(
            "boundary does not intersect raster, no valid pixels in {}",
            dest.display()
        )))
    }
}

async fn require_input<F>(path: &Path, what: &str, stage: F) -> Result<()>
where
    F: Fn(String) -> PipelineError,
{
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        Ok(())
    } else {
        Err(stage(format!("{} not found: {}", what, path.display())))
    }
}

#[async_trait]
impl RasterEngine for GdalCliEngine {
    async fn extract_band(&self, source: &Path, band: u32, dest: &Path) -> Result<()> {
        require_input(source, "source raster", PipelineError::FormatError).await?;
        let args = self.extract_args(source, band, dest);
        check_run(&self.config.gdal_translate, &args, dest, PipelineError::FormatError).await
    }

    async fn reproject(&self, source: &Path, target_crs: &str, dest: &Path) -> Result<()> {
        require_input(source, "raster", PipelineError::TransformError).await?;
        let args = self.reproject_args(source, target_crs, dest);
        check_run(&self.config.gdalwarp, &args, dest, PipelineError::TransformError).await
    }

    async fn clip(&self, source: &Path, boundary: &Path, dest: &Path) -> Result<()> {
        require_input(boundary, "boundary", PipelineError::ClipError).await?;
        require_input(source, "raster", PipelineError::ClipError).await?;
        let args = self.clip_args(source, boundary, dest);
        check_run(&self.config.gdalwarp, &args, dest, PipelineError::ClipError).await?;
        self.ensure_not_empty(dest).await
    }
}
