//! Pipeline runs against the real GDAL utilities.
//!
//! Skipped when the GDAL utilities are not on PATH.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use async_trait::async_trait;
use bcm_pipeline::{
    ArchiveFetcher, DatasetDescriptor, GdalCliEngine, Orchestrator, PipelineError, RasterEngine,
    Result, RunConfig, Stage,
};
use test_utils::{
    bbox, datasets, file_names, list_files, require_commands, require_test_file,
    temp_test_dir_with_prefix, write_boundary,
};

/// Copies a prepared local file instead of downloading.
struct LocalCopy(PathBuf);

#[async_trait]
impl ArchiveFetcher for LocalCopy {
    async fn fetch(&self, _url: &str, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(tokio::fs::copy(&self.0, dest).await?)
    }
}

/// A 12-band California Albers raster around the Central Valley.
fn create_yearly_raster(dir: &Path) -> PathBuf {
    let path = dir.join("yearly.tif");
    let status = Command::new("gdal_create")
        .args(["-q", "-of", "GTiff", "-outsize", "40", "40", "-bands", "12", "-ot", "Float32"])
        .args(["-burn", "1.5", "-a_srs", "EPSG:3310"])
        .args(["-a_ullr", "-200000", "200000", "200000", "-200000"])
        .arg(&path)
        .status()
        .expect("failed to run gdal_create");
    assert!(status.success(), "gdal_create failed");
    path
}

fn orchestrator_for(dir: &Path, source: PathBuf, boundary: PathBuf) -> Orchestrator {
    let data_root = dir.join("CA_BCM");
    let config = RunConfig::new(datasets::GISS_26, "aet", 2010..=2010, data_root, boundary)
        .unwrap()
        .with_extensions("nc", "tif")
        .unwrap();
    let dataset =
        DatasetDescriptor::new(datasets::GISS_26, "file:///archive/{variable}_{year}.nc").unwrap();
    Orchestrator::new(
        config,
        dataset,
        Arc::new(LocalCopy(source)),
        Arc::new(GdalCliEngine::default()),
    )
    .unwrap()
}

fn orchestrator(dir: &Path, boundary: PathBuf) -> Orchestrator {
    let source = create_yearly_raster(dir);
    orchestrator_for(dir, source, boundary)
}

#[tokio::test]
async fn test_gdal_run_produces_clipped_months() {
    require_commands!("gdal_create", "gdal_translate", "gdalwarp", "gdalinfo");
    let dir = temp_test_dir_with_prefix("bcm_gdal_");
    let boundary = write_boundary(dir.path(), "cvws", bbox::CENTRAL_VALLEY);

    let summary = orchestrator(dir.path(), boundary).run().await.unwrap();
    assert!(summary.is_success(), "failures: {:?}", summary.failures);

    let names = file_names(&dir.path().join("CA_BCM/GISS_26/GISS_26"));
    assert_eq!(names.len(), 12);
    assert!(names.contains(&"GISS_26_aet_2009_10.tif".to_string()));
    assert!(names.contains(&"GISS_26_aet_2010_09.tif".to_string()));
    assert!(list_files(&dir.path().join("CA_BCM"))
        .iter()
        .all(|f| !f.contains("_rpj") && !f.ends_with(".nc")));
}

#[tokio::test]
async fn test_gdal_disjoint_boundary_is_clip_error() {
    require_commands!("gdal_create", "gdal_translate", "gdalwarp", "gdalinfo");
    let dir = tempfile::tempdir().unwrap();
    let boundary = write_boundary(dir.path(), "atlantic", bbox::DISJOINT);

    let summary = orchestrator(dir.path(), boundary).run().await.unwrap();
    assert_eq!(summary.failed(), 12);
    assert!(summary.failures.iter().all(|f| f.stage == Stage::Clip));
    assert!(list_files(&dir.path().join("CA_BCM")).is_empty());
}

#[tokio::test]
async fn test_gdal_missing_band_is_format_error() {
    require_commands!("gdal_create", "gdal_translate");
    let dir = tempfile::tempdir().unwrap();
    let source = create_yearly_raster(dir.path());

    let result = GdalCliEngine::default()
        .extract_band(&source, 13, &dir.path().join("band13.tif"))
        .await;
    assert!(matches!(result, Err(PipelineError::FormatError(_))));
    assert!(!dir.path().join("band13.tif").exists());
}

#[tokio::test]
async fn test_gdal_real_projection_file() {
    require_commands!("gdal_translate", "gdalwarp", "gdalinfo");
    let source = require_test_file!("CA_BCM_GISS_rcp26_Monthly_aet_2010.nc");
    let dir = temp_test_dir_with_prefix("bcm_real_");
    let boundary = write_boundary(dir.path(), "ca_bcm", bbox::CA_BCM);

    let summary = orchestrator_for(dir.path(), source, boundary)
        .run()
        .await
        .unwrap();
    assert_eq!(summary.succeeded() + summary.failed(), 12);

    let names = file_names(&dir.path().join("CA_BCM/GISS_26/GISS_26"));
    assert_eq!(names.len(), summary.succeeded());
    assert!(names.iter().all(|n| n.starts_with("GISS_26_aet_")));
    assert!(list_files(&dir.path().join("CA_BCM"))
        .iter()
        .all(|f| !f.contains("_rpj") && !f.ends_with(".nc")));
}
