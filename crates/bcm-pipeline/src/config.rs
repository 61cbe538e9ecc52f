//! Immutable run configuration.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::dataset::is_directory_name;
use crate::error::{PipelineError, Result};

/// WGS84 geographic coordinates.
pub const DEFAULT_TARGET_CRS: &str = "EPSG:4326";
/// Extension of the yearly multi-band source files.
pub const DEFAULT_SOURCE_EXTENSION: &str = "nc";
/// Extension of extracted and final single-band rasters.
pub const DEFAULT_RASTER_EXTENSION: &str = "tiff";

/// Parameters of one pipeline run.
///
/// Built once by the caller and handed to the orchestrator; nothing in the
/// pipeline mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    dataset: String,
    variable: String,
    years: RangeInclusive<i32>,
    data_root: PathBuf,
    boundary: PathBuf,
    target_crs: String,
    source_extension: String,
    raster_extension: String,
}

impl RunConfig {
    /// Create a run configuration with default CRS and file extensions.
    pub fn new(
        dataset: impl Into<String>,
        variable: impl Into<String>,
        years: RangeInclusive<i32>,
        data_root: impl Into<PathBuf>,
        boundary: impl Into<PathBuf>,
    ) -> Result<Self> {
        let config = Self {
            dataset: dataset.into(),
            variable: variable.into(),
            years,
            data_root: data_root.into(),
            boundary: boundary.into(),
            target_crs: DEFAULT_TARGET_CRS.to_string(),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            raster_extension: DEFAULT_RASTER_EXTENSION.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_target_crs(mut self, crs: impl Into<String>) -> Result<Self> {
        self.target_crs = crs.into();
        self.validate()?;
        Ok(self)
    }

    pub fn with_extensions(
        mut self,
        source: impl Into<String>,
        raster: impl Into<String>,
    ) -> Result<Self> {
        self.source_extension = source.into();
        self.raster_extension = raster.into();
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.dataset.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("dataset is required".into()));
        }
        if !is_directory_name(&self.dataset) {
            return Err(PipelineError::InvalidConfig(format!(
                "invalid dataset name '{}'",
                self.dataset
            )));
        }
        if self.variable.trim().is_empty() || self.variable.contains(['/', '\\', '_']) {
            // '_' separates the filename fields
            return Err(PipelineError::InvalidConfig(format!(
                "invalid variable name '{}'",
                self.variable
            )));
        }
        if self.years.is_empty() {
            return Err(PipelineError::InvalidConfig(format!(
                "empty year range {}..={}",
                self.years.start(),
                self.years.end()
            )));
        }
        if self.target_crs.trim().is_empty() {
            return Err(PipelineError::InvalidConfig("target CRS is required".into()));
        }
        for ext in [&self.source_extension, &self.raster_extension] {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(PipelineError::InvalidConfig(format!(
                    "invalid file extension '{}'",
                    ext
                )));
            }
        }
        if self.source_extension == self.raster_extension {
            return Err(PipelineError::InvalidConfig(
                "source and raster extensions must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn years(&self) -> RangeInclusive<i32> {
        self.years.clone()
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn boundary(&self) -> &Path {
        &self.boundary
    }

    pub fn target_crs(&self) -> &str {
        &self.target_crs
    }

    pub fn source_extension(&self) -> &str {
        &self.source_extension
    }

    pub fn raster_extension(&self) -> &str {
        &self.raster_extension
    }
}
