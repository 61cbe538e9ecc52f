//! Climate projection raster pipeline.
//!
//! Fetches yearly multi-band projection files (one variable, one scenario,
//! one hydrological year per file) and turns each into twelve calendar-month
//! rasters, reprojected to a geographic CRS and clipped to a watershed.
//!
//! # Architecture
//!
//! - [`band`]: hydrological band index to calendar (year, month)
//! - [`dataset`]: dataset descriptors and the YAML catalog
//! - [`layout`]: file naming and artifact identities
//! - [`fetch`]: [`ArchiveFetcher`] and its HTTP implementation
//! - [`engine`]: [`RasterEngine`] (extract / reproject / clip) over GDAL
//! - [`janitor`]: identity-based removal of transient files
//! - [`orchestrator`]: the year x band loop with best-effort failure handling

pub mod band;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod janitor;
pub mod layout;
pub mod orchestrator;
pub mod summary;

// Re-exports
pub use band::{resolve, MonthLabel, BANDS, BAND_MONTHS};
pub use config::RunConfig;
pub use dataset::{DatasetCatalog, DatasetDescriptor};
pub use engine::{GdalCliEngine, GdalConfig, RasterEngine};
pub use error::{PipelineError, Result};
pub use fetch::{ArchiveFetcher, FetchConfig, HttpFetcher};
pub use janitor::Janitor;
pub use layout::{Artifact, ArtifactKind, DatasetLayout, UnitArtifacts, UnitId, REPROJECTED_TAG};
pub use orchestrator::Orchestrator;
pub use summary::{RunSummary, Stage, UnitFailure, UnitOutcome};
