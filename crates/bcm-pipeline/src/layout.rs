//! On-disk layout and artifact identities.
//!
//! ```text
//! <data-root>/<dataset>/<dataset>_<var>_<year>.nc                      yearly source
//! <data-root>/<dataset>/<dataset>/<dataset>_<var>_<yyyy>_<mm>.tiff      extracted / final
//! <data-root>/<dataset>/<dataset>/<dataset>_<var>_<yyyy>_<mm>_rpj.tiff  reprojected
//! ```
//!
//! The extracted band and the final clipped raster share one path: the clip
//! is written back into the extraction slot once the reprojected copy exists.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::band::MonthLabel;
use crate::config::RunConfig;

/// Suffix marking reprojected, not yet clipped rasters.
pub const REPROJECTED_TAG: &str = "rpj";

/// Identity of one (year, band) processing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnitId {
    /// Nominal year of the source file
    pub year: i32,
    /// Band index within the source file
    pub band: u32,
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/band{:02}", self.year, self.band)
    }
}

/// Pipeline stage an artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    YearlySource,
    ExtractedBand,
    Reprojected,
    FinalOutput,
}

impl ArtifactKind {
    /// Whether the artifact must not survive the run.
    pub fn is_transient(self) -> bool {
        !matches!(self, Self::FinalOutput)
    }
}

/// A file produced by the pipeline, with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    kind: ArtifactKind,
    year: i32,
    band: Option<u32>,
    path: PathBuf,
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Nominal year of the owning unit or source file.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Owning unit; `None` for yearly source files.
    pub fn unit(&self) -> Option<UnitId> {
        self.band.map(|band| UnitId {
            year: self.year,
            band,
        })
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.path.display())
    }
}

/// The three per-unit artifacts of one band.
#[derive(Debug, Clone)]
pub struct UnitArtifacts {
    pub extracted: Artifact,
    pub reprojected: Artifact,
    pub output: Artifact,
}

/// Path scheme for one (dataset, variable) run.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    dataset: String,
    variable: String,
    dataset_dir: PathBuf,
    output_dir: PathBuf,
    source_extension: String,
    raster_extension: String,
}

impl DatasetLayout {
    pub fn new(config: &RunConfig) -> Self {
        let dataset_dir = config.data_root().join(config.dataset());
        let output_dir = dataset_dir.join(config.dataset());
        Self {
            dataset: config.dataset().to_string(),
            variable: config.variable().to_string(),
            dataset_dir,
            output_dir,
            source_extension: config.source_extension().to_string(),
            raster_extension: config.raster_extension().to_string(),
        }
    }

    /// Directory holding the yearly source files.
    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }

    /// Directory holding the monthly rasters.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn stem(&self, label: MonthLabel) -> String {
        format!("{}_{}_{}_{}", self.dataset, self.variable, label.year, label.month)
    }

    pub fn yearly_source_path(&self, year: i32) -> PathBuf {
        self.dataset_dir.join(format!(
            "{}_{}_{}.{}",
            self.dataset, self.variable, year, self.source_extension
        ))
    }

    /// Path of the final raster for a calendar month.
    pub fn output_path(&self, label: MonthLabel) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.stem(label), self.raster_extension))
    }

    pub fn reprojected_path(&self, label: MonthLabel) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}.{}",
            self.stem(label),
            REPROJECTED_TAG,
            self.raster_extension
        ))
    }

    pub fn yearly_source(&self, year: i32) -> Artifact {
        Artifact {
            kind: ArtifactKind::YearlySource,
            year,
            band: None,
            path: self.yearly_source_path(year),
        }
    }

    /// Artifacts owned by one unit, named after its effective label.
    pub fn unit_artifacts(&self, unit: UnitId, label: MonthLabel) -> UnitArtifacts {
        let artifact = |kind: ArtifactKind, path: PathBuf| Artifact {
            kind,
            year: unit.year,
            band: Some(unit.band),
            path,
        };
        let slot = self.output_path(label);
        UnitArtifacts {
            extracted: artifact(ArtifactKind::ExtractedBand, slot.clone()),
            reprojected: artifact(ArtifactKind::Reprojected, self.reprojected_path(label)),
            output: artifact(ArtifactKind::FinalOutput, slot),
        }
    }
}
