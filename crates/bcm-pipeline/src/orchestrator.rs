//! Drives fetch, extraction, reprojection, clipping and cleanup across the
//! (year, band) space of one run.
//!
//! ```text
//! INIT -> per year: FETCH -> per band 1..=12: EXTRACT -> TRANSFORM -> CLIP -> CLEANUP_BAND
//!                         -> CLEANUP_YEAR -> next year | DONE
//! ```
//!
//! Years and bands are processed strictly in order. A failing unit is
//! recorded in the [`RunSummary`] and the run moves on; only directory
//! bootstrapping can abort a run.

use std::sync::Arc;
use std::time::Instant;

use metrics::counter;
use tracing::{info, instrument, warn};

use crate::band::{self, BANDS};
use crate::config::RunConfig;
use crate::dataset::DatasetDescriptor;
use crate::engine::RasterEngine;
use crate::error::{PipelineError, Result};
use crate::fetch::ArchiveFetcher;
use crate::janitor::Janitor;
use crate::layout::{Artifact, DatasetLayout, UnitArtifacts, UnitId};
use crate::summary::{RunSummary, Stage, UnitFailure, UnitOutcome};

/// Runs the pipeline for one dataset, variable and year range.
pub struct Orchestrator {
    config: RunConfig,
    dataset: DatasetDescriptor,
    layout: DatasetLayout,
    fetcher: Arc<dyn ArchiveFetcher>,
    engine: Arc<dyn RasterEngine>,
}

impl Orchestrator {
    pub fn new(
        config: RunConfig,
        dataset: DatasetDescriptor,
        fetcher: Arc<dyn ArchiveFetcher>,
        engine: Arc<dyn RasterEngine>,
    ) -> Result<Self> {
        if dataset.name() != config.dataset() {
            return Err(PipelineError::InvalidConfig(format!(
                "run configured for '{}' but dataset descriptor is '{}'",
                config.dataset(),
                dataset.name()
            )));
        }

        let layout = DatasetLayout::new(&config);
        Ok(Self {
            config,
            dataset,
            layout,
            fetcher,
            engine,
        })
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Process every configured year, returning what succeeded and failed.
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        info!(
            dataset = %self.config.dataset(),
            variable = %self.config.variable(),
            first_year = *self.config.years().start(),
            last_year = *self.config.years().end(),
            "Processing dataset"
        );

        self.bootstrap().await?;

        let mut summary = RunSummary::new(self.config.dataset(), self.config.variable());
        let mut janitor = Janitor::new();
        let total = self.config.years().count();

        for (index, year) in self.config.years().enumerate() {
            info!(year, index = index + 1, total, "Processing year");
            self.process_year(year, &mut janitor, &mut summary).await;
            summary.years_processed += 1;
        }

        summary.artifacts_removed = janitor.removed();
        summary.elapsed = started.elapsed();

        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            artifacts_removed = summary.artifacts_removed,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Run complete"
        );
        Ok(summary)
    }

    /// Create the dataset and output directories. Idempotent.
    async fn bootstrap(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.layout.dataset_dir()).await?;
        tokio::fs::create_dir_all(self.layout.output_dir()).await?;
        Ok(())
    }

    async fn process_year(&self, year: i32, janitor: &mut Janitor, summary: &mut RunSummary) {
        let source = self.layout.yearly_source(year);
        let url = self.dataset.url_for(self.config.variable(), year);
        self.track_reprojected(year, janitor);

        match self.fetcher.fetch(&url, source.path()).await {
            Ok(bytes) => {
                counter!("bcm_years_fetched_total").increment(1);
                counter!("bcm_bytes_fetched_total").increment(bytes);
            }
            Err(e) => {
                warn!(year, url = %url, error = %e, "Fetch failed, skipping year");
                for band in BANDS {
                    let unit = UnitId { year, band };
                    let label = band::resolve(band, year).ok();
                    self.record(summary, Err(UnitFailure::new(unit, label, Stage::Fetch, &e)));
                }
                janitor.finish_year(&source).await;
                return;
            }
        }

        for band in BANDS {
            let outcome = self.process_unit(UnitId { year, band }, &source, janitor).await;
            self.record(summary, outcome);
        }

        let removed = janitor.finish_year(&source).await;
        info!(year, removed, "Year complete");
    }

    /// Record every reprojected slot of the year so the year-end sweep also
    /// collects files left by an interrupted earlier run.
    fn track_reprojected(&self, year: i32, janitor: &mut Janitor) {
        for band in BANDS {
            if let Ok(label) = band::resolve(band, year) {
                let artifacts = self.layout.unit_artifacts(UnitId { year, band }, label);
                janitor.track(&artifacts.reprojected);
            }
        }
    }

    fn record(&self, summary: &mut RunSummary, outcome: UnitOutcome) {
        match &outcome {
            Ok(_) => counter!("bcm_units_succeeded_total").increment(1),
            Err(failure) => {
                counter!("bcm_units_failed_total", "stage" => failure.stage.as_str()).increment(1)
            }
        }
        summary.record(outcome);
    }

    /// Extract, reproject and clip one band. Transients of a failed unit are removed.
    #[instrument(skip(self, unit, source, janitor), fields(unit = %unit))]
    async fn process_unit(
        &self,
        unit: UnitId,
        source: &Artifact,
        janitor: &mut Janitor,
    ) -> UnitOutcome {
        let label = band::resolve(unit.band, unit.year)
            .map_err(|e| UnitFailure::new(unit, None, Stage::Resolve, &e))?;
        let artifacts = self.layout.unit_artifacts(unit, label);

        match self.run_stages(unit, source, &artifacts, janitor).await {
            Ok(()) => {
                info!(label = %label, output = %artifacts.output.path().display(), "Band complete");
                Ok(artifacts.output.path().to_path_buf())
            }
            Err((stage, e)) => {
                warn!(label = %label, stage = %stage, error = %e, "Band failed");
                // The extraction slot holds at most a partial clip at this point
                janitor
                    .remove_all([&artifacts.extracted, &artifacts.reprojected])
                    .await;
                Err(UnitFailure::new(unit, Some(label), stage, &e))
            }
        }
    }

    async fn run_stages(
        &self,
        unit: UnitId,
        source: &Artifact,
        artifacts: &UnitArtifacts,
        janitor: &mut Janitor,
    ) -> std::result::Result<(), (Stage, PipelineError)> {
        self.engine
            .extract_band(source.path(), unit.band, artifacts.extracted.path())
            .await
            .map_err(|e| (Stage::Extract, e))?;

        self.engine
            .reproject(
                artifacts.extracted.path(),
                self.config.target_crs(),
                artifacts.reprojected.path(),
            )
            .await
            .map_err(|e| (Stage::Transform, e))?;

        // Frees the slot the clip writes into
        if let Err(e) = janitor.remove(&artifacts.extracted).await {
            warn!(error = %e, "Could not remove extracted band before clip");
        }

        self.engine
            .clip(
                artifacts.reprojected.path(),
                self.config.boundary(),
                artifacts.output.path(),
            )
            .await
            .map_err(|e| (Stage::Clip, e))?;

        // Left for the year-end sweep if this fails
        if let Err(e) = janitor.remove(&artifacts.reprojected).await {
            warn!(error = %e, "Could not remove reprojected raster");
        }

        Ok(())
    }
}
