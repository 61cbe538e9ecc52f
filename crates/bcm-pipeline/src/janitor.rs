//! Removal of transient pipeline artifacts.
//!
//! Deletion goes by recorded identity only. The janitor keeps, per nominal
//! year, the reprojected artifacts that may exist on disk so that the
//! year-end sweep can collect anything a failed unit or an interrupted run
//! left behind. Extracted bands are
//! not recorded: they occupy the final output slot. Final outputs are never
//! accepted for removal.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::layout::{Artifact, ArtifactKind};

/// Tracks transient artifacts and deletes them.
#[derive(Debug, Default)]
pub struct Janitor {
    pending: BTreeMap<i32, BTreeSet<PathBuf>>,
    removed: usize,
}

impl Janitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a reprojected artifact may now exist on disk.
    pub fn track(&mut self, artifact: &Artifact) {
        if artifact.kind() == ArtifactKind::Reprojected {
            self.pending
                .entry(artifact.year())
                .or_default()
                .insert(artifact.path().to_path_buf());
        }
    }

    /// Delete one transient artifact. Returns whether a file was removed.
    ///
    /// A missing file is not an error.
    pub async fn remove(&mut self, artifact: &Artifact) -> Result<bool> {
        if artifact.kind() == ArtifactKind::FinalOutput {
            return Err(PipelineError::InvalidConfig(format!(
                "refusing to delete final output {}",
                artifact.path().display()
            )));
        }

        let removed = match tokio::fs::remove_file(artifact.path()).await {
            Ok(()) => {
                debug!(artifact = %artifact, "Removed artifact");
                self.removed += 1;
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            // Stays recorded for the year-end sweep
            Err(e) => return Err(e.into()),
        };

        if let Some(paths) = self.pending.get_mut(&artifact.year()) {
            paths.remove(artifact.path());
        }
        Ok(removed)
    }

    /// Delete every listed artifact, logging rather than propagating failures.
    pub async fn remove_all<'a, I>(&mut self, artifacts: I) -> usize
    where
        I: IntoIterator<Item = &'a Artifact>,
    {
        let mut count = 0;
        for artifact in artifacts {
            match self.remove(artifact).await {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(e) => warn!(artifact = %artifact, error = %e, "Failed to remove artifact"),
            }
        }
        count
    }

    /// Year-end sweep: the yearly source plus any reprojected file still recorded.
    pub async fn finish_year(&mut self, source: &Artifact) -> usize {
        let mut count = self.remove_all([source]).await;

        let leftovers = self.pending.remove(&source.year()).unwrap_or_default();
        for path in leftovers {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed leftover artifact");
                    self.removed += 1;
                    count += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove leftover"),
            }
        }
        count
    }

    /// Transient paths still recorded for a year.
    pub fn pending(&self, year: i32) -> usize {
        self.pending.get(&year).map_or(0, BTreeSet::len)
    }

    /// Files deleted so far.
    pub fn removed(&self) -> usize {
        self.removed
    }
}
