//! Common test doubles for bcm-pipeline integration tests
//!
//! Provides:
//! - A fetcher that writes deterministic yearly files without a network
//! - A raster engine that records each stage in the file contents

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bcm_pipeline::{ArchiveFetcher, PipelineError, RasterEngine, Result};

pub const SOURCE_MAGIC: &str = "BCM-YEARLY";
pub const DISJOINT_MARKER: &str = "DISJOINT";

/// Writes `BCM-YEARLY <url>` for each requested year.
#[derive(Default)]
pub struct FakeFetcher {
    /// Years whose transfer fails outright
    pub unavailable: HashSet<String>,
    /// Years whose transfer "succeeds" with a non-raster body
    pub corrupt: HashSet<String>,
    pub calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable(mut self, year: i32) -> Self {
        self.unavailable.insert(year.to_string());
        self
    }

    pub fn corrupt(mut self, year: i32) -> Self {
        self.corrupt.insert(year.to_string());
        self
    }

    fn matches(set: &HashSet<String>, url: &str) -> bool {
        set.iter().any(|year| url.contains(&format!("_{}.", year)))
    }
}

#[async_trait]
impl ArchiveFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if Self::matches(&self.unavailable, url) {
            return Err(PipelineError::FetchFailure {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            });
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = if Self::matches(&self.corrupt, url) {
            "<html>Service Unavailable</html>".to_string()
        } else {
            format!("{} {}", SOURCE_MAGIC, url)
        };
        std::fs::write(dest, &body)?;
        Ok(body.len() as u64)
    }
}

/// Engine whose outputs are text descriptions of the applied stages.
///
/// Failures can be injected per output file stem fragment, e.g. `"2010_02"`.
#[derive(Default)]
pub struct FakeEngine {
    pub fail_transform: HashSet<String>,
    pub fail_clip: HashSet<String>,
    pub log: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_transform(mut self, label: &str) -> Self {
        self.fail_transform.insert(label.to_string());
        self
    }

    pub fn fail_clip(mut self, label: &str) -> Self {
        self.fail_clip.insert(label.to_string());
        self
    }

    pub fn calls(&self, op: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.starts_with(op))
            .count()
    }

    fn note(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn hits(set: &HashSet<String>, path: &Path) -> bool {
        let name = path.to_string_lossy();
        set.iter().any(|label| name.contains(label.as_str()))
    }
}

fn read(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path)
}

#[async_trait]
impl RasterEngine for FakeEngine {
    async fn extract_band(&self, source: &Path, band: u32, dest: &Path) -> Result<()> {
        self.note(format!("extract {} {}", band, dest.display()));
        let content = read(source).map_err(|e| PipelineError::FormatError(e.to_string()))?;
        if !content.starts_with(SOURCE_MAGIC) {
            return Err(PipelineError::FormatError(format!(
                "{} is not a raster",
                source.display()
            )));
        }
        std::fs::write(dest, format!("band={}\n{}", band, content))?;
        Ok(())
    }

    async fn reproject(&self, source: &Path, target_crs: &str, dest: &Path) -> Result<()> {
        self.note(format!("reproject {}", dest.display()));
        if Self::hits(&self.fail_transform, dest) {
            return Err(PipelineError::TransformError("unsupported source CRS".into()));
        }
        let content = read(source).map_err(|e| PipelineError::TransformError(e.to_string()))?;
        std::fs::write(dest, format!("crs={}\n{}", target_crs, content))?;
        Ok(())
    }

    async fn clip(&self, source: &Path, boundary: &Path, dest: &Path) -> Result<()> {
        self.note(format!("clip {}", dest.display()));
        let cutline = read(boundary).map_err(|e| PipelineError::ClipError(e.to_string()))?;
        let content = read(source).map_err(|e| PipelineError::ClipError(e.to_string()))?;

        // Leave a partial file behind, as a crashed warp would
        std::fs::write(dest, "partial")?;
        if cutline.contains(DISJOINT_MARKER) || Self::hits(&self.fail_clip, dest) {
            return Err(PipelineError::ClipError("cutline does not intersect raster".into()));
        }
        std::fs::write(dest, format!("clip={}\n{}", cutline.trim(), content))?;
        Ok(())
    }
}
