//! Per-unit outcomes and the run summary.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::band::MonthLabel;
use crate::error::PipelineError;
use crate::layout::UnitId;

/// Pipeline stage at which a unit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolve,
    Fetch,
    Extract,
    Transform,
    Clip,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Transform => "transform",
            Self::Clip => "clip",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit that did not produce its output.
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub unit: UnitId,
    /// Effective label, when the band index resolved
    pub label: Option<MonthLabel>,
    pub stage: Stage,
    pub error: String,
}

impl UnitFailure {
    pub fn new(
        unit: UnitId,
        label: Option<MonthLabel>,
        stage: Stage,
        error: &PipelineError,
    ) -> Self {
        Self {
            unit,
            label,
            stage,
            error: error.to_string(),
        }
    }
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(
                f,
                "{} ({}) failed at {}: {}",
                self.unit, label, self.stage, self.error
            ),
            None => write!(f, "{} failed at {}: {}", self.unit, self.stage, self.error),
        }
    }
}

/// Result of processing one (year, band) unit.
pub type UnitOutcome = Result<PathBuf, UnitFailure>;

/// Aggregate of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub dataset: String,
    pub variable: String,
    pub years_processed: usize,
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<UnitFailure>,
    pub artifacts_removed: usize,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(dataset: &str, variable: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            variable: variable.to_string(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            Ok(path) => self.outputs.push(path),
            Err(failure) => self.failures.push(failure),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.outputs.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failed units of one nominal year.
    pub fn failures_for_year(&self, year: i32) -> impl Iterator<Item = &UnitFailure> {
        self.failures.iter().filter(move |f| f.unit.year == year)
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
