//! Dataset descriptors and catalog loading.
//!
//! Each dataset is one GCM/emissions-scenario combination of the archive.
//! Descriptors are loaded from YAML files in `config/datasets/`:
//!
//! ```yaml
//! dataset:
//!   name: GISS_26
//!   description: "GISS-E2-R, RCP 2.6"
//! source:
//!   url_template: "https://host/CA_BCM_GISS_rcp26_Monthly_{variable}_{year}.nc"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

const VARIABLE_PLACEHOLDER: &str = "{variable}";
const YEAR_PLACEHOLDER: &str = "{year}";

/// One climate scenario/model combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    name: String,
    url_template: String,
    description: String,
}

/// A single path component: no separators, not `.` or `..`.
pub(crate) fn is_directory_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(['/', '\\']) && !matches!(name, "." | "..")
}

impl DatasetDescriptor {
    /// Create a descriptor, validating the URL template.
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let url_template = url_template.into();

        if name.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "dataset name must not be empty".to_string(),
            ));
        }
        if !is_directory_name(&name) {
            return Err(PipelineError::InvalidConfig(format!(
                "dataset name '{}' is not usable as a directory name",
                name
            )));
        }
        if url_template.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(format!(
                "dataset '{}' has no URL template",
                name
            )));
        }
        for placeholder in [VARIABLE_PLACEHOLDER, YEAR_PLACEHOLDER] {
            if !url_template.contains(placeholder) {
                return Err(PipelineError::InvalidConfig(format!(
                    "URL template for '{}' is missing {}",
                    name, placeholder
                )));
            }
        }

        Ok(Self {
            name,
            url_template,
            description: String::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Substitute (variable, year) into the template.
    pub fn url_for(&self, variable: &str, year: i32) -> String {
        self.url_template
            .replace(VARIABLE_PLACEHOLDER, variable)
            .replace(YEAR_PLACEHOLDER, &year.to_string())
    }
}

/// On-disk YAML shape of a dataset file.
#[derive(Debug, Clone, Deserialize)]
struct DatasetFile {
    dataset: DatasetInfo,
    source: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct DatasetInfo {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct SourceConfig {
    #[serde(default)]
    url_template: String,
}

/// Parse a single dataset YAML document.
///
/// Returns `Ok(None)` for datasets marked `enabled: false`.
pub fn parse_dataset_yaml(content: &str) -> Result<Option<DatasetDescriptor>> {
    let file: DatasetFile = serde_yaml::from_str(content)
        .map_err(|e| PipelineError::InvalidConfig(format!("invalid dataset YAML: {}", e)))?;

    if !file.dataset.enabled {
        debug!(dataset = %file.dataset.name, "Skipping disabled dataset");
        return Ok(None);
    }

    let descriptor = DatasetDescriptor::new(file.dataset.name, file.source.url_template)?
        .with_description(file.dataset.description);
    Ok(Some(descriptor))
}

/// Named collection of dataset descriptors.
#[derive(Debug, Clone, Default)]
pub struct DatasetCatalog {
    datasets: BTreeMap<String, DatasetDescriptor>,
}

impl DatasetCatalog {
    /// Catalog of the CA-BCM 2014 precipitation/water-balance projections.
    pub fn builtin() -> Self {
        let entries = [
            (
                "GISS_26",
                "GISS-E2-R, RCP 2.6",
                "https://cida.usgs.gov/thredds/fileServer/CA-BCM-2014/GISS_rcp26/Monthly/CA_BCM_GISS_rcp26_Monthly_{variable}_{year}.nc",
            ),
            (
                "GISS_A1",
                "GISS-AOM, SRES A1B",
                "https://cida.usgs.gov/thredds/fileServer/CA-BCM-2014/GISS_AOM_A1B/Monthly/CA_BCM_GISS_AOM_A1B_Monthly_{variable}_{year}.nc",
            ),
            (
                "MPI_26",
                "MRI-CGCM3, RCP 2.6",
                "https://cida.usgs.gov/thredds/fileServer/CA-BCM-2014/MRI_rcp26/Monthly/CA_BCM_MRI_rcp26_Monthly_{variable}_{year}.nc",
            ),
        ];

        let mut catalog = Self::default();
        for (name, description, template) in entries {
            // Templates above are static and valid.
            if let Ok(descriptor) = DatasetDescriptor::new(name, template) {
                catalog.insert(descriptor.with_description(description));
            }
        }
        catalog
    }

    /// Load all enabled datasets from `<config_dir>/datasets/*.yaml`.
    ///
    /// Falls back to [`DatasetCatalog::builtin`] when the directory is absent.
    /// Files that fail to parse are skipped with a warning.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let datasets_dir = config_dir.join("datasets");

        if !datasets_dir.exists() {
            warn!(
                path = %datasets_dir.display(),
                "Dataset config directory not found, using built-in catalog"
            );
            return Ok(Self::builtin());
        }

        let mut catalog = Self::default();

        let mut paths: Vec<_> = std::fs::read_dir(&datasets_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();
        paths.sort();

        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            match parse_dataset_yaml(&content) {
                Ok(Some(descriptor)) => {
                    info!(
                        dataset = %descriptor.name(),
                        path = %path.display(),
                        "Loaded dataset configuration"
                    );
                    catalog.insert(descriptor);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to load dataset config");
                }
            }
        }

        info!(count = catalog.len(), "Loaded dataset catalog");
        Ok(catalog)
    }

    pub fn insert(&mut self, descriptor: DatasetDescriptor) {
        self.datasets.insert(descriptor.name().to_string(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&DatasetDescriptor> {
        self.datasets.get(name)
    }

    /// Look up a dataset, failing with the list of known names.
    pub fn require(&self, name: &str) -> Result<&DatasetDescriptor> {
        self.get(name).ok_or_else(|| {
            PipelineError::InvalidConfig(format!(
                "unknown dataset '{}' (known: {})",
                name,
                self.datasets.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetDescriptor> {
        self.datasets.values()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
