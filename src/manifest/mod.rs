//! Batch manifest: which log files make up which (variant, worker-count) cell.
//!
//! JSON shape:
//! {
//!   "options": { "time_unit": "ms" },   // optional, see ParseOptions
//!   "cores_per_worker": 16,              // optional, enables per-core throughput
//!   "variants": [
//!     {
//!       "name": "Budget",
//!       "label": "Budget b = 10000000",  // optional, defaults to name
//!       "workers": [1, 2, 4, 8, 16],
//!       "trials": "Budget/brock800_2_{trial}_{workers}.txt"
//!     },
//!     ...
//!   ]
//! }
//!
//! `trials` is one of:
//! - a pattern string, expanded for trials 1..=5
//! - { "pattern": "...", "count": N }
//! - a list of file templates, used as-is per worker count
//!
//! `{workers}` and `{trial}` are substituted. Relative paths resolve against the
//! manifest's directory.

use crate::error::{PipelineError, Result};
use crate::log::ParseOptions;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TRIAL_COUNT: u32 = 5;

const WORKERS_PLACEHOLDER: &str = "{workers}";
const TRIAL_PLACEHOLDER: &str = "{trial}";

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub options: ParseOptions,

    #[serde(default)]
    pub cores_per_worker: Option<u32>,

    #[serde(default)]
    pub variants: Vec<RawVariant>,
}

/// Variant as it appears in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVariant {
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub workers: Vec<u32>,

    pub trials: TrialsSpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TrialsSpec {
    Pattern(String),
    Counted {
        pattern: String,
        #[serde(default = "default_trial_count")]
        count: u32,
    },
    Files(Vec<String>),
}

fn default_trial_count() -> u32 {
    DEFAULT_TRIAL_COUNT
}

/// Validated manifest with every file path spelled out.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub options: ParseOptions,
    pub cores_per_worker: Option<u32>,
    pub variants: Vec<VariantPlan>,
}

#[derive(Debug, Clone)]
pub struct VariantPlan {
    pub name: String,
    pub label: String,
    /// Sorted by increasing worker count.
    pub cells: Vec<CellPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellPlan {
    pub workers: u32,
    pub files: Vec<PathBuf>,
}

impl Manifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PipelineError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| invalid(format!("{}: {}", path.display(), e)))
    }

    /// Check names and worker counts, then expand file templates.
    pub fn validate_and_build(&self, base_dir: &Path) -> Result<BatchPlan> {
        if self.variants.is_empty() {
            return Err(invalid("manifest lists no variants"));
        }
        if self.cores_per_worker == Some(0) {
            return Err(invalid("cores_per_worker must be positive"));
        }

        let mut names = BTreeSet::new();
        let mut variants = Vec::with_capacity(self.variants.len());
        for raw in &self.variants {
            if !names.insert(raw.name.as_str()) {
                return Err(invalid(format!("duplicate variant name: {}", raw.name)));
            }
            variants.push(raw.build(base_dir)?);
        }

        Ok(BatchPlan {
            options: self.options.clone(),
            cores_per_worker: self.cores_per_worker,
            variants,
        })
    }
}

impl RawVariant {
    fn build(&self, base_dir: &Path) -> Result<VariantPlan> {
        if self.workers.is_empty() {
            return Err(invalid(format!("variant {} lists no worker counts", self.name)));
        }
        let mut workers = self.workers.clone();
        workers.sort_unstable();
        if workers.windows(2).any(|w| w[0] == w[1]) {
            return Err(invalid(format!(
                "variant {} lists a worker count twice",
                self.name
            )));
        }

        let templates = self.templates()?;
        if workers.len() > 1 {
            if let Some(t) = templates.iter().find(|t| !t.contains(WORKERS_PLACEHOLDER)) {
                return Err(invalid(format!(
                    "variant {}: {:?} needs {} to tell worker counts apart",
                    self.name, t, WORKERS_PLACEHOLDER
                )));
            }
        }

        let cells = workers
            .into_iter()
            .map(|w| CellPlan {
                workers: w,
                files: templates
                    .iter()
                    .map(|t| base_dir.join(t.replace(WORKERS_PLACEHOLDER, &w.to_string())))
                    .collect(),
            })
            .collect();

        Ok(VariantPlan {
            name: self.name.clone(),
            label: self.label.clone().unwrap_or_else(|| self.name.clone()),
            cells,
        })
    }

    /// File templates with `{trial}` already expanded.
    fn templates(&self) -> Result<Vec<String>> {
        let (pattern, count) = match &self.trials {
            TrialsSpec::Files(files) => {
                if files.is_empty() {
                    return Err(invalid(format!("variant {} lists no files", self.name)));
                }
                return Ok(files
                    .iter()
                    .enumerate()
                    .map(|(i, f)| f.replace(TRIAL_PLACEHOLDER, &(i + 1).to_string()))
                    .collect());
            }
            TrialsSpec::Pattern(pattern) => (pattern, DEFAULT_TRIAL_COUNT),
            TrialsSpec::Counted { pattern, count } => (pattern, *count),
        };

        if count == 0 {
            return Err(invalid(format!("variant {} asks for zero trials", self.name)));
        }
        if count > 1 && !pattern.contains(TRIAL_PLACEHOLDER) {
            return Err(invalid(format!(
                "variant {}: {:?} needs {} for {} trials",
                self.name, pattern, TRIAL_PLACEHOLDER, count
            )));
        }
        Ok((1..=count)
            .map(|i| pattern.replace(TRIAL_PLACEHOLDER, &i.to_string()))
            .collect())
    }
}

fn invalid(reason: impl Into<String>) -> PipelineError {
    PipelineError::InvalidManifest {
        reason: reason.into(),
    }
}
