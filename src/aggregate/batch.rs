use crate::aggregate::matrix::{Cell, ScalingMatrix};
use crate::aggregate::trials::TrialSummary;
use crate::error::PipelineError;
use crate::log::ParseOptions;
use crate::manifest::BatchPlan;
use crate::model::{RunMetrics, parse_run_file};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Parsed,
    /// Parsed cleanly but carried nothing the aggregator can use.
    NoData,
    Failed { kind: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub variant: String,
    pub workers: u32,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn contributed(&self) -> bool {
        self.status == FileStatus::Parsed
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub matrix: ScalingMatrix,
    pub files: Vec<FileOutcome>,
}

impl BatchOutcome {
    pub fn files_without_data(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.contributed())
    }
}

/// Repeated trials of one configuration, outside any manifest.
#[derive(Debug, Clone)]
pub struct TrialsOutcome {
    /// `None` when no file contributed data.
    pub summary: Option<TrialSummary>,
    pub sources: Vec<String>,
    pub files: Vec<(PathBuf, FileStatus)>,
}

impl TrialsOutcome {
    pub fn files_without_data(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(|(_, status)| *status != FileStatus::Parsed)
            .map(|(path, _)| path.as_path())
    }
}

/// Parse each file into a run. Only runs that carried data are returned;
/// statuses line up with `paths`.
fn parse_trials(paths: &[PathBuf], opts: &ParseOptions) -> (Vec<RunMetrics>, Vec<FileStatus>) {
    let mut runs = Vec::with_capacity(paths.len());
    let statuses = paths
        .iter()
        .map(|path| match parse_run_file(path, opts) {
            Ok(run) if run.has_data() => {
                runs.push(run);
                FileStatus::Parsed
            }
            Ok(_) => {
                log::warn!("{}: no usable records", path.display());
                FileStatus::NoData
            }
            Err(err) => {
                log::warn!("{}", err);
                FileStatus::Failed {
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                }
            }
        })
        .collect();
    (runs, statuses)
}

/// Summarise trial logs of a single configuration. Files that fail or carry
/// no data are reported but never averaged in.
pub fn run_trials(paths: &[PathBuf], opts: &ParseOptions) -> TrialsOutcome {
    let (runs, statuses) = parse_trials(paths, opts);
    TrialsOutcome {
        summary: TrialSummary::from_runs(&runs),
        sources: runs.into_iter().map(|r| r.source).collect(),
        files: paths.iter().cloned().zip(statuses).collect(),
    }
}

/// Parse every file of every cell, one file at a time.
///
/// A file that fails to parse costs only its own trial; a cell left with no
/// trials is recorded as missing and the batch carries on.
pub fn run_batch(plan: &BatchPlan) -> BatchOutcome {
    let mut matrix = ScalingMatrix::new();
    let mut files = Vec::new();

    for variant in &plan.variants {
        for cell in &variant.cells {
            let (runs, statuses) = parse_trials(&cell.files, &plan.options);
            files.extend(
                cell.files
                    .iter()
                    .zip(statuses)
                    .map(|(path, status)| FileOutcome {
                        path: path.clone(),
                        variant: variant.name.clone(),
                        workers: cell.workers,
                        status,
                    }),
            );

            let entry = match TrialSummary::from_runs(&runs) {
                Some(summary) => Cell::Present {
                    summary,
                    sources: runs.iter().map(|r| r.source.clone()).collect(),
                },
                None => {
                    let missing = PipelineError::MissingCell {
                        variant: variant.name.clone(),
                        workers: cell.workers,
                    };
                    log::info!("{}", missing);
                    Cell::Missing {
                        reason: missing.to_string(),
                    }
                }
            };
            matrix.insert(&variant.name, &variant.label, cell.workers, entry);
        }
    }

    BatchOutcome { matrix, files }
}
