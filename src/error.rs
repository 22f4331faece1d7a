//! Error kinds surfaced by the log-to-statistics pipeline.

use std::io;
use std::path::PathBuf;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("cannot read log source {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record at {source_name}:{line}: {reason}: {text:?}")]
    MalformedRecord {
        source_name: String,
        line: usize,
        text: String,
        reason: String,
    },

    #[error("division by zero while computing {metric}")]
    DivisionByZero { metric: &'static str },

    #[error("no data for variant {variant} at {workers} workers")]
    MissingCell { variant: String, workers: u32 },

    #[error("invalid manifest: {reason}")]
    InvalidManifest { reason: String },
}

impl PipelineError {
    /// Stable short name of the error kind, used in per-file batch outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "SourceUnavailable",
            Self::MalformedRecord { .. } => "MalformedRecord",
            Self::DivisionByZero { .. } => "DivisionByZero",
            Self::MissingCell { .. } => "MissingCell",
            Self::InvalidManifest { .. } => "InvalidManifest",
        }
    }
}

/// `numerator / denominator`, refusing a zero denominator instead of producing infinity.
pub fn checked_ratio(metric: &'static str, numerator: f64, denominator: f64) -> Result<f64> {
    if denominator == 0.0 {
        return Err(PipelineError::DivisionByZero { metric });
    }
    Ok(numerator / denominator)
}
