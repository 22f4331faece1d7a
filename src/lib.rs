//! Turn search-skeleton benchmark logs into per-depth series, trial summaries
//! and scaling tables.
//!
//! Pipeline: log file -> [`crate::log::LogRecordParser`] -> [`crate::model::MetricsAccumulator`]
//! -> [`crate::model::RunMetrics`] -> [`aggregate`] -> [`report`].

pub mod aggregate;
pub mod error;
pub mod log;
pub mod manifest;
pub mod model;
pub mod report;
pub mod stats;

pub use error::{PipelineError, Result};
