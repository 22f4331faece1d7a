//! Per-run model: fold classified log lines into one run's metrics.

pub mod run;
pub mod series;

pub use run::{DepthCounts, MetricsAccumulator, RunMetrics, accumulate, parse_run_file};
pub use series::DepthTimeSeries;
