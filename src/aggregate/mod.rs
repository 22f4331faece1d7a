//! Cross-run aggregation: repeated trials, worker-count sweeps, and the
//! (variant, worker-count) matrix built from a batch manifest.

pub mod batch;
pub mod matrix;
pub mod scaling;
pub mod trials;

pub use batch::{BatchOutcome, FileOutcome, FileStatus, TrialsOutcome, run_batch, run_trials};
pub use matrix::{Cell, ScalingMatrix, VariantColumn};
pub use scaling::{AggregateRow, Derived, SpeedupSeries, ThroughputSeries};
pub use trials::TrialSummary;
