use crate::error::{Result, checked_ratio};
use crate::model::{DepthTimeSeries, RunMetrics};
use crate::stats;
use serde::Serialize;

/// Repeated trials of one configuration, reduced to the numbers that get plotted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    pub trials: usize,
    /// Trials that reported a time.
    pub timed_trials: usize,
    pub average_nodes: f64,
    pub average_backtracks: f64,
    pub median_time: f64,
    /// Set when no trial reported a time and `median_time` is a placeholder.
    pub time_is_fallback: bool,
    /// Depth-time samples of every trial, merged.
    pub depth_times: DepthTimeSeries,
}

impl TrialSummary {
    /// `None` when `runs` is empty.
    ///
    /// Averages divide by the number of runs passed in, not by a nominal trial count.
    pub fn from_runs(runs: &[RunMetrics]) -> Option<Self> {
        if runs.is_empty() {
            return None;
        }

        let nodes: Vec<f64> = runs.iter().map(|r| r.total_nodes as f64).collect();
        let backtracks: Vec<f64> = runs.iter().map(|r| r.total_backtracks as f64).collect();

        let times: Vec<f64> = runs.iter().filter_map(RunMetrics::reported_time).collect();
        let timed_trials = times.len();
        let (median_time, time_is_fallback) = match stats::median(&times) {
            Some(t) => (t, false),
            None => {
                log::warn!(
                    "none of {} trials reported a time; median time falls back to 0",
                    runs.len()
                );
                (0.0, true)
            }
        };

        let mut depth_times = DepthTimeSeries::new();
        for run in runs {
            depth_times.extend_from(&run.depth_times);
        }

        Some(Self {
            trials: runs.len(),
            timed_trials,
            average_nodes: stats::mean(&nodes).unwrap_or(0.0),
            average_backtracks: stats::mean(&backtracks).unwrap_or(0.0),
            median_time,
            time_is_fallback,
            depth_times,
        })
    }

    pub fn node_throughput(&self) -> Result<f64> {
        checked_ratio("node throughput", self.average_nodes, self.median_time)
    }

    pub fn backtrack_throughput(&self) -> Result<f64> {
        checked_ratio("backtrack throughput", self.average_backtracks, self.median_time)
    }
}
