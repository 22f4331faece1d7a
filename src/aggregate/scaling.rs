//! Derived series over a worker-count sweep.

use crate::aggregate::trials::TrialSummary;
use crate::error::{PipelineError, Result, checked_ratio};
use serde::Serialize;

/// One point of a scaling study.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateRow {
    pub workers: u32,
    pub median_time: f64,
    pub nodes: f64,
    pub backtracks: f64,
}

impl AggregateRow {
    pub fn from_summary(workers: u32, summary: &TrialSummary) -> Self {
        Self {
            workers,
            median_time: summary.median_time,
            nodes: summary.average_nodes,
            backtracks: summary.average_backtracks,
        }
    }

    pub fn node_throughput(&self) -> Result<f64> {
        checked_ratio("node throughput", self.nodes, self.median_time)
    }

    pub fn backtrack_throughput(&self) -> Result<f64> {
        checked_ratio("backtrack throughput", self.backtracks, self.median_time)
    }
}

/// A derived value that may be missing or undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Derived {
    Value(f64),
    /// The underlying cell has no data.
    Absent,
    DivisionByZero,
}

impl Derived {
    pub fn from_result(r: Result<f64>) -> Self {
        match r {
            Ok(v) => Derived::Value(v),
            Err(PipelineError::DivisionByZero { .. }) => Derived::DivisionByZero,
            Err(e) => {
                log::debug!("derived value unavailable: {}", e);
                Derived::Absent
            }
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Derived::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// A worker-count sweep; `None` where the configuration produced no data.
/// Rows are ordered by increasing worker count.
pub type Sweep = [(u32, Option<AggregateRow>)];

/// Baseline time over each row's time. The baseline is the first row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedupSeries {
    pub workers: Vec<u32>,
    pub speedup: Vec<Derived>,
    /// Linear scaling relative to the baseline worker count.
    pub ideal: Vec<f64>,
}

impl SpeedupSeries {
    pub fn from_rows(rows: &Sweep) -> Self {
        let baseline = rows.first().and_then(|(_, row)| row.as_ref());
        let base_workers = rows.first().map(|(w, _)| *w).unwrap_or(1).max(1);

        let speedup = rows
            .iter()
            .map(|(_, row)| match (baseline, row) {
                (Some(base), Some(row)) => Derived::from_result(checked_ratio(
                    "speedup",
                    base.median_time,
                    row.median_time,
                )),
                _ => Derived::Absent,
            })
            .collect();

        Self {
            workers: rows.iter().map(|(w, _)| *w).collect(),
            speedup,
            ideal: rows
                .iter()
                .map(|(w, _)| *w as f64 / base_workers as f64)
                .collect(),
        }
    }
}

/// Per-row throughput; the per-core variants need a cores-per-worker figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThroughputSeries {
    pub workers: Vec<u32>,
    pub nodes_per_second: Vec<Derived>,
    pub backtracks_per_second: Vec<Derived>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes_per_second_per_core: Option<Vec<Derived>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtracks_per_second_per_core: Option<Vec<Derived>>,
}

impl ThroughputSeries {
    pub fn from_rows(rows: &Sweep, cores_per_worker: Option<u32>) -> Self {
        let per_row = |f: fn(&AggregateRow) -> Result<f64>| -> Vec<Derived> {
            rows.iter()
                .map(|(_, row)| match row {
                    Some(row) => Derived::from_result(f(row)),
                    None => Derived::Absent,
                })
                .collect()
        };
        let nodes_per_second = per_row(AggregateRow::node_throughput);
        let backtracks_per_second = per_row(AggregateRow::backtrack_throughput);

        let per_core = |series: &[Derived]| -> Option<Vec<Derived>> {
            let cpw = cores_per_worker?;
            Some(
                rows.iter()
                    .zip(series)
                    .map(|((workers, _), d)| match d {
                        Derived::Value(v) => Derived::from_result(checked_ratio(
                            "per-core throughput",
                            *v,
                            (*workers as f64) * cpw as f64,
                        )),
                        other => *other,
                    })
                    .collect(),
            )
        };

        Self {
            workers: rows.iter().map(|(w, _)| *w).collect(),
            nodes_per_second_per_core: per_core(&nodes_per_second),
            backtracks_per_second_per_core: per_core(&backtracks_per_second),
            nodes_per_second,
            backtracks_per_second,
        }
    }
}
