//! Documents handed to the plotting layer.
//!
//! Everything here is plain serializable data; rendering is somebody else's job.

use crate::aggregate::{
    AggregateRow, BatchOutcome, Cell, Derived, FileOutcome, SpeedupSeries, ThroughputSeries,
    TrialSummary,
};
use crate::model::RunMetrics;
use crate::stats::BoxSummary;
use serde::Serialize;
use std::path::PathBuf;

/// One parsed log.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub metrics: RunMetrics,
    pub reported_time: Option<f64>,
    /// Box summary per depth of `depth_times` (null where a depth is empty).
    pub regularity: Vec<Option<BoxSummary>>,
}

impl RunReport {
    pub fn new(metrics: RunMetrics) -> Self {
        Self {
            reported_time: metrics.reported_time(),
            regularity: metrics.depth_times.regularity(),
            metrics,
        }
    }
}

/// Repeated trials of one configuration.
#[derive(Debug, Clone, Serialize)]
pub struct TrialReport {
    pub sources: Vec<String>,
    #[serde(flatten)]
    pub summary: TrialSummary,
    pub node_throughput: Derived,
    pub backtrack_throughput: Derived,
    pub regularity: Vec<Option<BoxSummary>>,
    /// Files that contributed no data, failed or empty.
    pub no_data: Vec<PathBuf>,
}

impl TrialReport {
    pub fn new(sources: Vec<String>, summary: TrialSummary, no_data: Vec<PathBuf>) -> Self {
        Self {
            sources,
            no_data,
            node_throughput: Derived::from_result(summary.node_throughput()),
            backtrack_throughput: Derived::from_result(summary.backtrack_throughput()),
            regularity: summary.depth_times.regularity(),
            summary,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowReport {
    pub workers: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<AggregateRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trials: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantReport {
    pub name: String,
    pub label: String,
    pub rows: Vec<RowReport>,
    pub speedup: SpeedupSeries,
    pub throughput: ThroughputSeries,
}

/// A whole scaling study.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores_per_worker: Option<u32>,
    pub variants: Vec<VariantReport>,
    pub files: Vec<FileOutcome>,
    /// Files that contributed no data, failed or empty.
    pub no_data: Vec<PathBuf>,
}

impl BatchReport {
    pub fn new(outcome: &BatchOutcome, cores_per_worker: Option<u32>) -> Self {
        let matrix = &outcome.matrix;
        let variants = matrix
            .variants()
            .iter()
            .map(|v| VariantReport {
                name: v.name.clone(),
                label: v.label.clone(),
                rows: v
                    .cells
                    .iter()
                    .map(|(&workers, cell)| match cell {
                        Cell::Present { summary, .. } => RowReport {
                            workers,
                            row: Some(AggregateRow::from_summary(workers, summary)),
                            trials: Some(summary.trials),
                            missing: None,
                        },
                        Cell::Missing { reason } => RowReport {
                            workers,
                            row: None,
                            trials: None,
                            missing: Some(reason.clone()),
                        },
                    })
                    .collect(),
                speedup: matrix.speedup(&v.name),
                throughput: matrix.throughput(&v.name, cores_per_worker),
            })
            .collect();

        Self {
            cores_per_worker,
            variants,
            files: outcome.files.clone(),
            no_data: outcome.files_without_data().map(|f| f.path.clone()).collect(),
        }
    }
}

pub fn render_json<T: Serialize>(doc: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ScalingMatrix;
    use crate::aggregate::FileStatus;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    #[test]
    fn run_report_flattens_metrics() {
        let mut m = RunMetrics {
            source: "a.log".into(),
            cpu_time: Some(2.0),
            ..RunMetrics::default()
        };
        m.depth_times.push(1, 1.0);
        let v: Value = serde_json::from_str(&render_json(&RunReport::new(m)).unwrap()).unwrap();
        assert_eq!(v["source"], json!("a.log"));
        assert_eq!(v["reported_time"], json!(2.0));
        assert_eq!(v["depth_times"], json!([[], [1.0]]));
        assert_eq!(v["regularity"][0], Value::Null);
        assert_eq!(v["regularity"][1]["median"], json!(1.0));
    }

    #[test]
    fn trial_report_marks_zero_time() {
        let summary = TrialSummary::from_runs(&[RunMetrics::default()]).unwrap();
        let r = TrialReport::new(vec!["x".into()], summary, vec!["y".into()]);
        assert_eq!(r.node_throughput, Derived::DivisionByZero);
        let v: Value = serde_json::from_str(&render_json(&r).unwrap()).unwrap();
        assert_eq!(v["no_data"], json!(["y"]));
    }

    #[test]
    fn batch_report_lists_missing_rows_and_files() {
        let run = RunMetrics {
            total_nodes: 50,
            cpu_time: Some(5.0),
            ..RunMetrics::default()
        };
        let mut matrix = ScalingMatrix::new();
        matrix.insert(
            "Depth",
            "Depthbounded d = 2",
            1,
            Cell::Present {
                summary: TrialSummary::from_runs(&[run]).unwrap(),
                sources: vec!["d_1.txt".into()],
            },
        );
        matrix.insert(
            "Depth",
            "Depthbounded d = 2",
            2,
            Cell::Missing {
                reason: "gone".into(),
            },
        );
        let outcome = BatchOutcome {
            matrix,
            files: vec![FileOutcome {
                path: "d_2.txt".into(),
                variant: "Depth".into(),
                workers: 2,
                status: FileStatus::NoData,
            }],
        };

        let report = BatchReport::new(&outcome, Some(16));
        let v = &report.variants[0];
        assert_eq!(v.rows[0].row.unwrap().median_time, 5.0);
        assert_eq!(v.rows[1].missing.as_deref(), Some("gone"));
        assert_eq!(v.throughput.nodes_per_second[0], Derived::Value(10.0));
        assert_eq!(report.no_data, vec![PathBuf::from("d_2.txt")]);

        let json: Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
        assert_eq!(json["files"][0]["status"], json!("no_data"));
        assert_eq!(json["variants"][0]["speedup"]["speedup"][1]["status"], json!("absent"));
    }
}
