use crate::error::{PipelineError, Result};
use crate::log::{LineKind, LogLine, LogRecordParser, MalformedPolicy, ParseOptions};
use crate::model::series::DepthTimeSeries;
use crate::stats;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Per-depth running totals.
pub type DepthCounts = BTreeMap<usize, u64>;

/// Everything one solver log says about its run. Times are seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    pub source: String,

    pub total_nodes: u64,
    pub total_backtracks: u64,
    pub total_prunes: u64,
    pub total_tasks: u64,

    pub nodes_by_depth: DepthCounts,
    pub backtracks_by_depth: DepthCounts,
    pub prunes_by_depth: DepthCounts,
    pub tasks_by_depth: DepthCounts,

    /// Last reported CPU time, if any.
    pub cpu_time: Option<f64>,
    /// How many CPU time lines the log carried; more than one is an anomaly.
    pub cpu_time_reports: usize,
    /// Whole-run wall clock samples ("cpu = ...").
    pub elapsed_times: Vec<f64>,

    pub depth_times: DepthTimeSeries,

    /// Malformed lines dropped under `MalformedPolicy::Skip`.
    pub skipped_lines: usize,
    /// Records deeper than `ParseOptions::max_depth`, counted at the max depth instead.
    pub folded_records: usize,
}

impl RunMetrics {
    /// CPU time when reported, else the median wall clock sample.
    pub fn reported_time(&self) -> Option<f64> {
        self.cpu_time.or_else(|| stats::median(&self.elapsed_times))
    }

    /// True if the log contributed anything the aggregator can use.
    pub fn has_data(&self) -> bool {
        self.reported_time().is_some()
            || self.total_nodes > 0
            || self.total_backtracks > 0
            || self.total_tasks > 0
            || self.total_prunes > 0
            || !self.depth_times.is_empty()
    }
}

/// Folds classified lines from one source into a `RunMetrics`.
pub struct MetricsAccumulator {
    metrics: RunMetrics,
    max_depth: Option<usize>,
}

impl MetricsAccumulator {
    pub fn new(source: impl Into<String>, opts: &ParseOptions) -> Self {
        Self {
            metrics: RunMetrics {
                source: source.into(),
                ..RunMetrics::default()
            },
            max_depth: opts.max_depth,
        }
    }

    pub fn push(&mut self, line: &LogLine) {
        log::trace!("{}:{}: {}", self.metrics.source, line.number, line.kind.tag());
        let m = &mut self.metrics;
        match line.kind {
            LineKind::CpuTime { seconds } => {
                if let Some(prev) = m.cpu_time {
                    log::warn!(
                        "{}:{}: CPU time reported again ({}s replaces {}s)",
                        m.source,
                        line.number,
                        seconds,
                        prev
                    );
                }
                m.cpu_time = Some(seconds);
                m.cpu_time_reports += 1;
            }
            LineKind::DepthTime { depth, seconds } => {
                let depth = self.clamp(depth, line.number);
                self.metrics.depth_times.push(depth, seconds);
            }
            LineKind::NodeCount { depth, count } => {
                m.total_nodes = m.total_nodes.saturating_add(count);
                self.add_at(depth, count, line.number, |m| &mut m.nodes_by_depth);
            }
            LineKind::BacktrackCount { depth, count } => {
                m.total_backtracks = m.total_backtracks.saturating_add(count);
                self.add_at(depth, count, line.number, |m| &mut m.backtracks_by_depth);
            }
            LineKind::PruneCount { depth, count } => {
                m.total_prunes = m.total_prunes.saturating_add(count);
                self.add_at(Some(depth), count, line.number, |m| &mut m.prunes_by_depth);
            }
            LineKind::TaskCount { depth, count } => {
                m.total_tasks = m.total_tasks.saturating_add(count);
                self.add_at(depth, count, line.number, |m| &mut m.tasks_by_depth);
            }
            LineKind::ElapsedTime { seconds } => m.elapsed_times.push(seconds),
            LineKind::Unrecognized => {}
        }
    }

    /// Record a malformed line that the caller chose to step over.
    pub fn skip(&mut self, err: &PipelineError) {
        log::warn!("skipping {}", err);
        self.metrics.skipped_lines += 1;
    }

    pub fn finish(self) -> RunMetrics {
        self.metrics
    }

    fn add_at(
        &mut self,
        depth: Option<usize>,
        count: u64,
        line_no: usize,
        counts: impl FnOnce(&mut RunMetrics) -> &mut DepthCounts,
    ) {
        if let Some(depth) = depth {
            let depth = self.clamp(depth, line_no);
            let total = counts(&mut self.metrics).entry(depth).or_default();
            *total = total.saturating_add(count);
        }
    }

    fn clamp(&mut self, depth: usize, line_no: usize) -> usize {
        match self.max_depth {
            Some(max) if depth > max => {
                self.metrics.folded_records += 1;
                log::warn!(
                    "{}:{}: depth {} folded into max depth {}",
                    self.metrics.source,
                    line_no,
                    depth,
                    max
                );
                max
            }
            _ => depth,
        }
    }
}

/// Drain a line sequence into one run, honouring the malformed-record policy.
pub fn accumulate<I>(lines: I, source: impl Into<String>, opts: &ParseOptions) -> Result<RunMetrics>
where
    I: IntoIterator<Item = Result<LogLine>>,
{
    let mut acc = MetricsAccumulator::new(source, opts);
    for line in lines {
        match line {
            Ok(line) => acc.push(&line),
            Err(err @ PipelineError::MalformedRecord { .. })
                if opts.on_malformed == MalformedPolicy::Skip =>
            {
                acc.skip(&err)
            }
            Err(err) => return Err(err),
        }
    }
    Ok(acc.finish())
}

/// Parse one log file into its run metrics. The file is closed before returning.
pub fn parse_run_file(path: impl AsRef<Path>, opts: &ParseOptions) -> Result<RunMetrics> {
    let parser = LogRecordParser::open(path.as_ref(), opts)?;
    let source = parser.source_name().to_string();
    accumulate(parser, source, opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn run(text: &str, opts: &ParseOptions) -> Result<RunMetrics> {
        let parser = LogRecordParser::new(text.as_bytes(), "mem.log", opts);
        accumulate(parser, "mem.log", opts)
    }

    const METRICS_LOG: &str = "\
CountNodes : true
Depth :2 Time :1000
Depth :2 Time :2000
Depth :0 Time :500
Depth :2 Time :3000
Nodes Depth 0:1
Nodes Depth 1:40
Nodes Depth 2:900
Backtracks Depth 1:1 200
Backtracks Depth 2:30
Prunes: 8
Total tasks Depth 1:4
Total tasks Depth 2:16
CPU Time (Before collecting metrics) 4500
";

    #[test]
    fn folds_a_full_metrics_log() {
        let m = run(METRICS_LOG, &ParseOptions::default()).unwrap();
        assert_eq!(m.depth_times.get(2), &[1.0, 2.0, 3.0]);
        assert_eq!(m.depth_times.get(0), &[0.5]);
        assert_eq!(m.depth_times.get(1), &[] as &[f64]);
        assert_eq!(m.total_nodes, 941);
        assert_eq!(m.nodes_by_depth.get(&2), Some(&900));
        assert_eq!(m.total_backtracks, 1230);
        assert_eq!(m.backtracks_by_depth.get(&1), Some(&1200));
        assert_eq!(m.total_prunes, 8);
        assert_eq!(m.prunes_by_depth, DepthCounts::from([(1, 8)]));
        assert_eq!(m.total_tasks, 20);
        assert_eq!(m.cpu_time, Some(4.5));
        assert_eq!(m.cpu_time_reports, 1);
        assert!(m.has_data());
    }

    #[test]
    fn samples_match_depth_time_lines() {
        let parser =
            LogRecordParser::new(METRICS_LOG.as_bytes(), "mem.log", &ParseOptions::default());
        let lines: Vec<LogLine> = parser.map(|l| l.unwrap()).collect();
        let classified = lines
            .iter()
            .filter(|l| matches!(l.kind, LineKind::DepthTime { .. }))
            .count();
        let m = accumulate(lines.into_iter().map(Ok), "mem.log", &ParseOptions::default()).unwrap();
        assert_eq!(m.depth_times.sample_count(), classified);
    }

    #[test]
    fn last_cpu_time_wins() {
        let m = run(
            "CPU Time (ms): 1000\nCPU Time (ms): 2500\n",
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(m.cpu_time, Some(2.5));
        assert_eq!(m.cpu_time_reports, 2);
    }

    #[test]
    fn elapsed_median_stands_in_for_cpu_time() {
        let m = run("cpu = 3000\ncpu = 1000\ncpu = 2000\n", &ParseOptions::default()).unwrap();
        assert_eq!(m.cpu_time, None);
        assert_eq!(m.reported_time(), Some(2.0));
    }

    #[test]
    fn deep_samples_fold_into_max_depth() {
        let opts = ParseOptions {
            max_depth: Some(2),
            ..ParseOptions::default()
        };
        let m = run("Depth :7 Time :1000\nNodes Depth 9:3\n", &opts).unwrap();
        assert_eq!(m.depth_times.max_depth(), Some(2));
        assert_eq!(m.depth_times.get(2), &[1.0]);
        assert_eq!(m.nodes_by_depth.get(&2), Some(&3));
        assert_eq!(m.folded_records, 2);
    }

    #[test]
    fn deep_depths_keep_their_own_bucket_by_default() {
        let m = run(
            "Depth :100 Time :1000\nDepth :150 Time :9000\n",
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(m.depth_times.get(100), &[1.0]);
        assert_eq!(m.depth_times.get(150), &[9.0]);
        assert_eq!(m.folded_records, 0);
    }

    #[test]
    fn duplicate_prune_summary_counts_once() {
        let m = run("Prunes: 5\nPrunes: 5\n", &ParseOptions::default()).unwrap();
        assert_eq!(m.total_prunes, 5);
        assert_eq!(m.prunes_by_depth, DepthCounts::from([(1, 5)]));
    }

    #[test]
    fn huge_counts_saturate() {
        let text = format!("Nodes Depth 1:{}\nNodes Depth 1:{}\n", u64::MAX, u64::MAX);
        let m = run(&text, &ParseOptions::default()).unwrap();
        assert_eq!(m.total_nodes, u64::MAX);
        assert_eq!(m.nodes_by_depth.get(&1), Some(&u64::MAX));
    }

    #[test]
    fn malformed_policy() {
        let text = "Nodes Depth 1:10\nNodes Depth 2:x\nNodes Depth 3:30\n";

        let err = run(text, &ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "MalformedRecord");

        let skip = ParseOptions {
            on_malformed: MalformedPolicy::Skip,
            ..ParseOptions::default()
        };
        let m = run(text, &skip).unwrap();
        assert_eq!(m.total_nodes, 40);
        assert_eq!(m.skipped_lines, 1);
    }

    #[test]
    fn parses_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", METRICS_LOG).unwrap();
        let m = parse_run_file(file.path(), &ParseOptions::default()).unwrap();
        assert_eq!(m.source, file.path().display().to_string());
        assert_eq!(m.cpu_time, Some(4.5));
    }

    #[test]
    fn empty_log_has_no_data() {
        let m = run("hello\n\n", &ParseOptions::default()).unwrap();
        assert!(!m.has_data());
        assert_eq!(m.reported_time(), None);
    }
}
