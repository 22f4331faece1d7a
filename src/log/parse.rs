use crate::error::{PipelineError, Result};
use crate::log::line::{LineKind, LogLine};
use crate::log::options::ParseOptions;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const CPU_TIME_LABEL: &str = "CPU Time";
const NODES_LABEL: &str = "Nodes";
const CUMULATIVE_NODES_LABEL: &str = "CountNodes";
const BACKTRACKS_LABEL: &str = "Backtracks";
const PRUNES_LABEL: &str = "Prunes";
const TASKS_LABEL: &str = "Total tasks";

// "cpu = 1234" from the scaling harness.
static ELAPSED_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^cpu\s*=\s*(\S+)$").ok());

// Depth is the last space-delimited token of the label: "Nodes Depth 3".
static LABEL_DEPTH_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(\d+)$").ok());

/// Lazy, single-pass classifier over the lines of one solver log.
///
/// Yields one `LogLine` per input line (unrecognized lines included). A line that
/// carries a known marker but whose number does not convert yields
/// `PipelineError::MalformedRecord`; iteration can continue past it.
pub struct LogRecordParser<R> {
    source_name: String,
    path: PathBuf,
    lines: Lines<R>,
    line_no: usize,
    classifier: LineClassifier,
}

impl LogRecordParser<BufReader<File>> {
    /// Open a log file. The handle lives as long as the parser.
    pub fn open(path: impl AsRef<Path>, opts: &ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PipelineError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("parsing {}", path.display());
        Ok(LogRecordParser::new(
            BufReader::new(file),
            path.display().to_string(),
            opts,
        ))
    }
}

impl<R: BufRead> LogRecordParser<R> {
    pub fn new(reader: R, source_name: impl Into<String>, opts: &ParseOptions) -> Self {
        let source_name = source_name.into();
        Self {
            path: PathBuf::from(&source_name),
            source_name,
            lines: reader.lines(),
            line_no: 0,
            classifier: LineClassifier::new(opts),
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

impl<R: BufRead> Iterator for LogRecordParser<R> {
    type Item = Result<LogLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = match self.lines.next()? {
            Ok(raw) => raw,
            Err(source) => {
                return Some(Err(PipelineError::SourceUnavailable {
                    path: self.path.clone(),
                    source,
                }));
            }
        };
        self.line_no += 1;

        Some(match self.classifier.classify(raw.trim()) {
            Ok(kind) => Ok(LogLine {
                number: self.line_no,
                raw,
                kind,
            }),
            Err(reason) => Err(PipelineError::MalformedRecord {
                source_name: self.source_name.clone(),
                line: self.line_no,
                text: raw,
                reason,
            }),
        })
    }
}

/// Per-source classification state. The prune cursor is the only thing carried
/// between lines.
struct LineClassifier {
    divisor: f64,
    time_label: String,
    depth_label: String,
    cumulative_exclusion: bool,
    prune_cursor: Option<usize>,
}

impl LineClassifier {
    fn new(opts: &ParseOptions) -> Self {
        Self {
            divisor: opts.time_unit.divisor(),
            time_label: opts.time_label.clone(),
            depth_label: opts.depth_label.clone(),
            cumulative_exclusion: opts.cumulative_exclusion,
            prune_cursor: None,
        }
    }

    /// First match wins. `Err` carries the reason a recognised line was rejected.
    fn classify(&mut self, line: &str) -> Result<LineKind, String> {
        if line.contains(CPU_TIME_LABEL) {
            let ms = parse_count(trailing_value(line))?;
            return Ok(LineKind::CpuTime {
                seconds: ms as f64 / 1000.0,
            });
        }

        if line.contains(&self.depth_label) && line.contains(&self.time_label) {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() >= 3 {
                let depth_token = fields[1].split_whitespace().next().unwrap_or("");
                let depth = depth_token
                    .parse::<usize>()
                    .map_err(|_| format!("bad depth {:?}", depth_token))?;
                let raw = parse_count(fields[fields.len() - 1])?;
                return Ok(LineKind::DepthTime {
                    depth,
                    seconds: raw as f64 / self.divisor,
                });
            }
        }

        if line.contains(NODES_LABEL)
            && !(self.cumulative_exclusion && line.contains(CUMULATIVE_NODES_LABEL))
        {
            let (label, value) = split_label(line)?;
            return Ok(LineKind::NodeCount {
                depth: self.label_depth(label),
                count: parse_count(value)?,
            });
        }

        if line.contains(BACKTRACKS_LABEL) {
            let (label, value) = split_label(line)?;
            let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
            return Ok(LineKind::BacktrackCount {
                depth: self.label_depth(label),
                count: parse_count(&digits)?,
            });
        }

        if line.contains(PRUNES_LABEL) {
            let (label, value) = split_label(line)?;
            let count = parse_count(value)?;
            let depth = match self.label_depth(label) {
                Some(depth) => depth,
                // Solvers repeat the summary line; only the first one counts.
                None if self.prune_cursor.is_some() => {
                    log::debug!("repeated prune summary ignored: {:?}", line);
                    return Ok(LineKind::Unrecognized);
                }
                None => *self.prune_cursor.insert(1),
            };
            return Ok(LineKind::PruneCount { depth, count });
        }

        if line.contains(TASKS_LABEL) {
            let (label, value) = split_label(line)?;
            return Ok(LineKind::TaskCount {
                depth: self.label_depth(label),
                count: parse_count(value)?,
            });
        }

        if let Some(caps) = ELAPSED_RE.as_ref().and_then(|re| re.captures(line)) {
            let ms = parse_count(&caps[1])?;
            return Ok(LineKind::ElapsedTime {
                seconds: ms as f64 / 1000.0,
            });
        }

        Ok(LineKind::Unrecognized)
    }

    fn label_depth(&self, label: &str) -> Option<usize> {
        LABEL_DEPTH_RE
            .as_ref()?
            .captures(label.trim_end())
            .and_then(|caps| caps[1].parse().ok())
    }
}

/// The numeric payload: text after the last ':' if there is one, else the last
/// whitespace token.
fn trailing_value(line: &str) -> &str {
    match line.rsplit_once(':') {
        Some((_, value)) => value,
        None => line.split_whitespace().last().unwrap_or(""),
    }
}

/// Split "Label Depth 3:1234" into the label field and the last field.
fn split_label(line: &str) -> Result<(&str, &str), String> {
    let (label, _) = line
        .split_once(':')
        .ok_or_else(|| "missing ':' separator".to_string())?;
    Ok((label, trailing_value(line)))
}

fn parse_count(field: &str) -> Result<u64, String> {
    let field = field.trim();
    field
        .parse::<u64>()
        .map_err(|e| format!("cannot convert {:?} to an integer ({})", field, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::options::{ParseOptions, TimeUnit};
    use pretty_assertions::assert_eq;

    fn kinds(text: &str, opts: &ParseOptions) -> Vec<LineKind> {
        LogRecordParser::new(text.as_bytes(), "test.log", opts)
            .map(|line| line.unwrap().kind)
            .collect()
    }

    fn one(line: &str) -> LineKind {
        kinds(line, &ParseOptions::default()).remove(0)
    }

    #[test]
    fn cpu_time_is_milliseconds() {
        assert_eq!(one("CPU Time (ms): 4500"), LineKind::CpuTime { seconds: 4.5 });
        assert_eq!(
            one("CPU Time (Before collecting metrics) 1234"),
            LineKind::CpuTime { seconds: 1.234 }
        );
    }

    #[test]
    fn cpu_time_is_exact_division() {
        for ms in [0u64, 1, 7, 999, 1001, 123_456_789] {
            let kind = one(&format!("CPU Time (ms): {ms}"));
            assert_eq!(
                kind,
                LineKind::CpuTime {
                    seconds: ms as f64 / 1000.0
                }
            );
        }
    }

    #[test]
    fn depth_time_uses_configured_unit() {
        assert_eq!(
            one("Depth :3 Time :1500"),
            LineKind::DepthTime {
                depth: 3,
                seconds: 1.5
            }
        );

        let us = ParseOptions {
            time_unit: TimeUnit::Us,
            ..ParseOptions::default()
        };
        assert_eq!(
            kinds("Depth :12 Time :2500000", &us),
            vec![LineKind::DepthTime {
                depth: 12,
                seconds: 2.5
            }]
        );
    }

    #[test]
    fn depth_time_needs_three_fields() {
        // Two fields only: not a depth-time record, and nothing else matches.
        assert_eq!(one("Depth Time: 12"), LineKind::Unrecognized);
    }

    #[test]
    fn node_counts_carry_label_depth() {
        assert_eq!(
            one("Nodes Depth 4:77"),
            LineKind::NodeCount {
                depth: Some(4),
                count: 77
            }
        );
        assert_eq!(
            one("Nodes Depth 12:5"),
            LineKind::NodeCount {
                depth: Some(12),
                count: 5
            }
        );
    }

    #[test]
    fn cumulative_node_label_is_excluded() {
        assert_eq!(one("CountNodes : true"), LineKind::Unrecognized);

        let keep = ParseOptions {
            cumulative_exclusion: false,
            ..ParseOptions::default()
        };
        let mut parser = LogRecordParser::new("CountNodes : true".as_bytes(), "x", &keep);
        assert!(matches!(
            parser.next(),
            Some(Err(PipelineError::MalformedRecord { line: 1, .. }))
        ));
    }

    #[test]
    fn backtracks_strip_thousands_separators() {
        assert_eq!(
            one("Backtracks: 1 234 567"),
            LineKind::BacktrackCount {
                depth: None,
                count: 1_234_567
            }
        );
        assert_eq!(
            one("Backtracks Depth 2:10 000"),
            LineKind::BacktrackCount {
                depth: Some(2),
                count: 10_000
            }
        );
    }

    #[test]
    fn only_first_prune_summary_counts() {
        let text = "Prunes: 5\nPrunes: 7\nPrunes Depth 4:1\n";
        assert_eq!(
            kinds(text, &ParseOptions::default()),
            vec![
                LineKind::PruneCount { depth: 1, count: 5 },
                LineKind::Unrecognized,
                LineKind::PruneCount { depth: 4, count: 1 },
            ]
        );
    }

    #[test]
    fn repeated_prune_summary_is_ignored() {
        assert_eq!(
            kinds("Prunes: 5\nPrunes: 5\n", &ParseOptions::default()),
            vec![
                LineKind::PruneCount { depth: 1, count: 5 },
                LineKind::Unrecognized,
            ]
        );
    }

    #[test]
    fn tasks_and_elapsed() {
        assert_eq!(
            one("Total tasks Depth 2:40"),
            LineKind::TaskCount {
                depth: Some(2),
                count: 40
            }
        );
        assert_eq!(one("cpu = 2500"), LineKind::ElapsedTime { seconds: 2.5 });
    }

    #[test]
    fn everything_else_is_unrecognized() {
        let text = "\nCountNodes : false\nMaxClique size = 21\nOrdered Skeleton Spawned 4 Tasks\n";
        let got = kinds(text, &ParseOptions::default());
        assert_eq!(got.len(), 4);
        assert!(got.iter().all(|k| !k.is_recognized()));
    }

    #[test]
    fn malformed_record_reports_line_and_text() {
        let text = "Nodes Depth 1:10\nNodes Depth 2:ten\nNodes Depth 3:30\n";
        let results: Vec<_> =
            LogRecordParser::new(text.as_bytes(), "run.log", &ParseOptions::default()).collect();
        assert_eq!(results.len(), 3);
        match &results[1] {
            Err(PipelineError::MalformedRecord {
                source_name,
                line,
                text,
                ..
            }) => {
                assert_eq!(source_name, "run.log");
                assert_eq!(*line, 2);
                assert_eq!(text, "Nodes Depth 2:ten");
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
        assert!(results[2].is_ok());
    }

    #[test]
    fn count_line_without_separator_is_malformed() {
        let mut parser =
            LogRecordParser::new("Backtracks 12".as_bytes(), "x", &ParseOptions::default());
        assert!(matches!(
            parser.next(),
            Some(Err(PipelineError::MalformedRecord { .. }))
        ));
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        match LogRecordParser::open(&missing, &ParseOptions::default()) {
            Err(PipelineError::SourceUnavailable { path, .. }) => assert_eq!(path, missing),
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("opened a missing file"),
        }
    }
}
