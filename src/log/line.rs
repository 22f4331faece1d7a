/// One classified line from a solver log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    /// 1-based line number within the source.
    pub number: usize,
    pub raw: String,
    pub kind: LineKind,
}

/// Classification tag plus the numeric payload extracted for it.
///
/// All times are already in seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    CpuTime { seconds: f64 },
    DepthTime { depth: usize, seconds: f64 },
    NodeCount { depth: Option<usize>, count: u64 },
    BacktrackCount { depth: Option<usize>, count: u64 },
    PruneCount { depth: usize, count: u64 },
    TaskCount { depth: Option<usize>, count: u64 },
    /// Whole-run wall clock as printed by the scaling harness ("cpu = 1234").
    ElapsedTime { seconds: f64 },
    Unrecognized,
}

impl LineKind {
    pub fn tag(&self) -> &'static str {
        match self {
            LineKind::CpuTime { .. } => "CpuTime",
            LineKind::DepthTime { .. } => "DepthTime",
            LineKind::NodeCount { .. } => "NodeCount",
            LineKind::BacktrackCount { .. } => "BacktrackCount",
            LineKind::PruneCount { .. } => "PruneCount",
            LineKind::TaskCount { .. } => "TaskCount",
            LineKind::ElapsedTime { .. } => "ElapsedTime",
            LineKind::Unrecognized => "Unrecognized",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, LineKind::Unrecognized)
    }
}
