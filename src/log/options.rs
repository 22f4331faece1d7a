use serde::{Deserialize, Serialize};

/// Unit of the raw integer in depth-time records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    #[serde(alias = "millis")]
    Ms,
    #[serde(alias = "micros")]
    Us,
}

impl TimeUnit {
    pub fn divisor(self) -> f64 {
        match self {
            TimeUnit::Ms => 1000.0,
            TimeUnit::Us => 1_000_000.0,
        }
    }
}

/// What to do with a recognised line whose numeric field does not convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Stop parsing the file and surface the error.
    #[default]
    Abort,
    /// Log the line, count it in `RunMetrics::skipped_lines`, keep going.
    Skip,
}

/// Knobs that distinguish one experiment family's log dialect from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub time_unit: TimeUnit,
    /// Label that marks a depth-time record, e.g. "Depth :3 Time :1000".
    pub time_label: String,
    /// Label that marks the depth field of a depth-time record.
    pub depth_label: String,
    /// Ignore lines carrying the cumulative "CountNodes" label when counting nodes.
    pub cumulative_exclusion: bool,
    /// Depths above this are folded into the last bucket. `None` keeps every depth.
    pub max_depth: Option<usize>,
    pub on_malformed: MalformedPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::Ms,
            time_label: "Time".to_string(),
            depth_label: "Depth".to_string(),
            cumulative_exclusion: true,
            max_depth: None,
            on_malformed: MalformedPolicy::Abort,
        }
    }
}

impl ParseOptions {
    pub fn micros() -> Self {
        Self {
            time_unit: TimeUnit::Us,
            ..Self::default()
        }
    }
}
