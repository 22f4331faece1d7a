use crate::stats::BoxSummary;
use serde::Serialize;

/// Elapsed-time samples (seconds) per search depth.
///
/// Depths are contiguous from 0 to the deepest depth seen; a depth that never
/// received a sample holds an empty sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DepthTimeSeries {
    buckets: Vec<Vec<f64>>,
}

impl DepthTimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, depth: usize, seconds: f64) {
        if depth >= self.buckets.len() {
            self.buckets.resize_with(depth + 1, Vec::new);
        }
        self.buckets[depth].push(seconds);
    }

    /// Append every sample of `other`, depth by depth.
    pub fn extend_from(&mut self, other: &DepthTimeSeries) {
        if other.buckets.len() > self.buckets.len() {
            self.buckets.resize_with(other.buckets.len(), Vec::new);
        }
        for (mine, theirs) in self.buckets.iter_mut().zip(&other.buckets) {
            mine.extend_from_slice(theirs);
        }
    }

    /// Samples at `depth`; empty for depths past the end.
    pub fn get(&self, depth: usize) -> &[f64] {
        self.buckets.get(depth).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.buckets.len().checked_sub(1)
    }

    /// Number of depth keys, 0 through `max_depth`.
    pub fn depths(&self) -> usize {
        self.buckets.len()
    }

    pub fn sample_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f64])> {
        self.buckets.iter().enumerate().map(|(d, v)| (d, v.as_slice()))
    }

    /// Box summary per depth; `None` where a depth has no samples.
    pub fn regularity(&self) -> Vec<Option<BoxSummary>> {
        self.buckets
            .iter()
            .map(|samples| BoxSummary::from_samples(samples))
            .collect()
    }
}
