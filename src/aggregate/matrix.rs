use crate::aggregate::scaling::{AggregateRow, SpeedupSeries, ThroughputSeries};
use crate::aggregate::trials::TrialSummary;
use std::collections::BTreeMap;

/// One (variant, worker-count) configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Present {
        summary: TrialSummary,
        /// Files whose runs went into `summary`.
        sources: Vec<String>,
    },
    /// No trial produced data; `reason` says why.
    Missing { reason: String },
}

impl Cell {
    pub fn summary(&self) -> Option<&TrialSummary> {
        match self {
            Cell::Present { summary, .. } => Some(summary),
            Cell::Missing { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantColumn {
    pub name: String,
    pub label: String,
    pub cells: BTreeMap<u32, Cell>,
}

/// Results indexed by (variant, worker-count). Variants keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalingMatrix {
    variants: Vec<VariantColumn>,
}

impl ScalingMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variant: &str, label: &str, workers: u32, cell: Cell) {
        let idx = match self.variants.iter().position(|v| v.name == variant) {
            Some(idx) => idx,
            None => {
                self.variants.push(VariantColumn {
                    name: variant.to_string(),
                    label: label.to_string(),
                    cells: BTreeMap::new(),
                });
                self.variants.len() - 1
            }
        };
        self.variants[idx].cells.insert(workers, cell);
    }

    pub fn get(&self, variant: &str, workers: u32) -> Option<&Cell> {
        self.variant(variant)?.cells.get(&workers)
    }

    pub fn variant(&self, variant: &str) -> Option<&VariantColumn> {
        self.variants.iter().find(|v| v.name == variant)
    }

    pub fn variants(&self) -> &[VariantColumn] {
        &self.variants
    }

    /// Rows in increasing worker order; missing cells stay `None`.
    pub fn rows(&self, variant: &str) -> Vec<(u32, Option<AggregateRow>)> {
        self.variant(variant)
            .map(|v| {
                v.cells
                    .iter()
                    .map(|(&w, cell)| (w, cell.summary().map(|s| AggregateRow::from_summary(w, s))))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn speedup(&self, variant: &str) -> SpeedupSeries {
        SpeedupSeries::from_rows(&self.rows(variant))
    }

    pub fn throughput(&self, variant: &str, cores_per_worker: Option<u32>) -> ThroughputSeries {
        ThroughputSeries::from_rows(&self.rows(variant), cores_per_worker)
    }

    /// Every (variant, workers) pair without data.
    pub fn missing_cells(&self) -> Vec<(&str, u32)> {
        self.variants
            .iter()
            .flat_map(|v| {
                v.cells
                    .iter()
                    .filter(|(_, c)| matches!(c, Cell::Missing { .. }))
                    .map(move |(&w, _)| (v.name.as_str(), w))
            })
            .collect()
    }
}
