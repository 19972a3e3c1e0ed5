use serde::Serialize;

use crate::table::ResultTable;

/// Quantile ranks reported for every field.
pub const QUANTILES: [f64; 3] = [0.25, 0.5, 0.75];

/// Statistics for one field over the runs that captured it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: String,
    pub samples: usize,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub mean: f64,
}

impl FieldSummary {
    /// Value for one of [`QUANTILES`].
    pub fn quantile(&self, q: f64) -> Option<f64> {
        QUANTILES
            .iter()
            .zip([self.p25, self.p50, self.p75])
            .find(|(rank, _)| **rank == q)
            .map(|(_, value)| value)
    }
}

/// Per-field statistics for one configuration, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub runs: usize,
    pub fields: Vec<FieldSummary>,
}

impl Summary {
    pub fn field(&self, name: &str) -> Option<&FieldSummary> {
        self.fields.iter().find(|summary| summary.field == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Linear-interpolation quantile of already sorted `values`.
///
/// Position `q * (n - 1)` is interpolated between its floor and ceiling order
/// statistics. Returns `None` for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Summarizes every field seen in `table`, using only the runs that captured it.
///
/// Fields never captured are left out; a table without any populated run gives
/// an empty summary.
pub fn summarize(table: &ResultTable) -> Summary {
    let fields = table
        .columns()
        .into_iter()
        .filter_map(|field| summarize_field(field, table.values(field)))
        .collect();

    Summary {
        runs: table.populated_runs(),
        fields,
    }
}

fn summarize_field(field: &str, mut values: Vec<f64>) -> Option<FieldSummary> {
    values.retain(|value| !value.is_nan());
    values.sort_by(f64::total_cmp);

    Some(FieldSummary {
        field: field.to_string(),
        samples: values.len(),
        p25: quantile(&values, QUANTILES[0])?,
        p50: quantile(&values, QUANTILES[1])?,
        p75: quantile(&values, QUANTILES[2])?,
        mean: mean(&values)?,
    })
}
