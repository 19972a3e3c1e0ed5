use crate::config::Configuration;
use crate::record::BenchmarkRecord;

/// Records for one configuration, one slot per run index.
///
/// A run that failed or produced nothing occupies its slot with an empty record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    runs: Vec<BenchmarkRecord>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` at `run`, padding skipped run indices with empty records.
    pub fn insert(&mut self, run: usize, record: BenchmarkRecord) {
        if self.runs.len() <= run {
            self.runs.resize_with(run + 1, BenchmarkRecord::default);
        }
        self.runs[run] = record;
    }

    pub fn push(&mut self, record: BenchmarkRecord) {
        self.runs.push(record);
    }

    pub fn get(&self, run: usize) -> Option<&BenchmarkRecord> {
        self.runs.get(run)
    }

    pub fn runs(&self) -> &[BenchmarkRecord] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Union of field names across runs, ordered by first appearance when the
    /// runs are walked in run-index order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for record in &self.runs {
            for name in record.names() {
                if !columns.contains(&name) {
                    columns.push(name);
                }
            }
        }
        columns
    }

    /// Values of `field` from the runs that captured it, in run order.
    pub fn values(&self, field: &str) -> Vec<f64> {
        self.runs
            .iter()
            .filter_map(|record| record.get(field))
            .collect()
    }

    /// Number of runs that produced at least one field.
    pub fn populated_runs(&self) -> usize {
        self.runs.iter().filter(|record| !record.is_empty()).count()
    }
}

/// Result tables for every configuration of an experiment, in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct ExperimentResults {
    entries: Vec<(Configuration, ResultTable)>,
}

impl ExperimentResults {
    pub fn new(configs: &[Configuration]) -> Self {
        Self {
            entries: configs
                .iter()
                .map(|config| (config.clone(), ResultTable::new()))
                .collect(),
        }
    }

    /// Table for the configuration at position `index` in enumeration order.
    pub fn table_mut(&mut self, index: usize) -> Option<&mut ResultTable> {
        self.entries.get_mut(index).map(|(_, table)| table)
    }

    pub fn table(&self, label: &str) -> Option<&ResultTable> {
        self.entries
            .iter()
            .find(|(config, _)| config.label() == label)
            .map(|(_, table)| table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Configuration, &ResultTable)> {
        self.entries.iter().map(|(config, table)| (config, table))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
