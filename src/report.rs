use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::aggregate::{QUANTILES, Summary, summarize};
use crate::config::Configuration;
use crate::record::BenchmarkRecord;
use crate::table::{ExperimentResults, ResultTable};

/// Line written between configuration sections of the text report.
pub const SECTION_DELIMITER: &str = "==========================================";

const REPORT_FILE: &str = "results.txt";
const JSON_FILE: &str = "summary.json";

/// Failure to write one report artifact.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write csv {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to serialize {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ReportError {
    pub fn path(&self) -> &Path {
        match self {
            ReportError::Io { path, .. }
            | ReportError::Csv { path, .. }
            | ReportError::Json { path, .. } => path,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Serialize)]
struct ConfigurationReport<'a> {
    policy: &'a str,
    configuration: &'a Configuration,
    summary: &'a Summary,
    runs: &'a [BenchmarkRecord],
}

/// Writes `table` as CSV: one row per run, one column per field in first-seen
/// order, empty cells where a run lacks a field.
pub fn write_table_csv(path: &Path, table: &ResultTable) -> Result<(), ReportError> {
    let columns = table.columns();
    if columns.is_empty() {
        File::create(path).map_err(|source| ReportError::io(path, source))?;
        return Ok(());
    }

    let csv_err = |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(&columns).map_err(csv_err)?;
    for record in table.runs() {
        let row = columns.iter().map(|column| {
            record
                .get(column)
                .map(|value| value.to_string())
                .unwrap_or_default()
        });
        writer.write_record(row).map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|source| ReportError::io(path, source))?;
    Ok(())
}

/// Text section for one configuration: quantile block followed by mean block.
pub fn render_section(label: &str, summary: &Summary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Cache type: {label}\n\n"));

    out.push_str("Quantiles:\n");
    if summary.is_empty() {
        out.push_str("(no data)\n");
    } else {
        let header: Vec<String> = std::iter::once("quantile".to_string())
            .chain(summary.fields.iter().map(|field| field.field.clone()))
            .collect();
        let rows: Vec<Vec<String>> = QUANTILES
            .iter()
            .map(|&q| {
                std::iter::once(format!("{q:.2}"))
                    .chain(summary.fields.iter().map(|field| {
                        field
                            .quantile(q)
                            .map(|value| format!("{value:.5}"))
                            .unwrap_or_default()
                    }))
                    .collect()
            })
            .collect();
        out.push_str(&align_columns(&header, &rows));
    }

    out.push_str("\nMeans:\n");
    if summary.is_empty() {
        out.push_str("(no data)\n");
    } else {
        let width = summary
            .fields
            .iter()
            .map(|field| field.field.len())
            .max()
            .unwrap_or(0);
        for field in &summary.fields {
            out.push_str(&format!("{:<width$}    {:.5}\n", field.field, field.mean));
        }
    }
    out.push_str(&format!("{SECTION_DELIMITER}\n\n"));
    out
}

/// Right-aligns every column to its widest cell.
fn align_columns(header: &[String], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            rows.iter()
                .filter_map(|row| row.get(idx))
                .map(String::len)
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for line in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        let cells: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:>width$}"))
            .collect();
        out.push_str(&cells.join("  "));
        out.push('\n');
    }
    out
}

/// Combined text report for every configuration, in enumeration order.
pub fn render_report(sections: &[(&str, Summary)]) -> String {
    sections
        .iter()
        .map(|(label, summary)| render_section(label, summary))
        .collect()
}

/// Writes every artifact for `results` under `dir`.
///
/// Each artifact is attempted independently; the failures are logged and
/// returned so the caller can report them.
pub fn write_reports(dir: &Path, results: &ExperimentResults) -> Vec<ReportError> {
    let mut failures = Vec::new();
    if let Err(source) = fs::create_dir_all(dir) {
        let err = ReportError::io(dir, source);
        error!(error = %err, "cannot create summaries directory");
        failures.push(err);
        return failures;
    }

    let summaries: Vec<(&Configuration, &ResultTable, Summary)> = results
        .iter()
        .map(|(config, table)| (config, table, summarize(table)))
        .collect();

    for (config, table, _) in &summaries {
        let path = dir.join(format!("{}.csv", config.label()));
        match write_table_csv(&path, table) {
            Ok(()) => info!(path = %path.display(), "wrote result table"),
            Err(err) => {
                error!(policy = %config.policy, error = %err, "failed to write result table");
                failures.push(err);
            }
        }
    }

    let sections: Vec<(&str, Summary)> = summaries
        .iter()
        .map(|(config, _, summary)| (config.label(), summary.clone()))
        .collect();
    let report_path = dir.join(REPORT_FILE);
    if let Err(err) = write_text(&report_path, &render_report(&sections)) {
        error!(error = %err, "failed to write summary report");
        failures.push(err);
    } else {
        info!(path = %report_path.display(), "wrote summary report");
    }

    let reports: Vec<ConfigurationReport<'_>> = summaries
        .iter()
        .map(|(config, table, summary)| ConfigurationReport {
            policy: config.label(),
            configuration: config,
            summary,
            runs: table.runs(),
        })
        .collect();
    if let Err(err) = write_json(&dir.join(JSON_FILE), &reports) {
        error!(error = %err, "failed to write json summary");
        failures.push(err);
    }

    failures
}

fn write_text(path: &Path, contents: &str) -> Result<(), ReportError> {
    let mut file = File::create(path).map_err(|source| ReportError::io(path, source))?;
    file.write_all(contents.as_bytes())
        .map_err(|source| ReportError::io(path, source))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|source| ReportError::io(path, source))?;
    serde_json::to_writer_pretty(file, value).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })
}
