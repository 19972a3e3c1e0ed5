//! Core crate exports for cachebench.
//!
//! The driver runs an external cache benchmark across eviction-policy
//! configurations, the parser recovers the fixed-format record from each run's
//! output, and the aggregation and report modules turn the accumulated records
//! into per-configuration tables and summaries.

pub mod aggregate;
pub mod config;
pub mod driver;
pub mod parser;
pub mod record;
pub mod report;
pub mod schema;
pub mod table;

pub use aggregate::{FieldSummary, QUANTILES, Summary, quantile, summarize};
pub use config::{ConfigError, Configuration, Distribution, ExperimentConfig, PolicyId};
pub use driver::{BenchmarkLauncher, DriverError, ExperimentDriver, ProcessLauncher};
pub use parser::{ParseError, ParseOutcome, parse_lines, parse_output};
pub use record::BenchmarkRecord;
pub use report::{ReportError, write_reports};
pub use schema::FieldGroup;
pub use table::{ExperimentResults, ResultTable};
