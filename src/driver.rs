use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::Configuration;
use crate::parser::{ParseOutcome, parse_output};
use crate::record::BenchmarkRecord;
use crate::table::ExperimentResults;

/// Reasons a single benchmark invocation produced no usable output.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to launch {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("capture {path}: {source}")]
    Capture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("benchmark exited with {0}")]
    ExitStatus(ExitStatus),
    #[error("benchmark failed: {0}")]
    Failed(String),
}

/// Runs the benchmark for one configuration, leaving its stdout at `capture`.
#[async_trait]
pub trait BenchmarkLauncher: Send + Sync {
    async fn launch(&self, config: &Configuration, capture: &Path) -> Result<(), DriverError>;
}

/// Launches the benchmark executable as a child process and waits for it.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    binary: PathBuf,
}

impl ProcessLauncher {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Shell-style rendering of the invocation, for logs.
    pub fn command_line(&self, config: &Configuration) -> String {
        let mut line = self.binary.display().to_string();
        for arg in config.args() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

#[async_trait]
impl BenchmarkLauncher for ProcessLauncher {
    async fn launch(&self, config: &Configuration, capture: &Path) -> Result<(), DriverError> {
        let capture_err = |source| DriverError::Capture {
            path: capture.to_path_buf(),
            source,
        };
        let stdout = tokio::fs::File::create(capture)
            .await
            .map_err(capture_err)?
            .into_std()
            .await;

        info!(
            command = %self.command_line(config),
            capture = %capture.display(),
            "launching benchmark"
        );
        let status = Command::new(&self.binary)
            .args(config.args())
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .status()
            .await
            .map_err(|source| DriverError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !status.success() {
            return Err(DriverError::ExitStatus(status));
        }
        Ok(())
    }
}

/// Walks the run × configuration matrix one invocation at a time.
pub struct ExperimentDriver<L: BenchmarkLauncher> {
    launcher: L,
    output_dir: PathBuf,
}

impl<L: BenchmarkLauncher> ExperimentDriver<L> {
    pub fn new(launcher: L, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            launcher,
            output_dir: output_dir.into(),
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Capture location for one invocation: `run_<run>/<POLICY>.txt`.
    pub fn capture_path(&self, run: usize, config: &Configuration) -> PathBuf {
        self.output_dir
            .join(format!("run_{run}"))
            .join(format!("{}.txt", config.label()))
    }

    /// Runs every configuration for run 0, then every configuration for run 1,
    /// and so on. Failed invocations leave an empty record in their slot.
    pub async fn run(&self, configs: &[Configuration], runs: usize) -> ExperimentResults {
        let mut results = ExperimentResults::new(configs);
        let mut failed = 0usize;

        for run in 0..runs {
            for (idx, config) in configs.iter().enumerate() {
                let record = match self.run_one(run, config).await {
                    Ok(record) => record,
                    Err(err @ DriverError::Capture { .. }) => {
                        error!(run, policy = %config.policy, error = %err, "capture unavailable");
                        failed += 1;
                        BenchmarkRecord::default()
                    }
                    Err(err) => {
                        warn!(run, policy = %config.policy, error = %err, "benchmark run failed");
                        failed += 1;
                        BenchmarkRecord::default()
                    }
                };
                if let Some(table) = results.table_mut(idx) {
                    table.insert(run, record);
                }
            }
        }

        info!(
            runs,
            configurations = configs.len(),
            failed,
            "experiment matrix finished"
        );
        results
    }

    /// Launches, then parses one invocation's capture.
    pub async fn run_one(
        &self,
        run: usize,
        config: &Configuration,
    ) -> Result<BenchmarkRecord, DriverError> {
        let capture = self.capture_path(run, config);
        if let Some(dir) = capture.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| DriverError::Capture {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }
        if tokio::fs::try_exists(&capture).await.unwrap_or(false) {
            debug!(path = %capture.display(), "overwriting existing capture");
        }

        self.launcher.launch(config, &capture).await?;

        let bytes = tokio::fs::read(&capture)
            .await
            .map_err(|source| DriverError::Capture {
                path: capture.clone(),
                source,
            })?;

        // Benchmarks may print progress bars or other non-UTF-8 noise around the record.
        let outcome = parse_output(&String::from_utf8_lossy(&bytes));
        log_outcome(run, config, &outcome);
        Ok(outcome.into_record())
    }
}

fn log_outcome(run: usize, config: &Configuration, outcome: &ParseOutcome) {
    if !outcome.marker_found {
        debug!(run, policy = %config.policy, "no record in benchmark output");
        return;
    }
    for err in &outcome.errors {
        match err.group() {
            Some(group) => warn!(run, policy = %config.policy, %group, error = %err, "incomplete record"),
            None => warn!(run, policy = %config.policy, error = %err, "dropped field"),
        }
    }
    if outcome.is_complete() {
        debug!(run, policy = %config.policy, fields = outcome.record.len(), "parsed record");
    }
}
