use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cachebench::{
    Distribution, ExperimentConfig, ExperimentDriver, PolicyId, ProcessLauncher, write_reports,
};

#[derive(Parser, Debug)]
#[command(name = "cachebench", about = "Testing harness for FrozenHot cache policies")]
struct Args {
    /// Number of runs for the experiment.
    #[arg(short = 'r', long)]
    num_runs: usize,

    /// Name of the experiment (defaults to the current local time).
    #[arg(short = 'n', long)]
    experiment_name: Option<String>,

    /// Directory that holds one sub-directory per experiment.
    #[arg(long, default_value = "benchmarks")]
    output_root: PathBuf,

    /// Optional TOML file with experiment parameters; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Benchmark executable to invoke.
    #[arg(long)]
    binary: Option<PathBuf>,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    shards: Option<usize>,

    /// Total requests issued per invocation.
    #[arg(long)]
    requests: Option<u64>,

    /// Cache capacity as a fraction of the request count.
    #[arg(long)]
    cache_ratio: Option<f64>,

    /// Explicit cache capacity; takes precedence over `--cache-ratio`.
    #[arg(long)]
    cache_size: Option<u64>,

    #[arg(long)]
    distribution: Option<String>,

    #[arg(long)]
    distribution_param: Option<f64>,

    /// Injected per-request latency.
    #[arg(long)]
    latency: Option<u64>,

    /// Rebuild frequency for the accelerated policies.
    #[arg(long)]
    frequency: Option<u64>,

    /// Comma-separated policy list, e.g. `LRU,LRU_FH`.
    #[arg(long, value_delimiter = ',')]
    policies: Option<Vec<PolicyId>>,
}

impl Args {
    fn experiment_config(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => ExperimentConfig::default(),
        };

        config.runs = self.num_runs;
        if let Some(binary) = &self.binary {
            config.binary = binary.clone();
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(shards) = self.shards {
            config.shards = shards;
        }
        if let Some(requests) = self.requests {
            config.requests = requests;
        }
        if let Some(ratio) = self.cache_ratio {
            config.cache_ratio = ratio;
        }
        if self.cache_size.is_some() {
            config.cache_size = self.cache_size;
        }
        if self.distribution.is_some() || self.distribution_param.is_some() {
            config.distribution = Distribution {
                name: self
                    .distribution
                    .clone()
                    .unwrap_or_else(|| config.distribution.name.clone()),
                param: self
                    .distribution_param
                    .unwrap_or(config.distribution.param),
            };
        }
        if let Some(latency) = self.latency {
            config.latency = latency;
        }
        if let Some(frequency) = self.frequency {
            config.frequency = frequency;
        }
        if let Some(policies) = &self.policies {
            config.policies = policies.clone();
        }

        config.validate().context("invalid experiment configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let args = Args::parse();
    let config = args.experiment_config()?;

    let name = args
        .experiment_name
        .clone()
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d_%H:%M:%S").to_string());
    let output_dir = args.output_root.join(&name);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("create experiment directory {}", output_dir.display()))?;

    info!(experiment = %name, runs = config.runs, "starting experiment");
    let configurations = config.configurations();
    let driver = ExperimentDriver::new(ProcessLauncher::new(&config.binary), &output_dir);
    let results = driver.run(&configurations, config.runs).await;

    let failures = write_reports(&output_dir.join("summaries"), &results);
    for failure in &failures {
        warn!(path = %failure.path().display(), "artifact not written");
    }

    println!("Done!");
    Ok(())
}

fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "cachebench",
            "-r",
            "4",
            "--requests",
            "2000",
            "--distribution-param",
            "1.2",
            "--policies",
            "lru,LRU_FH",
        ])
        .unwrap();
        let config = args.experiment_config().unwrap();

        assert_eq!(config.runs, 4);
        assert_eq!(config.cache_size(), 1000);
        assert_eq!(config.distribution, Distribution::zipf(1.2));
        assert_eq!(config.policies, vec![PolicyId::Lru, PolicyId::LruFh]);
    }

    #[test]
    fn repeated_policy_is_rejected() {
        let args =
            Args::try_parse_from(["cachebench", "-r", "1", "--policies", "LRU,lru"]).unwrap();
        assert!(args.experiment_config().is_err());
    }

    #[test]
    fn zero_runs_is_rejected() {
        let args = Args::try_parse_from(["cachebench", "--num-runs", "0"]).unwrap();
        assert!(args.experiment_config().is_err());
    }
}
