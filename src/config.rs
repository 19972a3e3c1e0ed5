use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while assembling or validating an experiment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown cache policy `{0}`")]
    UnknownPolicy(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Eviction-policy variants understood by the benchmark binary.
///
/// The `*Fh` ("frozen hot") variants periodically rebuild an accelerated
/// lookup structure for the hot set; the plain variants have no rebuild phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyId {
    #[serde(rename = "FIFO")]
    Fifo,
    #[serde(rename = "LRU")]
    Lru,
    #[serde(rename = "LFU")]
    Lfu,
    #[serde(rename = "FIFO_FH")]
    FifoFh,
    #[serde(rename = "LRU_FH")]
    LruFh,
    #[serde(rename = "LFU_FH")]
    LfuFh,
}

impl PolicyId {
    /// Default enumeration order: accelerated variants first, then plain ones.
    pub const ALL: [PolicyId; 6] = [
        PolicyId::FifoFh,
        PolicyId::LfuFh,
        PolicyId::LruFh,
        PolicyId::Fifo,
        PolicyId::Lfu,
        PolicyId::Lru,
    ];

    /// Identifier passed on the benchmark command line and used in artifact names.
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyId::Fifo => "FIFO",
            PolicyId::Lru => "LRU",
            PolicyId::Lfu => "LFU",
            PolicyId::FifoFh => "FIFO_FH",
            PolicyId::LruFh => "LRU_FH",
            PolicyId::LfuFh => "LFU_FH",
        }
    }

    pub fn is_rebuilding(self) -> bool {
        matches!(self, PolicyId::FifoFh | PolicyId::LruFh | PolicyId::LfuFh)
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PolicyId::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownPolicy(wanted.to_string()))
    }
}

/// Workload key distribution handed to the benchmark binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub name: String,
    pub param: f64,
}

impl Distribution {
    pub fn zipf(param: f64) -> Self {
        Self {
            name: "Zipf".into(),
            param,
        }
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Self::zipf(0.99)
    }
}

/// Immutable parameter set for one benchmark invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub threads: usize,
    pub cache_size: u64,
    pub requests: u64,
    pub shards: usize,
    pub distribution: Distribution,
    pub policy: PolicyId,
    pub latency: u64,
    frequency: u64,
}

impl Configuration {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        threads: usize,
        cache_size: u64,
        requests: u64,
        shards: usize,
        distribution: Distribution,
        policy: PolicyId,
        latency: u64,
        frequency: u64,
    ) -> Self {
        Self {
            threads,
            cache_size,
            requests,
            shards,
            distribution,
            policy,
            latency,
            frequency,
        }
    }

    /// Rebuild frequency passed to the binary; zero for policies without a rebuild phase.
    pub fn rebuild_frequency(&self) -> u64 {
        if self.policy.is_rebuilding() {
            self.frequency
        } else {
            0
        }
    }

    /// Positional arguments in the order the benchmark binary expects them.
    pub fn args(&self) -> Vec<String> {
        vec![
            self.threads.to_string(),
            self.cache_size.to_string(),
            self.requests.to_string(),
            self.shards.to_string(),
            self.distribution.name.clone(),
            self.distribution.param.to_string(),
            self.policy.as_str().to_string(),
            self.latency.to_string(),
            self.rebuild_frequency().to_string(),
        ]
    }

    /// Label used for report sections and artifact file names.
    pub fn label(&self) -> &'static str {
        self.policy.as_str()
    }
}

/// Startup parameters for a whole experiment.
///
/// Values default to the settings the harness has historically used and can be
/// overridden from a TOML file or the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Path to the benchmark executable.
    pub binary: PathBuf,
    pub runs: usize,
    pub threads: usize,
    pub shards: usize,
    pub requests: u64,
    /// Cache capacity as a fraction of `requests`, used when `cache_size` is unset.
    pub cache_ratio: f64,
    pub cache_size: Option<u64>,
    pub distribution: Distribution,
    /// Injected per-request latency.
    pub latency: u64,
    /// Rebuild frequency for the accelerated policy variants.
    pub frequency: u64,
    pub policies: Vec<PolicyId>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("./build/test_trace"),
            runs: 1,
            threads: 1,
            shards: 16,
            requests: 25_000_000,
            cache_ratio: 0.5,
            cache_size: None,
            distribution: Distribution::default(),
            latency: 5,
            frequency: 20,
            policies: PolicyId::ALL.to_vec(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn cache_size(&self) -> u64 {
        self.cache_size
            .unwrap_or_else(|| (self.requests as f64 * self.cache_ratio) as u64)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runs == 0 {
            return Err(ConfigError::Invalid("runs must be greater than zero".into()));
        }
        if self.threads == 0 {
            return Err(ConfigError::Invalid(
                "threads must be greater than zero".into(),
            ));
        }
        if self.shards == 0 {
            return Err(ConfigError::Invalid("shards must be greater than zero".into()));
        }
        if self.policies.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one policy must be configured".into(),
            ));
        }
        if let Some((idx, dup)) = self
            .policies
            .iter()
            .enumerate()
            .find(|(idx, policy)| self.policies[..*idx].contains(policy))
        {
            return Err(ConfigError::Invalid(format!(
                "policy {dup} is listed again at position {idx}"
            )));
        }
        if self.cache_size.is_none() && !(self.cache_ratio > 0.0 && self.cache_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "cache ratio {} must be in (0, 1]",
                self.cache_ratio
            )));
        }
        Ok(())
    }

    /// One configuration per policy, in policy-list order.
    pub fn configurations(&self) -> Vec<Configuration> {
        let cache_size = self.cache_size();
        self.policies
            .iter()
            .map(|&policy| {
                Configuration::new(
                    self.threads,
                    cache_size,
                    self.requests,
                    self.shards,
                    self.distribution.clone(),
                    policy,
                    self.latency,
                    self.frequency,
                )
            })
            .collect()
    }
}
