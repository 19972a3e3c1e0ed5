use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use cachebench::{BenchmarkLauncher, Configuration, DriverError, PolicyId};

/// Builds a benchmark stdout containing one well-formed record.
#[allow(dead_code)]
pub fn sample_output(run_time: f64, hit_avg: f64, miss_ratio: f64) -> String {
    format!(
        "Loading trace...\n\
         All threads run {run_time} s\n\
         - Hit Avg: {hit_avg} (stat size: 1000, real size_: 4000), median: 1.5, p9999: 40.5, p999: 20.5, p99: 10.5, p90: 5.5\n\
         - Other Avg: 9.5 (stat size: 300, real size_: 900), median: 8.5, p9999: 90.5, p999: 70.5, p99: 30.5, p90: 12.5\n\
         Total Avg Lat: 3.5 (size: 4900, miss ratio: {miss_ratio})\n\
         Shutting down\n"
    )
}

/// What the scripted launcher does for one invocation.
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub enum Step {
    Print(String),
    Bytes(Vec<u8>),
    Fail,
}

/// Call made to the scripted launcher.
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub struct Invocation {
    pub policy: PolicyId,
    pub args: Vec<String>,
    pub capture: PathBuf,
}

/// Launcher that replays a fixed script, one step per invocation.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedLauncher {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Invocation>>,
}

#[allow(dead_code)]
impl ScriptedLauncher {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl BenchmarkLauncher for ScriptedLauncher {
    async fn launch(&self, config: &Configuration, capture: &Path) -> Result<(), DriverError> {
        self.calls.lock().expect("calls lock").push(Invocation {
            policy: config.policy,
            args: config.args(),
            capture: capture.to_path_buf(),
        });

        let step = self
            .steps
            .lock()
            .expect("steps lock")
            .pop_front()
            .unwrap_or(Step::Fail);
        match step {
            Step::Print(text) => {
                std::fs::write(capture, text).expect("write capture");
                Ok(())
            }
            Step::Bytes(bytes) => {
                std::fs::write(capture, bytes).expect("write capture");
                Ok(())
            }
            Step::Fail => {
                std::fs::write(capture, "segfault\n").expect("write capture");
                Err(DriverError::Failed("scripted failure".into()))
            }
        }
    }
}
