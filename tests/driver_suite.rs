#[path = "common.rs"]
mod common;

use cachebench::{ExperimentConfig, ExperimentDriver, PolicyId, summarize};
use common::{ScriptedLauncher, Step, sample_output};

fn experiment(policies: Vec<PolicyId>) -> ExperimentConfig {
    ExperimentConfig {
        requests: 1000,
        policies,
        ..ExperimentConfig::default()
    }
}

#[tokio::test]
async fn failed_invocation_leaves_empty_slot() {
    let dir = tempfile::tempdir().unwrap();
    let configs = experiment(vec![PolicyId::Lru]).configurations();
    let launcher = ScriptedLauncher::new([
        Step::Print(sample_output(10.0, 2.0, 0.25)),
        Step::Print(sample_output(20.0, 4.0, 0.75)),
        Step::Fail,
    ]);
    let driver = ExperimentDriver::new(launcher, dir.path());

    let results = driver.run(&configs, 3).await;
    let table = results.table("LRU").expect("LRU table");

    assert_eq!(table.len(), 3);
    assert!(table.get(2).unwrap().is_empty());
    assert_eq!(table.populated_runs(), 2);

    let summary = summarize(table);
    assert_eq!(summary.fields.len(), 20);
    for field in &summary.fields {
        assert_eq!(field.samples, 2, "{} should only use runs 0 and 1", field.field);
    }
    let run_time = summary.field("run_time").unwrap();
    assert_eq!(run_time.mean, 15.0);
    assert_eq!(run_time.p50, 15.0);
    assert_eq!(summary.field("hit_avg").unwrap().mean, 3.0);
    assert_eq!(summary.field("miss_ratio").unwrap().p75, 0.625);
}

#[tokio::test]
async fn matrix_runs_all_configurations_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let configs = experiment(vec![PolicyId::LruFh, PolicyId::Lru]).configurations();
    let launcher = ScriptedLauncher::new(
        (0..4).map(|i| Step::Print(sample_output(i as f64, 1.0, 0.5))),
    );
    let driver = ExperimentDriver::new(launcher, dir.path());

    let results = driver.run(&configs, 2).await;

    let calls = driver.launcher().calls();
    let order: Vec<(PolicyId, String)> = calls
        .iter()
        .map(|call| {
            let run_dir = call
                .capture
                .parent()
                .and_then(|p| p.file_name())
                .unwrap()
                .to_string_lossy()
                .into_owned();
            (call.policy, run_dir)
        })
        .collect();
    assert_eq!(
        order,
        vec![
            (PolicyId::LruFh, "run_0".to_string()),
            (PolicyId::Lru, "run_0".to_string()),
            (PolicyId::LruFh, "run_1".to_string()),
            (PolicyId::Lru, "run_1".to_string()),
        ]
    );
    assert_eq!(calls[0].args.last().map(String::as_str), Some("20"));
    assert_eq!(calls[1].args.last().map(String::as_str), Some("0"));

    let fh = results.table("LRU_FH").unwrap();
    assert_eq!(fh.values("run_time"), vec![0.0, 2.0]);
    let plain = results.table("LRU").unwrap();
    assert_eq!(plain.values("run_time"), vec![1.0, 3.0]);
}

#[tokio::test]
async fn captures_are_kept_per_run_and_policy() {
    let dir = tempfile::tempdir().unwrap();
    let configs = experiment(vec![PolicyId::Fifo]).configurations();
    let launcher = ScriptedLauncher::new([Step::Print("no record here\n".to_string())]);
    let driver = ExperimentDriver::new(launcher, dir.path());

    let results = driver.run(&configs, 1).await;

    let capture = dir.path().join("run_0").join("FIFO.txt");
    assert_eq!(driver.capture_path(0, &configs[0]), capture);
    assert_eq!(std::fs::read_to_string(&capture).unwrap(), "no record here\n");
    assert!(results.table("FIFO").unwrap().get(0).unwrap().is_empty());
}

#[tokio::test]
async fn partial_record_is_retained() {
    let dir = tempfile::tempdir().unwrap();
    let configs = experiment(vec![PolicyId::Lfu]).configurations();
    let broken = "All threads run 4.5 s\n- Hit Avg: garbage\n".to_string();
    let launcher = ScriptedLauncher::new([
        Step::Print(broken),
        Step::Print(sample_output(5.5, 1.0, 0.5)),
    ]);
    let driver = ExperimentDriver::new(launcher, dir.path());

    let results = driver.run(&configs, 2).await;
    let table = results.table("LFU").unwrap();

    let first = table.get(0).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first.get("run_time"), Some(4.5));
    assert_eq!(table.values("run_time"), vec![4.5, 5.5]);
    assert_eq!(table.values("hit_avg"), vec![1.0]);
}

#[tokio::test]
async fn rerun_overwrites_existing_capture() {
    let dir = tempfile::tempdir().unwrap();
    let configs = experiment(vec![PolicyId::Lru]).configurations();

    let first = ExperimentDriver::new(
        ScriptedLauncher::new([Step::Print(sample_output(1.0, 1.0, 0.5))]),
        dir.path(),
    );
    first.run(&configs, 1).await;

    let second = ExperimentDriver::new(
        ScriptedLauncher::new([Step::Print(sample_output(2.0, 1.0, 0.5))]),
        dir.path(),
    );
    let results = second.run(&configs, 1).await;

    let capture = std::fs::read_to_string(dir.path().join("run_0").join("LRU.txt")).unwrap();
    assert!(capture.contains("All threads run 2 s"));
    assert_eq!(results.table("LRU").unwrap().values("run_time"), vec![2.0]);
}

#[tokio::test]
async fn invalid_utf8_around_record_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let configs = experiment(vec![PolicyId::Lru]).configurations();
    let mut output = b"progress \xff\xfe 50%\r\n".to_vec();
    output.extend_from_slice(sample_output(6.5, 1.0, 0.5).as_bytes());
    output.extend_from_slice(b"\xc3 trailing noise\n");
    let driver = ExperimentDriver::new(ScriptedLauncher::new([Step::Bytes(output)]), dir.path());

    let results = driver.run(&configs, 1).await;
    let record = results.table("LRU").unwrap().get(0).unwrap();

    assert_eq!(record.len(), 20);
    assert_eq!(record.get("run_time"), Some(6.5));
    assert_eq!(record.get("miss_ratio"), Some(0.5));
}
