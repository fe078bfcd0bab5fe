use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn gpfs_tune_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("gpfs-tune");
    path
}

const README: &str = "# IBM Spectrum Scale CSI\n\
Intro text that sits before the first section header.\n\
## Installation\n\
Install the operator from OperatorHub, then create the CSIScaleOperator custom resource.\n\
## Prerequisites\n\
A running IBM Spectrum Scale cluster with the GUI enabled and Kubernetes 1.19 or newer.\n\
## License\n\
Apache 2.0 licensed; see the LICENSE file in the repository root for the full text.\n";

const OPERATOR_YAML: &str = "apiVersion: csi.ibm.com/v1\n\
kind: CSIScaleOperator\n\
metadata:\n\
  name: ibm-spectrum-scale-csi\n\
  namespace: ibm-spectrum-scale-csi-driver\n";

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    // Pre-seeded checkout so no network is needed
    let repo = root.join("data/repos/ibm-spectrum-scale-csi");
    fs::create_dir_all(repo.join("deploy")).unwrap();
    fs::write(repo.join("README.md"), README).unwrap();
    fs::write(repo.join("deploy/operator.yaml"), OPERATOR_YAML).unwrap();
    fs::write(
        repo.join("conftest.py"),
        "\"\"\"Pytest fixtures for the Spectrum Scale CSI operator end-to-end tests.\"\"\"\nimport pytest\n",
    )
    .unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_content = format!(
        r#"[paths]
data_dir = "{root}/data"
dataset_file = "{root}/gpfs_dataset.jsonl"

[collect]
repos = []

[finetune]
output_dir = "{root}/results"
launcher = ["sh", "-c", "test -f \"$0\" && echo trainer saw plan"]
"#,
        root = root.display()
    );
    let config_path = config_dir.join("gpfs-tune.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_gpfs_tune(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = gpfs_tune_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run gpfs-tune binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_collect_writes_chunks() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_gpfs_tune(&config_path, &["collect", "--progress", "off"]);
    assert!(success, "collect failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("markdown files: 1"));
    assert!(stdout.contains("yaml configs: 1"));
    assert!(stdout.contains("code docstrings: 1"));
    assert!(stdout.contains("total chunks: 6"));

    let chunks = read_json(&tmp.path().join("data/extracted/gpfs_chunks.json"));
    let chunks = chunks.as_array().unwrap();
    assert_eq!(chunks.len(), 6);
    assert_eq!(chunks[0]["source"], "ibm-spectrum-scale-csi/README.md");
    assert_eq!(chunks[0]["type"], "markdown");
    assert_eq!(chunks[5]["type"], "documentation");
}

#[test]
fn test_collect_json_progress() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_gpfs_tune(&config_path, &["collect", "--progress", "json"]);
    assert!(success);
    let events: Vec<serde_json::Value> = stderr
        .lines()
        .filter_map(|l| serde_json::from_str(l).ok())
        .filter(|v: &serde_json::Value| v["event"] == "progress")
        .collect();
    assert!(events.iter().any(|e| e["phase"] == "extracting" && e["total"] == 1));
    assert!(events.iter().any(|e| e["phase"] == "extracted" && e["chunks"] == 3));
}

#[test]
fn test_generate_after_collect() {
    let (tmp, config_path) = setup_test_env();

    run_gpfs_tune(&config_path, &["collect", "--progress", "off"]);
    let (stdout, stderr, success) = run_gpfs_tune(&config_path, &["generate"]);
    assert!(success, "generate failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("curated pairs: 20"));
    assert!(stdout.contains("markdown pairs: 2"));
    assert!(stdout.contains("yaml pairs: 1"));

    let dataset = fs::read_to_string(tmp.path().join("gpfs_dataset.jsonl")).unwrap();
    let records: Vec<serde_json::Value> = dataset
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 23);
    for record in &records {
        assert!(!record["question"].as_str().unwrap().trim().is_empty());
        assert!(!record["answer"].as_str().unwrap().trim().is_empty());
    }
    assert_eq!(records[0]["question"], "How do I check network connectivity in GPFS?");
    assert!(records
        .iter()
        .any(|r| r["question"] == "What are the prerequisites?"));
    assert!(records.iter().any(|r| r["question"]
        == "Can you show an example CSIScaleOperator configuration for IBM Spectrum Scale?"));
}

#[test]
fn test_generate_without_chunks_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_gpfs_tune(&config_path, &["generate"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read chunk file"));
}

#[test]
fn test_finetune_launches_trainer() {
    let (tmp, config_path) = setup_test_env();

    run_gpfs_tune(&config_path, &["collect", "--progress", "off"]);
    run_gpfs_tune(&config_path, &["generate"]);
    let (stdout, stderr, success) = run_gpfs_tune(&config_path, &["finetune"]);
    assert!(success, "finetune failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("training samples: 18"));
    assert!(stdout.contains("test samples: 5"));
    assert!(stderr.contains("trainer saw plan"));

    let plan = read_json(&tmp.path().join("results/training_plan.json"));
    assert_eq!(plan["dataset"]["total"], 23);
    assert_eq!(plan["lora"]["target_modules"][0], "q_proj");
    assert!(tmp.path().join("results/train.jsonl").exists());
    assert!(tmp.path().join("results/test.jsonl").exists());
}

#[test]
fn test_finetune_dry_run_and_failing_trainer() {
    let (tmp, config_path) = setup_test_env();
    run_gpfs_tune(&config_path, &["collect", "--progress", "off"]);
    run_gpfs_tune(&config_path, &["generate"]);

    let (stdout, _, success) = run_gpfs_tune(&config_path, &["finetune", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("trainer not launched"));

    let config = fs::read_to_string(&config_path)
        .unwrap()
        .replace("test -f \\\"$0\\\" && echo trainer saw plan", "exit 7");
    fs::write(&config_path, config).unwrap();
    let (_, stderr, success) = run_gpfs_tune(&config_path, &["finetune"]);
    assert!(!success);
    assert!(stderr.contains("trainer exited with status 7"));
    assert!(tmp.path().join("results/training_plan.json").exists());
}

#[test]
fn test_stats_reports_both_files() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_gpfs_tune(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("not found"));

    run_gpfs_tune(&config_path, &["collect", "--progress", "off"]);
    run_gpfs_tune(&config_path, &["generate"]);
    let (stdout, stderr, success) = run_gpfs_tune(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("ibm-spectrum-scale-csi"));
    assert!(stdout.contains("Pairs:    23"));
    assert!(stdout.contains("Dedup collisions:     0"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_gpfs_tune(&tmp.path().join("absent.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_completions() {
    let tmp = TempDir::new().unwrap();
    let output = Command::new(gpfs_tune_binary())
        .args(["completions", "bash"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("gpfs-tune"));
}
