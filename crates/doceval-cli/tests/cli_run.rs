#![allow(deprecated)]
//! End-to-end CLI runs against the offline `fake` provider.

use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_fixture(root: &Path) {
    fs::create_dir_all(root.join("prompts")).unwrap();
    fs::create_dir_all(root.join("documents")).unwrap();
    fs::write(
        root.join("prompts/system_summary.txt"),
        "You summarize financial reports.",
    )
    .unwrap();
    fs::write(
        root.join("prompts/user_summary.txt"),
        "Summarize the report as JSON.",
    )
    .unwrap();
    fs::write(root.join("prompts/risks.md"), "List the risks as JSON.").unwrap();
    fs::write(
        root.join("documents/q1.txt"),
        "Quarterly revenue increased strongly across regions.",
    )
    .unwrap();
    fs::write(
        root.join("documents/q2.txt"),
        "Operating margins narrowed because shipping costs climbed.",
    )
    .unwrap();
    fs::write(
        root.join("eval.yaml"),
        "version: 1\nsuite: reports\nmodels:\n  - name: offline-a\n    provider: fake\n  - name: offline-b\n    provider: fake\nsettings:\n  concurrency: 2\n",
    )
    .unwrap();
}

fn read_json(path: &Path) -> Value {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&content).expect("invalid JSON")
}

#[test]
fn run_writes_results_and_summary() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());

    let output = Command::cargo_bin("doceval")
        .unwrap()
        .args(["run", "--config"])
        .arg(dir.path().join("eval.yaml"))
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "{stderr}");
    assert!(stderr.contains("Summary: 8 total, 8 succeeded, 0 failed"), "{stderr}");

    let summary = read_json(&dir.path().join("results/summary.json"));
    assert_eq!(summary["suite"], "reports");
    assert_eq!(summary["total"], 8);
    assert_eq!(summary["failed"], 0);
    assert!(summary["by_model"]["offline-a"].is_object());
    assert!(summary["by_prompt"]["risks"].is_object());
    assert!(summary["by_prompt"]["summary"].is_object());

    let per_case = fs::read_dir(dir.path().join("results/results")).unwrap().count();
    assert_eq!(per_case, 8);
}

#[test]
fn second_run_is_served_from_cache() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());
    let config = dir.path().join("eval.yaml");

    for _ in 0..2 {
        Command::cargo_bin("doceval")
            .unwrap()
            .args(["run", "--config"])
            .arg(&config)
            .assert()
            .success();
    }
    let summary = read_json(&dir.path().join("results/summary.json"));
    assert_eq!(summary["cache_hits"], 8);

    let stats = Command::cargo_bin("doceval")
        .unwrap()
        .args(["cache", "stats", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    let stats: Value = serde_json::from_slice(&stats.stdout).unwrap();
    assert_eq!(stats["entries"], 8);

    Command::cargo_bin("doceval")
        .unwrap()
        .args(["cache", "clear", "--config"])
        .arg(&config)
        .assert()
        .success();
}

#[test]
fn missing_prompts_dir_is_fatal() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());
    fs::remove_dir_all(dir.path().join("prompts")).unwrap();

    let output = Command::cargo_bin("doceval")
        .unwrap()
        .args(["run", "--config"])
        .arg(dir.path().join("eval.yaml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unsupported_config_version_is_fatal() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("eval.yaml"),
        "version: 9\nsuite: s\nmodels: [{name: m, provider: fake}]\n",
    )
    .unwrap();
    let output = Command::cargo_bin("doceval")
        .unwrap()
        .args(["run", "--config"])
        .arg(dir.path().join("eval.yaml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported config version"));
}

#[test]
fn corpus_list_shows_roles() {
    let dir = tempdir().unwrap();
    write_fixture(dir.path());
    let output = Command::cargo_bin("doceval")
        .unwrap()
        .args(["corpus", "list", "--config"])
        .arg(dir.path().join("eval.yaml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("prompts (3):"));
    assert!(stdout.contains("system: system_summary"));
    assert!(stdout.contains("documents (2):"));
}

#[test]
fn demo_project_runs_offline() {
    let config = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/eval.yaml");
    let out = tempdir().unwrap();

    Command::cargo_bin("doceval")
        .unwrap()
        .args(["corpus", "list", "--config"])
        .arg(&config)
        .assert()
        .success();

    let output = Command::cargo_bin("doceval")
        .unwrap()
        .args(["run", "--model", "offline", "--no-cache", "--strict", "--config"])
        .arg(&config)
        .arg("--output-dir")
        .arg(out.path())
        .output()
        .unwrap();
    assert_eq!(
        output.status.code(),
        Some(0),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary = read_json(&out.path().join("summary.json"));
    assert_eq!(summary["total"], 4);
    assert!(summary["by_model"].get("gpt-4o-mini").is_none());
}
