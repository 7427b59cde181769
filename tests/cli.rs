//! Runs the binary against plain directory trees.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, rel).unwrap();
}

fn sanitizer() -> Command {
    Command::new(env!("CARGO_BIN_EXE_repopath-sanitizer"))
}

fn read_report(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn item<'a>(report: &'a Value, current_path: &str) -> &'a Value {
    report["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["current_path"] == current_path)
        .unwrap_or_else(|| panic!("no item for {current_path}"))
}

#[test]
fn failed_move_is_recorded_in_report() {
    let dir = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    touch(dir.path(), "a?");
    touch(dir.path(), "a");
    let json = state.path().join("report.json");
    let text = state.path().join("summary.txt");

    sanitizer()
        .arg("apply")
        .arg("--no-git")
        .arg("--yes")
        .arg("--repo")
        .arg(dir.path())
        .arg("--json-out")
        .arg(&json)
        .arg("--text-out")
        .arg(&text)
        .arg("--state-dir")
        .arg(state.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stopped at a? -> a"));

    let report = read_report(&json);
    let warnings: Vec<&str> = report["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(
        warnings.iter().any(|w| w.starts_with("Move failed for a? -> a")),
        "{warnings:?}"
    );
    assert_eq!(item(&report, "a?")["status"], "Failed");
    assert!(report["applied_renames"].as_array().unwrap().is_empty());

    let summary = fs::read_to_string(&text).unwrap();
    assert!(summary.contains("Move failed for a? -> a"), "{summary}");

    assert_eq!(fs::read_to_string(dir.path().join("a")).unwrap(), "a");
    // Nothing was applied, so there is nothing to undo.
    let undo_records = fs::read_dir(state.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("last_run_"))
        .count();
    assert_eq!(undo_records, 0);
}

#[test]
fn dry_run_report_carries_preview_failures() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a?");
    touch(dir.path(), "a");

    let output = sanitizer()
        .arg("apply")
        .arg("--no-git")
        .arg("--dry-run")
        .arg("--json")
        .arg("--repo")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    let warnings = report["warnings"].as_array().unwrap();
    assert!(
        warnings
            .iter()
            .filter_map(Value::as_str)
            .any(|w| w.starts_with("Move failed for a? -> a")),
        "{warnings:?}"
    );
    assert!(dir.path().join("a?").exists());
}

#[test]
fn successful_apply_reports_applied_renames() {
    let dir = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    touch(dir.path(), "b?.txt");

    let output = sanitizer()
        .arg("apply")
        .arg("--no-git")
        .arg("--yes")
        .arg("--json")
        .arg("--repo")
        .arg(dir.path())
        .arg("--state-dir")
        .arg(state.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        report["applied_renames"],
        serde_json::json!([["b?.txt", "b.txt"]])
    );
    assert!(report["warnings"].as_array().unwrap().is_empty());
    assert_eq!(item(&report, "b?.txt")["status"], "Renamed");
    assert!(dir.path().join("b.txt").exists());
}
