#![cfg(feature = "cli")]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const SESSION_LOG: &str = r#"# five frames, one marker
{"time": 100.0, "events": [{"event": "record_toggled"}], "detections": [{"id": 7, "center": [0.0, 5.0], "corners": [[0,0],[1,0],[1,1],[0,1]]}]}
{"time": 101.0, "detections": [{"id": 7, "center": [10.0, 5.0], "corners": [[0,0],[1,0],[1,1],[0,1]]}]}
{"time": 102.0, "detections": [{"id": 7, "center": [20.0, 5.0], "corners": [[0,0],[1,0],[1,1],[0,1]]}]}
{"time": 103.0, "detections": [{"id": 7, "center": [30.0, 5.0], "corners": [[0,0],[1,0],[1,1],[0,1]]}]}
{"time": 104.0, "events": [{"event": "record_toggled"}]}
"#;

fn artrack() -> Command {
    Command::cargo_bin("artrack").unwrap()
}

fn write_log(dir: &Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("session.jsonl");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn replay_exports_trimmed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), SESSION_LOG);
    let out = dir.path().join("out.csv");

    let assert = artrack()
        .arg("replay")
        .arg(&log)
        .args(["--trim", "0.25", "0.75", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"stopped\""));

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["replay"]["exports"][0]["rows"], 3);
    assert_eq!(report["duration"], 4.0);

    let csv = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("relative_time,"));
    assert!(lines[1].starts_with("0,10,5,"));
}

#[test]
fn record_all_without_header_with_ids() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(
        dir.path(),
        r#"{"time": 1.0, "detections": [{"id": 4, "center": [1.0, 1.0], "corners": [[0,0],[2,0],[2,2],[0,2]]}]}
{"time": 2.0, "detections": [{"id": 4, "center": [2.0, 1.0], "corners": [[0,0],[2,0],[2,2],[0,2]]}]}
"#,
    );
    let out = dir.path().join("all.csv");

    artrack()
        .arg("replay")
        .arg(&log)
        .args(["--record-all", "--no-header", "--with-id", "--output"])
        .arg(&out)
        .assert()
        .success();

    let csv = fs::read_to_string(&out).unwrap();
    assert_eq!(csv, "4,0,1,1,0,0,2,0,2,2,0,2\n4,1,2,1,0,0,2,0,2,2,0,2\n");
}

#[test]
fn replay_without_output_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), SESSION_LOG);

    artrack()
        .arg("replay")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"samples\": 4"));

    let entries = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn replay_rejects_bad_log() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), "{\"time\": 1.0}\nnot json\n");

    artrack()
        .arg("replay")
        .arg(&log)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line: 2"));
}

#[test]
fn grid_prints_lines_for_missing_corner_file() {
    let dir = tempfile::tempdir().unwrap();
    let points = dir.path().join("missing.points");

    let assert = artrack()
        .arg("grid")
        .arg("--points")
        .arg(&points)
        .args(["--rows", "3", "--cols", "4"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["lines"].as_array().unwrap().len(), 5 + 4);
    assert_eq!(report["corners"][3], serde_json::json!([0, 0]));
}

#[test]
fn grid_reads_corner_file() {
    let dir = tempfile::tempdir().unwrap();
    let points = dir.path().join("grid.points");
    fs::write(&points, "0,0\n100,0\n100,100\n0,100\n").unwrap();

    artrack()
        .arg("grid")
        .arg("--points")
        .arg(&points)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rows\": 2"))
        .stdout(predicate::str::contains("100"));
}

#[test]
fn log_level_is_parsed_and_validated() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), SESSION_LOG);

    let assert = artrack()
        .args(["--log-level", "debug", "replay"])
        .arg(&log)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    serde_json::from_str::<serde_json::Value>(&stdout).unwrap();

    artrack()
        .args(["--log-level", "loud", "replay"])
        .arg(&log)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--log-level"));
}

#[cfg(feature = "tracing")]
#[test]
fn tracing_logs_stay_off_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path(), SESSION_LOG);

    for extra in [&[][..], &["--json-log"][..]] {
        let assert = artrack()
            .env("RUST_LOG", "info")
            .arg("replay")
            .arg(&log)
            .args(extra)
            .assert()
            .success()
            .stderr(predicate::str::contains("recording started"));
        let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(report["samples"], 4);
    }
}
