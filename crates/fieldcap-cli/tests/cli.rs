//! End-to-end tests for the `fieldcap` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"{
    "country": "Australia",
    "dictionary": [
        {"Name": "Total Due", "Mandatory": true, "Keywords": ["total due"],
         "Patterns": "\\$[0-9,]+\\.[0-9]{2}"},
        {"Name": "Due Date", "Mandatory": true, "Keywords": ["due date"], "Patterns": ""},
        {"Name": "Service Address", "Mandatory": false, "Keywords": [], "Patterns": ""}
    ]
}"#;

fn frame(amount: &str) -> String {
    format!(
        r#"{{"blocks": [
            {{"components": [
                {{"value": "J Smith", "bbox": [10, 10, 100, 30]}},
                {{"value": "12 Main St", "bbox": [10, 40, 120, 60]}},
                {{"value": "MELBOURNE VIC 3000", "bbox": [10, 70, 200, 90]}}
            ]}},
            {{"components": [
                {{"value": "Total Due", "bbox": [10, 200, 100, 220]}},
                {{"value": "{}", "bbox": [150, 203, 230, 223]}}
            ]}}
        ]}}"#,
        amount
    )
}

fn fieldcap() -> Command {
    Command::cargo_bin("fieldcap").unwrap()
}

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, CONFIG).unwrap();
    (dir, config)
}

fn write_frames(dir: &Path, amounts: &[&str]) -> PathBuf {
    let frames: Vec<String> = amounts.iter().map(|a| frame(a)).collect();
    let path = dir.join("frames.json");
    fs::write(&path, format!("[{}]", frames.join(","))).unwrap();
    path
}

#[test]
fn process_prints_confirmed_json() {
    let (dir, config) = setup();
    let frames = write_frames(dir.path(), &["$8.50", "$128.50", "$28.50"]);

    let output = fieldcap()
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(&frames)
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["frames_processed"], 3);
    assert_eq!(result["confirmed"]["Total Due"], "$128.50");
    assert_eq!(result["confirmed"]["Due Date"], "---");
    assert_eq!(
        result["confirmed"]["Service Address"],
        "J Smith, 12 Main St, MELBOURNE VIC 3000"
    );
    assert_eq!(result["missing_mandatory"], serde_json::json!(["Due Date"]));
}

#[test]
fn process_strict_fails_on_missing_mandatory() {
    let (dir, config) = setup();
    let frames = write_frames(dir.path(), &["$128.50"]);

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["process", "--strict", "--format", "csv"])
        .arg(&frames)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Total Due,$128.50,true,total due,1"))
        .stderr(predicate::str::contains("Mandatory fields unresolved: Due Date"));
}

#[test]
fn process_show_debug_lines() {
    let (dir, config) = setup();
    let frames = write_frames(dir.path(), &["$128.50"]);

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["process", "--format", "text", "--show-debug"])
        .arg(&frames)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Due:$128.50/total due/1"))
        .stdout(predicate::str::contains("Due Date:---//0"));
}

#[test]
fn process_writes_output_file() {
    let (dir, config) = setup();
    let frames = write_frames(dir.path(), &["$128.50"]);
    let out = dir.path().join("result.csv");

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["process", "--format", "csv", "--output"])
        .arg(&out)
        .arg(&frames)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("field,value,mandatory,keyword,pattern\n"));
}

#[test]
fn process_missing_input() {
    let (dir, config) = setup();

    fieldcap()
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_rejects_duplicate_fields() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    fs::write(
        &config,
        r#"{"dictionary": [{"Name": "A"}, {"Name": "A"}]}"#,
    )
    .unwrap();
    let frames = write_frames(dir.path(), &["$1.00"]);

    fieldcap()
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(&frames)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate field name: A"));
}

#[test]
fn replay_one_frame_per_file() {
    let (dir, config) = setup();
    let frames_dir = dir.path().join("frames");
    fs::create_dir(&frames_dir).unwrap();
    for (i, amount) in ["$1.00", "$1,128.50", "$28.50"].iter().enumerate() {
        fs::write(frames_dir.join(format!("frame-{:03}.json", i)), frame(amount)).unwrap();
    }
    fs::write(frames_dir.join("notes.txt"), "ignored").unwrap();

    let pattern = frames_dir.join("*");
    let output = fieldcap()
        .arg("--config")
        .arg(&config)
        .arg("replay")
        .arg(pattern.to_str().unwrap())
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["frames_processed"], 3);
    assert_eq!(result["confirmed"]["Total Due"], "$1,128.50");
}

#[test]
fn replay_skips_broken_frames_when_asked() {
    let (dir, config) = setup();
    fs::write(dir.path().join("a.json"), frame("$128.50")).unwrap();
    fs::write(dir.path().join("b.json"), "not json").unwrap();
    let pattern = dir.path().join("[ab].json");

    fieldcap()
        .arg("--config")
        .arg(&config)
        .arg("replay")
        .arg(pattern.to_str().unwrap())
        .assert()
        .failure();

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["replay", "--continue-on-error", "--format", "text"])
        .arg(pattern.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("$128.50"))
        .stderr(predicate::str::contains("1 skipped"));
}

#[test]
fn config_init_get_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("nested").join("config.json");

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(config.exists());

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "dictionary.0.Name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Total Due\""));

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "row_tolerance", "14"])
        .assert()
        .success();

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "row_tolerance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("14"));

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "--", "row_tolerance", "-1"])
        .assert()
        .failure();

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "missing.key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn config_path_reports_status() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    fieldcap()
        .arg("--config")
        .arg(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));
}
