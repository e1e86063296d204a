use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Config with all delays zeroed so a full sim run finishes quickly
fn write_fast_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[color]
settle_ms = 0
calibration_samples = 2
calibration_pause_ms = 0

[homing]
jog_pause_ms = 0

[simulation]
steps_per_pump = 400
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "self-check ok", "stdout")]
#[case(&["calibrate"], 0, "tolerance", "stdout")]
#[case(&["sort", "--objects", "3"], 0, "Run complete", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_fast_config(&dir);

    let mut cmd = Command::cargo_bin("sorter_cli").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => assert.stdout(predicate::str::contains(needle)),
        _ => assert.stderr(predicate::str::contains(needle)),
    };
}

#[test]
fn missing_config_path_is_an_error() {
    let mut cmd = Command::cargo_bin("sorter_cli").unwrap();
    cmd.arg("--config").arg("/nonexistent/cfg.toml");
    cmd.arg("self-check");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn invalid_config_is_rejected_with_context() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[scheduler]\ndrop_quadrant_order = [3, 99]\n").unwrap();

    let mut cmd = Command::cargo_bin("sorter_cli").unwrap();
    cmd.arg("--config").arg(&path);
    cmd.arg("self-check");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn json_sort_emits_machine_readable_summary() {
    let dir = tempdir().unwrap();
    let cfg = write_fast_config(&dir);

    let mut cmd = Command::cargo_bin("sorter_cli").unwrap();
    cmd.arg("--config").arg(&cfg);
    cmd.arg("--json");
    cmd.args(["sort", "--objects", "3"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    let line = text.lines().last().expect("summary line");
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["objects_sorted"], 3);
    assert_eq!(v["missed_slots"], 0);
}
