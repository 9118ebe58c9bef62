//! Integration tests for the luna binary.
//!
//! These tests verify end-to-end behavior including:
//! - Logging entries and the settings they update
//! - Prediction and regularity output
//! - Listing, deleting and exporting entries

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI command bound to a test directory (config and data both inside it)
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("luna").expect("Failed to find luna binary");
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn log_period(dir: &Path, date: &str) {
    cli(dir)
        .args(["log", "--date", date, "--flow", "medium"])
        .assert()
        .success();
}

#[test]
fn test_cli_help() {
    Command::cargo_bin("luna")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("menstrual cycle tracker"));
}

#[test]
fn test_log_creates_journal_and_settings() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["log", "--date", "2024-01-01", "--flow", "heavy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged period for 2024-01-01"));

    let user_dir = dir.join("data/default");
    let journal = fs::read_to_string(user_dir.join("logs.jsonl")).unwrap();
    assert!(journal.contains("\"log_type\":\"period\""));
    assert!(journal.contains("\"flow_intensity\":\"heavy\""));

    let settings: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(user_dir.join("settings.json")).unwrap())
            .unwrap();
    assert_eq!(settings["last_period_start"], "2024-01-01");
    assert_eq!(settings["average_cycle_length"], 28);
}

#[test]
fn test_log_type_inferred_without_flow() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["log", "--date", "2024-01-05", "--symptom", "cramps:2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged symptom"));
    cli(dir)
        .args(["log", "--date", "2024-01-06", "--mood", "calm"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged mood"));
    cli(dir)
        .args(["log", "--date", "2024-01-07", "--notes", "quiet day"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged note"));

    // No period logged, so no settings file
    assert!(!dir.join("data/default/settings.json").exists());
}

#[test]
fn test_invalid_flow_rejected() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["log", "--flow", "torrential"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown flow"));
}

#[test]
fn test_predict_without_data() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("predict")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not enough data"));
}

#[test]
fn test_predict_single_period_json_is_null() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    log_period(dir, "2024-01-01");

    cli(dir)
        .args(["predict", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::diff("null\n"));
}

#[test]
fn test_predict_regular_cycles() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    for date in ["2024-01-01", "2024-01-02", "2024-01-29", "2024-01-30", "2024-02-26"] {
        log_period(dir, date);
    }

    let output = cli(dir)
        .args(["predict", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let prediction: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(prediction["predicted_date"], "2024-03-25");
    assert_eq!(prediction["range_start"], "2024-03-25");
    assert_eq!(prediction["confidence"], "high");
    assert_eq!(prediction["insight"], "Based on 2 recorded cycles");

    cli(dir)
        .arg("predict")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mar 25, 2024"))
        .stdout(predicate::str::contains("high confidence"));
}

#[test]
fn test_regularity_flags_wide_spread() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    for date in ["2024-01-01", "2024-01-20", "2024-03-10"] {
        log_period(dir, date);
    }

    cli(dir)
        .arg("regularity")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cycle lengths: 19, 50"))
        .stdout(predicate::str::contains("Irregular"));
}

#[test]
fn test_regularity_insufficient_data() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    log_period(dir, "2024-01-01");

    let output = cli(dir)
        .args(["regularity", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let verdict: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(verdict["is_irregular"], false);
    assert_eq!(verdict["cycle_lengths"].as_array().unwrap().len(), 0);
    assert!(verdict["average"].is_null());
}

#[test]
fn test_settings_set_changes_fallback() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["settings", "set", "--cycle-length", "30", "--last-period-start", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Average cycle length:  30 days"));

    // A 10-day gap is not a valid cycle, so the settings length is used
    log_period(dir, "2024-01-01");
    log_period(dir, "2024-01-11");

    cli(dir)
        .args(["predict", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"predicted_date\": \"2024-02-10\""));
}

#[test]
fn test_settings_reject_zero_length() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .args(["settings", "set", "--period-length", "0"])
        .assert()
        .failure();
}

#[test]
fn test_status_from_settings() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    log_period(dir, "2024-03-01");

    cli(dir)
        .args(["status", "--today", "2024-03-15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cycle day 15 of 28"))
        .stdout(predicate::str::contains("in 14 days"));
}

#[test]
fn test_default_command_is_status() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Log a period"));
}

#[test]
fn test_list_and_delete() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    log_period(dir, "2024-01-01");
    log_period(dir, "2024-01-02");

    let output = cli(dir)
        .args(["list", "--json", "--oldest-first"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let entries: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["date"], "2024-01-01");
    let id = entries[0]["id"].as_str().unwrap().to_string();

    cli(dir)
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted entry"));
    cli(dir)
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("No entry with id"));

    cli(dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-02"))
        .stdout(predicate::str::contains("2024-01-01").not());
}

#[test]
fn test_users_have_separate_journals() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["--user", "alex", "log", "--date", "2024-01-01", "--flow", "light"])
        .assert()
        .success();

    cli(dir)
        .args(["--user", "sam", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries yet"));
    assert!(dir.join("data/alex/logs.jsonl").exists());
}

#[test]
fn test_insights_summary() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    cli(dir)
        .args(["log", "--date", "2024-01-01", "--flow", "heavy", "--symptom", "cramps:3"])
        .args(["--symptom", "med:ibuprofen", "--sleep", "7"])
        .assert()
        .success();
    cli(dir)
        .args(["log", "--date", "2024-01-02", "--symptom", "cramps:1", "--sleep", "6"])
        .assert()
        .success();

    cli(dir)
        .arg("insights")
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries: 2 (1 period days)"))
        .stdout(predicate::str::contains("cramps"))
        .stdout(predicate::str::contains("ibuprofen"))
        .stdout(predicate::str::contains("Average sleep: 6.5 h"));
}

#[test]
fn test_context_lists_recent_periods() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    log_period(dir, "2024-03-01");

    cli(dir)
        .args(["context", "--today", "2024-03-11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User's Menstrual Health Data:"))
        .stdout(predicate::str::contains("(10 days ago)"))
        .stdout(predicate::str::contains("- 2024-03-01: Flow medium"));
}

#[test]
fn test_export_csv() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    log_period(dir, "2024-01-01");
    log_period(dir, "2024-01-29");

    let csv_path = dir.join("export/luna.csv");
    cli(dir)
        .arg("export")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 entries"));

    let csv_content = fs::read_to_string(&csv_path).unwrap();
    assert!(csv_content.starts_with("id,date,log_type"));
    assert_eq!(csv_content.lines().count(), 3);
}

#[test]
fn test_config_file_defaults() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let config_path = dir.join("custom.toml");
    fs::write(
        &config_path,
        format!(
            "[data]\ndata_dir = {:?}\nuser = \"robin\"\n\n[defaults]\naverage_cycle_length = 32\n",
            dir.join("elsewhere")
        ),
    )
    .unwrap();

    Command::cargo_bin("luna")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .args(["status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cycle_length\": 32"));

    Command::cargo_bin("luna")
        .unwrap()
        .arg("--config")
        .arg(&config_path)
        .args(["log", "--date", "2024-01-01", "--notes", "hello"])
        .assert()
        .success();
    assert!(dir.join("elsewhere/robin/logs.jsonl").exists());
}

#[test]
fn test_context_json_is_chat_request() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    log_period(dir, "2024-03-01");

    let history: Vec<serde_json::Value> = (0..15)
        .map(|i| {
            serde_json::json!({
                "role": if i % 2 == 0 { "user" } else { "assistant" },
                "content": format!("message {}", i),
            })
        })
        .collect();
    let history_path = dir.join("history.json");
    fs::write(&history_path, serde_json::to_string(&history).unwrap()).unwrap();

    let output = cli(dir)
        .args(["context", "--today", "2024-03-11", "--json", "--history"])
        .arg(&history_path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let request: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let messages = request["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 12);
    assert_eq!(messages[0]["content"], "message 3");
    assert!(request["systemPrompt"]
        .as_str()
        .unwrap()
        .contains("- Last period started: 2024-03-01 (10 days ago)"));

    cli(dir)
        .args(["context", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"messages\": []"));
}

#[test]
fn test_settings_set_keeps_config_defaults_live() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let config_path = dir.join("custom.toml");
    let write_config = |cycle: u32| {
        fs::write(
            &config_path,
            format!(
                "[data]\ndata_dir = {:?}\n\n[defaults]\naverage_cycle_length = {}\n",
                dir.join("data"),
                cycle
            ),
        )
        .unwrap();
    };

    write_config(30);
    cli(dir)
        .arg("--config")
        .arg(&config_path)
        .args(["settings", "set", "--period-length", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Average cycle length:  30 days"));

    let stored: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.join("data/default/settings.json")).unwrap(),
    )
    .unwrap();
    assert!(stored["average_cycle_length"].is_null());
    assert_eq!(stored["average_period_length"], 4);

    write_config(33);
    cli(dir)
        .arg("--config")
        .arg(&config_path)
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Average cycle length:  33 days"))
        .stdout(predicate::str::contains("Average period length: 4 days"));
}
