use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn command(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_taskcal"));
    command
        .env("TASKCAL_STORE_PATH", dir.join("tasks.json"))
        .env("TASKCAL_CONFIG_PATH", dir.join("config.json"))
        .env("TASKCAL_TODAY", "2024-01-10")
        .env("TASKCAL_DISABLE_NOTIFICATIONS", "1")
        .env_remove("TASKCAL_LOG");
    command
}

fn run(dir: &Path, args: &[&str]) -> Output {
    command(dir).args(args).output().expect("failed to run taskcal")
}

fn write_config(dir: &Path, content: serde_json::Value) {
    std::fs::write(dir.join("config.json"), content.to_string()).unwrap();
}

#[test]
fn config_week_start_shapes_calendar() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), serde_json::json!({ "week_start": "sunday" }));

    let output = run(dir.path(), &["calendar", "2024-01", "--json"]);
    assert!(output.status.success());
    let grid: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(grid["week_start"], "sunday");
    assert_eq!(grid["weeks"][0][0]["date"], "2023-12-31");

    let output = run(
        dir.path(),
        &["--config-override", "week_start=monday", "calendar", "2024-01", "--json"],
    );
    let grid: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(grid["weeks"][0][0]["date"], "2024-01-01");
}

#[test]
fn aliases_expand_from_config_and_overrides() {
    let dir = TempDir::new().unwrap();
    write_config(
        dir.path(),
        serde_json::json!({ "aliases": { "td": "day --json" } }),
    );

    let output = run(dir.path(), &["td"]);
    assert!(output.status.success());
    let day: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(day["date"], "2024-01-10");

    let output = run(
        dir.path(),
        &["--config-override=aliases.ls=list --json", "ls"],
    );
    assert!(output.status.success());
    let tasks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(tasks.as_array().unwrap().is_empty());
}

#[test]
fn invalid_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ broken").unwrap();

    let output = run(dir.path(), &["calendar", "2024-01", "--json"]);

    assert!(output.status.success());
    let grid: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(grid["week_start"], "monday");
    assert!(String::from_utf8_lossy(&output.stderr).contains("config could not be loaded"));
}

#[test]
fn bad_override_is_rejected() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &["--config-override", "colour=red", "list"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown config field 'colour'"));
}

#[test]
fn unknown_command_is_reported_as_invalid_input() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &["frobnicate"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("ERROR: invalid_input - "));
}

#[test]
fn help_exits_successfully() {
    let dir = TempDir::new().unwrap();

    let output = run(dir.path(), &["--help"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("calendar"));
}

#[test]
fn interactive_mode_runs_each_line() {
    let dir = TempDir::new().unwrap();
    let mut child = command(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn taskcal");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(
            b"add \"Buy \\\"good\\\" milk\" --due 2024-01-12\nshow nope\nlist --json\nexit\nlist\n",
        )
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("Added task: Buy \"good\" milk"));
    assert!(stdout.contains("\"due_date\":\"2024-01-12\""));
    assert!(stderr.contains("ERROR: not_found - task not found"));
    // `exit` stops the loop before the trailing table listing.
    assert!(!stdout.contains("Priority"));
}
