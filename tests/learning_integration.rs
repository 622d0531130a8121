//! Integration tests for the larder CLI
//!
//! Drives the compiled binary end to end: record history, learn
//! patterns, and read them back. Each test gets its own data directory
//! by running with a temp working directory containing `.larder`.

use chrono::{Datelike, Duration, Utc};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Run larder with a temp working directory and return (success, stdout, stderr)
fn run_larder(dir: &Path, args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_larder"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to execute larder");

    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

/// Temp workspace with a project-local `.larder` data directory
fn setup_workspace() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    std::fs::create_dir(temp.path().join(".larder")).expect("Failed to create .larder");
    let (success, _, stderr) = run_larder(temp.path(), &["init"]);
    assert!(success, "larder init should succeed: {}", stderr);
    temp
}

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();
    let (success, stdout, _) = run_larder(temp.path(), &["--version"]);
    assert!(success, "larder --version should succeed");
    assert!(stdout.contains("larder"), "Version output should contain 'larder'");
}

#[test]
fn test_status_reports_initialized() {
    let temp = setup_workspace();
    let (success, stdout, _) = run_larder(temp.path(), &["status"]);
    assert!(success);
    assert!(stdout.contains("INITIALIZED"), "Status should report initialized: {}", stdout);
}

#[test]
fn test_learn_requires_two_records() {
    let temp = setup_workspace();

    let (success, _, _) = run_larder(temp.path(), &["add", "Butter", "0.2", "kg"]);
    assert!(success);

    let (success, stdout, _) = run_larder(temp.path(), &["learn", "Butter"]);
    assert!(success);
    assert!(
        stdout.contains("Not enough data"),
        "Single record should not produce a pattern: {}",
        stdout
    );

    let (success, stdout, _) = run_larder(temp.path(), &["pattern", "Butter"]);
    assert!(success);
    assert!(stdout.contains("No pattern learned yet"));
}

#[test]
fn test_learn_single_week_pattern() {
    let temp = setup_workspace();

    // Two records on the same day land in one weekly bucket
    let (success, _, _) = run_larder(temp.path(), &["add", "Milk", "2", "liters"]);
    assert!(success);
    let (success, _, _) = run_larder(temp.path(), &["add", "Milk", "3", "liters"]);
    assert!(success);

    let (success, stdout, stderr) = run_larder(temp.path(), &["learn", "Milk"]);
    assert!(success, "learn should succeed: {}", stderr);
    assert!(stdout.contains("Learned pattern for 'Milk'"), "{}", stdout);
    assert!(stdout.contains("5.0"), "Weekly average should be 5.0: {}", stdout);
    assert!(stdout.contains("stable"), "Two records give a stable trend: {}", stdout);

    let (success, stdout, _) = run_larder(temp.path(), &["pattern", "Milk"]);
    assert!(success);
    assert!(stdout.contains("Average weekly usage: 5.0 liters"), "{}", stdout);
    assert!(stdout.contains("Data points: 2"), "{}", stdout);
}

#[test]
fn test_learn_detects_increasing_trend() {
    let temp = setup_workspace();

    // Eight consecutive weeks: four at 10, then four at 20. Dates are
    // pinned to Mondays so each record is its own weekly bucket.
    let today = Utc::now().date_naive();
    let this_monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);

    for week in 0..8i64 {
        let date = (this_monday - Duration::weeks(7 - week)).to_string();
        let quantity = if week < 4 { "10" } else { "20" };
        let (success, _, stderr) = run_larder(
            temp.path(),
            &["add", "Oats", quantity, "cups", "--date", date.as_str()],
        );
        assert!(success, "add should succeed: {}", stderr);
    }

    let (success, stdout, stderr) = run_larder(temp.path(), &["learn", "Oats"]);
    assert!(success, "learn should succeed: {}", stderr);
    assert!(stdout.contains("Trend: increasing"), "{}", stdout);
    assert!(
        stdout.contains("Increase weekly order by 15-20%"),
        "High-confidence increase should be recommended: {}",
        stdout
    );
    assert!(
        stdout.contains("Low waste - good quantity management"),
        "No waste recorded should read as low waste: {}",
        stdout
    );
}

#[test]
fn test_learn_all_and_summary() {
    let temp = setup_workspace();

    let (success, _, _) = run_larder(temp.path(), &["add", "Milk", "2", "liters"]);
    assert!(success);
    let (success, _, _) = run_larder(temp.path(), &["add", "Milk", "3", "liters"]);
    assert!(success);
    let (success, _, _) = run_larder(temp.path(), &["add", "Bread", "1", "loaves"]);
    assert!(success);

    let (success, stdout, _) = run_larder(temp.path(), &["learn-all"]);
    assert!(success);
    // Bread has one record and is skipped
    assert!(stdout.contains("1 of 2 items"), "{}", stdout);

    let (success, stdout, _) = run_larder(temp.path(), &["summary"]);
    assert!(success);
    assert!(stdout.contains("Items tracked: 1"), "{}", stdout);
    assert!(stdout.contains("stable: 1"), "{}", stdout);

    let (success, stdout, _) = run_larder(temp.path(), &["stats"]);
    assert!(success);
    assert!(stdout.contains("Records: 3"), "{}", stdout);
    assert!(stdout.contains("learn_all"), "Learning log should record the run: {}", stdout);
}

#[test]
fn test_waste_flows_into_recommendation() {
    let temp = setup_workspace();

    let (success, _, _) = run_larder(
        temp.path(),
        &["add", "Spinach", "90", "grams", "--waste", "30"],
    );
    assert!(success);
    let (success, _, _) = run_larder(temp.path(), &["add", "Spinach", "90", "grams"]);
    assert!(success);

    let (success, stdout, _) = run_larder(temp.path(), &["learn", "Spinach"]);
    assert!(success);
    // 30 / (180 + 30) = 14.3% wasted
    assert!(stdout.contains("High waste (14.3%)"), "{}", stdout);
}

#[test]
fn test_add_rejects_negative_quantity() {
    let temp = setup_workspace();
    let (success, _, stderr) = run_larder(temp.path(), &["add", "Milk", "--", "-1", "liters"]);
    assert!(!success, "Negative quantity should be rejected: {}", stderr);
}
