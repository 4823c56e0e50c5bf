use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "haulplan-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn haulplan() -> Command {
    Command::new(env!("CARGO_BIN_EXE_haulplan"))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let output_path = temp_path("list");
    let status = haulplan()
        .args(["scenarios", "--list", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("Two-Shift Delivery"));
}

#[test]
fn cli_plan_writes_json_contract() {
    let output = haulplan()
        .args([
            "plan",
            "--miles",
            "855",
            "--cycle-used",
            "14",
            "--driver",
            "R. Diaz",
            "--start-date",
            "2026-10-19",
            "--report",
            "json",
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json body");
    assert_eq!(value["meta"]["driver_name"], "R. Diaz");
    assert_eq!(value["meta"]["start_date"], "2026-10-19");
    assert_eq!(value["route"]["distance_mi"], 855.0);
    assert_eq!(value["trip_stats"]["trip_days"], 2);
    assert_eq!(value["rest_stops"].as_array().map(Vec::len), Some(1));
}

#[test]
fn cli_plan_csv_to_file() {
    let output_path = temp_path("csv");
    let status = haulplan()
        .args(["plan", "--miles", "1200", "--cycle-used", "0", "--report", "csv"])
        .arg("--output")
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("day,date,status,start,end,hours,note"));
    assert!(content.contains("Pickup"));
    assert!(content.contains("Dropoff"));
}

#[test]
fn cli_cycle_exhaustion_exits_two() {
    let output = haulplan()
        .args(["plan", "--miles", "2000", "--cycle-used", "68"])
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Compliance warning"));
}

#[test]
fn cli_invalid_input_exits_one() {
    let output = haulplan()
        .args(["plan", "--miles=-5", "--cycle-used", "0", "--report", "json"])
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json error");
    assert_eq!(value["error"]["kind"], "invalid_input");
}

#[test]
fn cli_rules_file_overrides_defaults() {
    let rules_path = temp_path("rules");
    std::fs::write(&rules_path, r#"{"reset_status": "sleeper"}"#).expect("write rules");
    let output = haulplan()
        .args(["plan", "--miles", "855", "--cycle-used", "0", "--report", "json", "--rules"])
        .arg(&rules_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json body");
    let sleeper: f64 = value["days"]
        .as_array()
        .expect("days")
        .iter()
        .filter_map(|day| day["totals"]["sleeper"].as_f64())
        .sum();
    assert!((sleeper - 10.0).abs() < 1e-9);
    let _ = std::fs::remove_file(rules_path);
}

#[test]
fn cli_scenarios_pass() {
    let output = haulplan()
        .args(["scenarios", "--iterations", "1", "--report", "markdown"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Haulplan Scenario Results"));
    assert!(!stdout.contains("❌"));
}

#[test]
fn cli_sweep_digest_is_reproducible() {
    let run = || {
        let output = haulplan()
            .args(["sweep", "--seeds", "7,42", "--iterations", "25", "--report", "json"])
            .output()
            .expect("run cli");
        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
        value["digest"].as_str().map(ToString::to_string)
    };
    let first = run();
    assert!(first.is_some());
    assert_eq!(first, run());
}

#[test]
fn cli_unknown_scenario_fails() {
    let output = haulplan()
        .args(["scenarios", "--names", "moon run"])
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown scenario"));
}
