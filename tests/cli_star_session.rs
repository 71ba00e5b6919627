use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "startopo-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const TWO_CLICKS: &str = r#"
{
    "schema_version": 1,
    "session": { "ambient_jitter": false },
    "steps": [
        { "at_ms": 0, "action": "click_device", "device": 1 },
        { "at_ms": 100, "action": "click_device", "device": 2 }
    ]
}
"#;

#[test]
fn star_session_writes_viz_json_with_meta_first() {
    let dir = unique_temp_dir("star-session-viz");
    let scenario = write_file(&dir, "scenario.json", TWO_CLICKS);
    let out_json = dir.join("viz.json");

    let output = Command::new(env!("CARGO_BIN_EXE_star_session"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--viz-json",
            out_json.to_str().unwrap(),
            "--until-ms",
            "5000",
        ])
        .output()
        .expect("run star_session");
    assert!(
        output.status.success(),
        "star_session failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let raw = fs::read_to_string(&out_json).expect("read viz.json");
    let v: Value = serde_json::from_str(&raw).expect("parse viz.json");
    let arr = v.as_array().expect("viz.json must be a JSON array");
    assert_eq!(
        arr[0].get("kind").and_then(|k| k.as_str()),
        Some("meta"),
        "expected first viz event to be meta"
    );
    let moves = arr
        .iter()
        .filter(|ev| ev.get("kind").and_then(|k| k.as_str()) == Some("packet_move"))
        .count();
    assert_eq!(moves, 2, "one transmission should draw two hops");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn star_session_exports_the_activity_log() {
    let dir = unique_temp_dir("star-session-log");
    let scenario = write_file(&dir, "scenario.json", TWO_CLICKS);
    let log_out = dir.join("network.log");

    let output = Command::new(env!("CARGO_BIN_EXE_star_session"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--log-out",
            log_out.to_str().unwrap(),
        ])
        .output()
        .expect("run star_session");
    assert!(
        output.status.success(),
        "star_session failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let log = fs::read_to_string(&log_out).expect("read log");
    assert!(log.starts_with("[00:00.000] SUCCESS: Network topology initialized - All PCs online"));
    assert!(log.contains("SUCCESS: Data successfully transmitted from PC 1 to PC 2"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let summary = stdout
        .lines()
        .find(|line| line.starts_with("done @ "))
        .expect("summary line");
    assert!(summary.contains("packets_sent=1"), "{summary}");
    assert!(summary.contains("hub=Active"), "{summary}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn star_session_rejects_unknown_devices() {
    let dir = unique_temp_dir("star-session-bad");
    let scenario = write_file(
        &dir,
        "scenario.json",
        r#"{ "schema_version": 1, "steps": [ { "at_ms": 0, "action": "click_device", "device": 12 } ] }"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_star_session"))
        .args(["--scenario", scenario.to_str().unwrap()])
        .output()
        .expect("run star_session");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown device PC 12"), "stderr={stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn star_session_runs_the_builtin_tour() {
    let output = Command::new(env!("CARGO_BIN_EXE_star_session"))
        .args(["--no-ambient", "--seed", "3"])
        .output()
        .expect("run star_session");
    assert!(
        output.status.success(),
        "star_session failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Network congestion cleared - normal operation resumed"));
    assert!(stdout.contains("Hub recovered - Network fully operational"));
    assert!(stdout.lines().any(|line| line.starts_with("done @ ")));
}

#[test]
fn star_session_rejects_zero_tick_config() {
    let dir = unique_temp_dir("star-session-zero-tick");
    let config = write_file(&dir, "config.json", r#"{ "timing": { "ambient_tick_ms": 0 } }"#);

    let output = Command::new(env!("CARGO_BIN_EXE_star_session"))
        .args(["--config", config.to_str().unwrap(), "--until-ms", "1000"])
        .output()
        .expect("run star_session");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ambient_tick_ms"), "stderr={stderr}");

    let _ = fs::remove_dir_all(&dir);
}
