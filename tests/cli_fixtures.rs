use std::path::PathBuf;
use std::process::Command;

use serde_json::{json, Value};

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gesture_cli"))
}

fn scratch_file(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gesture_cli_tests_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir.join(name)
}

#[test]
fn replay_fixture_succeeds() {
    let output = cli()
        .args(["replay", "--fixture", "walk_and_shoot"])
        .output()
        .expect("failed to run gesture_cli replay");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("replay report JSON payload");
    assert_eq!(json["fixture"], "walk_and_shoot");
    assert_eq!(json["state_count"], 5);
    assert_eq!(json["states"][2]["state"]["combat"], "FIRE");
}

#[test]
fn replay_fixture_detects_mismatch() {
    let expect_path = scratch_file("fist_stop_incorrect.expect.json");
    let wrong = json!({
        "fixture": "fist_stop",
        "states": [{ "movement": "FORWARD", "combat": "FIRE" }]
    });
    std::fs::write(&expect_path, wrong.to_string()).expect("write expectation");

    let output = cli()
        .args([
            "replay",
            "--fixture",
            "fist_stop",
            "--expect",
            &expect_path.to_string_lossy(),
        ])
        .output()
        .expect("failed to run gesture_cli replay");
    assert_eq!(
        output.status.code(),
        Some(2),
        "mismatch should exit with status 2"
    );

    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    let start = stderr.find('{').expect("diff JSON on stderr");
    let diff: Value = serde_json::from_str(stderr[start..].trim()).expect("diff payload");
    let failures = diff["failures"].as_array().expect("failures array");
    assert_eq!(failures[0]["index"], 0);
    assert_eq!(failures[0]["actual"]["state"]["movement"], "STOP");

    let _ = std::fs::remove_file(&expect_path);
}

#[test]
fn replay_writes_output_file() {
    let output_path = scratch_file("hand_dropout_report.json");
    let output = cli()
        .args([
            "replay",
            "--fixture",
            "hand_dropout",
            "--output",
            &output_path.to_string_lossy(),
        ])
        .output()
        .expect("failed to run gesture_cli replay");
    assert!(output.status.success());

    let contents = std::fs::read_to_string(&output_path).expect("report written");
    let json: Value = serde_json::from_str(&contents).expect("report JSON");
    assert_eq!(json["fixture"], "hand_dropout");
    assert_eq!(json["state_count"], 2);

    let _ = std::fs::remove_file(&output_path);
}

#[test]
fn stream_emits_one_line_per_state() {
    let output = cli()
        .args(["stream", "--fixture", "hand_dropout"])
        .output()
        .expect("failed to run gesture_cli stream");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("JSON line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["state"]["movement"], "STOP");
}

#[test]
fn dump_fixtures_lists_bundled_fixtures() {
    let output = cli()
        .arg("dump-fixtures")
        .output()
        .expect("failed to run gesture_cli dump-fixtures");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    for name in ["fist_stop", "hand_dropout", "walk_and_shoot"] {
        assert!(
            stdout.lines().any(|line| line.starts_with(name)),
            "missing fixture {name} in:\n{stdout}"
        );
    }
}

#[test]
fn insights_reads_history_file() {
    let history_path = scratch_file("history.json");
    let snapshot = |id: &str, ended_at: u64, accuracy: f32, wave: u32| {
        json!({
            "id": id,
            "endedAt": ended_at,
            "score": 2_000,
            "accuracy": accuracy,
            "kills": 12,
            "highestWave": wave,
            "durationMs": 120_000,
            "difficulty": "veteran"
        })
    };
    let history = json!([
        snapshot("s3", 3_000, 92.0, 10),
        snapshot("s2", 2_000, 90.0, 8),
        snapshot("s1", 1_000, 88.0, 6),
        { "id": "", "accuracy": "broken" }
    ]);
    std::fs::write(&history_path, history.to_string()).expect("write history");

    let output = cli()
        .args(["insights", "--history", &history_path.to_string_lossy()])
        .output()
        .expect("failed to run gesture_cli insights");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("insights JSON");
    assert_eq!(json["totalSessions"], 3);
    assert_eq!(json["bestWave"], 10);
    assert_eq!(json["recommendedDifficulty"], "elite");

    let _ = std::fs::remove_file(&history_path);
}

#[test]
fn simulate_reports_match_outcome() {
    let output = cli()
        .args([
            "simulate",
            "--frames",
            "90",
            "--frame-ms",
            "1",
            "--reload-ms",
            "20",
            "--seed",
            "3",
            "--difficulty",
            "veteran",
        ])
        .output()
        .expect("failed to run gesture_cli simulate");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let json: Value = serde_json::from_slice(&output.stdout).expect("simulation JSON");
    assert_eq!(json["seed"], 3);
    assert!(json["frames_processed"].as_u64().unwrap_or_default() <= 90);
    assert_eq!(json["final_state"]["difficulty"], "veteran");
    assert!(json["final_state"]["ammo"].as_u64().unwrap_or_default() <= 10);
}
