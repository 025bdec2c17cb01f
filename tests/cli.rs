use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_metronome_cli"))
}

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8(stdout.to_vec())
        .expect("stdout utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid JSON line"))
        .collect()
}

#[test]
fn plan_prints_beat_schedule() {
    let output = cli()
        .args(["plan", "--bpm", "120", "--duration", "2"])
        .output()
        .expect("plan command");

    assert!(
        output.status.success(),
        "plan exited with {:?}",
        output.status.code()
    );
    let beats = json_lines(&output.stdout);
    let timestamps: Vec<f64> = beats
        .iter()
        .map(|b| b["timestamp"].as_f64().unwrap())
        .collect();
    assert_eq!(timestamps, vec![0.0, 0.5, 1.0, 1.5]);
    assert_eq!(beats[3]["sequence_index"], 3);
}

#[test]
fn plan_with_invalid_tempo_text_uses_default() {
    let output = cli()
        .args(["plan", "--bpm", "fast", "--duration", "1"])
        .output()
        .expect("plan command");

    assert!(output.status.success());
    let beats = json_lines(&output.stdout);
    assert_eq!(beats.len(), 2);
    assert_eq!(beats[1]["tempo_bpm"], 120.0);
}

#[test]
fn plan_applies_tempo_change() {
    let output = cli()
        .args([
            "plan",
            "--bpm",
            "60",
            "--duration",
            "3",
            "--tempo-change",
            "1.5:120",
        ])
        .output()
        .expect("plan command");

    assert!(output.status.success());
    let timestamps: Vec<f64> = json_lines(&output.stdout)
        .iter()
        .map(|b| b["timestamp"].as_f64().unwrap())
        .collect();
    assert_eq!(timestamps, vec![0.0, 1.0, 2.0, 2.5]);
}

#[test]
fn render_writes_wav() {
    let output_path =
        std::env::temp_dir().join(format!("metronome-render-{}.wav", std::process::id()));

    let output = cli()
        .args([
            "render",
            "--duration",
            "1",
            "--sample-rate",
            "8000",
            "--output",
            output_path.to_str().unwrap(),
        ])
        .output()
        .expect("render command");

    assert!(
        output.status.success(),
        "render exited with {:?}",
        output.status.code()
    );
    let reader = hound::WavReader::open(&output_path).expect("wav file");
    assert_eq!(reader.spec().sample_rate, 8000);
    assert_eq!(reader.len(), 8000);

    let _ = std::fs::remove_file(output_path);
}

#[test]
fn play_with_stub_reports_started_and_stopped() {
    let output = cli()
        .args(["play", "--stub", "--bpm", "240", "--duration", "0.6"])
        .output()
        .expect("play command");

    assert!(
        output.status.success(),
        "play exited with {:?}",
        output.status.code()
    );
    let events = json_lines(&output.stdout);
    assert_eq!(events.first().unwrap()["type"], "started");
    assert_eq!(events.last().unwrap()["type"], "stopped");
    assert!(events.iter().any(|e| e["type"] == "beat"));
}

#[test]
fn bad_tempo_change_is_rejected() {
    let output = cli()
        .args(["plan", "--tempo-change", "soon"])
        .output()
        .expect("plan command");

    assert!(!output.status.success());
}

#[test]
fn infinite_jitter_is_rejected() {
    let output = cli()
        .args(["plan", "--jitter-ms", "inf"])
        .output()
        .expect("plan command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("jitter"), "unexpected stderr: {stderr}");
}

#[test]
fn oversized_render_is_rejected_before_allocating() {
    let output_path =
        std::env::temp_dir().join(format!("metronome-huge-{}.wav", std::process::id()));

    let output = cli()
        .args([
            "render",
            "--duration",
            "1e9",
            "--output",
            output_path.to_str().unwrap(),
        ])
        .output()
        .expect("render command");

    assert_eq!(output.status.code(), Some(1));
    assert!(!output_path.exists());
}
