#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn vesclink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vesclink"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("vesclink should run")
}

fn stdout_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect()
}

#[test]
fn encode_duty_prints_frame_hex() {
    let output = vesclink(&["--format", "pretty", "encode", "duty", "0.5"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "0205050000c3503aa503"
    );
}

#[test]
fn encode_negative_setpoint() {
    let output = vesclink(&["--format", "json", "encode", "current", "-2.5"]);
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines[0]["name"], "SetCurrent");
    assert_eq!(lines[0]["type_id"], 6);
}

#[test]
fn encode_raw_writes_bytes() {
    let output = vesclink(&["--format", "raw", "encode", "values"]);
    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0x02, 0x01, 0x04, 0x40, 0x84, 0x03]);
}

#[test]
fn encode_setpoint_without_value_is_usage_error() {
    let output = vesclink(&["encode", "rpm"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn decode_hex_skips_garbage() {
    let output = vesclink(&[
        "--format",
        "json",
        "decode",
        "--hex",
        "ff 00 0205050000c3503aa503 020104408403",
    ]);
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["name"], "SetDuty");
    assert_eq!(lines[0]["fields"]["duty"], 0.5);
    assert_eq!(lines[1]["name"], "RequestValues");
}

#[test]
fn decode_recovers_frame_after_corrupt_one() {
    // Duty frame with a flipped payload bit, then a telemetry request.
    let output = vesclink(&[
        "--format",
        "json",
        "decode",
        "--hex",
        "0205050000d3503aa503020104408403",
    ]);
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["name"], "RequestValues");
}

#[test]
fn decode_reads_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_vesclink"))
        .args(["--format", "json", "decode"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("decode should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(&[0x02, 0x05, 0x08, 0x00, 0x00, 0x03, 0xE8, 0x2B, 0x58, 0x03])
        .expect("stdin should accept bytes");

    let output = child.wait_with_output().expect("decode should finish");
    assert!(output.status.success());
    let lines = stdout_lines(&output);
    assert_eq!(lines[0]["name"], "SetRPM");
    assert_eq!(lines[0]["fields"]["rpm"], 1000.0);
}

#[test]
fn decode_without_packets_is_data_invalid() {
    let output = vesclink(&["decode", "--hex", "00112233"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn info_on_missing_port_is_transport_error() {
    let output = vesclink(&[
        "info",
        "/dev/vesclink-missing-port",
        "--timeout",
        "1s",
    ]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn version_reports_package_version() {
    let output = vesclink(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("vesclink {}", env!("CARGO_PKG_VERSION"))
    );
}
