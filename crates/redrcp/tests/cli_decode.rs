#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::Command;

fn capture_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "redrcp-{tag}-{}-{}.txt",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_redrcp"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("redrcp should run")
}

#[test]
fn decode_hex_capture_prints_frames_as_json() {
    let path = capture_path("decode");
    // StartAutoRead2 response, a tag notification with a corrupted CRC, and
    // a completion-style notification.
    std::fs::write(
        &path,
        "BB 01 36 00 01 00 7E 00 00\n\
         BB 00 03 00 01 01 7E 7B 9A\n\
         00 00 BB 02 22 00 02 30 00 7E FF FF\n\
         BB 00 36 00 00 7E 85 25\n",
    )
    .expect("capture should be writable");

    let output = run(&["--format", "json", "decode", "--hex", path.to_str().unwrap()]);
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "stdout: {stdout}");

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["kind"], "command");
    assert_eq!(first["code"], 3);
    assert_eq!(first["name"], "GetReaderInformation");
    assert_eq!(first["payload"], "01");

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["name"], "StartAutoRead2");
    assert_eq!(second["payload_size"], 0);
}

#[test]
fn decode_rejects_bad_hex_with_usage_code() {
    let path = capture_path("badhex");
    std::fs::write(&path, "BB 0").expect("capture should be writable");

    let output = run(&["decode", "--hex", path.to_str().unwrap()]);
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn decode_missing_file_fails() {
    let output = run(&["decode", "/nonexistent/redrcp/capture.bin"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed reading"));
}

#[test]
fn version_prints_package_version() {
    let output = run(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("redrcp {}", env!("CARGO_PKG_VERSION"))
    );
}
