//! Integration tests for the oxidizecos binary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_oxidizecos"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run oxidizecos")
}

fn write_input(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write input file");
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

#[test]
fn test_parse_objects() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "objects.txt", b"3.140 /A#23B <<\n/B null /A 1\n>>");

    let output = run_cli(&["parse", arg(&input)]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "3.14\n/A#23B\n<< /B null /A 1 >>\n"
    );
}

#[test]
fn test_parse_deferred_indirect_stream() {
    let dir = tempdir().unwrap();
    let input = write_input(
        &dir,
        "stream.txt",
        b"8 0 obj\r\n<< /Length 5 >>\r\nstream\r\nhello\r\nendstream\r\nendobj\r\n",
    );

    let output = run_cli(&["parse", "--mode", "indirect", "--deferred", arg(&input)]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "8 0 obj\n<< /Length 5 >>\nstream\nhello\nendstream\nendobj\n\n"
    );
}

#[test]
fn test_parse_content() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "content.txt", b"q BT /F1 12 Tf (Hi) Tj ET Q");

    let output = run_cli(&["parse", "-m", "content", arg(&input)]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "q\n  BT\n    /F1 12 Tf\n    (Hi) Tj\n  ET\nQ\n"
    );
}

#[test]
fn test_strict_content_failure() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "bad.txt", b"/F1 Tf");

    let lenient = run_cli(&["parse", "-m", "content", arg(&input)]);
    assert!(lenient.status.success());

    let strict = run_cli(&["parse", "-m", "content", "--strict", arg(&input)]);
    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("Tf"));
}

#[test]
fn test_compare() {
    let dir = tempdir().unwrap();
    let a = write_input(&dir, "a.txt", b"<< /A 1 /B (x) >>");
    let b = write_input(&dir, "b.txt", b"<< /B <78> /A 1 >>");
    let c = write_input(&dir, "c.txt", b"<< /A 2 /B (x) >>");

    let cases = [
        (&a, &a, "Equal"),
        (&a, &b, "Similar"),
        (&a, &c, "Different"),
    ];
    for (left, right, expected) in cases {
        let output = run_cli(&["compare", arg(left), arg(right)]);
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), expected);
    }
}

#[test]
fn test_estimate() {
    let dir = tempdir().unwrap();
    let input = write_input(&dir, "estimate.txt", b"[1 2 3]");

    let output = run_cli(&["estimate", arg(&input)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Written size:   7 bytes"));
    assert!(stdout.contains("Estimated size:"));
}

#[test]
fn test_missing_file() {
    let output = run_cli(&["parse", "/nonexistent/input.txt"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
}
