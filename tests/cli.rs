use std::io::Write;
use std::process::{Command, Output, Stdio};

fn vis(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_vis"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Can start the binary");
    child
        .stdin
        .take()
        .expect("Has stdin")
        .write_all(stdin)
        .expect("Can write stdin");
    child.wait_with_output().expect("Binary finishes")
}

#[test]
fn argument_without_trailing_newline() {
    let output = vis(&["-a", "hello world"], b"");
    assert!(output.status.success());
    assert_eq!(output.stdout, br"hello\sworld");

    let output = vis(&["-d", "-a", r"a\\b\007"], b"");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"a\\b\x07");
}

#[test]
fn stream_from_stdin() {
    let output = vis(&[], b"tab\there\n");
    assert!(output.status.success());
    assert_eq!(output.stdout, br"tab\there\n");

    let output = vis(&["-d", "-"], br"tab\there\n");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"tab\there\n");
}

#[test]
fn wrong_usage_exits_with_one() {
    let output = vis(&["-a", "x", "extra"], b"");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage: vis"));
}

#[test]
fn decode_error_reported_once() {
    let output = vis(&["-d", "-a", r"\9"], b"");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("invalid escape sequence").count(), 1, "{}", stderr);
    assert!(!stderr.contains('\x1b'), "{}", stderr);
}
