use std::io::Write;
use std::process::{Command, Stdio};

fn pseudomap_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pseudomap"))
}

fn write_temp_table(content: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("create temp file");
    f.write_all(content.as_bytes()).expect("write temp file");
    f
}

const TABLE: &str = "\"File\",\"Type\",\"Namespace\",\"Path\",\"Value\"
Enc,Visit,enc,class.code,\"type == \"\"I\"\" ? \"\"IMP\"\" : \"\"AMB\"\"\",,,,,,,,
Enc,Visit,enc,period.start,\"a ? b\",,,,,,,,
";

#[test]
fn test_cli_translates_file() {
    let f = write_temp_table(TABLE);
    let output = pseudomap_binary()
        .arg(f.path())
        .output()
        .expect("run pseudomap");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success());
    assert_eq!(
        stdout,
        "1,Enc,Visit,enc,class.code,\"if type==\"\"I\"\" display \"\"IMP\"\"\notherwise display \"\"AMB\"\"\"\n"
    );
    assert!(
        stderr.contains("!!! 2,Enc,Visit,enc,period.start,\"a ? b\",,,,,,,,"),
        "expected failure line in stderr, got: {}",
        stderr
    );
    assert!(
        stderr.contains("1 failed, 1 succeeded"),
        "expected summary in stderr, got: {}",
        stderr
    );
}

#[test]
fn test_cli_reads_stdin() {
    let mut child = pseudomap_binary()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn pseudomap");

    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"F,T,N,p,\"c ? a : b\",,,,,,,,\n")
        .expect("write stdin");

    let output = child.wait_with_output().expect("wait for pseudomap");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success());
    assert_eq!(stdout, "1,F,T,N,p,\"if c display a\notherwise display b\"\n");
    assert!(stderr.contains("0 failed, 1 succeeded"));
}

#[test]
fn test_cli_expression_mode() {
    let output = pseudomap_binary()
        .args(["-X", "a ? (b ? c : d) : e"])
        .output()
        .expect("run pseudomap");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert_eq!(
        stdout,
        "\"if a\n\tif b display c\n\totherwise display d\notherwise display e\"\n"
    );
}

#[test]
fn test_cli_expression_error_formatted() {
    let output = pseudomap_binary()
        .args(["--expr", "a ? b"])
        .output()
        .expect("run pseudomap");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success());
    assert!(
        stderr.contains("E0001"),
        "expected error code E0001 in stderr, got: {}",
        stderr
    );
    assert!(
        !stderr.contains("UnexpectedToken {"),
        "stderr contains raw Debug output: {}",
        stderr
    );
    assert!(stderr.contains("1 failed, 0 succeeded"));
}

#[test]
fn test_cli_indent_else_flag() {
    let output = pseudomap_binary()
        .args(["--indent-else", "-X", "a ? b : c ? d : e"])
        .output()
        .expect("run pseudomap");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "\"if a display b\notherwise\n\tif c display d\n\totherwise display e\"\n"
    );
}

#[test]
fn test_cli_token_dump() {
    let output = pseudomap_binary()
        .args(["--tokens", "-X", "a?.b"])
        .output()
        .expect("run pseudomap");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert_eq!(stdout.lines().count(), 4);
    assert!(stdout.contains("'?.'"));
    assert!(stdout.contains("end of expression"));
}

#[test]
fn test_cli_missing_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let missing = dir.path().join("missing.csv");
    let output = pseudomap_binary()
        .arg(&missing)
        .output()
        .expect("run pseudomap");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(
        stderr.contains("failed to open"),
        "expected open failure in stderr, got: {}",
        stderr
    );
}

#[test]
fn test_cli_file_and_expr_conflict() {
    let f = write_temp_table(TABLE);
    let output = pseudomap_binary()
        .arg(f.path())
        .args(["-X", "a"])
        .output()
        .expect("run pseudomap");

    assert!(!output.status.success());
}
