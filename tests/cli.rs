//! Command-line driver

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn polyport(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_polyport"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "off")
        .output()
        .expect("run polyport")
}

#[test]
fn test_directory_conversion_writes_named_outputs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("nested")).expect("mkdir");
    fs::write(src.join("math.py"), "def add(a: int, b: int) -> int:\n    return a + b\n").expect("write");
    fs::write(src.join("nested").join("shapes.py"), "class Point:\n    def __init__(self, x: int):\n        self.x = x\n").expect("write");
    fs::write(src.join("README.txt"), "not code").expect("write");

    let output = polyport(&["src", "--to", "go", "--out", "out"], dir.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let add = fs::read_to_string(dir.path().join("out").join("add.go")).expect("add.go");
    assert!(add.contains("func Add(a int64, b int64) int64 {"), "{}", add);
    assert!(dir.path().join("out").join("nested").join("point.go").is_file());
    assert!(!dir.path().join("out").join("README.go").exists());
}

#[test]
fn test_diagnostics_json_reports_degraded_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("lib.rs"),
        "pub fn a() -> i64 {\n    return 1;\n}\n\nmacro_rules! m { () => {} }\n",
    )
    .expect("write");

    let output = polyport(&["lib.rs", "--to", "python", "--diagnostics-json"], dir.path());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("def a() -> int:"), "{}", stdout);
    assert!(stdout.contains("# OPAQUE: macro_rules! m"), "{}", stdout);

    let report: serde_json::Value = serde_json::from_slice(&output.stderr).expect("json on stderr");
    let errors = &report[0]["diagnostics"]["errors"];
    assert_eq!(errors.as_array().map(Vec::len), Some(1), "{}", report);
    assert_eq!(errors[0]["kind"], "parse-error");
}

#[test]
fn test_unknown_target_is_rejected_up_front() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("a.py"), "def f():\n    pass\n").expect("write");
    let output = polyport(&["a.py", "--to", "cobol"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cobol"));
}

#[test]
fn test_explicit_file_needs_a_known_language() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("script.xyz"), "def f() -> None:\n    pass\n").expect("write");
    let output = polyport(&["script.xyz", "--to", "rust"], dir.path());
    assert!(!output.status.success());

    let output = polyport(&["script.xyz", "--to", "rust", "--from", "python"], dir.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("pub fn f() {"));
}
