use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const MACHINE: &str = r#"
program: machine
help: true
flags:
  - key: -p
    policy: optional
    description: Specify power output.
    args:
      - name: number_watts
        description: An integer representing the number of watts.
        convert: { type: integer }
  - key: --speed
    description: Specify the speed.
    flags:
      - exclusive: mandatory
        members:
          - key: slow
          - key: medium
          - key: fast
            flags:
              - key: --limit
                policy: optional
                args:
                  - name: speed_limit
                    convert: { type: integer, min: 0, max: 50 }
"#;

fn write_grammar(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("failed to write grammar");
    path
}

fn argtree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_argtree"))
        .args(args)
        .output()
        .expect("failed to run argtree")
}

#[test]
fn check_prints_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path(), "machine.yaml", MACHINE);

    let out = argtree(&[
        "check",
        "--grammar",
        grammar.to_str().unwrap(),
        "--",
        "-p",
        "10",
        "--speed",
        "fast",
        "--limit",
        "20",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["help_requested"], false);
    assert_eq!(report["values"]["-p/number_watts"], 10);
    assert_eq!(report["values"]["--speed/fast/--limit/speed_limit"], 20);
    assert_eq!(report["choices"]["--speed/slow|medium|fast"], "fast");
}

#[test]
fn check_prints_yaml_report() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path(), "machine.yml", MACHINE);

    let out = argtree(&[
        "check",
        "--grammar",
        grammar.to_str().unwrap(),
        "--format",
        "yaml",
        "--",
        "--speed",
        "slow",
    ]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("help_requested: false"));
    assert!(stdout.contains("--speed/slow"));
}

#[test]
fn check_failure_prints_report_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path(), "machine.yaml", MACHINE);

    let out = argtree(&[
        "check",
        "--grammar",
        grammar.to_str().unwrap(),
        "--",
        "--speed",
        "slow",
        "medium",
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with(
        "Error: Cannot use slow in conjunction with medium.\nThe following flags are exclusive: slow|medium|fast"
    ));
    assert!(stderr.contains("Successfully parsed: machine --speed slow\n"));
    assert!(stderr.contains("Usage: machine [-p number_watts] --speed"));
}

#[test]
fn check_help_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path(), "machine.yaml", MACHINE);

    let out = argtree(&["check", "--grammar", grammar.to_str().unwrap(), "--", "--help"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("Usage: machine"));
}

#[test]
fn usage_prints_full_text() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path(), "machine.yaml", MACHINE);

    let out = argtree(&["usage", "--grammar", grammar.to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with(
        "Usage: machine [-p number_watts] --speed slow|medium|fast [--limit speed_limit] [--help]\n\nArguments:"
    ));
    assert!(stdout.contains("[optional] Specify power output."));
}

#[test]
fn validate_reports_count() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_grammar(dir.path(), "machine.yaml", MACHINE);
    let second = write_grammar(dir.path(), "copy.json", r#"{"args": [{"name": "input"}]}"#);

    let out = argtree(&["validate", first.to_str().unwrap(), second.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        "Validated 2 grammar file(s)."
    );
}

#[test]
fn validate_fails_on_bad_grammar() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_grammar(dir.path(), "good.yaml", MACHINE);
    let bad = write_grammar(dir.path(), "bad.yaml", "flags: [{ key: -a }, { key: -a }]");

    let out = argtree(&["validate", good.to_str().unwrap(), bad.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("error: "));
    assert!(stderr.contains("duplicate flag in scope: -a"));
}

#[test]
fn unsupported_extension_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path(), "machine.toml", "");

    let out = argtree(&["usage", "--grammar", grammar.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unsupported grammar format"));
}

#[test]
fn check_help_matches_usage_output() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path(), "machine.yaml", MACHINE);
    let path = grammar.to_str().unwrap();

    let help = argtree(&["check", "--grammar", path, "--", "-p", "3", "--help"]);
    let usage = argtree(&["usage", "--grammar", path]);
    assert_eq!(help.status.code(), Some(0));
    assert!(help.stderr.is_empty());
    assert_eq!(help.stdout, usage.stdout);
}

#[test]
fn check_conversion_failure_exits_with_status_one() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path(), "machine.yaml", MACHINE);

    let out = argtree(&[
        "check",
        "--grammar",
        grammar.to_str().unwrap(),
        "--",
        "--speed",
        "fast",
        "--limit",
        "51",
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with(
        "Error: Could not parse argument: speed_limit\nExpected value to be between 0(inclusive) and 50(inclusive).\n"
    ));
    assert!(stderr.contains("Successfully parsed: machine --speed fast --limit\n\nUsage: machine"));
}

#[test]
fn check_names_program_after_grammar_file() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = write_grammar(dir.path(), "convert.json", r#"{"args": [{"name": "input"}]}"#);

    let out = argtree(&["check", "--grammar", grammar.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("Error: Missing mandatory argument(s). Valid option(s) are: input\n"));
    assert!(stderr.contains("Successfully parsed: convert\n"));
    assert!(stderr.contains("Usage: convert input"));
}
