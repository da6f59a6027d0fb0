use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

const SCENARIO_A: &str = r#"
type node struct { int value; ptr to node next; };
var ptr to node jim;
{ jim = malloc node;
  if valid jim { [@jim].value = (1 + 4); print [@jim].value; }
  free jim; }
"#;

fn ebedc() -> Command {
    Command::cargo_bin("ebedc").expect("binary builds")
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ebedc-test-{}-{name}", std::process::id()))
}

#[test]
fn emits_c_to_stdout_from_stdin() {
    ebedc()
        .write_stdin(SCENARIO_A)
        .assert()
        .success()
        .stdout(predicate::str::contains("#include <stdio.h>"))
        .stdout(predicate::str::contains("int main(void)"));
}

#[test]
fn emits_c_from_a_source_file() {
    let source = scratch_path("in.8ebed");
    fs::write(&source, SCENARIO_A).expect("writable temp dir");
    ebedc()
        .arg(&source)
        .arg("--compile-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("_eb_free_node(&jim);"));
    let _ = fs::remove_file(&source);
}

#[test]
fn output_flag_writes_the_file() {
    let out = scratch_path("out.c");
    ebedc()
        .arg("--output")
        .arg(&out)
        .write_stdin(SCENARIO_A)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let written = fs::read_to_string(&out).expect("output file exists");
    assert!(written.contains("int main(void)"));
    let _ = fs::remove_file(&out);
}

#[test]
fn safety_errors_exit_1_with_position_on_stderr() {
    ebedc()
        .write_stdin("type node struct { int v; };\nvar ptr to node p;\n{ p = malloc node; [@p].v = 1; }")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("<stdin>:3:21: safety error"))
        .stderr(predicate::str::contains("possibly-invalid pointer `p`"));
}

#[test]
fn lex_errors_exit_1() {
    ebedc()
        .write_stdin("{ $ }")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("lex error"));
}

#[test]
fn missing_source_file_exits_2() {
    ebedc()
        .arg("definitely-not-here.8ebed")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn builtin_suite_passes() {
    ebedc()
        .arg("--test")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok   simple_ok"))
        .stdout(predicate::str::contains("ok   alias_is_invalidated"))
        .stdout(predicate::str::contains("0 failed"));
}
