//! File-based integration tests for the `middlec` binary itself (as opposed
//! to `tests/end_to_end.rs`, which drives the library directly). Grounded in
//! the teacher's own `tempfile`-based file-system tests (`compiler/src/script.rs`,
//! `compiler/src/resolver.rs`) and its use of `serial_test` to keep tests that
//! touch process-wide state (here: spawning a subprocess that reads `RUST_LOG`
//! from the shared environment) from interfering with each other.

use quillc_middle::ast::{AstBuilder, Param, Program, TypeExprKind};
use serial_test::serial;
use std::io::Write;
use std::process::Command;

fn sample_program_json() -> String {
    // fn add(a: i64, b: i64) -> i64 { return a + b; }
    let mut b = AstBuilder::new();
    let a = b.ident("a");
    let bb = b.ident("b");
    let sum = b.binary(quillc_middle::ast::BinaryOp::Add, a, bb);
    let ret = b.ret(Some(sum));
    let body = b.block(vec![ret]);
    let params = vec![
        Param { name: "a".to_string(), type_expr: TypeExprKind::Named("i64".to_string()), default_value: None },
        Param { name: "b".to_string(), type_expr: TypeExprKind::Named("i64".to_string()), default_value: None },
    ];
    let decl = b.fn_decl("add", params, Some(TypeExprKind::Named("i64".to_string())), body);
    let program = Program { ast: b.ast, decls: vec![decl] };
    serde_json::to_string(&program).unwrap()
}

#[test]
#[serial]
fn valid_ast_is_checked_lowered_and_dumped() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(sample_program_json().as_bytes()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_middlec"))
        .arg(file.path())
        .output()
        .expect("failed to run middlec");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- ssa add ---"));
}

#[test]
#[serial]
fn check_only_flag_skips_lowering() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(sample_program_json().as_bytes()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_middlec"))
        .arg(file.path())
        .arg("--check-only")
        .output()
        .expect("failed to run middlec");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok: no type errors"));
    assert!(!stdout.contains("--- ssa"));
}

#[test]
#[serial]
fn malformed_json_is_a_clean_failure() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"not json").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_middlec"))
        .arg(file.path())
        .output()
        .expect("failed to run middlec");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid AST JSON"));
}
