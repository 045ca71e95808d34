use super::helpers::*;
use complua_compiler::eval::{EvalKind, Scratch};
use complua_compiler::Options;
use tempfile::TempDir;

#[test]
fn e2e_debug_evaporates_when_off() {
    // The default build discards #debug without consulting the interpreter
    assert_eq!(emit_body("#debug \"x = %d\", 1"), "");
}

#[test]
fn e2e_checkcall_registration_emits_nothing() {
    assert_eq!(emit_body("#checkcall f(x) assert(x) end"), "");
}

#[test]
fn e2e_repr_emits_serialiser_call() {
    assert_eq!(emit_body("return #repr t"), "return __complua_repr(t)\n");
    assert_eq!(
        emit_body("return #repr {1}"),
        "return __complua_repr({1})\n"
    );
}

#[test]
fn e2e_repr_is_statement_error() {
    let e = emit_err("#repr x");
    assert!(e.message.contains("expression position"), "{}", e.message);
}

#[test]
fn e2e_scratch_handle_lifecycle() {
    let dir = TempDir::new().unwrap();
    let scratch = Scratch::create_in(dir.path()).unwrap();
    let expected = dir.path().join(".complua");
    assert!(expected.is_dir());
    let (dump, text) = scratch.artefact_paths(EvalKind::Eval);
    assert!(dump.ends_with(".eval.temp"));
    assert!(text.ends_with(".eval.temp.expr"));
    let (dump, text) = scratch.artefact_paths(EvalKind::Load);
    assert!(dump.ends_with(".load.temp"));
    assert!(text.ends_with(".load.temp.expr"));
    scratch.cleanup().unwrap();
    assert!(!expected.exists());
}

#[test]
fn e2e_missing_interpreter_is_reported() {
    let dir = TempDir::new().unwrap();
    let scratch = Scratch::create_in(dir.path()).unwrap();
    let opts = Options {
        interpreter: "complua-no-such-interpreter".to_string(),
        ..Options::default()
    };
    let err = complua_compiler::compile(b"#assert true", &scratch, &opts)
        .expect_err("evaluation should fail without an interpreter");
    assert!(err.message.contains("cannot run"), "{}", err.message);
    assert_eq!(err.line, 1);
}

#[test]
fn e2e_directives_never_reach_the_output() {
    let out = emit_body(
        "#inline function f(x) return x end\n#checkcall g(x) assert(x) end\nlocal a = 1",
    );
    assert_eq!(out, "local a = 1\n");
}
