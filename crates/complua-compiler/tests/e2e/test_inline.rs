use super::helpers::*;

const SQ: &str = "#inline function sq(x) return x * x end";

#[test]
fn e2e_registration_emits_nothing() {
    assert_eq!(emit_body(SQ), "");
}

#[test]
fn e2e_call_site_expands_with_argument_substitution() {
    let out = emit_body(&format!("{SQ}\nlocal y = sq(3 + 1)"));
    assert_eq!(
        out,
        "local y = (function()\nreturn ((3 + 1) * (3 + 1))\nend)()\n"
    );
}

#[test]
fn e2e_statement_call_gets_ambiguity_guard() {
    let out = emit_body(&format!("{SQ}\nsq(2)"));
    assert!(out.starts_with(";(function()"), "{out}");
}

#[test]
fn e2e_local_rebinding_deregisters() {
    let out = emit_body(&format!("{SQ}\nlocal sq = 2\nlocal z = sq(3)"));
    assert!(out.contains("local z = sq(3)"), "{out}");
    assert!(!out.contains("function"), "{out}");
}

#[test]
fn e2e_assignment_rebinding_deregisters() {
    let out = emit_body(&format!("{SQ}\nsq = 2\nlocal z = sq(3)"));
    assert!(out.contains("local z = sq(3)"), "{out}");
}

#[test]
fn e2e_shadowing_local_stops_parameter_substitution() {
    let out = emit_body(
        "#inline function f(x) local x = 1 return x end\nlocal y = f(9)",
    );
    // The shadowing local keeps its name and later uses read it, not 9
    assert!(out.contains("local x = 1"), "{out}");
    assert!(out.contains("return x"), "{out}");
}

#[test]
fn e2e_missing_arguments_become_nil() {
    let out = emit_body("#inline function f(a, b) return a or b end\nlocal y = f(1)");
    assert!(out.contains("(1 or nil)"), "{out}");
}

#[test]
fn e2e_registration_does_not_escape_function_scope() {
    let out = emit_body(&format!(
        "local function outer()\n{SQ}\nlocal a = sq(2)\nend\nlocal b = sq(2)"
    ));
    // Inside outer: expanded; outside: a plain call
    assert!(out.contains("local b = sq(2)"), "{out}");
}

#[test]
fn e2e_inline_at_runtime() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted(&format!("{SQ}\nprint(sq(3 + 1))"));
    assert_eq!(stdout, "16\n");
}
