use super::helpers::*;

#[test]
fn e2e_read_prefers_prefix_and_falls_back() {
    assert_eq!(
        emit_body("#using ns\nreturn foo + 1"),
        "return ((ns.foo ~= nil and ns.foo or foo) + 1)\n"
    );
}

#[test]
fn e2e_nested_usings_compose_innermost_first() {
    assert_eq!(
        emit_body("#using a\n#using b\nreturn x"),
        "return (b.x ~= nil and b.x or (a.x ~= nil and a.x or x))\n"
    );
}

#[test]
fn e2e_dotted_prefix() {
    assert_eq!(
        emit_body("#using a.b\nreturn x"),
        "return (a.b.x ~= nil and a.b.x or x)\n"
    );
}

#[test]
fn e2e_write_through_chain() {
    assert_eq!(
        emit_body("#using ns\nx = 1"),
        "if ns.x ~= nil then ns.x = 1\nelse x = 1\nend\n"
    );
}

#[test]
fn e2e_write_through_innermost_first() {
    assert_eq!(
        emit_body("#using a\n#using b\nx = 1"),
        "if b.x ~= nil then b.x = 1\nelseif a.x ~= nil then a.x = 1\nelse x = 1\nend\n"
    );
}

#[test]
fn e2e_declarations_are_not_rewritten() {
    assert_eq!(
        emit_body("#using ns\nlocal foo = bar"),
        "local foo = (ns.bar ~= nil and ns.bar or bar)\n"
    );
}

#[test]
fn e2e_field_access_rewrites_the_object_only() {
    assert_eq!(
        emit_body("#using ns\nreturn t.k"),
        "return (ns.t ~= nil and ns.t or t).k\n"
    );
}

#[test]
fn e2e_call_callee_is_rewritten() {
    assert_eq!(
        emit_body("#using ns\nf(1)"),
        ";(ns.f ~= nil and ns.f or f)(1)\n"
    );
}

#[test]
fn e2e_using_ends_with_enclosing_scope() {
    let out = emit_body("do\n#using ns\nlocal y = foo\nend\nreturn foo");
    assert!(out.contains("ns.foo"), "{out}");
    assert!(out.ends_with("return foo\n"), "{out}");
}

#[test]
fn e2e_using_at_runtime() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted("ns = {}\nns.foo = 10\n#using ns\nprint(foo + 1)");
    assert_eq!(stdout, "11\n");
}

#[test]
fn e2e_write_through_at_runtime() {
    if !luajit_available() {
        return;
    }
    // foo exists in ns, so the write lands there; bar does not, so the
    // write creates a global.
    let stdout = run_emitted(
        "ns = {}\nns.foo = 1\n#using ns\nfoo = 5\nbar = 7\nprint(ns.foo, ns.bar, rawget(_G, \"bar\"))",
    );
    assert_eq!(stdout, "5\tnil\t7\n");
}
