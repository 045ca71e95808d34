use super::helpers::*;

#[test]
fn e2e_output_starts_with_prelude() {
    let out = emit_str("local x = 1");
    assert!(out.starts_with("function __complua_repr(value)"));
}

#[test]
fn e2e_local_declaration() {
    assert_eq!(emit_body("local x = 1"), "local x = 1\n");
    assert_eq!(emit_body("local a, b = 1, 2"), "local a, b = 1, 2\n");
    assert_eq!(emit_body("local a, b, c"), "local a, b, c\n");
}

#[test]
fn e2e_assignment() {
    assert_eq!(emit_body("x = 1"), "x = 1\n");
    assert_eq!(emit_body("t.k = 1"), "t.k = 1\n");
    assert_eq!(emit_body("t[1] = 2"), "t[1] = 2\n");
    assert_eq!(emit_body("a, b = b, a"), "a, b = b, a\n");
}

#[test]
fn e2e_compound_assignment_desugars() {
    assert_eq!(emit_body("x += 1"), "x = (x + 1)\n");
    assert_eq!(emit_body("x -= 1"), "x = (x - 1)\n");
    assert_eq!(emit_body("x *= 2"), "x = (x * 2)\n");
    assert_eq!(emit_body("x /= 2"), "x = (x / 2)\n");
    assert_eq!(emit_body("x %= 2"), "x = (x % 2)\n");
    assert_eq!(emit_body("x ^= 2"), "x = (x ^ 2)\n");
    assert_eq!(emit_body("s ..= \"!\""), "s = (s .. \"!\")\n");
    assert_eq!(emit_body("t.n += 1"), "t.n = (t.n + 1)\n");
}

#[test]
fn e2e_operator_precedence_is_explicit() {
    assert_eq!(emit_body("return 1 + 2 * 3"), "return (1 + (2 * 3))\n");
    assert_eq!(
        emit_body("return a < b == c < d"),
        "return ((a < b) == (c < d))\n"
    );
    assert_eq!(emit_body("return 2 ^ 3 ^ 4"), "return (2 ^ (3 ^ 4))\n");
}

#[test]
fn e2e_string_quoting() {
    assert_eq!(emit_body("return \"a\\nb\""), "return \"a\\nb\"\n");
    assert_eq!(emit_body("return 'it\\'s'"), "return \"it's\"\n");
    // Long strings re-emit as short quoted literals
    assert_eq!(emit_body("return [[hi]]"), "return \"hi\"\n");
    // Non-printable bytes use three-digit decimal escapes
    assert_eq!(emit_body("return \"\\1\" .. \"1\""), "return (\"\\001\" .. \"1\")\n");
}

#[test]
fn e2e_control_flow_shapes() {
    assert_eq!(
        emit_body("if a then f() end"),
        "if a then\nf()\nend\n"
    );
    assert_eq!(
        emit_body("if a then f() elseif b then g() else h() end"),
        "if a then\nf()\nelseif b then\ng()\nelse\nh()\nend\n"
    );
    assert_eq!(
        emit_body("while x do f() end"),
        "while x do\nf()\nend\n"
    );
    assert_eq!(
        emit_body("repeat f() until x"),
        "repeat\nf()\nuntil x\n"
    );
    assert_eq!(
        emit_body("for i = 1, 10 do f(i) end"),
        "for i = 1, 10 do\nf(i)\nend\n"
    );
    assert_eq!(
        emit_body("for i = 10, 1, -1 do f(i) end"),
        "for i = 10, 1, -1 do\nf(i)\nend\n"
    );
    assert_eq!(
        emit_body("for k, v in pairs(t) do f(k, v) end"),
        "for k, v in pairs(t) do\nf(k, v)\nend\n"
    );
    assert_eq!(emit_body("do f() end"), "do\nf()\nend\n");
}

#[test]
fn e2e_functions() {
    assert_eq!(
        emit_body("local function f(x) return x end"),
        "local function f(x)\nreturn x\nend\n"
    );
    assert_eq!(
        emit_body("function a.b:c(x, ...) return x end"),
        "function a.b:c(x, ...)\nreturn x\nend\n"
    );
    assert_eq!(
        emit_body("local f = function(...) return ... end"),
        "local f = function(...)\nreturn ...\nend\n"
    );
}

#[test]
fn e2e_calls_and_sugar() {
    assert_eq!(emit_body("f(1, 2)"), "f(1, 2)\n");
    assert_eq!(emit_body("f\"s\""), "f(\"s\")\n");
    assert_eq!(emit_body("f{1}"), "f({1})\n");
    assert_eq!(emit_body("obj:m(1)"), "obj:m(1)\n");
    assert_eq!(emit_body("a.b.c(x)"), "a.b.c(x)\n");
}

#[test]
fn e2e_table_constructor() {
    assert_eq!(
        emit_body("return {1, k = 2, [3] = 4}"),
        "return {1, k = 2, [3] = 4}\n"
    );
    assert_eq!(emit_body("return {}"), "return {}\n");
}

#[test]
fn e2e_goto_and_labels() {
    assert_eq!(emit_body("goto done\n::done::"), "goto done\n::done::\n");
}

#[test]
fn e2e_numbers() {
    assert_eq!(emit_body("return 42"), "return 42\n");
    assert_eq!(emit_body("return 1.5"), "return 1.5\n");
    assert_eq!(emit_body("return 0xff"), "return 255\n");
}

#[test]
fn e2e_length_operator() {
    assert_eq!(emit_body("return #t"), "return #t\n");
    assert_eq!(emit_body("return #t + 1"), "return (#t + 1)\n");
}

#[test]
fn e2e_do_as_expression() {
    assert_eq!(
        emit_body("local x = do return 1 end"),
        "local x = (function()\nreturn 1\nend)()\n"
    );
}

#[test]
fn e2e_line_markers_precede_statements() {
    assert_eq!(
        emit_body_with_markers("local a = 1\n\nlocal b = 2"),
        "--LINE:1\nlocal a = 1\n--LINE:3\nlocal b = 2\n"
    );
}

#[test]
fn e2e_line_markers_suppressed_in_call_arguments() {
    let out = emit_body_with_markers("f(function() local x = 1 end)");
    // One marker for the call statement, none inside the argument
    assert_eq!(out.matches("--LINE:").count(), 1);
    assert!(out.contains("local x = 1"));
}

#[test]
fn e2e_marker_restored_after_call_arguments() {
    let out = emit_body_with_markers("f(1)\nlocal a = 2");
    assert_eq!(out.matches("--LINE:").count(), 2);
}

#[test]
fn e2e_todo_statement() {
    assert_eq!(emit_body("#todo"), "error(\"Not implemented\")\n");
    assert_eq!(emit_body("#todo \"later\""), "error(\"later\")\n");
}

#[test]
fn e2e_parse_error_carries_line() {
    let e = emit_err("local a = 1\nlocal = 2");
    assert_eq!(e.line, 2);
}
