//! Evaluator round-trips. These drive the real interpreter and skip with
//! a notice when luajit is not installed.

use super::helpers::*;

#[test]
fn e2e_eval_splices_a_value_expression() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted("print(#eval 1 + 2)");
    assert_eq!(stdout, "3\n");
}

#[test]
fn e2e_eval_sees_earlier_bindings() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted("local a = 21\nprint(#eval a * 2)");
    assert_eq!(stdout, "42\n");
}

#[test]
fn e2e_eval_replays_reassignments() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted("local a = 1\na = a + 10\nprint(#eval a)");
    assert_eq!(stdout, "11\n");
}

#[test]
fn e2e_eval_sees_functions() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted(
        "local function double(n)\nreturn n * 2\nend\nprint(#eval double(21))",
    );
    assert_eq!(stdout, "42\n");
}

#[test]
fn e2e_eval_round_trips_strings() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted("print(#eval \"a\" .. \"b\")");
    assert_eq!(stdout, "ab\n");
}

#[test]
fn e2e_eval_round_trips_tables() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted("local t = #eval {x = 7}\nprint(t.x)");
    assert_eq!(stdout, "7\n");
}

#[test]
fn e2e_eval_error_maps_to_source_line() {
    if !luajit_available() {
        return;
    }
    let err = emit_err("local x = nil\nreturn #eval x.y");
    assert_eq!(err.line, 2);
    assert!(err.message.contains("index"), "{}", err.message);
}

#[test]
fn e2e_assert_true_is_a_no_op() {
    if !luajit_available() {
        return;
    }
    let out = emit_body("#assert 1 == 1\nlocal a = 1");
    assert_eq!(out, "local a = 1\n");
}

#[test]
fn e2e_assert_false_aborts_the_build() {
    if !luajit_available() {
        return;
    }
    let err = emit_err("local ok = true\n#assert 1 == 2");
    assert_eq!(err.line, 2);
    assert!(err.message.contains("assert"), "{}", err.message);
}

#[test]
fn e2e_load_expression_splices_the_fragment() {
    if !luajit_available() {
        return;
    }
    let out = emit_body("return #load \"1+1\"");
    assert_eq!(out, "return (1 + 1)\n");
}

#[test]
fn e2e_load_statement_splices_the_fragment() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted("#load \"print('hi')\"");
    assert_eq!(stdout, "hi\n");
}

#[test]
fn e2e_load_computed_source() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted("print(#load (\"1\" .. \"+\" .. \"2\"))");
    assert_eq!(stdout, "3\n");
}

#[test]
fn e2e_load_rejects_non_strings() {
    if !luajit_available() {
        return;
    }
    let err = emit_err("#load 42");
    assert!(
        err.message.contains("did not produce a string"),
        "{}",
        err.message
    );
    assert_eq!(err.line, 1);
}

#[test]
fn e2e_checkcall_success_keeps_the_call() {
    if !luajit_available() {
        return;
    }
    let source = "#checkcall ascii_map(...)\n\
                  local n = select(\"#\", ...)\n\
                  local w = string.len((select(1, ...)))\n\
                  for i = 2, n do\n\
                  assert(string.len((select(i, ...))) == w, \"rows differ in width\")\n\
                  end\n\
                  end\n\
                  ascii_map(\"xxxxxxxx\", \"x      x\", \"xxxxxxxx\")";
    let out = emit_body(source);
    assert!(out.contains("ascii_map(\"xxxxxxxx\", \"x      x\", \"xxxxxxxx\")"), "{out}");
}

#[test]
fn e2e_checkcall_failure_points_at_the_call_site() {
    if !luajit_available() {
        return;
    }
    let source = "#checkcall ascii_map(...)\n\
                  local n = select(\"#\", ...)\n\
                  local w = string.len((select(1, ...)))\n\
                  for i = 2, n do\n\
                  assert(string.len((select(i, ...))) == w, \"rows differ in width\")\n\
                  end\n\
                  end\n\
                  ascii_map(\"xxxxxxxx\", \"x      x\", \"xxxxxxxxx\")";
    let err = emit_err(source);
    assert_eq!(err.line, 8);
    assert!(err.message.contains("rows differ in width"), "{}", err.message);
}

#[test]
fn e2e_debug_expands_when_enabled() {
    if !luajit_available() {
        return;
    }
    let out = emit_with(
        "#debug \"n = %d\", 4\nlocal a = 1",
        complua_compiler::Options {
            debug: true,
            line_info: false,
            ..complua_compiler::Options::default()
        },
    );
    // The directive runs at compile time and leaves nothing behind
    assert!(out.ends_with("local a = 1\n"), "{out}");
}

#[test]
fn e2e_eval_functions_survive_the_boundary() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted(
        "local f = #eval function(n)\nreturn n + 1\nend\nprint(f(41))",
    );
    assert_eq!(stdout, "42\n");
}

#[test]
fn e2e_repr_round_trips_at_runtime() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted("print(#repr \"hi\")");
    assert_eq!(stdout, "\"hi\"\n");
}
