use super::helpers::*;

#[test]
fn e2e_defer_emits_nothing_at_appearance_site() {
    let out = emit_body("local function f()\n#defer print(1)\nlocal x = 2\nend");
    // print(1) appears exactly once, after the local
    assert_eq!(out.matches("print(1)").count(), 1);
    let local_at = out.find("local x = 2").unwrap();
    let print_at = out.find("print(1)").unwrap();
    assert!(print_at > local_at);
}

#[test]
fn e2e_defer_runs_after_return_expressions() {
    let out = emit_body(
        "local function f()\nlocal x = 1\n#defer print(x)\nx = 2\nreturn x\nend",
    );
    let ret_capture = out.find("local __complua_ret").unwrap();
    let deferred = out.find("print(x)").unwrap();
    let ret_out = out.find("return unpack(__complua_ret, 1, __complua_ret.n)").unwrap();
    assert!(ret_capture < deferred && deferred < ret_out);
}

#[test]
fn e2e_defer_order_is_insertion_order() {
    let out = emit_body("local function f()\n#defer print(1)\n#defer print(2)\nend");
    let first = out.find("print(1)").unwrap();
    let second = out.find("print(2)").unwrap();
    assert!(first < second);
}

#[test]
fn e2e_defer_flushes_at_fall_through() {
    let out = emit_body("local function f()\n#defer g()\nlocal y = 1\nend");
    let body_end = out.rfind("end").unwrap();
    let deferred = out.find("g()").unwrap();
    assert!(deferred < body_end);
}

#[test]
fn e2e_defer_in_do_block_flushes_at_block_end() {
    let out = emit_body("local function f()\ndo\n#defer g()\nlocal y = 1\nend\nlocal z = 2\nend");
    let deferred = out.find("g()").unwrap();
    let after_block = out.find("local z = 2").unwrap();
    assert!(deferred < after_block);
}

#[test]
fn e2e_plain_return_without_defers() {
    let out = emit_body("local function f()\nreturn 1, 2\nend");
    assert!(out.contains("return 1, 2"));
    assert!(!out.contains("__complua_ret"));
}

#[test]
fn e2e_defer_with_empty_return() {
    let out = emit_body("local function f()\n#defer g()\nreturn\nend");
    let deferred = out.find("g()").unwrap();
    let ret = out.find("return").unwrap();
    assert!(deferred < ret);
    assert!(!out.contains("__complua_ret"));
}

#[test]
fn e2e_defer_does_not_leak_out_of_function() {
    let out = emit_body("local function f()\n#defer g()\nend\nlocal tail = 1");
    // g() flushes inside f, not at the end of the chunk
    let g_at = out.find("g()").unwrap();
    let tail_at = out.find("local tail = 1").unwrap();
    assert!(g_at < tail_at);
    assert_eq!(out.matches("g()").count(), 1);
}

#[test]
fn e2e_defer_observes_final_value() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted(
        "local function f()\nlocal x = 1\n#defer print(x)\nx = 2\nreturn x\nend\nprint(f())",
    );
    // The deferred print sees the final value of x, then the caller
    // prints the returned value.
    assert_eq!(stdout, "2\n2\n");
}

#[test]
fn e2e_defer_order_at_runtime() {
    if !luajit_available() {
        return;
    }
    let stdout = run_emitted(
        "local function f()\n#defer print(\"a\")\n#defer print(\"b\")\nreturn 0\nend\nf()",
    );
    assert_eq!(stdout, "a\nb\n");
}
