//! Dependency tracker: for a node evaluated at compile time, recover the
//! chain of declarations every identifier in it depends on, in
//! declaration order. Duplicates are fine — the plain dialect tolerates
//! redeclaring a local in sequence.

use crate::env::Env;
use complua_syntax::ast::{Expr, Field, FuncBody, Stat, StatKind};
use std::rc::Rc;

/// Dependency chain for an expression.
pub fn expr_chain(expr: &Expr, env: &Env) -> Vec<Rc<Stat>> {
    let mut out = Vec::new();
    let mut visiting = Vec::new();
    walk_expr(expr, env, &mut visiting, &mut out);
    out
}

/// Dependency chain for a statement (used to log reassignments).
pub fn stat_chain(stat: &Stat, env: &Env) -> Vec<Rc<Stat>> {
    let mut out = Vec::new();
    let mut visiting = Vec::new();
    walk_stat(stat, env, &mut visiting, &mut out);
    out
}

fn resolve(name: &str, env: &Env, visiting: &mut Vec<String>, out: &mut Vec<Rc<Stat>>) {
    // A name already on the resolution stack is being defined right now;
    // re-entering it would never terminate (self-recursive functions).
    if visiting.iter().any(|n| n == name) {
        return;
    }
    let def = match env.lookup(name) {
        Some(def) => def.clone(),
        // Unresolved names are left to the interpreter: stdlib globals
        // work, anything else becomes a mapped runtime error.
        None => return,
    };
    visiting.push(name.to_string());
    walk_stat(&def, env, visiting, out);
    out.push(def);
    // Replay every logged reassignment of this name, each with the
    // dependency chain recorded at its point.
    for record in &env.assigns {
        if record.name == name {
            out.extend(record.chain.iter().cloned());
            out.push(record.stat.clone());
        }
    }
    visiting.pop();
}

fn walk_stat(stat: &Stat, env: &Env, visiting: &mut Vec<String>, out: &mut Vec<Rc<Stat>>) {
    match &stat.kind {
        StatKind::Local { exprs, .. } => walk_exprs(exprs, env, visiting, out),
        StatKind::Assign { targets, exprs } => {
            // Index/field targets read their object and key.
            for target in targets {
                match target {
                    Expr::Name(_) => {}
                    other => walk_expr(other, env, visiting, out),
                }
            }
            walk_exprs(exprs, env, visiting, out);
        }
        StatKind::CompoundAssign { target, value, .. } => {
            walk_expr(target, env, visiting, out);
            walk_expr(value, env, visiting, out);
        }
        StatKind::Function { body, .. } => walk_func_body(body, env, visiting, out),
        StatKind::LocalFunction { body, .. } => walk_func_body(body, env, visiting, out),
        StatKind::Call(call) => {
            walk_expr(&call.callee, env, visiting, out);
            walk_exprs(&call.args, env, visiting, out);
        }
        StatKind::MethodCall(call) => {
            walk_expr(&call.object, env, visiting, out);
            walk_exprs(&call.args, env, visiting, out);
        }
        StatKind::Do(body) => walk_block(body, env, visiting, out),
        StatKind::While { cond, body } => {
            walk_expr(cond, env, visiting, out);
            walk_block(body, env, visiting, out);
        }
        StatKind::Repeat { body, cond } => {
            walk_block(body, env, visiting, out);
            walk_expr(cond, env, visiting, out);
        }
        StatKind::If { arms, else_body } => {
            for arm in arms {
                walk_expr(&arm.cond, env, visiting, out);
                walk_block(&arm.body, env, visiting, out);
            }
            if let Some(body) = else_body {
                walk_block(body, env, visiting, out);
            }
        }
        StatKind::NumericFor {
            start,
            limit,
            step,
            body,
            ..
        } => {
            walk_expr(start, env, visiting, out);
            walk_expr(limit, env, visiting, out);
            if let Some(step) = step {
                walk_expr(step, env, visiting, out);
            }
            walk_block(body, env, visiting, out);
        }
        StatKind::GenericFor { exprs, body, .. } => {
            walk_exprs(exprs, env, visiting, out);
            walk_block(body, env, visiting, out);
        }
        StatKind::Return(exprs) => walk_exprs(exprs, env, visiting, out),
        StatKind::Break | StatKind::Goto(_) | StatKind::Label(_) | StatKind::Todo(_) => {}
        StatKind::Eval(expr)
        | StatKind::Assert(expr)
        | StatKind::Using(expr)
        | StatKind::Load(expr) => walk_expr(expr, env, visiting, out),
        StatKind::Debug(exprs) => walk_exprs(exprs, env, visiting, out),
        StatKind::CheckCall { body, .. } | StatKind::Inline { body, .. } => {
            walk_func_body(body, env, visiting, out)
        }
        StatKind::Defer(inner) => walk_stat(inner, env, visiting, out),
    }
}

fn walk_block(block: &[Stat], env: &Env, visiting: &mut Vec<String>, out: &mut Vec<Rc<Stat>>) {
    for stat in block {
        walk_stat(stat, env, visiting, out);
    }
}

fn walk_func_body(
    body: &FuncBody,
    env: &Env,
    visiting: &mut Vec<String>,
    out: &mut Vec<Rc<Stat>>,
) {
    walk_block(&body.body, env, visiting, out);
}

fn walk_exprs(exprs: &[Expr], env: &Env, visiting: &mut Vec<String>, out: &mut Vec<Rc<Stat>>) {
    for expr in exprs {
        walk_expr(expr, env, visiting, out);
    }
}

fn walk_expr(expr: &Expr, env: &Env, visiting: &mut Vec<String>, out: &mut Vec<Rc<Stat>>) {
    match expr {
        Expr::Name(name) => resolve(name, env, visiting, out),
        Expr::Unary { operand, .. } => walk_expr(operand, env, visiting, out),
        Expr::Binary { lhs, rhs, .. } => {
            walk_expr(lhs, env, visiting, out);
            walk_expr(rhs, env, visiting, out);
        }
        Expr::Field { object, .. } => walk_expr(object, env, visiting, out),
        Expr::Index { object, index } => {
            walk_expr(object, env, visiting, out);
            walk_expr(index, env, visiting, out);
        }
        Expr::Call(call) => {
            walk_expr(&call.callee, env, visiting, out);
            walk_exprs(&call.args, env, visiting, out);
        }
        Expr::MethodCall(call) => {
            walk_expr(&call.object, env, visiting, out);
            walk_exprs(&call.args, env, visiting, out);
        }
        Expr::Paren(inner) => walk_expr(inner, env, visiting, out),
        Expr::Function(body) => walk_func_body(body, env, visiting, out),
        Expr::Table(fields) => {
            for field in fields {
                match field {
                    Field::Positional(value) => walk_expr(value, env, visiting, out),
                    Field::Named(_, value) => walk_expr(value, env, visiting, out),
                    Field::Computed(key, value) => {
                        walk_expr(key, env, visiting, out);
                        walk_expr(value, env, visiting, out);
                    }
                }
            }
        }
        Expr::DoExpr(block) => walk_block(block, env, visiting, out),
        Expr::Eval { expr, .. } | Expr::Load { expr, .. } => walk_expr(expr, env, visiting, out),
        Expr::Repr(inner) => walk_expr(inner, env, visiting, out),
        Expr::Nil
        | Expr::True
        | Expr::False
        | Expr::Integer(_)
        | Expr::Float(_)
        | Expr::Str(_)
        | Expr::Vararg => {}
    }
}
