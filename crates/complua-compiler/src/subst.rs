//! Structural copy-with-substitution for inline expansion. Parameter
//! names are rewritten to the argument ASTs; declaration left-hand sides
//! are never touched, and a `local` (or inner parameter) that shadows a
//! parameter drops it from the map for the rest of that block.

use complua_syntax::ast::{
    Call, Expr, Field, FuncBody, IfArm, MethodCall, Stat, StatKind,
};
use std::collections::HashMap;

pub type SubstMap = HashMap<String, Expr>;

/// Substitute through a block. The map shrinks as declarations shadow
/// parameters; nested blocks see a copy, so shadowing does not escape.
pub fn substitute_block(block: &[Stat], map: &SubstMap) -> Vec<Stat> {
    let mut map = map.clone();
    block
        .iter()
        .map(|stat| substitute_stat(stat, &mut map))
        .collect()
}

fn substitute_stat(stat: &Stat, map: &mut SubstMap) -> Stat {
    let kind = match &stat.kind {
        StatKind::Local { names, exprs } => {
            // Initialisers are substituted before the names shadow.
            let exprs = substitute_exprs(exprs, map);
            for name in names {
                map.remove(name);
            }
            StatKind::Local {
                names: names.clone(),
                exprs,
            }
        }
        StatKind::Assign { targets, exprs } => StatKind::Assign {
            targets: targets.iter().map(|t| substitute_target(t, map)).collect(),
            exprs: substitute_exprs(exprs, map),
        },
        StatKind::CompoundAssign { target, op, value } => StatKind::CompoundAssign {
            target: substitute_target(target, map),
            op: *op,
            value: substitute_expr(value, map),
        },
        StatKind::Function { name, body } => StatKind::Function {
            name: name.clone(),
            body: substitute_func_body(body, map),
        },
        StatKind::LocalFunction { name, body } => {
            map.remove(name);
            StatKind::LocalFunction {
                name: name.clone(),
                body: substitute_func_body(body, map),
            }
        }
        StatKind::Call(call) => StatKind::Call(substitute_call(call, map)),
        StatKind::MethodCall(call) => StatKind::MethodCall(substitute_method_call(call, map)),
        StatKind::Do(body) => StatKind::Do(substitute_block(body, map)),
        StatKind::While { cond, body } => StatKind::While {
            cond: substitute_expr(cond, map),
            body: substitute_block(body, map),
        },
        StatKind::Repeat { body, cond } => StatKind::Repeat {
            body: substitute_block(body, map),
            cond: substitute_expr(cond, map),
        },
        StatKind::If { arms, else_body } => StatKind::If {
            arms: arms
                .iter()
                .map(|arm| IfArm {
                    cond: substitute_expr(&arm.cond, map),
                    body: substitute_block(&arm.body, map),
                })
                .collect(),
            else_body: else_body.as_ref().map(|body| substitute_block(body, map)),
        },
        StatKind::NumericFor {
            var,
            start,
            limit,
            step,
            body,
        } => {
            let start = substitute_expr(start, map);
            let limit = substitute_expr(limit, map);
            let step = step.as_ref().map(|s| substitute_expr(s, map));
            // The loop variable shadows inside the body only.
            let mut inner = map.clone();
            inner.remove(var);
            StatKind::NumericFor {
                var: var.clone(),
                start,
                limit,
                step,
                body: substitute_block(body, &inner),
            }
        }
        StatKind::GenericFor { names, exprs, body } => {
            let exprs = substitute_exprs(exprs, map);
            let mut inner = map.clone();
            for name in names {
                inner.remove(name);
            }
            StatKind::GenericFor {
                names: names.clone(),
                exprs,
                body: substitute_block(body, &inner),
            }
        }
        StatKind::Return(exprs) => StatKind::Return(substitute_exprs(exprs, map)),
        StatKind::Break => StatKind::Break,
        StatKind::Goto(name) => StatKind::Goto(name.clone()),
        StatKind::Label(name) => StatKind::Label(name.clone()),
        StatKind::Eval(expr) => StatKind::Eval(substitute_expr(expr, map)),
        StatKind::Assert(expr) => StatKind::Assert(substitute_expr(expr, map)),
        StatKind::Debug(exprs) => StatKind::Debug(substitute_exprs(exprs, map)),
        StatKind::CheckCall { name, body } => StatKind::CheckCall {
            name: name.clone(),
            body: substitute_func_body(body, map),
        },
        StatKind::Inline { name, body } => StatKind::Inline {
            name: name.clone(),
            body: substitute_func_body(body, map),
        },
        StatKind::Defer(inner) => StatKind::Defer(Box::new(substitute_stat(inner, map))),
        StatKind::Using(expr) => StatKind::Using(substitute_expr(expr, map)),
        StatKind::Load(expr) => StatKind::Load(substitute_expr(expr, map)),
        StatKind::Todo(msg) => StatKind::Todo(msg.clone()),
    };
    Stat {
        kind,
        span: stat.span,
    }
}

/// Assignment left-hand sides: a bare name is never rewritten (it is a
/// write, not a read); field and index targets read their object and key.
fn substitute_target(target: &Expr, map: &SubstMap) -> Expr {
    match target {
        Expr::Name(_) => target.clone(),
        other => substitute_expr(other, map),
    }
}

fn substitute_func_body(body: &FuncBody, map: &SubstMap) -> FuncBody {
    let mut inner = map.clone();
    for param in &body.params {
        inner.remove(param);
    }
    FuncBody {
        params: body.params.clone(),
        is_vararg: body.is_vararg,
        body: substitute_block(&body.body, &inner),
    }
}

fn substitute_call(call: &Call, map: &SubstMap) -> Call {
    Call {
        callee: Box::new(substitute_expr(&call.callee, map)),
        args: substitute_exprs(&call.args, map),
        span: call.span,
    }
}

fn substitute_method_call(call: &MethodCall, map: &SubstMap) -> MethodCall {
    MethodCall {
        object: Box::new(substitute_expr(&call.object, map)),
        method: call.method.clone(),
        args: substitute_exprs(&call.args, map),
        span: call.span,
    }
}

fn substitute_exprs(exprs: &[Expr], map: &SubstMap) -> Vec<Expr> {
    exprs.iter().map(|e| substitute_expr(e, map)).collect()
}

fn substitute_expr(expr: &Expr, map: &SubstMap) -> Expr {
    match expr {
        Expr::Name(name) => match map.get(name) {
            Some(replacement) => replacement.clone(),
            None => expr.clone(),
        },
        Expr::Unary { op, operand } => Expr::Unary {
            op: *op,
            operand: Box::new(substitute_expr(operand, map)),
        },
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(substitute_expr(lhs, map)),
            rhs: Box::new(substitute_expr(rhs, map)),
        },
        Expr::Field { object, name } => Expr::Field {
            object: Box::new(substitute_expr(object, map)),
            name: name.clone(),
        },
        Expr::Index { object, index } => Expr::Index {
            object: Box::new(substitute_expr(object, map)),
            index: Box::new(substitute_expr(index, map)),
        },
        Expr::Call(call) => Expr::Call(Box::new(substitute_call(call, map))),
        Expr::MethodCall(call) => Expr::MethodCall(Box::new(substitute_method_call(call, map))),
        Expr::Paren(inner) => Expr::Paren(Box::new(substitute_expr(inner, map))),
        Expr::Function(body) => Expr::Function(Box::new(substitute_func_body(body, map))),
        Expr::Table(fields) => Expr::Table(
            fields
                .iter()
                .map(|field| match field {
                    Field::Positional(value) => Field::Positional(substitute_expr(value, map)),
                    Field::Named(name, value) => {
                        Field::Named(name.clone(), substitute_expr(value, map))
                    }
                    Field::Computed(key, value) => {
                        Field::Computed(substitute_expr(key, map), substitute_expr(value, map))
                    }
                })
                .collect(),
        ),
        Expr::DoExpr(block) => Expr::DoExpr(substitute_block(block, map)),
        Expr::Eval { expr, span } => Expr::Eval {
            expr: Box::new(substitute_expr(expr, map)),
            span: *span,
        },
        Expr::Load { expr, span } => Expr::Load {
            expr: Box::new(substitute_expr(expr, map)),
            span: *span,
        },
        Expr::Repr(inner) => Expr::Repr(Box::new(substitute_expr(inner, map))),
        Expr::Nil
        | Expr::True
        | Expr::False
        | Expr::Integer(_)
        | Expr::Float(_)
        | Expr::Str(_)
        | Expr::Vararg => expr.clone(),
    }
}
