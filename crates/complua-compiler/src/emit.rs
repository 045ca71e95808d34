//! Recursive AST-to-source emitter. Dispatch is per node kind; directive
//! nodes delegate compile-time work to the evaluator and splice its
//! results back into the output.

use crate::deps;
use crate::diag;
use crate::env::Env;
use crate::eval::{EvalFailure, EvalKind, EvalOutcome, Scratch};
use crate::prelude::{PRELUDE, REPR_FN};
use crate::subst::{self, SubstMap};
use crate::{CompileError, Options};
use complua_syntax::ast::{
    Call, Expr, Field, FuncBody, MethodCall, Stat, StatKind, UnOp,
};
use complua_syntax::lexer::Lexer;
use complua_syntax::parser::{parse_chunk, parse_expr_fragment};
use complua_syntax::token::{Span, Token};
use std::rc::Rc;

pub struct Emitter<'a> {
    scratch: &'a Scratch,
    opts: &'a Options,
}

impl<'a> Emitter<'a> {
    pub fn new(scratch: &'a Scratch, opts: &'a Options) -> Self {
        Emitter { scratch, opts }
    }

    /// Emit a whole chunk; pending defers flush at the end of the program.
    pub fn emit_chunk(&mut self, block: &[Stat], env: &mut Env) -> Result<String, CompileError> {
        self.emit_scope_block(block, env, 0)
    }

    // ---- Blocks and scopes ----

    /// Emit one statement into `out`, with its line marker and the `;`
    /// guard against Lua's call-chaining ambiguity.
    fn append_stat(
        &mut self,
        out: &mut String,
        stat: &Stat,
        env: &mut Env,
    ) -> Result<(), CompileError> {
        let text = self.emit_stat(stat, env)?;
        if text.is_empty() {
            return Ok(());
        }
        if env.line_info {
            out.push_str(diag::LINE_MARKER);
            out.push_str(&stat.span.line.to_string());
            out.push('\n');
        }
        if text.starts_with('(') {
            out.push(';');
        }
        out.push_str(&text);
        out.push('\n');
        Ok(())
    }

    /// Emit a block that owns a scope exit: defers from `flush_from`
    /// onwards run at fall-through. A trailing return has already flushed
    /// the whole queue.
    fn emit_scope_block(
        &mut self,
        block: &[Stat],
        env: &mut Env,
        flush_from: usize,
    ) -> Result<String, CompileError> {
        let mut out = String::new();
        for stat in block {
            self.append_stat(&mut out, stat, env)?;
        }
        let ends_with_return = matches!(block.last().map(|s| &s.kind), Some(StatKind::Return(_)));
        if !ends_with_return {
            let pending: Vec<Stat> = env.defers[flush_from.min(env.defers.len())..].to_vec();
            for stat in &pending {
                self.append_stat(&mut out, stat, env)?;
            }
        }
        Ok(out)
    }

    /// Emit a block with no scope exit of its own (if/loop bodies).
    fn emit_plain_block(&mut self, block: &[Stat], env: &mut Env) -> Result<String, CompileError> {
        let mut out = String::new();
        for stat in block {
            self.append_stat(&mut out, stat, env)?;
        }
        Ok(out)
    }

    // ---- Statements ----

    fn emit_stat(&mut self, stat: &Stat, env: &mut Env) -> Result<String, CompileError> {
        let text = match &stat.kind {
            StatKind::Local { names, exprs } => {
                for name in names {
                    env.deregister(name);
                }
                let mut text = format!("local {}", names.join(", "));
                if !exprs.is_empty() {
                    text.push_str(" = ");
                    text.push_str(&self.emit_expr_list(exprs, env)?);
                }
                let rc = Rc::new(stat.clone());
                for name in names {
                    env.bind(name, rc.clone());
                }
                text
            }
            StatKind::Assign { targets, exprs } => self.emit_assign(stat, targets, exprs, env)?,
            StatKind::CompoundAssign { target, op, value } => {
                // a += b  desugars to  a = a + b
                let desugared = Stat {
                    kind: StatKind::Assign {
                        targets: vec![target.clone()],
                        exprs: vec![Expr::Binary {
                            op: *op,
                            lhs: Box::new(target.clone()),
                            rhs: Box::new(value.clone()),
                        }],
                    },
                    span: stat.span,
                };
                return self.emit_stat(&desugared, env);
            }
            StatKind::Function { name, body } => {
                if name.path.len() == 1 && name.method.is_none() {
                    env.deregister(&name.path[0]);
                    env.bind(&name.path[0], Rc::new(stat.clone()));
                }
                let mut text = format!("function {}", name.path.join("."));
                if let Some(method) = &name.method {
                    text.push(':');
                    text.push_str(method);
                }
                text.push_str(&self.emit_func_tail(body, env)?);
                text
            }
            StatKind::LocalFunction { name, body } => {
                env.deregister(name);
                env.bind(name, Rc::new(stat.clone()));
                format!("local function {name}{}", self.emit_func_tail(body, env)?)
            }
            StatKind::Call(call) => self.emit_call(call, env)?,
            StatKind::MethodCall(call) => self.emit_method_call(call, env)?,
            StatKind::Do(body) => {
                let mut inner = env.enter_block();
                let mark = inner.defers.len();
                let block = self.emit_scope_block(body, &mut inner, mark)?;
                format!("do\n{block}end")
            }
            StatKind::While { cond, body } => {
                let cond = self.emit_expr(cond, env)?;
                let block = self.emit_plain_block(body, env)?;
                format!("while {cond} do\n{block}end")
            }
            StatKind::Repeat { body, cond } => {
                let block = self.emit_plain_block(body, env)?;
                let cond = self.emit_expr(cond, env)?;
                format!("repeat\n{block}until {cond}")
            }
            StatKind::If { arms, else_body } => {
                let mut text = String::new();
                for (i, arm) in arms.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "elseif" };
                    let cond = self.emit_expr(&arm.cond, env)?;
                    let block = self.emit_plain_block(&arm.body, env)?;
                    text.push_str(&format!("{keyword} {cond} then\n{block}"));
                }
                if let Some(body) = else_body {
                    let block = self.emit_plain_block(body, env)?;
                    text.push_str(&format!("else\n{block}"));
                }
                text.push_str("end");
                text
            }
            StatKind::NumericFor {
                var,
                start,
                limit,
                step,
                body,
            } => {
                let start = self.emit_expr(start, env)?;
                let limit = self.emit_expr(limit, env)?;
                let mut head = format!("for {var} = {start}, {limit}");
                if let Some(step) = step {
                    head.push_str(", ");
                    head.push_str(&self.emit_expr(step, env)?);
                }
                let block = self.emit_plain_block(body, env)?;
                format!("{head} do\n{block}end")
            }
            StatKind::GenericFor { names, exprs, body } => {
                let exprs = self.emit_expr_list(exprs, env)?;
                let block = self.emit_plain_block(body, env)?;
                format!("for {} in {exprs} do\n{block}end", names.join(", "))
            }
            StatKind::Return(exprs) => self.emit_return(exprs, env)?,
            StatKind::Break => "break".to_string(),
            StatKind::Goto(name) => format!("goto {name}"),
            StatKind::Label(name) => format!("::{name}::"),

            // --- Directives ---
            StatKind::Eval(expr) => self.eval_splice(expr, stat.span, env)?,
            StatKind::Assert(expr) => {
                let call = name_call("assert", vec![expr.clone()], stat.span);
                self.run_directive(&call, stat.span, env, EvalKind::Eval)?;
                String::new()
            }
            StatKind::Debug(args) => {
                if env.debug {
                    let format = Expr::Call(Box::new(Call {
                        callee: Box::new(Expr::Field {
                            object: Box::new(Expr::Name("string".to_string())),
                            name: "format".to_string(),
                        }),
                        args: args.clone(),
                        span: stat.span,
                    }));
                    let call = name_call("print", vec![format], stat.span);
                    self.run_directive(&call, stat.span, env, EvalKind::Eval)?;
                }
                String::new()
            }
            StatKind::CheckCall { name, body } => {
                env.checkcalls.insert(name.clone(), body.clone());
                String::new()
            }
            StatKind::Inline { name, body } => {
                env.inlines.insert(name.clone(), body.clone());
                String::new()
            }
            StatKind::Defer(inner) => {
                env.defers.push((**inner).clone());
                String::new()
            }
            StatKind::Using(prefix) => {
                env.usings.push(prefix.clone());
                String::new()
            }
            StatKind::Load(expr) => self.load_splice_stat(expr, stat.span, env)?,
            StatKind::Todo(msg) => {
                let msg: &[u8] = msg.as_deref().unwrap_or(b"Not implemented");
                format!("error({})", quote_bytes(msg))
            }
        };
        Ok(text)
    }

    fn emit_assign(
        &mut self,
        stat: &Stat,
        targets: &[Expr],
        exprs: &[Expr],
        env: &mut Env,
    ) -> Result<String, CompileError> {
        for target in targets {
            if let Expr::Name(name) = target {
                env.deregister(name);
            }
        }

        // With `#using` active, a single-name assignment writes through
        // to the first prefix holding a non-nil binding.
        let write_through = match (targets, exprs) {
            ([Expr::Name(name)], [value]) if !env.usings.is_empty() => {
                Some((name.clone(), value))
            }
            _ => None,
        };
        let text = if let Some((name, value)) = write_through {
            let value = self.emit_expr(value, env)?;
            self.write_chain(&name, &value, env)?
        } else {
            let mut parts = Vec::new();
            for target in targets {
                parts.push(self.emit_target(target, env)?);
            }
            format!("{} = {}", parts.join(", "), self.emit_expr_list(exprs, env)?)
        };

        // Record bindings: a first assignment defines the name, a
        // reassignment is logged with its dependency chain at this point.
        let rc = Rc::new(stat.clone());
        for target in targets {
            if let Expr::Name(name) = target {
                if env.lookup(name).is_some() {
                    let chain = deps::stat_chain(stat, env);
                    env.log_assign(name, chain, rc.clone());
                } else {
                    env.bind(name, rc.clone());
                }
            }
        }
        Ok(text)
    }

    fn emit_return(&mut self, exprs: &[Expr], env: &mut Env) -> Result<String, CompileError> {
        if env.defers.is_empty() {
            return Ok(if exprs.is_empty() {
                "return".to_string()
            } else {
                format!("return {}", self.emit_expr_list(exprs, env)?)
            });
        }
        // Deferred statements run after the return expressions are
        // evaluated but before control leaves.
        let pending = env.defers.clone();
        let mut text = String::new();
        if exprs.is_empty() {
            for stat in &pending {
                self.append_stat(&mut text, stat, env)?;
            }
            text.push_str("return");
        } else {
            let list = self.emit_expr_list(exprs, env)?;
            text.push_str(&format!(
                "local __complua_ret = (function(...) return {{n = select('#', ...), ...}} end)({list})\n"
            ));
            for stat in &pending {
                self.append_stat(&mut text, stat, env)?;
            }
            text.push_str("return unpack(__complua_ret, 1, __complua_ret.n)");
        }
        Ok(text)
    }

    /// `(params)\n<body>end` — shared tail of every function form.
    fn emit_func_tail(&mut self, body: &FuncBody, env: &Env) -> Result<String, CompileError> {
        let mut inner = env.enter_function(&body.params);
        let block = self.emit_scope_block(&body.body, &mut inner, 0)?;
        let mut params = body.params.join(", ");
        if body.is_vararg {
            if params.is_empty() {
                params.push_str("...");
            } else {
                params.push_str(", ...");
            }
        }
        Ok(format!("({params})\n{block}end"))
    }

    // ---- Expressions ----

    fn emit_expr(&mut self, expr: &Expr, env: &mut Env) -> Result<String, CompileError> {
        let text = match expr {
            Expr::Nil => "nil".to_string(),
            Expr::True => "true".to_string(),
            Expr::False => "false".to_string(),
            Expr::Integer(i) => i.to_string(),
            Expr::Float(f) => float_text(*f),
            Expr::Str(bytes) => quote_bytes(bytes),
            Expr::Vararg => "...".to_string(),
            Expr::Name(name) => self.read_name(name, env)?,
            Expr::Unary { op, operand } => {
                let inner = self.emit_expr(operand, env)?;
                // `--` would start a comment
                if *op == UnOp::Neg && inner.starts_with('-') {
                    format!("-({inner})")
                } else {
                    format!("{}{inner}", op.text())
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.emit_expr(lhs, env)?;
                let rhs = self.emit_expr(rhs, env)?;
                format!("({lhs} {} {rhs})", op.text())
            }
            Expr::Field { object, name } => {
                format!("{}.{name}", self.emit_prefix(object, env)?)
            }
            Expr::Index { object, index } => {
                let object = self.emit_prefix(object, env)?;
                let index = self.emit_expr(index, env)?;
                format!("{object}[{index}]")
            }
            Expr::Call(call) => self.emit_call(call, env)?,
            Expr::MethodCall(call) => self.emit_method_call(call, env)?,
            Expr::Paren(inner) => format!("({})", self.emit_expr(inner, env)?),
            Expr::Function(body) => format!("function{}", self.emit_func_tail(body, env)?),
            Expr::Table(fields) => self.emit_table(fields, env)?,
            Expr::DoExpr(block) => {
                let mut inner = env.enter_function(&[]);
                let block = self.emit_scope_block(block, &mut inner, 0)?;
                format!("(function()\n{block}end)()")
            }
            Expr::Eval { expr, span } => self.eval_splice(expr, *span, env)?,
            Expr::Load { expr, span } => self.load_splice_expr(expr, *span, env)?,
            Expr::Repr(inner) => format!("{REPR_FN}({})", self.emit_expr(inner, env)?),
        };
        Ok(text)
    }

    /// Emit an expression used in prefix position (indexed or called):
    /// anything that is not already a prefix expression gets parenthesised.
    fn emit_prefix(&mut self, expr: &Expr, env: &mut Env) -> Result<String, CompileError> {
        let is_prefix = matches!(
            expr,
            Expr::Name(_)
                | Expr::Field { .. }
                | Expr::Index { .. }
                | Expr::Call(_)
                | Expr::MethodCall(_)
                | Expr::Paren(_)
        );
        let text = self.emit_expr(expr, env)?;
        if is_prefix || text.starts_with('(') {
            Ok(text)
        } else {
            Ok(format!("({text})"))
        }
    }

    fn emit_expr_list(&mut self, exprs: &[Expr], env: &mut Env) -> Result<String, CompileError> {
        let mut parts = Vec::new();
        for expr in exprs {
            parts.push(self.emit_expr(expr, env)?);
        }
        Ok(parts.join(", "))
    }

    /// Argument lists clear the line-info flag: a marker comment inside
    /// them would break the expression.
    fn emit_args(&mut self, args: &[Expr], env: &mut Env) -> Result<String, CompileError> {
        let saved = env.line_info;
        env.line_info = false;
        let result = self.emit_expr_list(args, env);
        env.line_info = saved;
        result
    }

    fn emit_call(&mut self, call: &Call, env: &mut Env) -> Result<String, CompileError> {
        if let Expr::Name(name) = call.callee.as_ref() {
            if let Some(validator) = env.checkcalls.get(name).cloned() {
                // (function(params) body end)(args), run at compile time
                let check = Expr::Call(Box::new(Call {
                    callee: Box::new(Expr::Paren(Box::new(Expr::Function(Box::new(validator))))),
                    args: call.args.clone(),
                    span: call.span,
                }));
                self.run_directive(&check, call.span, env, EvalKind::Eval)?;
            }
            if let Some(inline) = env.inlines.get(name).cloned() {
                return self.emit_inline_expansion(&inline, call, env);
            }
        }
        let callee = self.emit_prefix(&call.callee, env)?;
        let args = self.emit_args(&call.args, env)?;
        Ok(format!("{callee}({args})"))
    }

    fn emit_method_call(
        &mut self,
        call: &MethodCall,
        env: &mut Env,
    ) -> Result<String, CompileError> {
        let object = self.emit_prefix(&call.object, env)?;
        let args = self.emit_args(&call.args, env)?;
        Ok(format!("{object}:{}({args})", call.method))
    }

    fn emit_inline_expansion(
        &mut self,
        body: &FuncBody,
        call: &Call,
        env: &mut Env,
    ) -> Result<String, CompileError> {
        let mut map = SubstMap::new();
        for (i, param) in body.params.iter().enumerate() {
            let arg = call.args.get(i).cloned().unwrap_or(Expr::Nil);
            map.insert(param.clone(), arg);
        }
        let substituted = subst::substitute_block(&body.body, &map);
        let mut inner = env.enter_function(&[]);
        let block = self.emit_scope_block(&substituted, &mut inner, 0)?;
        Ok(format!("(function()\n{block}end)()"))
    }

    fn emit_table(&mut self, fields: &[Field], env: &mut Env) -> Result<String, CompileError> {
        let mut parts = Vec::new();
        for field in fields {
            parts.push(match field {
                Field::Positional(value) => self.emit_expr(value, env)?,
                Field::Named(name, value) => {
                    format!("{name} = {}", self.emit_expr(value, env)?)
                }
                Field::Computed(key, value) => {
                    let key = self.emit_expr(key, env)?;
                    format!("[{key}] = {}", self.emit_expr(value, env)?)
                }
            });
        }
        Ok(format!("{{{}}}", parts.join(", ")))
    }

    fn emit_target(&mut self, target: &Expr, env: &mut Env) -> Result<String, CompileError> {
        match target {
            // A bare name target is a write, not a read: no using rewrite.
            Expr::Name(name) => Ok(name.clone()),
            other => self.emit_expr(other, env),
        }
    }

    // ---- #using chains ----

    /// Read of a bare name under `#using`: innermost prefix first, bare
    /// name as the final fallback.
    fn read_name(&mut self, name: &str, env: &mut Env) -> Result<String, CompileError> {
        if env.usings.is_empty() {
            return Ok(name.to_string());
        }
        let prefixes = env.usings.clone();
        let mut chain = name.to_string();
        for prefix in &prefixes {
            let p = self.emit_prefix_plain(prefix, env)?;
            chain = format!("({p}.{name} ~= nil and {p}.{name} or {chain})");
        }
        Ok(chain)
    }

    /// Write of a bare name under `#using`: assign into the first prefix
    /// holding a non-nil binding, else the bare name.
    fn write_chain(
        &mut self,
        name: &str,
        value: &str,
        env: &mut Env,
    ) -> Result<String, CompileError> {
        let prefixes = env.usings.clone();
        let mut text = String::new();
        for (i, prefix) in prefixes.iter().rev().enumerate() {
            let p = self.emit_prefix_plain(prefix, env)?;
            let keyword = if i == 0 { "if" } else { "elseif" };
            text.push_str(&format!(
                "{keyword} {p}.{name} ~= nil then {p}.{name} = {value}\n"
            ));
        }
        text.push_str(&format!("else {name} = {value}\nend"));
        Ok(text)
    }

    /// Emit a using prefix itself, outside the influence of the stack.
    fn emit_prefix_plain(&mut self, prefix: &Expr, env: &mut Env) -> Result<String, CompileError> {
        let saved = std::mem::take(&mut env.usings);
        let result = self.emit_prefix(prefix, env);
        env.usings = saved;
        result
    }

    // ---- Compile-time evaluation ----

    /// Build the self-contained plain-dialect program for `expr`:
    /// serialiser prelude, dependency replay, the value, and a trailer
    /// writing the dump and text artefacts.
    fn build_program(
        &mut self,
        expr: &Expr,
        span: Span,
        env: &Env,
        kind: EvalKind,
    ) -> Result<String, CompileError> {
        let mut program = String::new();
        program.push_str(PRELUDE);
        program.push('\n');

        let chain = deps::expr_chain(expr, env);
        let mut dep_env = env.clone();
        dep_env.defers.clear();
        dep_env.line_info = true;
        for dep in &chain {
            self.append_stat(&mut program, dep, &mut dep_env)?;
        }

        program.push_str(diag::LINE_MARKER);
        program.push_str(&span.line.to_string());
        program.push('\n');
        // The value expression carries no markers of its own (a validator
        // body would otherwise shadow the call-site marker), so an error
        // in it maps to the directive's source line.
        dep_env.line_info = false;
        let value = self.emit_expr(expr, &mut dep_env)?;
        program.push_str(&format!("local __complua_value = {value}\n"));

        let (dump_path, text_path) = self.scratch.artefact_paths(kind);
        program.push_str(&format!(
            "local __complua_chunk = assert(loadstring(\"return \" .. {REPR_FN}(__complua_value)))\n\
             local __complua_out = assert(io.open([[{}]], \"wb\"))\n\
             __complua_out:write(string.dump(__complua_chunk))\n\
             __complua_out:close()\n\
             __complua_out = assert(io.open([[{}]], \"wb\"))\n\
             __complua_out:write({REPR_FN}(__complua_value))\n\
             __complua_out:close()\n",
            dump_path.display(),
            text_path.display()
        ));
        Ok(program)
    }

    fn run_directive(
        &mut self,
        expr: &Expr,
        span: Span,
        env: &Env,
        kind: EvalKind,
    ) -> Result<EvalOutcome, CompileError> {
        let program = self.build_program(expr, span, env, kind)?;
        match self.scratch.run(kind, &program, &self.opts.interpreter) {
            Ok(outcome) => Ok(outcome),
            Err(EvalFailure::Interpreter(stderr)) => {
                Err(self.map_interpreter_error(&stderr, &program, span))
            }
            Err(EvalFailure::Io(e)) => Err(CompileError {
                message: format!("cannot run '{}': {e}", self.opts.interpreter),
                line: span.line,
            }),
        }
    }

    fn map_interpreter_error(&self, stderr: &str, program: &str, span: Span) -> CompileError {
        if let Some((generated_line, message)) = diag::parse_interpreter_error(stderr) {
            if let Some(source_line) = diag::nearest_marker(program, generated_line) {
                return CompileError {
                    message,
                    line: source_line,
                };
            }
        }
        // No marker found: surface the raw interpreter output.
        CompileError {
            message: stderr.trim().to_string(),
            line: span.line,
        }
    }

    /// `#eval`: splice an immediately-invoked function that restores the
    /// textual representation and returns the result of the reloaded
    /// byte-dump, so data values and function identities both survive.
    fn eval_splice(
        &mut self,
        expr: &Expr,
        span: Span,
        env: &mut Env,
    ) -> Result<String, CompileError> {
        let outcome = self.run_directive(expr, span, env, EvalKind::Eval)?;
        let text = String::from_utf8_lossy(&outcome.text).into_owned();
        let bytes = outcome
            .dump
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(",");
        Ok(format!(
            "(function() local __complua_restored = {text}; \
             return loadstring(string.char({bytes}))() end)()"
        ))
    }

    /// `#load`: the compile-time value must be a string; decode it from
    /// the serialised artefact with our own lexer.
    fn load_bytes(
        &mut self,
        expr: &Expr,
        span: Span,
        env: &Env,
    ) -> Result<Vec<u8>, CompileError> {
        let outcome = self.run_directive(expr, span, env, EvalKind::Load)?;
        decode_string_artefact(&outcome.text).ok_or_else(|| CompileError {
            message: "'#load' expression did not produce a string".to_string(),
            line: span.line,
        })
    }

    fn load_splice_stat(
        &mut self,
        expr: &Expr,
        span: Span,
        env: &mut Env,
    ) -> Result<String, CompileError> {
        let bytes = self.load_bytes(expr, span, env)?;
        let block = parse_chunk(&bytes).map_err(|e| CompileError {
            message: format!("in '#load' fragment: {}", e.message),
            line: span.line,
        })?;
        // A fragment's lines do not correspond to the input file, so
        // markers are suppressed while splicing it.
        let saved = env.line_info;
        env.line_info = false;
        let mut out = String::new();
        let mut result = Ok(());
        for stat in &block {
            result = self.append_stat(&mut out, stat, env);
            if result.is_err() {
                break;
            }
        }
        env.line_info = saved;
        result?;
        Ok(out.trim_end().to_string())
    }

    fn load_splice_expr(
        &mut self,
        expr: &Expr,
        span: Span,
        env: &mut Env,
    ) -> Result<String, CompileError> {
        let bytes = self.load_bytes(expr, span, env)?;
        let loaded = parse_expr_fragment(&bytes).map_err(|e| CompileError {
            message: format!("in '#load' fragment: {}", e.message),
            line: span.line,
        })?;
        let saved = env.line_info;
        env.line_info = false;
        let result = self.emit_expr(&loaded, env);
        env.line_info = saved;
        result
    }
}

/// `name(args)` helper for synthesised compile-time calls.
fn name_call(name: &str, args: Vec<Expr>, span: Span) -> Expr {
    Expr::Call(Box::new(Call {
        callee: Box::new(Expr::Name(name.to_string())),
        args,
        span,
    }))
}

/// The serialised text artefact of `#load` must be exactly one string
/// literal; decode it structurally rather than by pattern match.
fn decode_string_artefact(text: &[u8]) -> Option<Vec<u8>> {
    let mut lexer = Lexer::new(text);
    let bytes = match lexer.advance().ok()?.token {
        Token::Str(bytes) => bytes,
        _ => return None,
    };
    match lexer.advance().ok()?.token {
        Token::Eof => Some(bytes),
        _ => None,
    }
}

/// Quote bytes as a plain-dialect string literal. Non-printable bytes use
/// the three-digit decimal escape so a following digit cannot extend them.
pub fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::from("\"");
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\{b:03}")),
        }
    }
    out.push('"');
    out
}

/// Float literal text. Infinities and NaN have no literal form in the
/// plain dialect.
fn float_text(f: f64) -> String {
    if f.is_nan() {
        "(0/0)".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "(1/0)".to_string()
        } else {
            "(-1/0)".to_string()
        }
    } else {
        format!("{f}")
    }
}
