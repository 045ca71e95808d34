//! Complua compiler: emitter, dependency tracking, compile-time
//! evaluation, and diagnostics for the extended dialect.

pub mod deps;
pub mod diag;
pub mod emit;
pub mod env;
pub mod eval;
pub mod prelude;
pub mod subst;

use complua_syntax::parser::{self, ParseError};
use std::fmt;

/// Compiler error. All compile-time errors are fatal; the binary renders
/// the single `complua: <file>:<line>: <message>` diagnostic line.
#[derive(Clone, Debug)]
pub struct CompileError {
    pub message: String,
    pub line: u32,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.message)
    }
}

impl std::error::Error for CompileError {}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError {
            message: e.message,
            line: e.line,
        }
    }
}

/// Compilation options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Expand `#debug` directives instead of discarding them.
    pub debug: bool,
    /// Emit `--LINE:<n>` markers before statements.
    pub line_info: bool,
    /// The external interpreter run for compile-time evaluation.
    pub interpreter: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            debug: false,
            line_info: true,
            interpreter: "luajit".to_string(),
        }
    }
}

/// Compile extended-dialect source to a plain-dialect program: the
/// serialiser prelude followed by the emitted translation.
pub fn compile(
    source: &[u8],
    scratch: &eval::Scratch,
    opts: &Options,
) -> Result<String, CompileError> {
    let block = parser::parse_chunk(source)?;
    let mut env = env::Env::new(opts.debug, opts.line_info);
    let mut emitter = emit::Emitter::new(scratch, opts);
    let program = emitter.emit_chunk(&block, &mut env)?;
    Ok(format!("{}\n{}", prelude::PRELUDE, program))
}
