//! The compilation environment threaded through emission.

use complua_syntax::ast::{Expr, FuncBody, Stat};
use indexmap::IndexMap;
use std::rc::Rc;

/// One logged reassignment of a bound name: the dependency chain as it
/// stood at the assignment, plus the assignment itself.
#[derive(Clone, Debug)]
pub struct AssignRecord {
    pub name: String,
    pub chain: Vec<Rc<Stat>>,
    pub stat: Rc<Stat>,
}

/// Mutable environment passed into every emit step. Scope entry points
/// (function body, do-block, do-as-expression) clone it; callers see the
/// original on exit.
#[derive(Clone, Debug)]
pub struct Env {
    /// Ordered (name, defining statement) pairs. Later entries shadow
    /// earlier ones; the insertion order is what dependency replay walks.
    pub bindings: Vec<(String, Rc<Stat>)>,
    /// Reassignments of bound names, in source order.
    pub assigns: Vec<AssignRecord>,
    /// Statements hoisted to run at scope exit, in insertion order.
    pub defers: Vec<Stat>,
    /// Namespace prefixes introduced by `#using`, innermost last.
    pub usings: Vec<Expr>,
    /// Inline functions keyed by name, expanded at call sites.
    pub inlines: IndexMap<String, FuncBody>,
    /// Compile-time validators keyed by name, run at call sites.
    pub checkcalls: IndexMap<String, FuncBody>,
    /// Whether emitted statements carry `--LINE:<n>` markers.
    pub line_info: bool,
    /// Whether `#debug` directives expand.
    pub debug: bool,
}

impl Env {
    pub fn new(debug: bool, line_info: bool) -> Self {
        Env {
            bindings: Vec::new(),
            assigns: Vec::new(),
            defers: Vec::new(),
            usings: Vec::new(),
            inlines: IndexMap::new(),
            checkcalls: IndexMap::new(),
            line_info,
            debug,
        }
    }

    /// Clone for a function body: a fresh defer queue, and parameters
    /// shadow any registered inlines or checked calls.
    pub fn enter_function(&self, params: &[String]) -> Env {
        let mut inner = self.clone();
        inner.defers.clear();
        for param in params {
            inner.deregister(param);
        }
        inner
    }

    /// Clone for a do-block or do-as-expression.
    pub fn enter_block(&self) -> Env {
        self.clone()
    }

    /// Record a defining statement for `name`.
    pub fn bind(&mut self, name: &str, stat: Rc<Stat>) {
        self.bindings.push((name.to_string(), stat));
    }

    /// Most recent binding for `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&Rc<Stat>> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, stat)| stat)
    }

    /// Log a reassignment of an already-bound name.
    pub fn log_assign(&mut self, name: &str, chain: Vec<Rc<Stat>>, stat: Rc<Stat>) {
        self.assigns.push(AssignRecord {
            name: name.to_string(),
            chain,
            stat,
        });
    }

    /// Rebinding a name deregisters its inline and checked-call entries.
    pub fn deregister(&mut self, name: &str) {
        self.inlines.shift_remove(name);
        self.checkcalls.shift_remove(name);
    }
}
