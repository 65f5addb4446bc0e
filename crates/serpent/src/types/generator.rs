//! Comprehensions: `listcomp` and lazily evaluated generator-expression objects.
//!
//! A comprehension over several sources walks them depth-first, like nested `for` loops.
//! Each level may carry a filter that is called with the level's current element; when a
//! level is exhausted the walk backtracks to the previous one and inner levels restart from
//! a fresh iterator over their source.

use super::{ForIter, Payload, iter::iter_self, payload_error, receiver};
use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    function::{Signature, unpack},
    namespace::Namespace,
    value::Value,
};

#[derive(Debug)]
pub(crate) struct GenExpr {
    sources: Vec<Value>,
    func: Value,
    /// One filter per level; `None` for unfiltered levels.
    filters: Vec<Value>,
    /// Iterators of the active levels, outermost first.
    iters: Vec<ForIter>,
}

impl GenExpr {
    fn new(rt: &mut Runtime, sources: Vec<Value>, func: Value, mut filters: Vec<Value>) -> RunResult<Self> {
        let Some(first) = sources.first() else {
            return Err(ExcType::value_error("comprehension needs at least one source"));
        };
        if filters.is_empty() {
            filters = vec![Value::None; sources.len()];
        } else if filters.len() != sources.len() {
            return Err(ExcType::value_error(format!(
                "comprehension has {} sources but {} filters",
                sources.len(),
                filters.len()
            )));
        }
        let first = ForIter::new(rt, first)?;
        Ok(Self {
            sources,
            func,
            filters,
            iters: vec![first],
        })
    }

    /// Produces the next result, or `None` once every level is exhausted.
    fn advance(&mut self, rt: &mut Runtime) -> RunResult<Option<Value>> {
        loop {
            let depth = self.iters.len();
            let Some(iter) = self.iters.last_mut() else {
                return Ok(None);
            };
            if !iter.try_next(rt)? {
                self.iters.pop();
                continue;
            }
            let value = iter.value().clone();
            let filter = &self.filters[depth - 1];
            if !filter.is_none() {
                let keep = rt.call(filter, vec![value])?;
                if !rt.truthy(&keep)? {
                    continue;
                }
            }
            if depth < self.sources.len() {
                let inner = ForIter::new(rt, &self.sources[depth])?;
                self.iters.push(inner);
                continue;
            }
            let args = self.iters.iter().map(|it| it.value().clone()).collect();
            return rt.call(&self.func, args).map(Some);
        }
    }
}

fn genexpr_next(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let inst = receiver(&this, "generator")?;
    // the state is moved out while running so re-entrant calls can be detected
    let mut state = match inst.take_payload() {
        Payload::GenExpr(state) => state,
        Payload::Empty => return Err(ExcType::value_error("generator already executing")),
        other => {
            inst.set_payload(other);
            return Err(payload_error("generator"));
        }
    };
    let result = state.advance(rt);
    inst.set_payload(Payload::GenExpr(state));
    result?.ok_or_else(ExcType::stop_iteration)
}

pub(crate) fn namespace() -> Namespace {
    Namespace::new()
        .in_module("__builtin__")
        .method("__iter__", Signature::new(["self"]), iter_self)
        .method("next", Signature::new(["self"]), genexpr_next)
}

impl Runtime {
    /// A generator expression over `sources`, yielding `func(*level_values)` for every
    /// combination that passes the per-level `filters` (empty for none).
    pub fn genexpr(&mut self, sources: Vec<Value>, func: Value, filters: Vec<Value>) -> RunResult<Value> {
        let state = GenExpr::new(self, sources, func, filters)?;
        let inst = self.allocate_instance(self.builtins.genexpr, Payload::GenExpr(Box::new(state)))?;
        Ok(Value::Instance(inst))
    }

    /// The list comprehension counterpart of [`genexpr`](Self::genexpr).
    pub fn listcomp(&mut self, sources: Vec<Value>, func: Value, filters: Vec<Value>) -> RunResult<Value> {
        let mut state = GenExpr::new(self, sources, func, filters)?;
        let mut items = Vec::new();
        while let Some(item) = state.advance(self)? {
            self.check_time()?;
            items.push(item);
        }
        self.new_list(items)
    }
}
