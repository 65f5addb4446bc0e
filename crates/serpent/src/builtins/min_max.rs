//! Implementation of the min() and max() builtin functions.

use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    function::unpack,
    types::tuple::tuple_items,
    value::Value,
};

/// Implementation of the min() builtin function.
///
/// - `min(iterable)` returns the smallest item of the iterable;
/// - `min(a, b, ...)` returns the smallest argument.
pub fn builtin_min(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    builtin_min_max(rt, args, true)
}

/// Implementation of the max() builtin function, the counterpart of [`builtin_min`].
pub fn builtin_max(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    builtin_min_max(rt, args, false)
}

fn builtin_min_max(rt: &mut Runtime, args: Vec<Value>, is_min: bool) -> RunResult<Value> {
    let func_name = if is_min { "min" } else { "max" };
    let [rest] = unpack(args)?;
    let positional = tuple_items(&rest).map(|items| items.to_vec()).unwrap_or_default();
    let candidates = match positional.as_slice() {
        [] => {
            return Err(ExcType::type_error(format!(
                "{func_name} expected 1 arguments, got 0"
            )));
        }
        [iterable] => rt.collect(iterable)?,
        _ => positional,
    };
    rt.extreme(candidates, is_min)?
        .ok_or_else(|| ExcType::value_error(format!("{func_name}() arg is an empty sequence")))
}

impl Runtime {
    /// The first smallest (`is_min`) or first largest element of `items`.
    pub(crate) fn extreme(&mut self, items: Vec<Value>, is_min: bool) -> RunResult<Option<Value>> {
        let mut items = items.into_iter();
        let Some(mut best) = items.next() else {
            return Ok(None);
        };
        for item in items {
            let better = if is_min {
                self.lt(&item, &best)?
            } else {
                self.gt(&item, &best)?
            };
            if better {
                best = item;
            }
        }
        Ok(Some(best))
    }

    /// `min(items)`; `ValueError` when empty.
    pub fn min(&mut self, iterable: &Value) -> RunResult<Value> {
        let items = self.collect(iterable)?;
        self.extreme(items, true)?
            .ok_or_else(|| ExcType::value_error("min() arg is an empty sequence"))
    }

    /// `max(items)`; `ValueError` when empty.
    pub fn max(&mut self, iterable: &Value) -> RunResult<Value> {
        let items = self.collect(iterable)?;
        self.extreme(items, false)?
            .ok_or_else(|| ExcType::value_error("max() arg is an empty sequence"))
    }
}
