//! Implementation of the sum() and reduce() builtin functions.

use super::optional;
use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    function::unpack,
    types::string::text_of,
    value::Value,
};

/// Implementation of the sum() builtin function.
///
/// Adds the items of an iterable to `start` from left to right. Text start values are
/// rejected; joining strings is `str.join`'s job.
pub fn builtin_sum(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [iterable, start] = unpack(args)?;
    rt.sum(&iterable, start)
}

/// Implementation of the reduce() builtin function.
pub fn builtin_reduce(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [function, iterable, initial] = unpack(args)?;
    rt.reduce(&function, &iterable, optional(&initial))
}

impl Runtime {
    pub fn sum(&mut self, iterable: &Value, start: Value) -> RunResult<Value> {
        if text_of(&start).is_some() {
            return Err(ExcType::type_error("sum() can't sum strings [use ''.join(seq) instead]"));
        }
        let mut total = start;
        for item in self.collect(iterable)? {
            total = self.add(&total, &item)?;
        }
        Ok(total)
    }

    /// Folds `iterable` with the two-argument `function`, seeded with `initial` or the first
    /// item.
    pub fn reduce(&mut self, function: &Value, iterable: &Value, initial: Option<Value>) -> RunResult<Value> {
        let mut items = self.collect(iterable)?.into_iter();
        let Some(mut acc) = initial.or_else(|| items.next()) else {
            return Err(ExcType::type_error("reduce() of empty sequence with no initial value"));
        };
        for item in items {
            acc = self.call(function, vec![acc, item])?;
        }
        Ok(acc)
    }
}
