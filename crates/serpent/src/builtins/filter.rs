//! Implementation of the filter() builtin function.

use crate::{
    Runtime,
    exception_private::RunResult,
    function::unpack,
    types::{string::text_of, tuple::tuple_items},
    value::Value,
};

/// Implementation of the filter() builtin function.
///
/// Keeps the items for which `function` returns a true value, or the true items when
/// `function` is `None`. Text filters to text and tuples to tuples; anything else
/// iterable produces a list.
pub fn builtin_filter(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [function, iterable] = unpack(args)?;
    rt.filter(&function, &iterable)
}

impl Runtime {
    pub fn filter(&mut self, function: &Value, iterable: &Value) -> RunResult<Value> {
        let mut kept = Vec::new();
        for item in self.collect(iterable)? {
            let test = if function.is_none() {
                item.clone()
            } else {
                self.call(function, vec![item.clone()])?
            };
            if self.truthy(&test)? {
                kept.push(item);
            }
        }
        if text_of(iterable).is_some() {
            let mut text = String::new();
            for item in &kept {
                text.push_str(&self.str_of(item)?);
            }
            return Ok(Value::from(text));
        }
        if tuple_items(iterable).is_some() {
            return self.new_tuple(kept);
        }
        self.new_list(kept)
    }
}
