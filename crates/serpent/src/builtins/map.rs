//! Implementation of the map() and zip() builtin functions.

use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    function::unpack,
    types::tuple::tuple_items,
    value::Value,
};

fn iterables_of(rest: &Value) -> Vec<Value> {
    tuple_items(rest).map(|items| items.to_vec()).unwrap_or_default()
}

/// Implementation of the map() builtin function.
///
/// Applies `function` to the items of the iterables taken in parallel and returns a list.
/// Shorter iterables are padded with `None`. A `None` function yields the items
/// themselves: bare items for one iterable, tuples for several.
pub fn builtin_map(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [function, rest] = unpack(args)?;
    let iterables = iterables_of(&rest);
    if iterables.is_empty() {
        return Err(ExcType::type_error("map() requires at least two args"));
    }
    rt.map(&function, &iterables)
}

/// Implementation of the zip() builtin function.
///
/// Returns a list of tuples, truncated to the shortest iterable.
pub fn builtin_zip(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [rest] = unpack(args)?;
    rt.zip(&iterables_of(&rest))
}

impl Runtime {
    pub fn map(&mut self, function: &Value, iterables: &[Value]) -> RunResult<Value> {
        let mut columns = Vec::with_capacity(iterables.len());
        for iterable in iterables {
            columns.push(self.collect(iterable)?);
        }
        let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
        let mut out = Vec::with_capacity(rows);
        for row in 0..rows {
            self.check_time()?;
            let args: Vec<Value> = columns
                .iter()
                .map(|column| column.get(row).cloned().unwrap_or(Value::None))
                .collect();
            let item = match (function.is_none(), args.len()) {
                (true, 1) => args.into_iter().next().unwrap_or_default(),
                (true, _) => self.new_tuple(args)?,
                (false, _) => self.call(function, args)?,
            };
            out.push(item);
        }
        self.new_list(out)
    }

    pub fn zip(&mut self, iterables: &[Value]) -> RunResult<Value> {
        let mut columns = Vec::with_capacity(iterables.len());
        for iterable in iterables {
            columns.push(self.collect(iterable)?);
        }
        let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
        let mut out = Vec::with_capacity(rows);
        for row in 0..rows {
            let tuple = columns.iter().map(|column| column[row].clone()).collect();
            out.push(self.new_tuple(tuple)?);
        }
        self.new_list(out)
    }
}
