//! Implementation of the print() builtin function.

use crate::{
    Runtime,
    exception_private::RunResult,
    function::unpack,
    types::tuple::tuple_items,
    value::Value,
};

/// Implementation of the print() builtin function.
///
/// Writes the `str()` of every argument separated by spaces, then a newline.
pub fn builtin_print(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [rest] = unpack(args)?;
    let values = tuple_items(&rest).map(|items| items.to_vec()).unwrap_or_default();
    rt.print(&values)?;
    Ok(Value::None)
}

impl Runtime {
    pub fn print(&mut self, values: &[Value]) -> RunResult<()> {
        // format everything first: a failing __str__ must not leave half a line behind
        let mut parts = Vec::with_capacity(values.len());
        for value in values {
            parts.push(self.str_of(value)?);
        }
        let writer = self.print_writer();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                writer.stdout_push(' ');
            }
            writer.stdout_write(part);
        }
        writer.stdout_push('\n');
        Ok(())
    }
}
