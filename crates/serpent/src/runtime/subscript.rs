//! Subscription: `container[index]`, item assignment and item deletion.

use super::Runtime;
use crate::{ExcType, exception_private::RunResult, value::Value};

impl Runtime {
    /// `container[index]` through `__getitem__`.
    pub fn getitem(&mut self, container: &Value, index: &Value) -> RunResult<Value> {
        match self.dispatch_method(container, "__getitem__") {
            Some(method) => self.call(&method, vec![index.clone()]),
            None => Err(ExcType::type_error(format!(
                "'{}' object is not subscriptable",
                self.type_name(container)
            ))),
        }
    }

    /// `container[index] = value` through `__setitem__`; tuples and text have none.
    pub fn setitem(&mut self, container: &Value, index: &Value, value: Value) -> RunResult<()> {
        match self.dispatch_method(container, "__setitem__") {
            Some(method) => self.call(&method, vec![index.clone(), value]).map(drop),
            None => Err(ExcType::type_error(format!(
                "'{}' object does not support item assignment",
                self.type_name(container)
            ))),
        }
    }

    pub fn delitem(&mut self, container: &Value, index: &Value) -> RunResult<()> {
        match self.dispatch_method(container, "__delitem__") {
            Some(method) => self.call(&method, vec![index.clone()]).map(drop),
            None => Err(ExcType::type_error(format!(
                "'{}' object doesn't support item deletion",
                self.type_name(container)
            ))),
        }
    }
}
