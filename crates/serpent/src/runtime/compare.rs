//! Comparisons and membership.
//!
//! Only `>` and `>=` are dispatched; `<` is computed as `not (a >= b)` and `<=` as
//! `not (a > b)`. This assumes a total order and gives the wrong answer for unordered
//! values such as NaN.

use std::cmp::Ordering;

use strum::{Display, EnumString, IntoStaticStr};

use super::{OperatorResult, Runtime};
use crate::{
    ExcType,
    exception_private::RunResult,
    tracer::DispatchStrategy,
    types::string::text_of,
    value::Value,
};

/// Comparison operators usable in a chain, parsed from their source spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum CompareOp {
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "not in")]
    NotIn,
    #[strum(serialize = "is")]
    Is,
    #[strum(serialize = "is not")]
    IsNot,
}

impl Runtime {
    /// `a == b`: `__eq__` on either side, else identity.
    pub fn eq(&mut self, a: &Value, b: &Value) -> RunResult<bool> {
        match self.dispatch("__eq__", "__eq__", a, b)? {
            OperatorResult::Value(result) => self.truthy(&result),
            OperatorResult::NotImplemented => {
                self.tracer.on_dispatch("__eq__", DispatchStrategy::Identity);
                Ok(a == b)
            }
        }
    }

    /// `a != b`: `__ne__` on either side, else non-identity.
    pub fn ne(&mut self, a: &Value, b: &Value) -> RunResult<bool> {
        match self.dispatch("__ne__", "__ne__", a, b)? {
            OperatorResult::Value(result) => self.truthy(&result),
            OperatorResult::NotImplemented => {
                self.tracer.on_dispatch("__ne__", DispatchStrategy::Identity);
                Ok(a != b)
            }
        }
    }

    /// `a > b`, falling back to `b.__lt__(a)`.
    pub fn gt(&mut self, a: &Value, b: &Value) -> RunResult<bool> {
        self.ordering_op(">", "__gt__", "__lt__", a, b, Ordering::is_gt)
    }

    /// `a >= b`, falling back to `b.__le__(a)`.
    pub fn ge(&mut self, a: &Value, b: &Value) -> RunResult<bool> {
        self.ordering_op(">=", "__ge__", "__le__", a, b, Ordering::is_ge)
    }

    /// `a < b`, computed as `not (a >= b)`.
    pub fn lt(&mut self, a: &Value, b: &Value) -> RunResult<bool> {
        Ok(!self.ge(a, b)?)
    }

    /// `a <= b`, computed as `not (a > b)`.
    pub fn le(&mut self, a: &Value, b: &Value) -> RunResult<bool> {
        Ok(!self.gt(a, b)?)
    }

    /// `item in container`, through `container.__contains__`.
    ///
    /// Host text supports substring tests natively.
    pub fn contains(&mut self, container: &Value, item: &Value) -> RunResult<bool> {
        if let Value::Text(haystack) = container {
            return match text_of(item) {
                Some(needle) => Ok(haystack.contains(&*needle)),
                None => Err(ExcType::type_error("'in <string>' requires string as left operand")),
            };
        }
        match self.dispatch_method(container, "__contains__") {
            Some(method) => {
                let result = self.call(&method, vec![item.clone()])?;
                self.truthy(&result)
            }
            None => Err(ExcType::type_error(format!(
                "argument of type '{}' is not iterable",
                self.type_name(container)
            ))),
        }
    }

    /// Applies a single comparison operator.
    pub fn compare(&mut self, op: CompareOp, a: &Value, b: &Value) -> RunResult<bool> {
        match op {
            CompareOp::Lt => self.lt(a, b),
            CompareOp::Gt => self.gt(a, b),
            CompareOp::Le => self.le(a, b),
            CompareOp::Ge => self.ge(a, b),
            CompareOp::Eq => self.eq(a, b),
            CompareOp::Ne => self.ne(a, b),
            CompareOp::In => self.contains(b, a),
            CompareOp::NotIn => Ok(!self.contains(b, a)?),
            CompareOp::Is => Ok(a == b),
            CompareOp::IsNot => Ok(a != b),
        }
    }

    /// Evaluates `values[0] op[0] values[1] op[1] values[2] ...`, short-circuiting on the
    /// first false link.
    pub fn compare_chain(&mut self, values: &[Value], ops: &[CompareOp]) -> RunResult<bool> {
        if values.len() != ops.len() + 1 {
            return Err(ExcType::value_error(format!(
                "comparison chain needs {} operands for {} operators, got {}",
                ops.len() + 1,
                ops.len(),
                values.len()
            )));
        }
        for (pair, op) in values.windows(2).zip(ops) {
            if !self.compare(*op, &pair[0], &pair[1])? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn ordering_op(
        &mut self,
        symbol: &str,
        op: &str,
        reflected: &str,
        a: &Value,
        b: &Value,
        test: fn(Ordering) -> bool,
    ) -> RunResult<bool> {
        if let OperatorResult::Value(result) = self.dispatch(op, reflected, a, b)? {
            return self.truthy(&result);
        }
        let ordering = match (a, b) {
            (Value::Text(x), Value::Text(y)) => Some(Some(x.cmp(y))),
            _ => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => Some(x.partial_cmp(&y)),
                _ => None,
            },
        };
        match ordering {
            Some(ordering) => {
                self.tracer.on_dispatch(op, DispatchStrategy::Native);
                // unordered operands (NaN) compare false
                Ok(ordering.is_some_and(test))
            }
            None => {
                self.tracer.on_dispatch(op, DispatchStrategy::Unsupported);
                Err(ExcType::type_error(format!(
                    "'{symbol}' not supported between instances of '{}' and '{}'",
                    self.type_name(a),
                    self.type_name(b)
                )))
            }
        }
    }
}
