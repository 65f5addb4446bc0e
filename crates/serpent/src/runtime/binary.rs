//! Binary operator dispatch.
//!
//! Every arithmetic operator goes through the same protocol:
//! 1. the left operand's special method (`__add__`), unless it returns `NotImplemented`;
//! 2. the right operand's reflected method (`__radd__`), whose result is final;
//! 3. the native operator when both operands are primitives of the same kind;
//! 4. otherwise `TypeError`.

use num_integer::Integer;
use strum::{Display, EnumString, IntoStaticStr};

use super::Runtime;
use crate::{
    ExcType,
    exception_private::RunResult,
    tracer::DispatchStrategy,
    value::{Number, Value},
};

/// Outcome of the method phase of dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorResult {
    Value(Value),
    /// Neither operand handled the operation.
    NotImplemented,
}

/// Arithmetic operators, displayed as their source symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    /// Classic division: floors when both operands are integers.
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "//")]
    FloorDiv,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "**")]
    Pow,
}

impl BinaryOp {
    #[must_use]
    pub fn dunder(self) -> &'static str {
        match self {
            Self::Add => "__add__",
            Self::Sub => "__sub__",
            Self::Mul => "__mul__",
            Self::Div => "__div__",
            Self::FloorDiv => "__floordiv__",
            Self::Mod => "__mod__",
            Self::Pow => "__pow__",
        }
    }

    #[must_use]
    pub fn reflected(self) -> &'static str {
        match self {
            Self::Add => "__radd__",
            Self::Sub => "__rsub__",
            Self::Mul => "__rmul__",
            Self::Div => "__rdiv__",
            Self::FloorDiv => "__rfloordiv__",
            Self::Mod => "__rmod__",
            Self::Pow => "__rpow__",
        }
    }

    #[must_use]
    pub fn inplace(self) -> &'static str {
        match self {
            Self::Add => "__iadd__",
            Self::Sub => "__isub__",
            Self::Mul => "__imul__",
            Self::Div => "__idiv__",
            Self::FloorDiv => "__ifloordiv__",
            Self::Mod => "__imod__",
            Self::Pow => "__ipow__",
        }
    }
}

impl Runtime {
    /// The method phase of dispatch: `a.op(b)`, then `b.rop(a)`.
    ///
    /// A reflected method's result is returned as-is, even `NotImplemented`.
    pub fn dispatch(&mut self, op: &str, reflected: &str, a: &Value, b: &Value) -> RunResult<OperatorResult> {
        if let Some(method) = self.dispatch_method(a, op) {
            let result = self.call(&method, vec![b.clone()])?;
            if !result.is_not_implemented() {
                self.tracer.on_dispatch(op, DispatchStrategy::Forward);
                return Ok(OperatorResult::Value(result));
            }
        }
        if let Some(method) = self.dispatch_method(b, reflected) {
            let result = self.call(&method, vec![a.clone()])?;
            if result.is_not_implemented() {
                return Ok(OperatorResult::NotImplemented);
            }
            self.tracer.on_dispatch(op, DispatchStrategy::Reflected);
            return Ok(OperatorResult::Value(result));
        }
        Ok(OperatorResult::NotImplemented)
    }

    /// Applies a binary operator with full dispatch and native fallback.
    pub fn binary_op(&mut self, op: BinaryOp, a: &Value, b: &Value) -> RunResult<Value> {
        if let OperatorResult::Value(value) = self.dispatch(op.dunder(), op.reflected(), a, b)? {
            return Ok(value);
        }
        if let Some(value) = native_binary(op, a, b)? {
            self.tracer.on_dispatch(op.dunder(), DispatchStrategy::Native);
            return Ok(value);
        }
        self.tracer.on_dispatch(op.dunder(), DispatchStrategy::Unsupported);
        Err(ExcType::binary_type_error(op.into(), self.type_name(a), self.type_name(b)))
    }

    /// Augmented assignment: tries `a.__iop__(b)` first, then the binary operator.
    pub fn inplace_op(&mut self, op: BinaryOp, a: &Value, b: &Value) -> RunResult<Value> {
        if let Some(method) = self.dispatch_method(a, op.inplace()) {
            let result = self.call(&method, vec![b.clone()])?;
            if !result.is_not_implemented() {
                self.tracer.on_dispatch(op.inplace(), DispatchStrategy::Forward);
                return Ok(result);
            }
        }
        self.binary_op(op, a, b)
    }

    pub fn add(&mut self, a: &Value, b: &Value) -> RunResult<Value> {
        self.binary_op(BinaryOp::Add, a, b)
    }

    pub fn sub(&mut self, a: &Value, b: &Value) -> RunResult<Value> {
        self.binary_op(BinaryOp::Sub, a, b)
    }

    pub fn mul(&mut self, a: &Value, b: &Value) -> RunResult<Value> {
        self.binary_op(BinaryOp::Mul, a, b)
    }

    pub fn div(&mut self, a: &Value, b: &Value) -> RunResult<Value> {
        self.binary_op(BinaryOp::Div, a, b)
    }

    pub fn modulo(&mut self, a: &Value, b: &Value) -> RunResult<Value> {
        self.binary_op(BinaryOp::Mod, a, b)
    }
}

/// The native operator for two primitives of the same kind; `None` when the kinds differ or
/// the operator has no native meaning for them.
fn native_binary(op: BinaryOp, a: &Value, b: &Value) -> RunResult<Option<Value>> {
    if let (Value::Text(x), Value::Text(y)) = (a, b) {
        return Ok(match op {
            BinaryOp::Add => Some(Value::from(format!("{x}{y}"))),
            _ => None,
        });
    }
    let (Some(x), Some(y)) = (a.as_number(), b.as_number()) else {
        return Ok(None);
    };
    let value = match (x, y) {
        (Number::Int(x), Number::Int(y)) => int_binary(op, x, y)?,
        _ => float_binary(op, x.as_f64(), y.as_f64())?,
    };
    Ok(Some(value))
}

fn int_binary(op: BinaryOp, x: i64, y: i64) -> RunResult<Value> {
    let overflow = || ExcType::overflow("integer overflow");
    let result = match op {
        BinaryOp::Add => x.checked_add(y).ok_or_else(overflow)?,
        BinaryOp::Sub => x.checked_sub(y).ok_or_else(overflow)?,
        BinaryOp::Mul => x.checked_mul(y).ok_or_else(overflow)?,
        BinaryOp::Div | BinaryOp::FloorDiv => {
            if y == 0 {
                return Err(ExcType::zero_division("integer division or modulo by zero"));
            }
            if x == i64::MIN && y == -1 {
                return Err(overflow());
            }
            Integer::div_floor(&x, &y)
        }
        BinaryOp::Mod => {
            if y == 0 {
                return Err(ExcType::zero_division("integer division or modulo by zero"));
            }
            if y == -1 {
                0
            } else {
                Integer::mod_floor(&x, &y)
            }
        }
        BinaryOp::Pow => {
            if y < 0 {
                if x == 0 {
                    return Err(ExcType::zero_division("0.0 cannot be raised to a negative power"));
                }
                return Ok(Value::Float((x as f64).powf(y as f64)));
            }
            let exp = u32::try_from(y).map_err(|_| overflow())?;
            x.checked_pow(exp).ok_or_else(overflow)?
        }
    };
    Ok(Value::Int(result))
}

fn float_binary(op: BinaryOp, x: f64, y: f64) -> RunResult<Value> {
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => {
            if y == 0.0 {
                return Err(ExcType::zero_division("float division by zero"));
            }
            x / y
        }
        BinaryOp::FloorDiv => {
            if y == 0.0 {
                return Err(ExcType::zero_division("float divmod()"));
            }
            (x / y).floor()
        }
        BinaryOp::Mod => {
            if y == 0.0 {
                return Err(ExcType::zero_division("float modulo"));
            }
            let r = x % y;
            if r != 0.0 && (r < 0.0) != (y < 0.0) { r + y } else { r }
        }
        BinaryOp::Pow => x.powf(y),
    };
    Ok(Value::Float(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_division_floors_towards_negative_infinity() {
        assert_eq!(int_binary(BinaryOp::Div, -7, 2).unwrap(), Value::Int(-4));
        assert_eq!(int_binary(BinaryOp::Mod, -7, 2).unwrap(), Value::Int(1));
        assert_eq!(int_binary(BinaryOp::Mod, 7, -2).unwrap(), Value::Int(-1));
    }

    #[test]
    fn overflow_is_reported_not_wrapped() {
        assert!(int_binary(BinaryOp::Add, i64::MAX, 1).is_err());
        assert!(int_binary(BinaryOp::Pow, 2, 64).is_err());
    }

    #[test]
    fn mixed_numbers_promote_to_float() {
        let value = native_binary(BinaryOp::Add, &Value::Int(1), &Value::Float(0.5)).unwrap();
        assert_eq!(value, Some(Value::Float(1.5)));
    }

    #[test]
    fn text_only_concatenates() {
        let joined = native_binary(BinaryOp::Add, &Value::from("ab"), &Value::from("cd")).unwrap();
        assert_eq!(joined, Some(Value::from("abcd")));
        assert_eq!(
            native_binary(BinaryOp::Sub, &Value::from("ab"), &Value::from("cd")).unwrap(),
            None
        );
        assert_eq!(native_binary(BinaryOp::Add, &Value::from("ab"), &Value::Int(1)).unwrap(), None);
    }
}
