//! Built-in functions.
//!
//! Every builtin is available twice: as a method on [`Runtime`] for Rust callers, and as a
//! [`BuiltinFunction`] callable published in the `__builtin__` module. Each non-trivial
//! builtin has its own submodule.

pub(crate) mod filter;
pub(crate) mod isinstance;
pub(crate) mod map;
pub(crate) mod min_max; // min and max share implementation
pub(crate) mod print;
pub(crate) mod sorted;
pub(crate) mod sum;

use std::rc::Rc;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    ExcType, Runtime,
    exception_private::{RunResult, SimpleException},
    function::{Function, Signature, unpack},
    types::{range::range_spec, string::text_of, tuple::tuple_items},
    value::Value,
};

/// Enumerates the built-in functions.
///
/// Variants display as their lowercase language-level name (`Isinstance` -> "isinstance").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum BuiltinFunction {
    Bool,
    Callable,
    Filter,
    Getattr,
    Hasattr,
    Isinstance,
    Issubclass,
    Iter,
    Len,
    Map,
    Max,
    Min,
    Next,
    Print,
    Range,
    Reduce,
    Repr,
    Setattr,
    Sorted,
    Sum,
    Zip,
}

impl BuiltinFunction {
    /// Parameter list the function is called with.
    #[must_use]
    pub fn signature(self) -> Signature {
        match self {
            Self::Bool => Signature::new(["x"]).with_default("x", Value::Bool(false)),
            Self::Callable | Self::Iter | Self::Len | Self::Repr => Signature::new(["obj"]),
            Self::Filter => Signature::new(["function", "iterable"]),
            Self::Getattr => Signature::new(["obj", "name", "default"]).with_var_args(),
            Self::Hasattr => Signature::new(["obj", "name"]),
            Self::Isinstance => Signature::new(["obj", "classinfo"]),
            Self::Issubclass => Signature::new(["cls", "classinfo"]),
            Self::Map => Signature::new(["function", "iterables"]).with_var_args(),
            Self::Max | Self::Min | Self::Print | Self::Zip => Signature::new(["args"]).with_var_args(),
            Self::Next => Signature::new(["iterator", "default"]).with_var_args(),
            Self::Range => Signature::new(["start", "stop", "step"])
                .with_default("stop", Value::NotImplemented)
                .with_default("step", Value::Int(1)),
            Self::Reduce => Signature::new(["function", "iterable", "initial"]).with_var_args(),
            Self::Setattr => Signature::new(["obj", "name", "value"]),
            Self::Sorted => Signature::new(["iterable", "cmp", "key", "reverse"])
                .with_default("cmp", Value::None)
                .with_default("key", Value::None)
                .with_default("reverse", Value::Bool(false)),
            Self::Sum => Signature::new(["iterable", "start"]).with_default("start", Value::Int(0)),
        }
    }

    /// Runs the builtin on arguments already bound to [`signature`](Self::signature).
    pub fn call(self, rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
        match self {
            Self::Bool => {
                let [x] = unpack(args)?;
                rt.truthy(&x).map(Value::Bool)
            }
            Self::Callable => {
                let [obj] = unpack(args)?;
                Ok(Value::Bool(rt.callable(&obj)))
            }
            Self::Filter => filter::builtin_filter(rt, args),
            Self::Getattr => {
                let [obj, name, default] = unpack(args)?;
                let name = attr_name(&name)?;
                match (rt.lookup_attr(&obj, &name), optional(&default)) {
                    (Some(value), _) => Ok(value),
                    (None, Some(default)) => Ok(default),
                    (None, None) => Err(rt.attribute_error(&obj, &name)),
                }
            }
            Self::Hasattr => {
                let [obj, name] = unpack(args)?;
                Ok(Value::Bool(rt.hasattr(&obj, &attr_name(&name)?)))
            }
            Self::Isinstance => {
                let [obj, classinfo] = unpack(args)?;
                rt.isinstance(&obj, &classinfo).map(Value::Bool)
            }
            Self::Issubclass => {
                let [cls, classinfo] = unpack(args)?;
                rt.issubclass(&cls, &classinfo).map(Value::Bool)
            }
            Self::Iter => {
                let [obj] = unpack(args)?;
                rt.iter(&obj)
            }
            Self::Len => {
                let [obj] = unpack(args)?;
                Ok(Value::Int(rt.len(&obj)? as i64))
            }
            Self::Map => map::builtin_map(rt, args),
            Self::Max => min_max::builtin_max(rt, args),
            Self::Min => min_max::builtin_min(rt, args),
            Self::Next => {
                let [iterator, default] = unpack(args)?;
                match (rt.next(&iterator)?, optional(&default)) {
                    (Some(value), _) => Ok(value),
                    (None, Some(default)) => Ok(default),
                    (None, None) => Err(ExcType::stop_iteration()),
                }
            }
            Self::Print => print::builtin_print(rt, args),
            Self::Range => {
                let [start, stop, step] = unpack(args)?;
                let mut spec = range_spec("range", &start, &stop, &step)?;
                rt.collect_range(&mut spec)
            }
            Self::Reduce => sum::builtin_reduce(rt, args),
            Self::Repr => {
                let [obj] = unpack(args)?;
                rt.repr(&obj).map(Value::Text)
            }
            Self::Setattr => {
                let [obj, name, value] = unpack(args)?;
                rt.setattr(&obj, &attr_name(&name)?, value)?;
                Ok(Value::None)
            }
            Self::Sorted => sorted::builtin_sorted(rt, args),
            Self::Sum => sum::builtin_sum(rt, args),
            Self::Zip => map::builtin_zip(rt, args),
        }
    }

    /// A callable function value running this builtin.
    #[must_use]
    pub fn to_function(self) -> Function {
        Function::new(self.to_string(), self.signature(), move |rt, args| self.call(rt, args)).with_module("__builtin__")
    }
}

fn attr_name(name: &Value) -> RunResult<Rc<str>> {
    text_of(name).ok_or_else(|| ExcType::type_error("attribute name must be string"))
}

/// The single optional argument collected by a variadic tail.
pub(crate) fn optional(rest: &Value) -> Option<Value> {
    tuple_items(rest).and_then(|items| items.first().cloned())
}

/// Formats a float the way the language prints it: integral values keep a `.0`.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_owned()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_owned()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

impl Runtime {
    /// `len(value)` through `__len__`.
    pub fn len(&mut self, value: &Value) -> RunResult<usize> {
        if let Value::Text(text) = value {
            return Ok(text.chars().count());
        }
        let Some(method) = self.dispatch_method(value, "__len__") else {
            return Err(ExcType::type_error(format!(
                "object of type '{}' has no len()",
                self.type_name(value)
            )));
        };
        let len = self.call(&method, Vec::new())?;
        len.as_int()
            .and_then(|len| usize::try_from(len).ok())
            .ok_or_else(|| ExcType::value_error("__len__() should return >= 0"))
    }

    /// Truth value: `__nonzero__`, then `__len__`, then `true` for any other object.
    pub fn truthy(&mut self, value: &Value) -> RunResult<bool> {
        match value {
            Value::None => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            Value::Float(f) => Ok(*f != 0.0),
            Value::Text(text) => Ok(!text.is_empty()),
            Value::Instance(_) => {
                if let Some(method) = self.dispatch_method(value, "__nonzero__") {
                    let result = self.call(&method, Vec::new())?;
                    return self.truthy(&result);
                }
                if self.dispatch_method(value, "__len__").is_some() {
                    return Ok(self.len(value)? > 0);
                }
                Ok(true)
            }
            Value::NotImplemented | Value::Class(_) | Value::Function(_) | Value::Method(_) | Value::Module(_) => {
                Ok(true)
            }
        }
    }

    /// `repr(value)`: `__repr__` for instances, a built-in rendering otherwise.
    pub fn repr(&mut self, value: &Value) -> RunResult<Rc<str>> {
        let text = match value {
            Value::None => "None".to_owned(),
            Value::NotImplemented => "NotImplemented".to_owned(),
            Value::Bool(b) => if *b { "True" } else { "False" }.to_owned(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Text(text) => crate::types::string::quote(text),
            Value::Class(id) => format!("<class '{}'>", self.heap.class(*id).qualified_name()),
            Value::Function(func) => match func.module() {
                Some(module) => format!("<function {} from module {module}>", func.name()),
                None => format!("<function {}>", func.name()),
            },
            Value::Method(desc) => {
                let name = desc.func().name();
                match (desc.owner(), desc.receiver()) {
                    (Some(owner), Some(receiver)) => {
                        let class_name = self.heap.class(owner).name().to_owned();
                        let receiver = self.repr(&receiver.clone())?;
                        format!("<bound method {class_name}.{name} of {receiver}>")
                    }
                    (Some(owner), None) => format!("<unbound method {}.{name}>", self.heap.class(owner).name()),
                    _ => format!("<{} object {name}>", desc.kind_name()),
                }
            }
            Value::Module(module) => format!("<module '{}' from '{}'>", module.name(), module.file()),
            Value::Instance(inst) => match self.dispatch_method(value, "__repr__") {
                Some(method) => {
                    let result = self.call(&method, Vec::new())?;
                    return text_of(&result).ok_or_else(|| {
                        ExcType::type_error(format!(
                            "__repr__ returned non-string (type {})",
                            self.type_name(&result)
                        ))
                    });
                }
                None => {
                    let record = self.heap.class(inst.class_id());
                    format!("<{} object at {:#x}>", record.qualified_name(), inst.address())
                }
            },
        };
        Ok(Rc::from(text))
    }

    /// `str(value)`: text as-is, `__str__` for instances that define it, `repr` otherwise.
    pub fn str_of(&mut self, value: &Value) -> RunResult<Rc<str>> {
        if let Some(text) = text_of(value) {
            return Ok(text);
        }
        if let Value::Instance(_) = value
            && let Some(method) = self.dispatch_method(value, "__str__")
        {
            let result = self.call(&method, Vec::new())?;
            return text_of(&result).ok_or_else(|| {
                ExcType::type_error(format!(
                    "__str__ returned non-string (type {})",
                    self.type_name(&result)
                ))
            });
        }
        self.repr(value)
    }

    /// [`str_of`](Self::str_of) as a text value.
    pub fn to_str(&mut self, value: &Value) -> RunResult<Value> {
        self.str_of(value).map(Value::Text)
    }

    /// Raises `AssertionError(message)` unless `value` is truthy.
    pub fn assert_true(&mut self, value: &Value, message: &str) -> RunResult<()> {
        if self.truthy(value)? {
            Ok(())
        } else {
            Err(SimpleException::new_msg(ExcType::AssertionError, message).into())
        }
    }

    /// Calls a builtin by name with positional arguments.
    pub fn call_builtin(&mut self, builtin: BuiltinFunction, args: Vec<Value>) -> RunResult<Value> {
        let func = Rc::new(builtin.to_function());
        self.call_function(&func, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_keep_a_decimal_point() {
        assert_eq!(format_float(2.0), "2.0");
        assert_eq!(format_float(-0.5), "-0.5");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(1e20), "100000000000000000000");
    }

    #[test]
    fn names_are_lowercase() {
        assert_eq!(BuiltinFunction::Isinstance.to_string(), "isinstance");
        assert_eq!("getattr".parse::<BuiltinFunction>().unwrap(), BuiltinFunction::Getattr);
    }
}
