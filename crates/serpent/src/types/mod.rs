//! Class records, descriptors and the built-in classes.
//!
//! Built-in containers are ordinary classes built with the class builder; their methods are
//! native functions that keep their state in the instance [`Payload`].

pub(crate) mod class;
pub(crate) mod descriptor;
pub(crate) mod dict;
pub(crate) mod exception;
pub(crate) mod generator;
pub(crate) mod iter;
pub(crate) mod list;
pub(crate) mod range;
pub(crate) mod sequence;
pub(crate) mod slice;
pub(crate) mod string;
pub(crate) mod tuple;

use std::rc::Rc;

pub use class::{ClassAttr, ClassRecord, InstanceRef};
pub use descriptor::{BindTarget, Descriptor, bind};
pub use iter::ForIter;
pub use slice::Slice;

use crate::{
    ExcType,
    exception_private::RunResult,
    exception_public::StackFrame,
    value::Value,
};

/// Native state of an instance of a built-in class.
#[derive(Debug, Default)]
pub(crate) enum Payload {
    /// Plain instances, and built-in instances whose `__init__` has not run yet.
    #[default]
    Empty,
    List(Vec<Value>),
    Tuple(Rc<[Value]>),
    Dict(dict::DictStore),
    Str(Rc<str>),
    Slice(Slice),
    SeqIter(iter::SeqIter),
    Range(range::RangeSpec),
    RangeIter(range::RangeSpec),
    GenExpr(Box<generator::GenExpr>),
    /// Call stack captured when the exception instance was raised.
    Exception(Vec<StackFrame>),
}

/// Returns the instance a native method was called on.
pub(crate) fn receiver<'a>(value: &'a Value, type_name: &str) -> RunResult<&'a InstanceRef> {
    value
        .as_instance()
        .ok_or_else(|| ExcType::type_error(format!("descriptor requires a '{type_name}' object")))
}

/// Error for a method called on an instance of the right class whose payload is missing,
/// e.g. a subclass whose `__init__` never called the base constructor.
pub(crate) fn payload_error(type_name: &str) -> crate::RunError {
    ExcType::type_error(format!("descriptor requires an initialized '{type_name}' object"))
}
