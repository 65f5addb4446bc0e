//! Runtime values.

use std::{cmp::Ordering, fmt, rc::Rc};

use crate::{
    function::Function,
    heap::ClassId,
    modules::ModuleRef,
    types::{Descriptor, InstanceRef},
};

/// A dynamically typed value.
///
/// `None`, booleans, numbers and host text are stored inline. Instances, functions, method
/// descriptors and modules are shared through reference counting, so cloning a `Value` is
/// always cheap. Classes live in the [`Heap`](crate::Heap) arena and are referenced by id.
///
/// `PartialEq` on `Value` is *identity*: the same object, or two primitives of equal value.
/// Language-level equality that honours `__eq__` is [`Runtime::eq`](crate::Runtime::eq).
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    /// The sentinel a special method returns to decline an operation.
    NotImplemented,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Host-native text. `str` instances wrap text in a class; this is the primitive form.
    Text(Rc<str>),
    Class(ClassId),
    Instance(InstanceRef),
    Function(Rc<Function>),
    Method(Rc<Descriptor>),
    Module(ModuleRef),
}

/// A host-native number, used for the primitive fallback of operator dispatch.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl Value {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented)
    }

    /// Returns the integer value of `Int` and `Bool` values.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Returns the instance behind this value, if it is one.
    #[must_use]
    pub fn as_instance(&self) -> Option<&InstanceRef> {
        match self {
            Self::Instance(inst) => Some(inst),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            Self::Class(id) => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Self::Int(i) => Some(Number::Int(*i)),
            Self::Bool(b) => Some(Number::Int(i64::from(*b))),
            Self::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Name of the primitive kind, or `None` for heap-backed values.
    #[must_use]
    pub(crate) fn primitive_type_name(&self) -> Option<&'static str> {
        match self {
            Self::None => Some("NoneType"),
            Self::NotImplemented => Some("NotImplementedType"),
            Self::Bool(_) => Some("bool"),
            Self::Int(_) => Some("int"),
            Self::Float(_) => Some("float"),
            Self::Text(_) => Some("str"),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) | (Self::NotImplemented, Self::NotImplemented) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Class(a), Self::Class(b)) => a == b,
            (Self::Instance(a), Self::Instance(b)) => a.ptr_eq(b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Method(a), Self::Method(b)) => Rc::ptr_eq(a, b),
            (Self::Module(a), Self::Module(b)) => a.ptr_eq(b),
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::NotImplemented => f.write_str("NotImplemented"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Text(s) => write!(f, "Text({s:?})"),
            Self::Class(id) => write!(f, "{id:?}"),
            Self::Instance(inst) => write!(f, "{inst:?}"),
            Self::Function(func) => write!(f, "Function({})", func.name()),
            Self::Method(desc) => write!(f, "Method({}: {})", desc.kind_name(), desc.func().name()),
            Self::Module(module) => write!(f, "{module:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Self::Text(s)
    }
}

impl From<ClassId> for Value {
    fn from(id: ClassId) -> Self {
        Self::Class(id)
    }
}

impl From<InstanceRef> for Value {
    fn from(inst: InstanceRef) -> Self {
        Self::Instance(inst)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Self::Function(Rc::new(func))
    }
}

impl From<Descriptor> for Value {
    fn from(desc: Descriptor) -> Self {
        Self::Method(Rc::new(desc))
    }
}
