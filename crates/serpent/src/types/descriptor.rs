use std::rc::Rc;

use crate::{function::Function, heap::ClassId, value::Value};

/// Method wrappers stored in class attribute tables.
///
/// A plain function defined in a class body becomes an [`UnboundMethod`](Self::UnboundMethod)
/// of that class. Looking the attribute up through an instance yields a
/// [`BoundMethod`](Self::BoundMethod) that carries the instance as receiver.
#[derive(Debug)]
pub enum Descriptor {
    /// Method reached through its class; the receiver must be passed explicitly.
    UnboundMethod { class_id: ClassId, func: Rc<Function> },
    /// Method closed over its receiver.
    BoundMethod {
        class_id: ClassId,
        func: Rc<Function>,
        receiver: Value,
    },
    /// Function receiving the class it is accessed through as first argument.
    ClassMethod { func: Rc<Function> },
    /// Function receiving no implicit argument.
    StaticMethod { func: Rc<Function> },
}

impl Descriptor {
    /// Wraps `func` as a class method value.
    #[must_use]
    pub fn classmethod(func: Rc<Function>) -> Value {
        Self::ClassMethod { func }.into()
    }

    /// Wraps `func` as a static method value.
    #[must_use]
    pub fn staticmethod(func: Rc<Function>) -> Value {
        Self::StaticMethod { func }.into()
    }

    #[must_use]
    pub fn func(&self) -> &Rc<Function> {
        match self {
            Self::UnboundMethod { func, .. }
            | Self::BoundMethod { func, .. }
            | Self::ClassMethod { func }
            | Self::StaticMethod { func } => func,
        }
    }

    /// The receiver of a bound method.
    #[must_use]
    pub fn receiver(&self) -> Option<&Value> {
        match self {
            Self::BoundMethod { receiver, .. } => Some(receiver),
            _ => None,
        }
    }

    /// Class the method was resolved on, for bound and unbound methods.
    #[must_use]
    pub fn owner(&self) -> Option<ClassId> {
        match self {
            Self::UnboundMethod { class_id, .. } | Self::BoundMethod { class_id, .. } => Some(*class_id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unbound(&self) -> bool {
        matches!(self, Self::UnboundMethod { .. })
    }

    /// Type name as seen from the language.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::UnboundMethod { .. } | Self::BoundMethod { .. } => "instancemethod",
            Self::ClassMethod { .. } => "classmethod",
            Self::StaticMethod { .. } => "staticmethod",
        }
    }
}

/// What an attribute is being looked up through.
#[derive(Debug, Clone, Copy)]
pub enum BindTarget<'a> {
    /// Access through the class itself.
    Class(ClassId),
    /// Access through an instance of `class_id`.
    Instance { receiver: &'a Value, class_id: ClassId },
}

impl BindTarget<'_> {
    fn class_id(self) -> ClassId {
        match self {
            Self::Class(class_id) | Self::Instance { class_id, .. } => class_id,
        }
    }
}

/// Resolves a value fetched from a class attribute table for the given access target.
///
/// - unbound methods stay unbound through the class and bind to the receiver through an
///   instance;
/// - class methods bind to the class in either case;
/// - static methods resolve to their raw function;
/// - bound methods and plain data are returned unchanged.
#[must_use]
pub fn bind(value: &Value, target: BindTarget<'_>) -> Value {
    let Value::Method(desc) = value else {
        return value.clone();
    };
    match (&**desc, target) {
        (Descriptor::UnboundMethod { func, .. }, BindTarget::Instance { receiver, class_id }) => {
            Descriptor::BoundMethod {
                class_id,
                func: func.clone(),
                receiver: receiver.clone(),
            }
            .into()
        }
        (Descriptor::ClassMethod { func }, target) => {
            let class_id = target.class_id();
            Descriptor::BoundMethod {
                class_id,
                func: func.clone(),
                receiver: Value::Class(class_id),
            }
            .into()
        }
        (Descriptor::StaticMethod { func }, _) => Value::Function(func.clone()),
        _ => value.clone(),
    }
}
