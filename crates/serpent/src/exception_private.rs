use std::{
    borrow::Cow,
    fmt::{self, Display},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{exception_public::StackFrame, resource::ResourceError, types::InstanceRef};

/// Result type alias for operations that can raise.
pub type RunResult<T> = Result<T, RunError>;

/// Built-in exception kinds.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `ValueError` -> "ValueError").
///
/// Variants are declared parent-first so the runtime can build the class tree by iterating
/// them in order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum ExcType {
    /// Root of the tree; catches everything.
    BaseException,
    Exception,
    StandardError,
    TypeError,
    ImportError,
    EnvironmentError,
    IOError,
    OSError,
    EOFError,
    RuntimeError,
    NotImplementedError,
    NameError,
    UnboundLocalError,
    AttributeError,
    SyntaxError,
    IndentationError,
    TabError,
    // --- LookupError hierarchy ---
    LookupError,
    IndexError,
    KeyError,
    // --- ValueError hierarchy ---
    ValueError,
    UnicodeError,
    UnicodeEncodeError,
    UnicodeDecodeError,
    UnicodeTranslateError,
    AssertionError,
    // --- ArithmeticError hierarchy ---
    ArithmeticError,
    FloatingPointError,
    OverflowError,
    ZeroDivisionError,
    SystemError,
    ReferenceError,
    MemoryError,
    BufferError,
    /// Signals iterator exhaustion. Sits directly under `Exception`, not `StandardError`.
    StopIteration,
    // --- Warning hierarchy ---
    Warning,
    UserWarning,
    DeprecationWarning,
    PendingDeprecationWarning,
    SyntaxWarning,
    RuntimeWarning,
    FutureWarning,
    ImportWarning,
    UnicodeWarning,
    BytesWarning,
    // --- direct BaseException subclasses ---
    GeneratorExit,
    SystemExit,
    KeyboardInterrupt,
}

impl ExcType {
    /// The single base of this exception kind, `None` for `BaseException`.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        let parent = match self {
            Self::BaseException => return None,
            Self::Exception | Self::GeneratorExit | Self::SystemExit | Self::KeyboardInterrupt => {
                Self::BaseException
            }
            Self::StandardError | Self::StopIteration | Self::Warning => Self::Exception,
            Self::IOError | Self::OSError => Self::EnvironmentError,
            Self::NotImplementedError => Self::RuntimeError,
            Self::UnboundLocalError => Self::NameError,
            Self::IndentationError => Self::SyntaxError,
            Self::TabError => Self::IndentationError,
            Self::IndexError | Self::KeyError => Self::LookupError,
            Self::UnicodeError => Self::ValueError,
            Self::UnicodeEncodeError | Self::UnicodeDecodeError | Self::UnicodeTranslateError => Self::UnicodeError,
            Self::FloatingPointError | Self::OverflowError | Self::ZeroDivisionError => Self::ArithmeticError,
            Self::UserWarning
            | Self::DeprecationWarning
            | Self::PendingDeprecationWarning
            | Self::SyntaxWarning
            | Self::RuntimeWarning
            | Self::FutureWarning
            | Self::ImportWarning
            | Self::UnicodeWarning
            | Self::BytesWarning => Self::Warning,
            Self::TypeError
            | Self::ImportError
            | Self::EnvironmentError
            | Self::EOFError
            | Self::RuntimeError
            | Self::NameError
            | Self::AttributeError
            | Self::SyntaxError
            | Self::LookupError
            | Self::ValueError
            | Self::AssertionError
            | Self::ArithmeticError
            | Self::SystemError
            | Self::ReferenceError
            | Self::MemoryError
            | Self::BufferError => Self::StandardError,
        };
        Some(parent)
    }

    /// Whether an exception of this kind is caught by a handler for `handler_type`.
    #[must_use]
    pub fn is_subclass_of(self, handler_type: Self) -> bool {
        let mut current = Some(self);
        while let Some(exc_type) = current {
            if exc_type == handler_type {
                return true;
            }
            current = exc_type.parent();
        }
        false
    }

    #[must_use]
    pub(crate) fn type_error(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::TypeError, msg).into()
    }

    #[must_use]
    pub(crate) fn value_error(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::ValueError, msg).into()
    }

    #[must_use]
    pub(crate) fn index_error(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::IndexError, msg).into()
    }

    /// KeyError carrying the repr of the missing key.
    #[must_use]
    pub(crate) fn key_error(key_repr: impl Display) -> RunError {
        SimpleException::new_msg(Self::KeyError, key_repr).into()
    }

    #[must_use]
    pub(crate) fn zero_division(msg: &'static str) -> RunError {
        SimpleException::new_msg(Self::ZeroDivisionError, msg).into()
    }

    #[must_use]
    pub(crate) fn overflow(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::OverflowError, msg).into()
    }

    #[must_use]
    pub(crate) fn import_error(msg: impl Display) -> RunError {
        SimpleException::new_msg(Self::ImportError, msg).into()
    }

    /// AttributeError in the form `'{type}' object has no attribute '{name}'`.
    #[must_use]
    pub(crate) fn attribute_error(type_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("'{type_name}' object has no attribute '{attr}'"),
        )
        .into()
    }

    /// AttributeError for a missing class attribute.
    #[must_use]
    pub(crate) fn type_object_attribute_error(class_name: &str, attr: &str) -> RunError {
        SimpleException::new_msg(
            Self::AttributeError,
            format!("type object '{class_name}' has no attribute '{attr}'"),
        )
        .into()
    }

    /// MemoryError for a result that cannot be allocated.
    #[must_use]
    pub(crate) fn memory_error() -> RunError {
        SimpleException::new(Self::MemoryError, None).into()
    }

    /// Exhaustion signal raised by `next()`.
    #[must_use]
    pub(crate) fn stop_iteration() -> RunError {
        SimpleException::new(Self::StopIteration, None).into()
    }

    /// TypeError for an operator no operand could handle.
    #[must_use]
    pub(crate) fn binary_type_error(op: &str, lhs: &str, rhs: &str) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("unsupported operand type(s) for {op}: '{lhs}' and '{rhs}'"),
        )
        .into()
    }

    /// TypeError for a callable invoked with the wrong number of arguments.
    #[must_use]
    pub(crate) fn arg_count_error(name: &str, qualifier: &str, expected: usize, actual: usize) -> RunError {
        let plural = if expected == 1 { "" } else { "s" };
        SimpleException::new_msg(
            Self::TypeError,
            format!("{name}() takes {qualifier} {expected} argument{plural} ({actual} given)"),
        )
        .into()
    }
}

/// A lightweight exception: a kind plus an optional message.
///
/// Native code raises these without touching the runtime; they are turned into real
/// exception instances only when a handler asks for the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleException {
    exc_type: ExcType,
    arg: Option<String>,
}

impl SimpleException {
    #[must_use]
    pub fn new(exc_type: ExcType, arg: Option<String>) -> Self {
        Self { exc_type, arg }
    }

    #[must_use]
    pub fn new_msg(exc_type: ExcType, msg: impl Display) -> Self {
        Self::new(exc_type, Some(msg.to_string()))
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn arg(&self) -> Option<&str> {
        self.arg.as_deref()
    }
}

impl Display for SimpleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}: {arg}", self.exc_type),
            None => write!(f, "{}", self.exc_type),
        }
    }
}

/// The thing that was raised.
#[derive(Debug, Clone)]
pub(crate) enum RaisedException {
    /// Built-in kind and message, not yet materialized.
    Simple(SimpleException),
    /// A live exception instance.
    Instance(InstanceRef),
}

/// A raised exception together with the call stack captured when it was raised.
#[derive(Debug, Clone)]
pub struct ExceptionRaise {
    pub(crate) exc: RaisedException,
    /// Innermost frame last. `None` until the exception is raised explicitly or first
    /// crosses a call boundary.
    pub(crate) traceback: Option<Vec<StackFrame>>,
}

impl From<SimpleException> for ExceptionRaise {
    fn from(exc: SimpleException) -> Self {
        Self {
            exc: RaisedException::Simple(exc),
            traceback: None,
        }
    }
}

/// Error type threaded through every fallible runtime operation.
#[derive(Debug, Clone)]
pub enum RunError {
    /// Internal runtime error: a broken invariant, not a user-level exception.
    Internal(Cow<'static, str>),
    /// Catchable exception (e.g. `ValueError`, `TypeError`).
    Exc(Box<ExceptionRaise>),
    /// Exception from a resource limit. Displays like any other exception but is never
    /// matched by [`Runtime::exception_matches`](crate::Runtime::exception_matches).
    UncatchableExc(Box<ExceptionRaise>),
}

impl RunError {
    #[must_use]
    pub fn internal(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal(msg.into())
    }

    /// The built-in kind of a not-yet-materialized exception.
    #[must_use]
    pub fn simple_type(&self) -> Option<ExcType> {
        match self {
            Self::Exc(raise) | Self::UncatchableExc(raise) => match &raise.exc {
                RaisedException::Simple(exc) => Some(exc.exc_type()),
                RaisedException::Instance(_) => None,
            },
            Self::Internal(_) => None,
        }
    }

    /// The captured call stack, innermost frame last.
    #[must_use]
    pub fn traceback(&self) -> Option<&[StackFrame]> {
        match self {
            Self::Exc(raise) | Self::UncatchableExc(raise) => raise.traceback.as_deref(),
            Self::Internal(_) => None,
        }
    }

    /// Records `stack` as the traceback unless one was captured already.
    ///
    /// Returns `true` when the traceback was set by this call.
    pub(crate) fn capture_traceback(&mut self, stack: &[StackFrame]) -> bool {
        match self {
            Self::Exc(raise) | Self::UncatchableExc(raise) if raise.traceback.is_none() => {
                raise.traceback = Some(stack.to_vec());
                true
            }
            _ => false,
        }
    }
}

impl From<SimpleException> for RunError {
    fn from(exc: SimpleException) -> Self {
        Self::Exc(Box::new(exc.into()))
    }
}

impl From<ResourceError> for RunError {
    fn from(err: ResourceError) -> Self {
        Self::UncatchableExc(Box::new(err.into_exception().into()))
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
            Self::Exc(raise) | Self::UncatchableExc(raise) => match &raise.exc {
                RaisedException::Simple(exc) => write!(f, "{exc}"),
                RaisedException::Instance(inst) => write!(f, "exception instance {inst:?}"),
            },
        }
    }
}

impl std::error::Error for RunError {}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn parents_are_declared_before_children() {
        let order: Vec<ExcType> = ExcType::iter().collect();
        for (index, exc_type) in order.iter().enumerate() {
            if let Some(parent) = exc_type.parent() {
                let parent_index = order.iter().position(|t| *t == parent);
                assert!(
                    parent_index.is_some_and(|p| p < index),
                    "{parent} must be declared before {exc_type}"
                );
            }
        }
    }

    #[test]
    fn lookup_errors_share_a_base() {
        assert!(ExcType::KeyError.is_subclass_of(ExcType::LookupError));
        assert!(ExcType::IndexError.is_subclass_of(ExcType::StandardError));
        assert!(!ExcType::StopIteration.is_subclass_of(ExcType::StandardError));
        assert!(!ExcType::SystemExit.is_subclass_of(ExcType::Exception));
        assert!(ExcType::TabError.is_subclass_of(ExcType::SyntaxError));
    }

    #[test]
    fn names_round_trip_through_strum() {
        let parsed: ExcType = "ZeroDivisionError".parse().unwrap();
        assert_eq!(parsed, ExcType::ZeroDivisionError);
        let name: &'static str = ExcType::UnicodeDecodeError.into();
        assert_eq!(name, "UnicodeDecodeError");
    }
}
