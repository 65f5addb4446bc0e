//! Raising, matching and describing exceptions.

use super::Runtime;
use crate::{
    ExcType,
    exception_private::{ExceptionRaise, RaisedException, RunError, RunResult, SimpleException},
    exception_public::Exception,
    heap::ClassId,
    types::{InstanceRef, Payload},
    value::Value,
};

impl Runtime {
    /// Raises `exception`: an exception class (instantiated without arguments) or instance.
    ///
    /// Returns the error to propagate; raising never "succeeds". The current call stack is
    /// captured into both the error and the instance.
    #[must_use]
    pub fn raise(&mut self, exception: Value) -> RunError {
        let value = match exception {
            Value::Class(class_id) => match self.instantiate(class_id, Vec::new()) {
                Ok(value) => value,
                Err(err) => return err,
            },
            other => other,
        };
        let base = self.exc_class(ExcType::BaseException);
        let inst = match value {
            Value::Instance(inst) if self.class_is_subclass(inst.class_id(), base) => inst,
            other => {
                return ExcType::type_error(format!(
                    "exceptions must derive from BaseException, not {}",
                    self.type_name(&other)
                ));
            }
        };
        let traceback = self.call_stack.clone();
        record_traceback(&inst, &traceback);
        self.tracer.on_raise(self.heap.class(inst.class_id()).name());
        RunError::Exc(Box::new(ExceptionRaise {
            exc: RaisedException::Instance(inst),
            traceback: Some(traceback),
        }))
    }

    /// Raises a new instance of a built-in exception kind with a message.
    #[must_use]
    pub fn raise_new(&mut self, exc_type: ExcType, msg: &str) -> RunError {
        let class_id = self.exc_class(exc_type);
        match self.instantiate(class_id, vec![Value::from(msg)]) {
            Ok(value) => self.raise(value),
            Err(err) => err,
        }
    }

    /// Whether a handler for `class_id` catches `err`.
    ///
    /// Internal errors and resource-limit errors never match.
    #[must_use]
    pub fn exception_matches(&self, err: &RunError, class_id: ClassId) -> bool {
        let RunError::Exc(raise) = err else {
            return false;
        };
        match &raise.exc {
            RaisedException::Simple(exc) => self.class_is_subclass(self.exc_class(exc.exc_type()), class_id),
            RaisedException::Instance(inst) => self.class_is_subclass(inst.class_id(), class_id),
        }
    }

    /// Whether `err` is a (catchable) `StopIteration`.
    #[must_use]
    pub fn is_stop_iteration(&self, err: &RunError) -> bool {
        match err.simple_type() {
            Some(exc_type) => matches!(err, RunError::Exc(_)) && exc_type == ExcType::StopIteration,
            None => self.exception_matches(err, self.exc_class(ExcType::StopIteration)),
        }
    }

    /// The exception instance behind `err`, creating it for lightweight native errors.
    ///
    /// The created instance replaces the lightweight form inside `err`, so repeated calls
    /// return the same instance.
    pub fn exception_value(&mut self, err: &mut RunError) -> RunResult<Value> {
        let (RunError::Exc(raise) | RunError::UncatchableExc(raise)) = err else {
            return Err(err.clone());
        };
        let simple = match &raise.exc {
            RaisedException::Instance(inst) => return Ok(Value::Instance(inst.clone())),
            RaisedException::Simple(simple) => simple.clone(),
        };
        let inst = self.materialize(&simple)?;
        if let Some(traceback) = &raise.traceback {
            record_traceback(&inst, traceback);
        }
        raise.exc = RaisedException::Instance(inst.clone());
        Ok(Value::Instance(inst))
    }

    /// Runs the catch-site logic for `result`.
    ///
    /// - `Ok(Ok(value))` when there was no error;
    /// - `Ok(Err(exception))` when the error matched `class_id`;
    /// - `Err(err)` to keep propagating.
    pub fn catch<T>(&mut self, result: RunResult<T>, class_id: ClassId) -> RunResult<Result<T, Value>> {
        match result {
            Ok(value) => Ok(Ok(value)),
            Err(mut err) if self.exception_matches(&err, class_id) => Ok(Err(self.exception_value(&mut err)?)),
            Err(err) => Err(err),
        }
    }

    /// Detaches `err` from the runtime: class name, message and traceback as strings.
    pub fn describe_error(&mut self, err: &RunError) -> Exception {
        let raise = match err {
            RunError::Internal(msg) => {
                return Exception::new("RuntimeError", Some(format!("internal error: {msg}")));
            }
            RunError::Exc(raise) | RunError::UncatchableExc(raise) => raise,
        };
        let traceback = raise.traceback.clone().unwrap_or_default();
        let exc = match &raise.exc {
            RaisedException::Simple(simple) => Exception::new(simple.exc_type().to_string(), simple.arg().map(str::to_owned)),
            RaisedException::Instance(inst) => {
                let type_name = self.heap.class(inst.class_id()).name().to_owned();
                let message = match self.str_of(&Value::Instance(inst.clone())) {
                    Ok(text) => text.to_string(),
                    Err(_) => format!("<unprintable {type_name} object>"),
                };
                Exception::new(type_name, Some(message))
            }
        };
        exc.with_traceback(traceback)
    }

    /// Traceback recorded on a raised exception instance.
    #[must_use]
    pub fn exception_traceback(&self, exception: &Value) -> Option<Vec<crate::StackFrame>> {
        let inst = exception.as_instance()?;
        match &*inst.payload() {
            Payload::Exception(frames) => Some(frames.clone()),
            _ => None,
        }
    }

    fn materialize(&mut self, simple: &SimpleException) -> RunResult<InstanceRef> {
        let class_id = self.exc_class(simple.exc_type());
        let args = simple.arg().map(Value::from).into_iter().collect();
        match self.instantiate(class_id, args)? {
            Value::Instance(inst) => Ok(inst),
            _ => Err(RunError::internal("exception class produced a non-instance")),
        }
    }
}

/// Stores the traceback on an exception instance, unless the instance holds other native
/// state (an exception class that also derives from a container).
fn record_traceback(inst: &InstanceRef, traceback: &[crate::StackFrame]) {
    inst.with_payload_mut(|payload| {
        if matches!(payload, Payload::Empty | Payload::Exception(_)) {
            *payload = Payload::Exception(traceback.to_vec());
        }
    });
}
