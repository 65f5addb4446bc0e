//! Calling functions, methods and classes.

use std::rc::Rc;

use super::Runtime;
use crate::{
    ExcType,
    exception_private::RunResult,
    exception_public::StackFrame,
    function::Function,
    heap::ClassId,
    types::{Descriptor, Payload},
    value::Value,
};

impl Runtime {
    /// Calls any callable value.
    ///
    /// - functions bind `args` to their signature;
    /// - bound methods prepend their receiver;
    /// - unbound methods require an instance of their class as first argument;
    /// - static methods call their function;
    /// - classes instantiate;
    /// - instances defer to `__call__`.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> RunResult<Value> {
        match callee {
            Value::Function(func) => self.call_function(func, args),
            Value::Method(desc) => self.call_descriptor(desc, args),
            Value::Class(class_id) => self.instantiate(*class_id, args),
            Value::Instance(_) => match self.dispatch_method(callee, "__call__") {
                Some(method) => self.call(&method, args),
                None => Err(self.not_callable(callee)),
            },
            _ => Err(self.not_callable(callee)),
        }
    }

    /// Whether [`call`](Self::call) would accept `value`.
    #[must_use]
    pub fn callable(&self, value: &Value) -> bool {
        match value {
            Value::Function(_) | Value::Class(_) => true,
            Value::Method(desc) => !matches!(**desc, Descriptor::ClassMethod { .. }),
            Value::Instance(_) => self.dispatch_method(value, "__call__").is_some(),
            _ => false,
        }
    }

    /// Calls a function: binds arguments, pushes a frame, runs the body, pops the frame.
    ///
    /// An error leaving the body without a traceback gets the stack as it was inside the
    /// body, so native errors report where they happened.
    pub fn call_function(&mut self, func: &Rc<Function>, args: Vec<Value>) -> RunResult<Value> {
        self.check_time()?;
        let args = self.bind_arguments(func, args)?;
        self.call_stack.push(StackFrame::new(func.name(), func.module()));
        self.tracer.on_call(func.name(), self.call_stack.len());
        let result = func.invoke(self, args).map_err(|mut err| {
            if err.capture_traceback(&self.call_stack)
                && let Some(exc_type) = err.simple_type()
            {
                self.tracer.on_raise(exc_type.into());
            }
            err
        });
        self.call_stack.pop();
        self.tracer.on_return(self.call_stack.len());
        result
    }

    fn call_descriptor(&mut self, desc: &Descriptor, mut args: Vec<Value>) -> RunResult<Value> {
        match desc {
            Descriptor::BoundMethod { func, receiver, .. } => {
                args.insert(0, receiver.clone());
                self.call_function(func, args)
            }
            Descriptor::UnboundMethod { class_id, func } => {
                self.check_unbound_receiver(*class_id, func, args.first())?;
                self.call_function(func, args)
            }
            Descriptor::StaticMethod { func } => self.call_function(func, args),
            Descriptor::ClassMethod { .. } => Err(ExcType::type_error("'classmethod' object is not callable")),
        }
    }

    fn check_unbound_receiver(&self, class_id: ClassId, func: &Function, first: Option<&Value>) -> RunResult<()> {
        let ok = first
            .and_then(Value::as_instance)
            .is_some_and(|inst| self.class_is_subclass(inst.class_id(), class_id));
        if ok {
            return Ok(());
        }
        let got = match first {
            Some(value) => format!("{} instance", self.type_name(value)),
            None => "nothing".to_owned(),
        };
        Err(ExcType::type_error(format!(
            "unbound method {}() must be called with {} instance as first argument (got {got} instead)",
            func.name(),
            self.heap.class(class_id).name(),
        )))
    }

    /// Creates an instance of `class_id` and runs its `__init__` with `args`.
    ///
    /// Classes without `__init__` accept and ignore any arguments.
    pub fn instantiate(&mut self, class_id: ClassId, args: Vec<Value>) -> RunResult<Value> {
        let inst = self.allocate_instance(class_id, Payload::Empty)?;
        self.snapshot_bindings(&inst);
        let value = Value::Instance(inst);
        if let Some(init) = self.dispatch_method(&value, "__init__") {
            self.call(&init, args)?;
        }
        Ok(value)
    }

    /// Applies a function's signature to positional arguments.
    fn bind_arguments(&mut self, func: &Function, mut args: Vec<Value>) -> RunResult<Vec<Value>> {
        let signature = func.signature();
        if signature.is_passthrough() {
            return Ok(args);
        }
        let fixed = signature.fixed_count();
        if args.len() > fixed && !signature.has_var_args() {
            let qualifier = if signature.required_count() == fixed {
                "exactly"
            } else {
                "at most"
            };
            return Err(ExcType::arg_count_error(func.name(), qualifier, fixed, args.len()));
        }
        let rest = if args.len() > fixed {
            args.split_off(fixed)
        } else {
            Vec::new()
        };
        let given = args.len();
        for param in &signature.params()[given..fixed] {
            match signature.default_for(param) {
                Some(default) => args.push(default.clone()),
                None => {
                    let required = signature.required_count();
                    let qualifier = if required == fixed && !signature.has_var_args() {
                        "exactly"
                    } else {
                        "at least"
                    };
                    return Err(ExcType::arg_count_error(func.name(), qualifier, required, given));
                }
            }
        }
        if signature.has_var_args() {
            args.push(self.new_tuple(rest)?);
        }
        Ok(args)
    }

    fn not_callable(&self, value: &Value) -> crate::RunError {
        ExcType::type_error(format!("'{}' object is not callable", self.type_name(value)))
    }
}
