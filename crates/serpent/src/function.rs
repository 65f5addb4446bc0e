//! Callable functions and their parameter signatures.

use std::fmt;

use indexmap::IndexMap;

use crate::{
    Runtime,
    exception_private::{RunError, RunResult},
    value::Value,
};

/// Body of a function: receives the runtime and the bound argument list.
pub type NativeFn = dyn Fn(&mut Runtime, Vec<Value>) -> RunResult<Value>;

/// Parameter description of a function.
///
/// An empty parameter list means the body receives the caller's arguments untouched.
/// Otherwise arguments are bound positionally: missing trailing parameters take their
/// default (looked up by name) and, with `var_args`, the final parameter collects all
/// remaining positionals into a tuple.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<String>,
    defaults: IndexMap<String, Value>,
    var_args: bool,
}

impl Signature {
    #[must_use]
    pub fn new<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            defaults: IndexMap::new(),
            var_args: false,
        }
    }

    /// Signature that forwards arguments as given.
    #[must_use]
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Sets the default value for the parameter `name`.
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Makes the final parameter collect surplus positional arguments.
    #[must_use]
    pub fn with_var_args(mut self) -> Self {
        self.var_args = true;
        self
    }

    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[must_use]
    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.defaults.get(name)
    }

    #[must_use]
    pub fn has_var_args(&self) -> bool {
        self.var_args
    }

    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of parameters bound one-to-one to positional arguments.
    pub(crate) fn fixed_count(&self) -> usize {
        if self.var_args {
            self.params.len().saturating_sub(1)
        } else {
            self.params.len()
        }
    }

    /// Number of fixed parameters without a default.
    pub(crate) fn required_count(&self) -> usize {
        self.params[..self.fixed_count()]
            .iter()
            .filter(|param| !self.defaults.contains_key(param.as_str()))
            .count()
    }
}

/// A named callable.
pub struct Function {
    name: String,
    module: Option<String>,
    signature: Signature,
    body: Box<NativeFn>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        signature: Signature,
        body: impl Fn(&mut Runtime, Vec<Value>) -> RunResult<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            module: None,
            signature,
            body: Box::new(body),
        }
    }

    /// Sets the module name shown in tracebacks and reprs.
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn invoke(&self, rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
        (self.body)(rt, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Destructures bound arguments into a fixed-size array.
///
/// Function bodies with a non-passthrough [`Signature`] always receive exactly one value per
/// parameter, so a mismatch here is an internal error rather than a user-facing one.
pub fn unpack<const N: usize>(args: Vec<Value>) -> RunResult<[Value; N]> {
    args.try_into().map_err(|args: Vec<Value>| {
        RunError::internal(format!("expected {N} bound arguments, got {}", args.len()))
    })
}
