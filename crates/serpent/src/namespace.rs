use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    Runtime,
    exception_private::RunResult,
    function::{Function, Signature},
    types::Descriptor,
    value::Value,
};

/// The attribute namespace of a class body, in definition order.
///
/// Plain functions placed here become unbound methods of the class being built;
/// [`classmethod`](Self::classmethod) and [`staticmethod`](Self::staticmethod) entries keep
/// their kind; anything else is stored as a class attribute as-is.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: IndexMap<String, Value>,
    module: Option<String>,
}

impl Namespace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Module name recorded on the class and on functions defined through this namespace.
    #[must_use]
    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Adds a plain data attribute (or an already-built callable).
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Adds a function that becomes an instance method.
    #[must_use]
    pub fn method(
        mut self,
        name: &str,
        signature: Signature,
        body: impl Fn(&mut Runtime, Vec<Value>) -> RunResult<Value> + 'static,
    ) -> Self {
        let func = self.function(name, signature, body);
        self.entries.insert(name.to_owned(), Value::Function(func));
        self
    }

    /// Adds a function whose first argument is the class it is accessed through.
    #[must_use]
    pub fn classmethod(
        mut self,
        name: &str,
        signature: Signature,
        body: impl Fn(&mut Runtime, Vec<Value>) -> RunResult<Value> + 'static,
    ) -> Self {
        let func = self.function(name, signature, body);
        self.entries
            .insert(name.to_owned(), Descriptor::ClassMethod { func }.into());
        self
    }

    /// Adds a function that never receives an implicit first argument.
    #[must_use]
    pub fn staticmethod(
        mut self,
        name: &str,
        signature: Signature,
        body: impl Fn(&mut Runtime, Vec<Value>) -> RunResult<Value> + 'static,
    ) -> Self {
        let func = self.function(name, signature, body);
        self.entries
            .insert(name.to_owned(), Descriptor::StaticMethod { func }.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn function(
        &self,
        name: &str,
        signature: Signature,
        body: impl Fn(&mut Runtime, Vec<Value>) -> RunResult<Value> + 'static,
    ) -> Rc<Function> {
        let func = Function::new(name, signature, body);
        Rc::new(match &self.module {
            Some(module) => func.with_module(module.clone()),
            None => func,
        })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Namespace {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            module: None,
        }
    }
}
