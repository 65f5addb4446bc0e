//! The runtime: owner of the class arena, the module registry and the diagnostics hooks.
//!
//! Operations are implemented as `impl Runtime` blocks spread over the sibling modules:
//! attribute access in `attr`, calls and instantiation in `call`, operator dispatch in
//! `binary` and `compare`, and raising/catching in `exceptions`.

mod attr;
mod binary;
mod call;
mod compare;
mod exceptions;
mod subscript;

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

pub use binary::{BinaryOp, OperatorResult};
pub use compare::CompareOp;

use crate::{
    ExcType,
    exception_private::RunResult,
    exception_public::StackFrame,
    heap::{ClassId, Heap, HeapStats},
    io::{PrintWriter, StdPrint},
    modules::ModuleRegistry,
    namespace::Namespace,
    resource::{LARGE_RESULT_THRESHOLD, LimitedTracker, NoLimitTracker, ResourceLimits, ResourceTracker},
    tracer::{NoopTracer, RuntimeTracer},
    types::{
        self, ClassRecord, InstanceRef, Payload,
        class::build_class,
    },
    value::Value,
};

/// How instances see the methods of their class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeBinding {
    /// Methods are resolved through the class on every access, so patching a class after
    /// instances exist is visible to those instances.
    #[default]
    Live,
    /// Bound methods are copied into the instance when it is created; later class patches
    /// only affect instances created afterwards.
    Snapshot,
}

/// Runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub limits: ResourceLimits,
    pub attribute_binding: AttributeBinding,
    /// Extra module search roots, consulted after `"."` and `"<builtin>"`.
    pub search_path: Vec<String>,
}

/// Ids of the classes every runtime starts with.
#[derive(Debug)]
pub(crate) struct BuiltinClasses {
    pub list: ClassId,
    pub tuple: ClassId,
    pub dict: ClassId,
    pub str: ClassId,
    pub slice: ClassId,
    pub listiterator: ClassId,
    pub listreversediterator: ClassId,
    pub tupleiterator: ClassId,
    pub xrange: ClassId,
    pub rangeiterator: ClassId,
    pub genexpr: ClassId,
    exceptions: AHashMap<ExcType, ClassId>,
}

impl BuiltinClasses {
    fn bootstrap(heap: &mut Heap) -> Self {
        let mut exceptions = AHashMap::new();
        for exc_type in ExcType::iter() {
            let name: &'static str = exc_type.into();
            let (bases, namespace) = match exc_type.parent() {
                Some(parent) => (vec![exceptions[&parent]], Namespace::new().in_module("exceptions")),
                None => (Vec::new(), types::exception::namespace()),
            };
            exceptions.insert(exc_type, build_class(heap, name, &bases, &namespace));
        }

        let list = build_class(heap, "list", &[], &types::list::namespace());
        let tuple = build_class(heap, "tuple", &[], &types::tuple::namespace());
        let dict = build_class(heap, "dict", &[], &types::dict::namespace());
        let str = build_class(heap, "str", &[], &types::string::namespace());
        let slice = build_class(heap, "slice", &[], &types::slice::namespace());
        let listiterator = build_class(heap, "listiterator", &[], &types::iter::list_iterator_namespace());
        let listreversediterator = build_class(
            heap,
            "listreversediterator",
            &[listiterator],
            &types::iter::reversed_iterator_namespace(),
        );
        let tupleiterator = build_class(
            heap,
            "tupleiterator",
            &[listiterator],
            &Namespace::new().in_module("__builtin__"),
        );
        let xrange = build_class(heap, "xrange", &[], &types::range::xrange_namespace());
        let rangeiterator = build_class(heap, "rangeiterator", &[], &types::range::iterator_namespace());
        let genexpr = build_class(heap, "generator", &[], &types::generator::namespace());

        Self {
            list,
            tuple,
            dict,
            str,
            slice,
            listiterator,
            listreversediterator,
            tupleiterator,
            xrange,
            rangeiterator,
            genexpr,
            exceptions,
        }
    }

    pub fn exception(&self, exc_type: ExcType) -> ClassId {
        self.exceptions[&exc_type]
    }

    /// Built-in class by its language-level name.
    fn by_name(&self, name: &str) -> Option<ClassId> {
        let id = match name {
            "list" => self.list,
            "tuple" => self.tuple,
            "dict" => self.dict,
            "str" => self.str,
            "slice" => self.slice,
            "listiterator" => self.listiterator,
            "listreversediterator" => self.listreversediterator,
            "tupleiterator" => self.tupleiterator,
            "xrange" => self.xrange,
            "rangeiterator" => self.rangeiterator,
            "generator" => self.genexpr,
            other => return other.parse::<ExcType>().ok().map(|exc_type| self.exception(exc_type)),
        };
        Some(id)
    }

    /// Containers and iterators published in the `__builtin__` module.
    pub fn public(&self) -> [(&'static str, ClassId); 6] {
        [
            ("list", self.list),
            ("tuple", self.tuple),
            ("dict", self.dict),
            ("str", self.str),
            ("slice", self.slice),
            ("xrange", self.xrange),
        ]
    }
}

/// The object runtime.
///
/// Owns the class arena, the module registry, the call stack used for tracebacks and the
/// pluggable resource tracker, tracer and print writer. Values created by one runtime must
/// only be used with that runtime.
pub struct Runtime {
    pub(crate) heap: Heap,
    pub(crate) builtins: BuiltinClasses,
    pub(crate) call_stack: Vec<StackFrame>,
    pub(crate) modules: ModuleRegistry,
    /// Addresses of containers whose repr is being computed, to cut self-references.
    repr_guard: Vec<usize>,
    binding: AttributeBinding,
    tracker: Box<dyn ResourceTracker>,
    pub(crate) tracer: Box<dyn RuntimeTracer>,
    print: Box<dyn PrintWriter>,
}

impl Runtime {
    /// Creates a runtime with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        let mut heap = Heap::default();
        let builtins = BuiltinClasses::bootstrap(&mut heap);
        let tracker: Box<dyn ResourceTracker> = if config.limits.is_unlimited() {
            Box::new(NoLimitTracker)
        } else {
            Box::new(LimitedTracker::new(config.limits))
        };
        let mut rt = Self {
            heap,
            builtins,
            call_stack: Vec::new(),
            modules: ModuleRegistry::new(config.search_path),
            repr_guard: Vec::new(),
            binding: config.attribute_binding,
            tracker,
            tracer: Box::new(NoopTracer),
            print: Box::new(StdPrint),
        };
        crate::modules::register_builtin_modules(&mut rt);
        rt
    }

    pub fn set_tracer(&mut self, tracer: impl RuntimeTracer + 'static) {
        self.tracer = Box::new(tracer);
    }

    pub fn set_tracker(&mut self, tracker: impl ResourceTracker + 'static) {
        self.tracker = Box::new(tracker);
    }

    pub fn set_print(&mut self, print: impl PrintWriter + 'static) {
        self.print = Box::new(print);
    }

    #[must_use]
    pub fn attribute_binding(&self) -> AttributeBinding {
        self.binding
    }

    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    #[must_use]
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Allocations counted by the resource tracker, if it counts them.
    #[must_use]
    pub fn allocation_count(&self) -> Option<usize> {
        self.tracker.allocation_count()
    }

    #[must_use]
    pub fn class_record(&self, id: ClassId) -> &ClassRecord {
        self.heap.class(id)
    }

    /// A built-in class by name: `"list"`, `"dict"`, `"KeyError"`, ...
    #[must_use]
    pub fn builtin_class(&self, name: &str) -> Option<ClassId> {
        self.builtins.by_name(name)
    }

    /// The class of a built-in exception kind.
    #[must_use]
    pub fn exc_class(&self, exc_type: ExcType) -> ClassId {
        self.builtins.exception(exc_type)
    }

    /// Frames of the functions currently executing, outermost first.
    #[must_use]
    pub fn call_stack(&self) -> &[StackFrame] {
        &self.call_stack
    }

    /// Builds a new class from `bases` (in declaration order) and its own `namespace`.
    pub fn define_class(&mut self, name: &str, bases: &[ClassId], namespace: Namespace) -> RunResult<ClassId> {
        if let Some(unknown) = bases.iter().find(|base| self.heap.get_class(**base).is_none()) {
            return Err(ExcType::type_error(format!(
                "base {unknown:?} of class '{name}' is not a class of this runtime"
            )));
        }
        let id = build_class(&mut self.heap, name, bases, &namespace);
        self.tracer
            .on_class_built(name, bases.len(), self.heap.class(id).attr_count());
        Ok(id)
    }

    pub(crate) fn allocate_instance(&mut self, class_id: ClassId, payload: Payload) -> RunResult<InstanceRef> {
        self.tracker.on_allocate()?;
        self.heap.note_instance();
        self.tracer.on_instantiate(self.heap.class(class_id).name());
        Ok(InstanceRef::new(class_id, payload))
    }

    pub(crate) fn check_time(&mut self) -> RunResult<()> {
        self.tracker.check_time()?;
        Ok(())
    }

    /// Lets the resource tracker veto a result of `estimated_bytes` before it is built.
    pub(crate) fn check_large_result(&self, estimated_bytes: usize) -> RunResult<()> {
        if estimated_bytes > LARGE_RESULT_THRESHOLD {
            self.tracker.check_large_result(estimated_bytes)?;
        }
        Ok(())
    }

    pub(crate) fn print_writer(&mut self) -> &mut dyn PrintWriter {
        self.print.as_mut()
    }

    /// Language-level type name of a value, as used in error messages.
    #[must_use]
    pub fn type_name<'a>(&'a self, value: &Value) -> &'a str {
        if let Some(name) = value.primitive_type_name() {
            return name;
        }
        match value {
            Value::Instance(inst) => self.heap.class(inst.class_id()).name(),
            Value::Class(_) => "type",
            Value::Function(_) => "function",
            Value::Method(desc) => desc.kind_name(),
            Value::Module(_) => "module",
            _ => "object",
        }
    }

    /// Marks `inst` as being repr'd; returns `false` if it already is (a self-reference).
    pub(crate) fn enter_repr(&mut self, inst: &InstanceRef) -> bool {
        let address = inst.address();
        if self.repr_guard.contains(&address) {
            return false;
        }
        self.repr_guard.push(address);
        true
    }

    pub(crate) fn leave_repr(&mut self, inst: &InstanceRef) {
        let address = inst.address();
        if let Some(pos) = self.repr_guard.iter().rposition(|a| *a == address) {
            self.repr_guard.remove(pos);
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("classes", &self.heap.stats().classes)
            .field("call_depth", &self.call_stack.len())
            .field("binding", &self.binding)
            .field("tracker", &self.tracker)
            .field("tracer", &self.tracer)
            .finish_non_exhaustive()
    }
}
