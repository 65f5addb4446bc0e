//! Class records, the class builder merge rule, and instances.

use std::{
    cell::{Ref, RefCell},
    fmt,
    rc::Rc,
};

use indexmap::IndexMap;

use super::{Descriptor, Payload};
use crate::{
    heap::{ClassId, Heap},
    namespace::Namespace,
    value::Value,
};

/// A resolved class attribute.
///
/// `depth` is the override depth of method-like attributes: 1 for a method defined in the
/// class body, one more for every level of inheritance it was copied through. Plain data
/// attributes carry no depth and are always replaced by later merges.
#[derive(Debug, Clone)]
pub struct ClassAttr {
    value: Value,
    depth: Option<u32>,
}

impl ClassAttr {
    /// Wraps an entry of the class's own namespace.
    pub(crate) fn own(value: &Value, class_id: ClassId) -> Self {
        match value {
            Value::Function(func) => Self {
                value: Descriptor::UnboundMethod {
                    class_id,
                    func: func.clone(),
                }
                .into(),
                depth: Some(1),
            },
            Value::Method(desc) => match &**desc {
                Descriptor::UnboundMethod { func, .. } => Self {
                    value: Descriptor::UnboundMethod {
                        class_id,
                        func: func.clone(),
                    }
                    .into(),
                    depth: Some(1),
                },
                Descriptor::ClassMethod { .. } | Descriptor::StaticMethod { .. } => Self {
                    value: value.clone(),
                    depth: Some(1),
                },
                Descriptor::BoundMethod { .. } => Self::data(value),
            },
            _ => Self::data(value),
        }
    }

    /// Copies an attribute of a base class into the class `class_id`.
    fn inherit(&self, class_id: ClassId) -> Self {
        let depth = self.depth.map(|depth| depth + 1);
        let value = match &self.value {
            Value::Method(desc) if desc.is_unbound() => Descriptor::UnboundMethod {
                class_id,
                func: desc.func().clone(),
            }
            .into(),
            other => other.clone(),
        };
        Self { value, depth }
    }

    fn data(value: &Value) -> Self {
        Self {
            value: value.clone(),
            depth: None,
        }
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn depth(&self) -> Option<u32> {
        self.depth
    }
}

/// Whether an inherited attribute with `incoming` depth loses to the entry already merged.
///
/// Only method-like entries compete on depth; the shallower (closer) definition wins and a
/// tie goes to the later merge, which is the base listed earlier.
fn is_shadowed(existing: Option<&ClassAttr>, incoming: Option<u32>) -> bool {
    match (existing.and_then(ClassAttr::depth), incoming) {
        (Some(current), Some(incoming)) => current < incoming,
        _ => false,
    }
}

/// A class: name, immutable bases and the resolved attribute table.
#[derive(Debug)]
pub struct ClassRecord {
    name: String,
    module: Option<String>,
    bases: Vec<ClassId>,
    attrs: IndexMap<String, ClassAttr>,
}

impl ClassRecord {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            module: None,
            bases: Vec::new(),
            attrs: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// `module.Name`, or just the name for classes without a module.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{module}.{}", self.name),
            None => self.name.clone(),
        }
    }

    #[must_use]
    pub fn bases(&self) -> &[ClassId] {
        &self.bases
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&ClassAttr> {
        self.attrs.get(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &ClassAttr)> {
        self.attrs.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    #[must_use]
    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    /// Re-assigns an attribute after the class was built, wrapping it like a class body entry.
    pub(crate) fn patch_attr(&mut self, name: &str, value: &Value, class_id: ClassId) {
        self.attrs.insert(name.to_owned(), ClassAttr::own(value, class_id));
    }

    pub(crate) fn remove_attr(&mut self, name: &str) -> Option<ClassAttr> {
        self.attrs.shift_remove(name)
    }
}

/// Builds a class from its bases and own namespace.
///
/// Bases are merged in reverse declaration order, each inherited attribute subject to the
/// depth rule; the own namespace is applied last and unconditionally.
pub(crate) fn build_class(heap: &mut Heap, name: &str, bases: &[ClassId], namespace: &Namespace) -> ClassId {
    let id = heap.reserve_class(name);
    let mut attrs: IndexMap<String, ClassAttr> = IndexMap::new();
    for &base in bases.iter().rev() {
        for (key, attr) in heap.class(base).attrs() {
            let incoming = attr.depth().map(|depth| depth + 1);
            if is_shadowed(attrs.get(key), incoming) {
                continue;
            }
            attrs.insert(key.to_owned(), attr.inherit(id));
        }
    }
    for (key, value) in namespace.iter() {
        attrs.insert(key.to_owned(), ClassAttr::own(value, id));
    }
    let record = heap.class_mut(id);
    record.bases = bases.to_vec();
    record.module = namespace.module().map(str::to_owned);
    record.attrs = attrs;
    id
}

// ============================================================================
// Instances
// ============================================================================

/// An instance: its class plus per-instance slots and native state.
#[derive(Debug)]
pub(crate) struct Instance {
    class_id: ClassId,
    slots: IndexMap<String, Value>,
    payload: Payload,
}

/// Shared handle to an instance.
#[derive(Clone)]
pub struct InstanceRef(Rc<RefCell<Instance>>);

impl InstanceRef {
    pub(crate) fn new(class_id: ClassId, payload: Payload) -> Self {
        Self(Rc::new(RefCell::new(Instance {
            class_id,
            slots: IndexMap::new(),
            payload,
        })))
    }

    #[must_use]
    pub fn class_id(&self) -> ClassId {
        self.0.borrow().class_id
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Stable address used in default reprs.
    #[must_use]
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }

    /// Per-instance attribute, not looking at the class.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<Value> {
        self.0.borrow().slots.get(name).cloned()
    }

    #[must_use]
    pub fn slot_names(&self) -> Vec<String> {
        self.0.borrow().slots.keys().cloned().collect()
    }

    pub(crate) fn set_slot(&self, name: &str, value: Value) {
        self.0.borrow_mut().slots.insert(name.to_owned(), value);
    }

    pub(crate) fn remove_slot(&self, name: &str) -> Option<Value> {
        self.0.borrow_mut().slots.shift_remove(name)
    }

    pub(crate) fn payload(&self) -> Ref<'_, Payload> {
        Ref::map(self.0.borrow(), |inst| &inst.payload)
    }

    /// Runs `f` with mutable access to the native state.
    ///
    /// `f` must not call back into the runtime.
    pub(crate) fn with_payload_mut<R>(&self, f: impl FnOnce(&mut Payload) -> R) -> R {
        f(&mut self.0.borrow_mut().payload)
    }

    pub(crate) fn set_payload(&self, payload: Payload) {
        self.0.borrow_mut().payload = payload;
    }

    pub(crate) fn take_payload(&self) -> Payload {
        std::mem::take(&mut self.0.borrow_mut().payload)
    }
}

impl fmt::Debug for InstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({:?} at {:#x})", self.class_id(), self.address())
    }
}
