//! The iterator protocol and the sequence iterators.
//!
//! Iterables expose `__iter__()`, iterators expose `next()`, which raises `StopIteration`
//! when exhausted. At the Rust boundary exhaustion is a value, not an error:
//! [`Runtime::next`] returns `Ok(None)` and [`ForIter::try_next`] returns `false`.

use super::{
    InstanceRef, Payload, payload_error, receiver,
    sequence::{seq_item, seq_len},
};
use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    function::{Signature, unpack},
    heap::ClassId,
    namespace::Namespace,
    value::Value,
};

/// Loop driver: `while it.try_next(rt)? { use(it.value()) }`.
#[derive(Debug, Clone)]
pub struct ForIter {
    iter: Value,
    value: Value,
}

impl ForIter {
    /// Starts iterating over `iterable`.
    pub fn new(rt: &mut Runtime, iterable: &Value) -> RunResult<Self> {
        Ok(Self {
            iter: rt.iter(iterable)?,
            value: Value::None,
        })
    }

    /// Advances the iterator; `false` once it is exhausted.
    pub fn try_next(&mut self, rt: &mut Runtime) -> RunResult<bool> {
        match rt.next(&self.iter)? {
            Some(value) => {
                self.value = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The element produced by the last successful [`try_next`](Self::try_next).
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Position in a list or tuple.
///
/// Forward iterators hold the next index; reversed iterators hold the number of elements
/// still to produce. Elements are read on every step, so changes to the sequence during
/// iteration are observed.
#[derive(Debug, Clone)]
pub(crate) struct SeqIter {
    seq: InstanceRef,
    at: usize,
}

impl SeqIter {
    fn forward(&mut self) -> Option<Value> {
        let item = seq_item(&self.seq, self.at)?;
        self.at += 1;
        Some(item)
    }

    fn backward(&mut self) -> Option<Value> {
        self.at = self.at.checked_sub(1)?.min(seq_len(&self.seq).checked_sub(1)?);
        seq_item(&self.seq, self.at)
    }
}

fn sequence_arg(seq: &Value) -> RunResult<InstanceRef> {
    match seq.as_instance() {
        Some(inst) if matches!(&*inst.payload(), Payload::List(_) | Payload::Tuple(_)) => Ok(inst.clone()),
        _ => Err(ExcType::type_error("sequence iterator requires a list or tuple")),
    }
}

fn step(this: &Value, advance: fn(&mut SeqIter) -> Option<Value>) -> RunResult<Value> {
    let inst = receiver(this, "listiterator")?;
    let item = inst.with_payload_mut(|payload| match payload {
        Payload::SeqIter(it) => Ok(advance(it)),
        _ => Err(payload_error("listiterator")),
    })?;
    item.ok_or_else(ExcType::stop_iteration)
}

fn iter_init(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, seq] = unpack(args)?;
    let seq = sequence_arg(&seq)?;
    receiver(&this, "listiterator")?.set_payload(Payload::SeqIter(SeqIter { seq, at: 0 }));
    Ok(Value::None)
}

fn reversed_init(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, seq] = unpack(args)?;
    let seq = sequence_arg(&seq)?;
    let at = seq_len(&seq);
    receiver(&this, "listreversediterator")?.set_payload(Payload::SeqIter(SeqIter { seq, at }));
    Ok(Value::None)
}

/// `__iter__` of every iterator: the iterator itself.
pub(crate) fn iter_self(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    Ok(this)
}

pub(crate) fn list_iterator_namespace() -> Namespace {
    Namespace::new()
        .in_module("__builtin__")
        .method("__init__", Signature::new(["self", "seq"]), iter_init)
        .method("__iter__", Signature::new(["self"]), iter_self)
        .method("next", Signature::new(["self"]), |_, args| {
            let [this] = unpack(args)?;
            step(&this, SeqIter::forward)
        })
}

pub(crate) fn reversed_iterator_namespace() -> Namespace {
    Namespace::new()
        .in_module("__builtin__")
        .method("__init__", Signature::new(["self", "seq"]), reversed_init)
        .method("next", Signature::new(["self"]), |_, args| {
            let [this] = unpack(args)?;
            step(&this, SeqIter::backward)
        })
}

impl Runtime {
    /// Creates a sequence iterator of class `class_id` over `seq`.
    pub(crate) fn seq_iterator(&mut self, class_id: ClassId, seq: InstanceRef, reversed: bool) -> RunResult<Value> {
        let at = if reversed { seq_len(&seq) } else { 0 };
        let inst = self.allocate_instance(class_id, Payload::SeqIter(SeqIter { seq, at }))?;
        Ok(Value::Instance(inst))
    }

    /// `iter(iterable)`: calls `__iter__`.
    ///
    /// Primitive text iterates over its characters.
    pub fn iter(&mut self, iterable: &Value) -> RunResult<Value> {
        if let Value::Text(text) = iterable {
            let chars = text.chars().map(|c| Value::from(c.to_string())).collect();
            let list = self.new_list(chars)?;
            return self.iter(&list);
        }
        match self.dispatch_method(iterable, "__iter__") {
            Some(method) => self.call(&method, Vec::new()),
            None => Err(ExcType::type_error(format!(
                "'{}' object is not iterable",
                self.type_name(iterable)
            ))),
        }
    }

    /// Advances `iterator`: `Ok(None)` when it raises `StopIteration`.
    pub fn next(&mut self, iterator: &Value) -> RunResult<Option<Value>> {
        let Some(method) = self.dispatch_method(iterator, "next") else {
            return Err(ExcType::type_error(format!(
                "{} object is not an iterator",
                self.type_name(iterator)
            )));
        };
        match self.call(&method, Vec::new()) {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.is_stop_iteration(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Drains `iterable` into a vector.
    ///
    /// Exact `list` and `tuple` instances and text are read directly; everything else goes
    /// through the iterator protocol.
    pub fn collect(&mut self, iterable: &Value) -> RunResult<Vec<Value>> {
        if let Some(inst) = iterable.as_instance() {
            let class_id = inst.class_id();
            if class_id == self.builtins.list || class_id == self.builtins.tuple {
                return self
                    .sequence_items(iterable)
                    .ok_or_else(|| payload_error(self.type_name(iterable)));
            }
        }
        if let Value::Text(text) = iterable {
            return Ok(text.chars().map(|c| Value::from(c.to_string())).collect());
        }
        let mut it = ForIter::new(self, iterable)?;
        let mut items = Vec::new();
        while it.try_next(self)? {
            self.check_time()?;
            items.push(it.value.clone());
        }
        Ok(items)
    }
}
