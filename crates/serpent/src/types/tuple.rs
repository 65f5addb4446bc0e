//! The `tuple` class: an immutable sequence.

use std::rc::Rc;

use super::{
    InstanceRef, Payload, payload_error, receiver,
    sequence::{repeat, seq_count, seq_eq, seq_find, seq_repr},
    slice::{SeqIndex, normalize_index},
};
use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    function::{Signature, unpack},
    namespace::Namespace,
    value::Value,
};

/// Elements of a tuple instance (including subclasses), `None` for anything else.
pub(crate) fn tuple_items(value: &Value) -> Option<Rc<[Value]>> {
    let inst = value.as_instance()?;
    match &*inst.payload() {
        Payload::Tuple(items) => Some(items.clone()),
        _ => None,
    }
}

fn this_tuple(this: &Value) -> RunResult<(&InstanceRef, Rc<[Value]>)> {
    let inst = receiver(this, "tuple")?;
    match tuple_items(this) {
        Some(items) => Ok((inst, items)),
        None => Err(payload_error("tuple")),
    }
}

fn tuple_init(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, iterable] = unpack(args)?;
    let items = if iterable.is_none() {
        Vec::new()
    } else {
        rt.collect(&iterable)?
    };
    receiver(&this, "tuple")?.set_payload(Payload::Tuple(items.into()));
    Ok(Value::None)
}

fn tuple_add(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let Some(tail) = tuple_items(&other) else {
        return Ok(Value::NotImplemented);
    };
    let (_, items) = this_tuple(&this)?;
    let mut joined = items.to_vec();
    joined.extend_from_slice(&tail);
    rt.new_tuple(joined)
}

fn tuple_mul(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, times] = unpack(args)?;
    let Some(times) = times.as_int() else {
        return Ok(Value::NotImplemented);
    };
    let (_, items) = this_tuple(&this)?;
    let repeated = repeat(rt, &items, times)?;
    rt.new_tuple(repeated)
}

fn tuple_getitem(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, index] = unpack(args)?;
    let (_, items) = this_tuple(&this)?;
    match SeqIndex::from_value(&index, "tuple")? {
        SeqIndex::Int(i) => normalize_index(i, items.len())
            .map(|i| items[i].clone())
            .ok_or_else(|| ExcType::index_error("tuple index out of range")),
        SeqIndex::Slice(slice) => {
            let selected = slice.select(&items)?;
            rt.new_tuple(selected)
        }
    }
}

fn tuple_eq(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let Some(other) = tuple_items(&other) else {
        return Ok(Value::NotImplemented);
    };
    let (_, items) = this_tuple(&this)?;
    Ok(Value::Bool(seq_eq(rt, &items, &other)?))
}

fn tuple_ne(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    Ok(match tuple_eq(rt, args)? {
        Value::Bool(eq) => Value::Bool(!eq),
        other => other,
    })
}

fn tuple_contains(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, item] = unpack(args)?;
    let (_, items) = this_tuple(&this)?;
    Ok(Value::Bool(seq_find(rt, &items, &item)?.is_some()))
}

fn tuple_index(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, item] = unpack(args)?;
    let (_, items) = this_tuple(&this)?;
    match seq_find(rt, &items, &item)? {
        Some(pos) => Ok(Value::Int(pos as i64)),
        None => Err(ExcType::value_error("tuple.index(x): x not in tuple")),
    }
}

fn tuple_count(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, item] = unpack(args)?;
    let (_, items) = this_tuple(&this)?;
    Ok(Value::Int(seq_count(rt, &items, &item)? as i64))
}

fn tuple_len(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let (_, items) = this_tuple(&this)?;
    Ok(Value::Int(items.len() as i64))
}

fn tuple_iter(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let (inst, _) = this_tuple(&this)?;
    let inst = inst.clone();
    rt.seq_iterator(rt.builtins.tupleiterator, inst, false)
}

fn tuple_repr(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let (inst, items) = this_tuple(&this)?;
    seq_repr(rt, inst, &items, ("(", ")"), "(...)")
}

pub(crate) fn namespace() -> Namespace {
    let unary = || Signature::new(["self"]);
    let binary = || Signature::new(["self", "other"]);
    Namespace::new()
        .in_module("__builtin__")
        .method(
            "__init__",
            Signature::new(["self", "iterable"]).with_default("iterable", Value::None),
            tuple_init,
        )
        .method("__add__", binary(), tuple_add)
        .method("__mul__", binary(), tuple_mul)
        .method("__rmul__", binary(), tuple_mul)
        .method("__getitem__", Signature::new(["self", "index"]), tuple_getitem)
        .method("__eq__", binary(), tuple_eq)
        .method("__ne__", binary(), tuple_ne)
        .method("__contains__", Signature::new(["self", "item"]), tuple_contains)
        .method("__len__", unary(), tuple_len)
        .method("__iter__", unary(), tuple_iter)
        .method("__repr__", unary(), tuple_repr)
        .method("__str__", unary(), tuple_repr)
        .method("index", Signature::new(["self", "item"]), tuple_index)
        .method("count", Signature::new(["self", "item"]), tuple_count)
}

impl Runtime {
    /// Creates a `tuple` holding `items`.
    pub fn new_tuple(&mut self, items: Vec<Value>) -> RunResult<Value> {
        let inst = self.allocate_instance(self.builtins.tuple, Payload::Tuple(items.into()))?;
        Ok(Value::Instance(inst))
    }
}
