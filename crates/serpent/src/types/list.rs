//! The `list` class.

use super::{
    InstanceRef, Payload, payload_error, receiver,
    sequence::{repeat, seq_count, seq_eq, seq_find, seq_items, seq_repr},
    slice::{SeqIndex, normalize_index},
};
use crate::{
    ExcType, Runtime,
    builtins::sorted::sort_values,
    exception_private::RunResult,
    function::{Signature, unpack},
    namespace::Namespace,
    value::Value,
};

/// Returns the receiver after checking it carries list state.
fn this_list<'a>(this: &'a Value) -> RunResult<&'a InstanceRef> {
    let inst = receiver(this, "list")?;
    if matches!(&*inst.payload(), Payload::List(_)) {
        Ok(inst)
    } else {
        Err(payload_error("list"))
    }
}

fn with_items<R>(inst: &InstanceRef, f: impl FnOnce(&mut Vec<Value>) -> R) -> RunResult<R> {
    inst.with_payload_mut(|payload| match payload {
        Payload::List(items) => Ok(f(items)),
        _ => Err(payload_error("list")),
    })
}

fn items_of(inst: &InstanceRef) -> RunResult<Vec<Value>> {
    with_items(inst, |items| items.clone())
}

/// Elements of a list instance (including subclasses), `None` for anything else.
pub(crate) fn list_items(value: &Value) -> Option<Vec<Value>> {
    let inst = value.as_instance()?;
    match &*inst.payload() {
        Payload::List(items) => Some(items.clone()),
        _ => None,
    }
}

fn list_init(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, iterable] = unpack(args)?;
    let items = if iterable.is_none() {
        Vec::new()
    } else {
        rt.collect(&iterable)?
    };
    receiver(&this, "list")?.set_payload(Payload::List(items));
    Ok(Value::None)
}

fn list_add(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let Some(tail) = list_items(&other) else {
        return Ok(Value::NotImplemented);
    };
    let mut items = items_of(this_list(&this)?)?;
    items.extend(tail);
    rt.new_list(items)
}

fn list_iadd(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let tail = rt.collect(&other)?;
    with_items(this_list(&this)?, |items| items.extend(tail))?;
    Ok(this)
}

fn list_mul(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, times] = unpack(args)?;
    let Some(times) = times.as_int() else {
        return Ok(Value::NotImplemented);
    };
    let items = items_of(this_list(&this)?)?;
    let repeated = repeat(rt, &items, times)?;
    rt.new_list(repeated)
}

fn list_imul(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, times] = unpack(args)?;
    let Some(times) = times.as_int() else {
        return Ok(Value::NotImplemented);
    };
    let inst = this_list(&this)?;
    let repeated = repeat(rt, &items_of(inst)?, times)?;
    with_items(inst, |items| *items = repeated)?;
    Ok(this)
}

fn list_contains(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, item] = unpack(args)?;
    let items = items_of(this_list(&this)?)?;
    Ok(Value::Bool(seq_find(rt, &items, &item)?.is_some()))
}

fn list_eq(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let Some(other) = list_items(&other) else {
        return Ok(Value::NotImplemented);
    };
    let items = items_of(this_list(&this)?)?;
    Ok(Value::Bool(seq_eq(rt, &items, &other)?))
}

fn list_ne(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    Ok(match list_eq(rt, args)? {
        Value::Bool(eq) => Value::Bool(!eq),
        other => other,
    })
}

fn list_getitem(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, index] = unpack(args)?;
    let inst = this_list(&this)?;
    match SeqIndex::from_value(&index, "list")? {
        SeqIndex::Int(i) => with_items(inst, |items| {
            normalize_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| ExcType::index_error("list index out of range"))
        })?,
        SeqIndex::Slice(slice) => {
            let selected = slice.select(&items_of(inst)?)?;
            rt.new_list(selected)
        }
    }
}

fn list_setitem(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, index, value] = unpack(args)?;
    let inst = this_list(&this)?;
    match SeqIndex::from_value(&index, "list")? {
        SeqIndex::Int(i) => with_items(inst, |items| -> RunResult<()> {
            let i = normalize_index(i, items.len())
                .ok_or_else(|| ExcType::index_error("list assignment index out of range"))?;
            items[i] = value;
            Ok(())
        })??,
        SeqIndex::Slice(slice) => {
            let replacement = rt.collect(&value)?;
            with_items(inst, |items| -> RunResult<()> {
                let (start, stop, step) = slice.indices(items.len())?;
                if step == 1 {
                    let start = start as usize;
                    let stop = (stop.max(start as i64)) as usize;
                    items.splice(start..stop, replacement);
                    return Ok(());
                }
                let positions = slice.positions(items.len())?;
                if positions.len() != replacement.len() {
                    return Err(ExcType::value_error(format!(
                        "attempt to assign sequence of size {} to extended slice of size {}",
                        replacement.len(),
                        positions.len()
                    )));
                }
                for (pos, value) in positions.into_iter().zip(replacement) {
                    items[pos] = value;
                }
                Ok(())
            })??;
        }
    }
    Ok(Value::None)
}

fn list_delitem(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, index] = unpack(args)?;
    let inst = this_list(&this)?;
    let index = SeqIndex::from_value(&index, "list")?;
    with_items(inst, |items| -> RunResult<Value> {
        match index {
            SeqIndex::Int(i) => {
                let i = normalize_index(i, items.len())
                    .ok_or_else(|| ExcType::index_error("list assignment index out of range"))?;
                items.remove(i);
            }
            SeqIndex::Slice(slice) => {
                let mut positions = slice.positions(items.len())?;
                positions.sort_unstable_by(|a, b| b.cmp(a));
                for pos in positions {
                    items.remove(pos);
                }
            }
        }
        Ok(Value::None)
    })?
}

fn list_iter(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let inst = this_list(&this)?.clone();
    rt.seq_iterator(rt.builtins.listiterator, inst, false)
}

fn list_reversed(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let inst = this_list(&this)?.clone();
    rt.seq_iterator(rt.builtins.listreversediterator, inst, true)
}

fn list_len(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let len = with_items(this_list(&this)?, |items| items.len())?;
    Ok(Value::Int(len as i64))
}

fn list_repr(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let inst = this_list(&this)?;
    let items = items_of(inst)?;
    seq_repr(rt, inst, &items, ("[", "]"), "[...]")
}

fn list_append(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, item] = unpack(args)?;
    with_items(this_list(&this)?, |items| items.push(item))?;
    Ok(Value::None)
}

fn list_extend(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, iterable] = unpack(args)?;
    let tail = rt.collect(&iterable)?;
    with_items(this_list(&this)?, |items| items.extend(tail))?;
    Ok(Value::None)
}

fn list_insert(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, index, item] = unpack(args)?;
    let index = index
        .as_int()
        .ok_or_else(|| ExcType::type_error("list.insert() index must be an integer"))?;
    with_items(this_list(&this)?, |items| {
        let len = items.len() as i64;
        let at = if index < 0 { (index + len).max(0) } else { index.min(len) };
        items.insert(at as usize, item);
    })?;
    Ok(Value::None)
}

fn list_pop(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, index] = unpack(args)?;
    let index = index
        .as_int()
        .ok_or_else(|| ExcType::type_error("list.pop() index must be an integer"))?;
    with_items(this_list(&this)?, |items| -> RunResult<Value> {
        if items.is_empty() {
            return Err(ExcType::index_error("pop from empty list"));
        }
        let i = normalize_index(index, items.len()).ok_or_else(|| ExcType::index_error("pop index out of range"))?;
        Ok(items.remove(i))
    })?
}

fn list_remove(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, item] = unpack(args)?;
    let inst = this_list(&this)?;
    let items = items_of(inst)?;
    let Some(pos) = seq_find(rt, &items, &item)? else {
        return Err(ExcType::value_error("list.remove(x): x not in list"));
    };
    with_items(inst, |items| {
        if pos < items.len() {
            items.remove(pos);
        }
    })?;
    Ok(Value::None)
}

fn list_index(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, item] = unpack(args)?;
    let items = items_of(this_list(&this)?)?;
    match seq_find(rt, &items, &item)? {
        Some(pos) => Ok(Value::Int(pos as i64)),
        None => Err(ExcType::value_error("list.index(x): x not in list")),
    }
}

fn list_count(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, item] = unpack(args)?;
    let items = items_of(this_list(&this)?)?;
    Ok(Value::Int(seq_count(rt, &items, &item)? as i64))
}

fn list_reverse(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    with_items(this_list(&this)?, |items| items.reverse())?;
    Ok(Value::None)
}

fn list_sort(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, cmp, key, reverse] = unpack(args)?;
    let inst = this_list(&this)?;
    // sorting works on a copy; the list reads as empty meanwhile
    let items = with_items(inst, std::mem::take)?;
    let reverse = rt.truthy(&reverse)?;
    let sorted = sort_values(rt, items.clone(), &cmp, &key, reverse);
    match sorted {
        Ok(sorted) => with_items(inst, |slot| *slot = sorted)?,
        Err(err) => {
            with_items(inst, |slot| *slot = items)?;
            return Err(err);
        }
    }
    Ok(Value::None)
}

pub(crate) fn namespace() -> Namespace {
    let unary = || Signature::new(["self"]);
    let binary = || Signature::new(["self", "other"]);
    Namespace::new()
        .in_module("__builtin__")
        .method(
            "__init__",
            Signature::new(["self", "iterable"]).with_default("iterable", Value::None),
            list_init,
        )
        .method("__add__", binary(), list_add)
        .method("__iadd__", binary(), list_iadd)
        .method("__mul__", binary(), list_mul)
        .method("__rmul__", binary(), list_mul)
        .method("__imul__", binary(), list_imul)
        .method("__contains__", Signature::new(["self", "item"]), list_contains)
        .method("__eq__", binary(), list_eq)
        .method("__ne__", binary(), list_ne)
        .method("__getitem__", Signature::new(["self", "index"]), list_getitem)
        .method("__setitem__", Signature::new(["self", "index", "value"]), list_setitem)
        .method("__delitem__", Signature::new(["self", "index"]), list_delitem)
        .method("__iter__", unary(), list_iter)
        .method("__reversed__", unary(), list_reversed)
        .method("__len__", unary(), list_len)
        .method("__repr__", unary(), list_repr)
        .method("__str__", unary(), list_repr)
        .method("append", Signature::new(["self", "item"]), list_append)
        .method("extend", Signature::new(["self", "iterable"]), list_extend)
        .method("insert", Signature::new(["self", "index", "item"]), list_insert)
        .method(
            "pop",
            Signature::new(["self", "index"]).with_default("index", Value::Int(-1)),
            list_pop,
        )
        .method("remove", Signature::new(["self", "item"]), list_remove)
        .method("index", Signature::new(["self", "item"]), list_index)
        .method("count", Signature::new(["self", "item"]), list_count)
        .method("reverse", unary(), list_reverse)
        .method(
            "sort",
            Signature::new(["self", "cmp", "key", "reverse"])
                .with_default("cmp", Value::None)
                .with_default("key", Value::None)
                .with_default("reverse", Value::Bool(false)),
            list_sort,
        )
}

impl Runtime {
    /// Creates a `list` holding `items`.
    pub fn new_list(&mut self, items: Vec<Value>) -> RunResult<Value> {
        let inst = self.allocate_instance(self.builtins.list, Payload::List(items))?;
        Ok(Value::Instance(inst))
    }

    /// Elements of a list or tuple value; `None` for anything else.
    #[must_use]
    pub fn sequence_items(&self, value: &Value) -> Option<Vec<Value>> {
        seq_items(value.as_instance()?)
    }
}
