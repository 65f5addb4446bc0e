//! The `dict` class: an insertion-ordered mapping.
//!
//! Keys are matched with language-level equality, so any value can be a key. Lookup is a
//! linear scan; entries keep first-insertion order and deleting a key removes its entry.

use super::{InstanceRef, Payload, payload_error, receiver};
use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    function::{Signature, unpack},
    namespace::Namespace,
    types::tuple::tuple_items,
    value::Value,
};

/// Entries of a dict in insertion order.
#[derive(Debug, Clone, Default)]
pub(crate) struct DictStore {
    entries: Vec<(Value, Value)>,
}

impl DictStore {
    fn keys(&self) -> Vec<Value> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    fn values(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn this_dict(this: &Value) -> RunResult<&InstanceRef> {
    let inst = receiver(this, "dict")?;
    if matches!(&*inst.payload(), Payload::Dict(_)) {
        Ok(inst)
    } else {
        Err(payload_error("dict"))
    }
}

fn with_store<R>(inst: &InstanceRef, f: impl FnOnce(&mut DictStore) -> R) -> RunResult<R> {
    inst.with_payload_mut(|payload| match payload {
        Payload::Dict(store) => Ok(f(store)),
        _ => Err(payload_error("dict")),
    })
}

fn store_of(value: &Value) -> Option<DictStore> {
    match &*value.as_instance()?.payload() {
        Payload::Dict(store) => Some(store.clone()),
        _ => None,
    }
}

/// Position of `key`, comparing identity first and `__eq__` second.
///
/// Keys are snapshotted before comparing, since `__eq__` may run arbitrary code.
fn position(rt: &mut Runtime, inst: &InstanceRef, key: &Value) -> RunResult<Option<usize>> {
    let keys = with_store(inst, |store| store.keys())?;
    if let Some(pos) = keys.iter().position(|k| k == key) {
        return Ok(Some(pos));
    }
    for (i, candidate) in keys.iter().enumerate() {
        if rt.eq(candidate, key)? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

fn get(rt: &mut Runtime, inst: &InstanceRef, key: &Value) -> RunResult<Option<Value>> {
    let Some(pos) = position(rt, inst, key)? else {
        return Ok(None);
    };
    with_store(inst, |store| store.entries.get(pos).map(|(_, v)| v.clone()))
}

fn set(rt: &mut Runtime, inst: &InstanceRef, key: Value, value: Value) -> RunResult<()> {
    let pos = position(rt, inst, &key)?;
    with_store(inst, |store| match pos.and_then(|pos| store.entries.get_mut(pos)) {
        Some(entry) => entry.1 = value,
        None => store.entries.push((key, value)),
    })
}

fn remove(rt: &mut Runtime, inst: &InstanceRef, key: &Value) -> RunResult<Option<Value>> {
    let Some(pos) = position(rt, inst, key)? else {
        return Ok(None);
    };
    with_store(inst, |store| (pos < store.entries.len()).then(|| store.entries.remove(pos).1))
}

fn key_error(rt: &mut Runtime, key: &Value) -> crate::RunError {
    match rt.repr(key) {
        Ok(repr) => ExcType::key_error(repr),
        Err(err) => err,
    }
}

/// Adds every pair of `source` (a dict or an iterable of pairs) to `inst`.
fn merge_from(rt: &mut Runtime, inst: &InstanceRef, source: &Value) -> RunResult<()> {
    if let Some(store) = store_of(source) {
        for (key, value) in store.entries {
            set(rt, inst, key, value)?;
        }
        return Ok(());
    }
    for (i, item) in rt.collect(source)?.into_iter().enumerate() {
        let pair = rt.collect(&item)?;
        let [key, value]: [Value; 2] = pair.try_into().map_err(|pair: Vec<Value>| {
            ExcType::value_error(format!(
                "dictionary update sequence element #{i} has length {}; 2 is required",
                pair.len()
            ))
        })?;
        set(rt, inst, key, value)?;
    }
    Ok(())
}

fn dict_init(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, source] = unpack(args)?;
    let inst = receiver(&this, "dict")?;
    inst.set_payload(Payload::Dict(DictStore::default()));
    if !source.is_none() {
        merge_from(rt, inst, &source)?;
    }
    Ok(Value::None)
}

fn dict_getitem(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, key] = unpack(args)?;
    match get(rt, this_dict(&this)?, &key)? {
        Some(value) => Ok(value),
        None => Err(key_error(rt, &key)),
    }
}

fn dict_setitem(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, key, value] = unpack(args)?;
    set(rt, this_dict(&this)?, key, value)?;
    Ok(Value::None)
}

fn dict_delitem(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, key] = unpack(args)?;
    match remove(rt, this_dict(&this)?, &key)? {
        Some(_) => Ok(Value::None),
        None => Err(key_error(rt, &key)),
    }
}

fn dict_contains(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, key] = unpack(args)?;
    Ok(Value::Bool(position(rt, this_dict(&this)?, &key)?.is_some()))
}

fn dict_eq(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let Some(theirs) = store_of(&other) else {
        return Ok(Value::NotImplemented);
    };
    let ours = with_store(this_dict(&this)?, |store| store.clone())?;
    if ours.len() != theirs.len() {
        return Ok(Value::Bool(false));
    }
    let Some(other) = other.as_instance() else {
        return Ok(Value::Bool(false));
    };
    for (key, value) in ours.entries {
        match get(rt, other, &key)? {
            Some(found) if found == value || rt.eq(&value, &found)? => {}
            _ => return Ok(Value::Bool(false)),
        }
    }
    Ok(Value::Bool(true))
}

fn dict_len(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    Ok(Value::Int(with_store(this_dict(&this)?, |store| store.len())? as i64))
}

fn dict_repr(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let inst = this_dict(&this)?;
    if !rt.enter_repr(inst) {
        return Ok(Value::from("{...}"));
    }
    let entries = with_store(inst, |store| store.entries.clone());
    let body = entries.and_then(|entries| {
        let mut out = String::new();
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&rt.repr(key)?);
            out.push_str(": ");
            out.push_str(&rt.repr(value)?);
        }
        Ok(out)
    });
    rt.leave_repr(inst);
    Ok(Value::from(format!("{{{}}}", body?)))
}

fn dict_keys(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let keys = with_store(this_dict(&this)?, |store| store.keys())?;
    rt.new_list(keys)
}

fn dict_values(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let values = with_store(this_dict(&this)?, |store| store.values())?;
    rt.new_list(values)
}

fn item_tuples(rt: &mut Runtime, this: &Value) -> RunResult<Vec<Value>> {
    let entries = with_store(this_dict(this)?, |store| store.entries.clone())?;
    entries
        .into_iter()
        .map(|(key, value)| rt.new_tuple(vec![key, value]))
        .collect()
}

fn dict_items(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let items = item_tuples(rt, &this)?;
    rt.new_list(items)
}

fn dict_iterkeys(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let keys = dict_keys(rt, args)?;
    rt.iter(&keys)
}

fn dict_itervalues(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let values = dict_values(rt, args)?;
    rt.iter(&values)
}

fn dict_iteritems(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let items = dict_items(rt, args)?;
    rt.iter(&items)
}

fn dict_get(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, key, default] = unpack(args)?;
    Ok(get(rt, this_dict(&this)?, &key)?.unwrap_or(default))
}

fn dict_has_key(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    dict_contains(rt, args)
}

fn dict_pop(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, key, default] = unpack(args)?;
    let defaults = tuple_items(&default).unwrap_or_default();
    if defaults.len() > 1 {
        return Err(ExcType::type_error(format!(
            "pop expected at most 2 arguments, got {}",
            defaults.len() + 1
        )));
    }
    if let Some(value) = remove(rt, this_dict(&this)?, &key)? {
        return Ok(value);
    }
    match defaults.first() {
        Some(default) => Ok(default.clone()),
        None => Err(key_error(rt, &key)),
    }
}

fn dict_popitem(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let popped = with_store(this_dict(&this)?, |store| store.entries.pop())?;
    match popped {
        Some((key, value)) => rt.new_tuple(vec![key, value]),
        None => Err(ExcType::key_error("'popitem(): dictionary is empty'")),
    }
}

fn dict_setdefault(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, key, default] = unpack(args)?;
    let inst = this_dict(&this)?;
    if let Some(value) = get(rt, inst, &key)? {
        return Ok(value);
    }
    set(rt, inst, key, default.clone())?;
    Ok(default)
}

fn dict_update(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, source] = unpack(args)?;
    merge_from(rt, this_dict(&this)?, &source)?;
    Ok(Value::None)
}

fn dict_copy(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let store = with_store(this_dict(&this)?, |store| store.clone())?;
    let inst = rt.allocate_instance(rt.builtins.dict, Payload::Dict(store))?;
    Ok(Value::Instance(inst))
}

fn dict_clear(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    with_store(this_dict(&this)?, |store| store.entries.clear())?;
    Ok(Value::None)
}

fn dict_fromkeys(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [cls, keys, value] = unpack(args)?;
    let dict = rt.call(&cls, Vec::new())?;
    let inst = this_dict(&dict)?;
    for key in rt.collect(&keys)? {
        set(rt, inst, key, value.clone())?;
    }
    Ok(dict)
}

pub(crate) fn namespace() -> Namespace {
    let unary = || Signature::new(["self"]);
    Namespace::new()
        .in_module("__builtin__")
        .method(
            "__init__",
            Signature::new(["self", "source"]).with_default("source", Value::None),
            dict_init,
        )
        .method("__getitem__", Signature::new(["self", "key"]), dict_getitem)
        .method("__setitem__", Signature::new(["self", "key", "value"]), dict_setitem)
        .method("__delitem__", Signature::new(["self", "key"]), dict_delitem)
        .method("__contains__", Signature::new(["self", "key"]), dict_contains)
        .method("__eq__", Signature::new(["self", "other"]), dict_eq)
        .method("__len__", unary(), dict_len)
        .method("__iter__", unary(), dict_iterkeys)
        .method("__repr__", unary(), dict_repr)
        .method("__str__", unary(), dict_repr)
        .method(
            "get",
            Signature::new(["self", "key", "default"]).with_default("default", Value::None),
            dict_get,
        )
        .method("has_key", Signature::new(["self", "key"]), dict_has_key)
        .method("keys", unary(), dict_keys)
        .method("values", unary(), dict_values)
        .method("items", unary(), dict_items)
        .method("iterkeys", unary(), dict_iterkeys)
        .method("itervalues", unary(), dict_itervalues)
        .method("iteritems", unary(), dict_iteritems)
        .method(
            "pop",
            Signature::new(["self", "key", "default"]).with_var_args(),
            dict_pop,
        )
        .method("popitem", unary(), dict_popitem)
        .method(
            "setdefault",
            Signature::new(["self", "key", "default"]).with_default("default", Value::None),
            dict_setdefault,
        )
        .method("update", Signature::new(["self", "source"]), dict_update)
        .method("copy", unary(), dict_copy)
        .method("clear", unary(), dict_clear)
        .classmethod(
            "fromkeys",
            Signature::new(["cls", "keys", "value"]).with_default("value", Value::None),
            dict_fromkeys,
        )
}

impl Runtime {
    /// Creates a `dict` from `pairs`; later duplicates overwrite earlier values.
    pub fn new_dict(&mut self, pairs: Vec<(Value, Value)>) -> RunResult<Value> {
        let inst = self.allocate_instance(self.builtins.dict, Payload::Dict(DictStore::default()))?;
        for (key, value) in pairs {
            set(self, &inst, key, value)?;
        }
        Ok(Value::Instance(inst))
    }

    /// Looks `key` up in a dict value; `Ok(None)` when absent.
    pub fn dict_get(&mut self, dict: &Value, key: &Value) -> RunResult<Option<Value>> {
        get(self, this_dict(dict)?, key)
    }

    pub fn dict_set(&mut self, dict: &Value, key: Value, value: Value) -> RunResult<()> {
        set(self, this_dict(dict)?, key, value)
    }
}
