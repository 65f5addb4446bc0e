//! Methods of `BaseException`, inherited by every exception class.

use crate::{
    Runtime,
    exception_private::RunResult,
    function::{Signature, unpack},
    namespace::Namespace,
    types::tuple::tuple_items,
    value::Value,
};

fn exc_args(rt: &Runtime, this: &Value) -> Vec<Value> {
    rt.lookup_attr(this, "args")
        .and_then(|args| tuple_items(&args))
        .map(|items| items.to_vec())
        .unwrap_or_default()
}

fn exc_init(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, args] = unpack(args)?;
    let message = match tuple_items(&args).as_deref() {
        Some([only]) => only.clone(),
        _ => Value::from(""),
    };
    rt.setattr(&this, "args", args)?;
    rt.setattr(&this, "message", message)?;
    Ok(Value::None)
}

fn exc_str(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    match exc_args(rt, &this).as_slice() {
        [] => Ok(Value::from("")),
        [only] => Ok(Value::Text(rt.str_of(only)?)),
        many => {
            let tuple = rt.new_tuple(many.to_vec())?;
            Ok(Value::Text(rt.repr(&tuple)?))
        }
    }
}

fn exc_repr(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let args = exc_args(rt, &this);
    let tuple = rt.new_tuple(args)?;
    let name = rt.type_name(&this).to_owned();
    Ok(Value::from(format!("{name}{}", rt.repr(&tuple)?)))
}

pub(crate) fn namespace() -> Namespace {
    Namespace::new()
        .in_module("exceptions")
        .method("__init__", Signature::new(["self", "args"]).with_var_args(), exc_init)
        .method("__str__", Signature::new(["self"]), exc_str)
        .method("__repr__", Signature::new(["self"]), exc_repr)
}
