//! Helpers shared by `list` and `tuple`.

use super::{InstanceRef, Payload};
use crate::{ExcType, Runtime, exception_private::RunResult, value::Value};

/// Snapshot of the elements of a list or tuple instance.
pub(crate) fn seq_items(inst: &InstanceRef) -> Option<Vec<Value>> {
    match &*inst.payload() {
        Payload::List(items) => Some(items.clone()),
        Payload::Tuple(items) => Some(items.to_vec()),
        _ => None,
    }
}

/// Element `index` of a list or tuple instance.
pub(crate) fn seq_item(inst: &InstanceRef, index: usize) -> Option<Value> {
    match &*inst.payload() {
        Payload::List(items) => items.get(index).cloned(),
        Payload::Tuple(items) => items.get(index).cloned(),
        _ => None,
    }
}

pub(crate) fn seq_len(inst: &InstanceRef) -> usize {
    match &*inst.payload() {
        Payload::List(items) => items.len(),
        Payload::Tuple(items) => items.len(),
        _ => 0,
    }
}

/// Element-wise equality after a length check.
pub(crate) fn seq_eq(rt: &mut Runtime, a: &[Value], b: &[Value]) -> RunResult<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(b) {
        if x != y && !rt.eq(x, y)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Position of the first element equal to `item`.
pub(crate) fn seq_find(rt: &mut Runtime, items: &[Value], item: &Value) -> RunResult<Option<usize>> {
    for (i, candidate) in items.iter().enumerate() {
        if candidate == item || rt.eq(candidate, item)? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

pub(crate) fn seq_count(rt: &mut Runtime, items: &[Value], item: &Value) -> RunResult<usize> {
    let mut count = 0;
    for candidate in items {
        if candidate == item || rt.eq(candidate, item)? {
            count += 1;
        }
    }
    Ok(count)
}

/// `items * times`; zero or negative counts give an empty sequence.
///
/// Results that cannot be sized or allocated raise `MemoryError`.
pub(crate) fn repeat(rt: &Runtime, items: &[Value], times: i64) -> RunResult<Vec<Value>> {
    let times = usize::try_from(times).unwrap_or(0);
    if items.is_empty() || times == 0 {
        return Ok(Vec::new());
    }
    let len = items.len().checked_mul(times).ok_or_else(ExcType::memory_error)?;
    rt.check_large_result(len.saturating_mul(size_of::<Value>()))?;
    let mut out = Vec::new();
    out.try_reserve_exact(len).map_err(|_| ExcType::memory_error())?;
    for _ in 0..times {
        out.extend_from_slice(items);
    }
    Ok(out)
}

/// Renders `open item, item close`, printing `placeholder` for a container that contains
/// itself.
pub(crate) fn seq_repr(
    rt: &mut Runtime,
    inst: &InstanceRef,
    items: &[Value],
    (open, close): (&str, &str),
    placeholder: &str,
) -> RunResult<Value> {
    if !rt.enter_repr(inst) {
        return Ok(Value::from(placeholder));
    }
    let result = join_reprs(rt, items);
    rt.leave_repr(inst);
    let mut body = result?;
    // one-element tuples keep their trailing comma
    if open == "(" && items.len() == 1 {
        body.push(',');
    }
    Ok(Value::from(format!("{open}{body}{close}")))
}

fn join_reprs(rt: &mut Runtime, items: &[Value]) -> RunResult<String> {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&rt.repr(item)?);
    }
    Ok(out)
}
