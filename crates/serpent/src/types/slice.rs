//! `slice` objects and index normalization shared by the sequence types.

use serde::{Deserialize, Serialize};

use super::{Payload, payload_error, receiver};
use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    function::{Signature, unpack},
    namespace::Namespace,
    value::Value,
};

/// Start, stop and step of a slice; `None` means "use the default for the direction".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    #[must_use]
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Resolves the slice against a sequence of length `len`.
    ///
    /// Returns `(start, stop, step)` with negative bounds counted from the end and both
    /// bounds clamped to the sequence.
    pub fn indices(&self, len: usize) -> RunResult<(i64, i64, i64)> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(ExcType::value_error("slice step cannot be zero"));
        }
        let len = len as i64;
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: Option<i64>, default: i64| match bound {
            None => default,
            Some(b) if b < 0 => (b + len).max(lower),
            Some(b) => b.min(upper),
        };
        let start = clamp(self.start, if step < 0 { upper } else { lower });
        let stop = clamp(self.stop, if step < 0 { lower } else { upper });
        Ok((start, stop, step))
    }

    /// The positions selected from a sequence of length `len`, in iteration order.
    pub fn positions(&self, len: usize) -> RunResult<Vec<usize>> {
        let (start, stop, step) = self.indices(len)?;
        let mut positions = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            positions.push(i as usize);
            let Some(next) = i.checked_add(step) else {
                break;
            };
            i = next;
        }
        Ok(positions)
    }

    /// Copies the selected elements out of `items`.
    pub fn select<T: Clone>(&self, items: &[T]) -> RunResult<Vec<T>> {
        Ok(self
            .positions(items.len())?
            .into_iter()
            .map(|i| items[i].clone())
            .collect())
    }
}

/// Normalizes a possibly negative index; `None` when out of range.
#[must_use]
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

/// A subscript: a single position or a slice.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SeqIndex {
    Int(i64),
    Slice(Slice),
}

impl SeqIndex {
    /// Interprets a subscript value for the sequence type `type_name`.
    pub fn from_value(index: &Value, type_name: &str) -> RunResult<Self> {
        if let Some(i) = index.as_int() {
            return Ok(Self::Int(i));
        }
        if let Some(inst) = index.as_instance()
            && let Payload::Slice(slice) = &*inst.payload()
        {
            return Ok(Self::Slice(*slice));
        }
        Err(ExcType::type_error(format!(
            "{type_name} indices must be integers or slices"
        )))
    }
}

fn bound(value: &Value, what: &str) -> RunResult<Option<i64>> {
    match value {
        Value::None => Ok(None),
        other => other
            .as_int()
            .map(Some)
            .ok_or_else(|| ExcType::type_error(format!("slice {what} must be an integer or None"))),
    }
}

fn slice_of(this: &Value) -> RunResult<Slice> {
    match &*receiver(this, "slice")?.payload() {
        Payload::Slice(slice) => Ok(*slice),
        _ => Err(payload_error("slice")),
    }
}

fn slice_init(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, first, stop, step] = unpack(args)?;
    // slice(stop) and slice(start, stop[, step])
    let slice = match stop {
        Value::NotImplemented => Slice::new(None, bound(&first, "stop")?, None),
        stop => Slice::new(bound(&first, "start")?, bound(&stop, "stop")?, bound(&step, "step")?),
    };
    receiver(&this, "slice")?.set_payload(Payload::Slice(slice));
    Ok(Value::None)
}

fn slice_indices(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, len] = unpack(args)?;
    let len = len
        .as_int()
        .filter(|len| *len >= 0)
        .ok_or_else(|| ExcType::value_error("length should not be negative"))?;
    let (start, stop, step) = slice_of(&this)?.indices(len as usize)?;
    rt.new_tuple(vec![Value::Int(start), Value::Int(stop), Value::Int(step)])
}

fn slice_repr(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let slice = slice_of(&this)?;
    let show = |b: Option<i64>| b.map_or_else(|| "None".to_owned(), |b| b.to_string());
    Ok(Value::from(format!(
        "slice({}, {}, {})",
        show(slice.start),
        show(slice.stop),
        show(slice.step)
    )))
}

fn slice_eq(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let Some(other) = other.as_instance() else {
        return Ok(Value::Bool(false));
    };
    let other = match &*other.payload() {
        Payload::Slice(slice) => *slice,
        _ => return Ok(Value::Bool(false)),
    };
    Ok(Value::Bool(slice_of(&this)? == other))
}

pub(crate) fn namespace() -> Namespace {
    // `NotImplemented` marks an omitted stop so `slice(None)` and `slice(5)` stay distinct
    Namespace::new()
        .in_module("__builtin__")
        .method(
            "__init__",
            Signature::new(["self", "start", "stop", "step"])
                .with_default("stop", Value::NotImplemented)
                .with_default("step", Value::None),
            slice_init,
        )
        .method("indices", Signature::new(["self", "len"]), slice_indices)
        .method("__repr__", Signature::new(["self"]), slice_repr)
        .method("__str__", Signature::new(["self"]), slice_repr)
        .method("__eq__", Signature::new(["self", "other"]), slice_eq)
}

impl Runtime {
    /// Creates a `slice` instance.
    pub fn new_slice(&mut self, slice: Slice) -> RunResult<Value> {
        let inst = self.allocate_instance(self.builtins.slice, Payload::Slice(slice))?;
        Ok(Value::Instance(inst))
    }
}
