//! `xrange`, its iterator, and the list-producing `range`.

use super::{Payload, iter::iter_self, payload_error, receiver};
use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    function::{Signature, unpack},
    namespace::Namespace,
    value::Value,
};

/// An arithmetic progression; `next` is the first value not yet produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RangeSpec {
    next: i64,
    end: i64,
    step: i64,
}

impl RangeSpec {
    pub fn new(start: i64, end: i64, step: i64) -> RunResult<Self> {
        if step == 0 {
            return Err(ExcType::value_error("range() step argument must not be zero"));
        }
        Ok(Self { next: start, end, step })
    }

    /// Number of values still to produce.
    pub fn len(&self) -> usize {
        let (start, end, step) = (i128::from(self.next), i128::from(self.end), i128::from(self.step));
        let span = if step > 0 { end - start } else { start - end };
        if span <= 0 {
            0
        } else {
            ((span - 1) / step.abs() + 1) as usize
        }
    }

    pub fn advance(&mut self) -> Option<i64> {
        let more = if self.step > 0 {
            self.next < self.end
        } else {
            self.next > self.end
        };
        if !more {
            return None;
        }
        let value = self.next;
        self.next = self.next.saturating_add(self.step);
        Some(value)
    }
}

fn int_arg(value: &Value, func: &str) -> RunResult<i64> {
    value
        .as_int()
        .ok_or_else(|| ExcType::type_error(format!("{func}() integer argument expected, got {}", value_kind(value))))
}

fn value_kind(value: &Value) -> &'static str {
    value.primitive_type_name().unwrap_or("object")
}

/// Interprets `(start, stop, step)` where an omitted `stop` (`NotImplemented`) makes the
/// single argument the stop.
pub(crate) fn range_spec(func: &str, first: &Value, stop: &Value, step: &Value) -> RunResult<RangeSpec> {
    if stop.is_not_implemented() {
        return RangeSpec::new(0, int_arg(first, func)?, 1);
    }
    RangeSpec::new(int_arg(first, func)?, int_arg(stop, func)?, int_arg(step, func)?)
}

fn range_of(this: &Value) -> RunResult<RangeSpec> {
    match &*receiver(this, "xrange")?.payload() {
        Payload::Range(spec) => Ok(*spec),
        _ => Err(payload_error("xrange")),
    }
}

fn xrange_init(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, first, stop, step] = unpack(args)?;
    let spec = range_spec("xrange", &first, &stop, &step)?;
    receiver(&this, "xrange")?.set_payload(Payload::Range(spec));
    Ok(Value::None)
}

fn xrange_iter(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let spec = range_of(&this)?;
    let inst = rt.allocate_instance(rt.builtins.rangeiterator, Payload::RangeIter(spec))?;
    Ok(Value::Instance(inst))
}

fn xrange_len(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    Ok(Value::Int(range_of(&this)?.len() as i64))
}

fn xrange_repr(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let spec = range_of(&this)?;
    let repr = if spec.step == 1 && spec.next == 0 {
        format!("xrange({})", spec.end)
    } else if spec.step == 1 {
        format!("xrange({}, {})", spec.next, spec.end)
    } else {
        format!("xrange({}, {}, {})", spec.next, spec.end, spec.step)
    };
    Ok(Value::from(repr))
}

fn range_iter_next(_rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this] = unpack(args)?;
    let next = receiver(&this, "rangeiterator")?.with_payload_mut(|payload| match payload {
        Payload::RangeIter(spec) => Ok(spec.advance()),
        _ => Err(payload_error("rangeiterator")),
    })?;
    next.map(Value::Int).ok_or_else(ExcType::stop_iteration)
}

pub(crate) fn xrange_namespace() -> Namespace {
    Namespace::new()
        .in_module("__builtin__")
        .method(
            "__init__",
            Signature::new(["self", "start", "stop", "step"])
                .with_default("stop", Value::NotImplemented)
                .with_default("step", Value::Int(1)),
            xrange_init,
        )
        .method("__iter__", Signature::new(["self"]), xrange_iter)
        .method("__len__", Signature::new(["self"]), xrange_len)
        .method("__repr__", Signature::new(["self"]), xrange_repr)
}

pub(crate) fn iterator_namespace() -> Namespace {
    Namespace::new()
        .in_module("__builtin__")
        .method("__iter__", Signature::new(["self"]), iter_self)
        .method("next", Signature::new(["self"]), range_iter_next)
}

impl Runtime {
    /// `range(start, stop, step)` as a list.
    pub fn range(&mut self, start: i64, stop: i64, step: i64) -> RunResult<Value> {
        let mut spec = RangeSpec::new(start, stop, step)?;
        self.collect_range(&mut spec)
    }

    pub(crate) fn collect_range(&mut self, spec: &mut RangeSpec) -> RunResult<Value> {
        let mut items = Vec::with_capacity(spec.len());
        while let Some(i) = spec.advance() {
            items.push(Value::Int(i));
        }
        self.new_list(items)
    }
}
