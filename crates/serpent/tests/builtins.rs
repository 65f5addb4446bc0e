//! Tests for the builtin functions.

use pretty_assertions::assert_eq;
use serpent::{BuiltinFunction, CollectStringPrint, ExcType, Function, Namespace, RunResult, Runtime, Signature, Value, unpack};

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

fn add(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [a, b] = unpack(args)?;
    rt.add(&a, &b)
}

fn adder() -> Value {
    Value::from(Function::new("add", Signature::new(["a", "b"]), add))
}

fn repr(rt: &mut Runtime, value: &Value) -> String {
    rt.repr(value).unwrap().to_string()
}

// =============================================================================
// 1. min, max, sum, reduce
// =============================================================================

/// `min` and `max` take either one iterable or several arguments.
#[test]
fn min_and_max() {
    let mut rt = Runtime::new();
    let list = rt.new_list(ints(&[3, 1, 4, 1, 5])).unwrap();
    assert_eq!(rt.min(&list).unwrap(), Value::Int(1));
    assert_eq!(rt.max(&list).unwrap(), Value::Int(5));

    let spread = rt
        .call_builtin(BuiltinFunction::Max, vec![Value::Int(2), Value::Float(2.5), Value::Int(-1)])
        .unwrap();
    assert_eq!(spread, Value::Float(2.5));

    let empty = rt.new_list(vec![]).unwrap();
    let err = rt.min(&empty).unwrap_err();
    assert_eq!(rt.describe_error(&err).message(), Some("min() arg is an empty sequence"));
    let err = rt.call_builtin(BuiltinFunction::Max, vec![]).unwrap_err();
    assert_eq!(rt.describe_error(&err).message(), Some("max expected 1 arguments, got 0"));
}

/// Ties keep the first element found.
#[test]
fn min_keeps_the_first_of_equals() {
    let mut rt = Runtime::new();
    let numbers = rt.new_list(vec![Value::Float(1.0), Value::Int(1), Value::Int(2)]).unwrap();
    let smallest = rt.min(&numbers).unwrap();
    assert!(matches!(smallest, Value::Float(_)), "1.0 and 1 are equal: the first one wins");
    let largest = rt.max(&numbers).unwrap();
    assert!(matches!(largest, Value::Int(2)));
}

/// `sum` adds from a start value and refuses text starts.
#[test]
fn sum_values() {
    let mut rt = Runtime::new();
    let range = rt.range(1, 5, 1).unwrap();
    assert_eq!(rt.sum(&range, Value::Int(0)).unwrap(), Value::Int(10));
    assert_eq!(rt.sum(&range, Value::Float(0.5)).unwrap(), Value::Float(10.5));

    let lists = {
        let a = rt.new_list(ints(&[1])).unwrap();
        let b = rt.new_list(ints(&[2])).unwrap();
        rt.new_tuple(vec![a, b]).unwrap()
    };
    let start = rt.new_list(vec![]).unwrap();
    let flat = rt.sum(&lists, start).unwrap();
    assert_eq!(repr(&mut rt, &flat), "[1, 2]");

    let err = rt.sum(&range, Value::from("")).unwrap_err();
    assert_eq!(
        rt.describe_error(&err).message(),
        Some("sum() can't sum strings [use ''.join(seq) instead]")
    );
}

/// `reduce` folds left, optionally from an initial value.
#[test]
fn reduce_folds_left() {
    let mut rt = Runtime::new();
    let words = rt
        .new_list(vec![Value::from("a"), Value::from("b"), Value::from("c")])
        .unwrap();
    assert_eq!(rt.reduce(&adder(), &words, None).unwrap(), Value::from("abc"));
    assert_eq!(
        rt.reduce(&adder(), &words, Some(Value::from(">"))).unwrap(),
        Value::from(">abc")
    );

    let empty = rt.new_list(vec![]).unwrap();
    assert_eq!(rt.reduce(&adder(), &empty, Some(Value::Int(7))).unwrap(), Value::Int(7));
    let err = rt.reduce(&adder(), &empty, None).unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::TypeError));

    let via_builtin = rt
        .call_builtin(BuiltinFunction::Reduce, vec![adder(), words, Value::from("-")])
        .unwrap();
    assert_eq!(via_builtin, Value::from("-abc"));
}

// =============================================================================
// 2. map, zip, filter, sorted
// =============================================================================

/// `map` calls the function across iterables in parallel, padding with `None`.
#[test]
fn map_pads_shorter_iterables() {
    let mut rt = Runtime::new();
    let a = rt.new_list(ints(&[1, 2, 3])).unwrap();
    let b = rt.new_tuple(ints(&[10, 20])).unwrap();

    let sums = rt.map(&adder(), &[a.clone(), a.clone()]).unwrap();
    assert_eq!(repr(&mut rt, &sums), "[2, 4, 6]");

    let pairs = rt.map(&Value::None, &[a.clone(), b]).unwrap();
    assert_eq!(repr(&mut rt, &pairs), "[(1, 10), (2, 20), (3, None)]");

    let identity = rt.map(&Value::None, &[a]).unwrap();
    assert_eq!(repr(&mut rt, &identity), "[1, 2, 3]");

    let err = rt.call_builtin(BuiltinFunction::Map, vec![adder()]).unwrap_err();
    assert_eq!(rt.describe_error(&err).message(), Some("map() requires at least two args"));
}

/// `zip` stops at the shortest iterable.
#[test]
fn zip_truncates() {
    let mut rt = Runtime::new();
    let a = rt.new_list(ints(&[1, 2, 3])).unwrap();
    let zipped = rt.zip(&[a, Value::from("xy")]).unwrap();
    assert_eq!(repr(&mut rt, &zipped), "[(1, 'x'), (2, 'y')]");
    let nothing = rt.zip(&[]).unwrap();
    assert_eq!(repr(&mut rt, &nothing), "[]");
}

/// `filter` keeps the shape of text and tuples.
#[test]
fn filter_keeps_container_kind() {
    let mut rt = Runtime::new();
    let mixed = rt
        .new_tuple(vec![Value::Int(0), Value::Int(1), Value::None, Value::from("x")])
        .unwrap();
    let truthy = rt.filter(&Value::None, &mixed).unwrap();
    assert_eq!(repr(&mut rt, &truthy), "(1, 'x')");

    let is_vowel = Value::from(Function::new("is_vowel", Signature::new(["c"]), |rt, args| {
        let [c] = unpack(args)?;
        rt.contains(&Value::from("aeiou"), &c).map(Value::Bool)
    }));
    assert_eq!(rt.filter(&is_vowel, &Value::from("serpent")).unwrap(), Value::from("ee"));

    let xrange = rt.builtin_class("xrange").unwrap();
    let lazy = rt.instantiate(xrange, vec![Value::Int(3)]).unwrap();
    let as_list = rt.filter(&Value::None, &lazy).unwrap();
    assert_eq!(repr(&mut rt, &as_list), "[1, 2]");
}

/// `sorted` returns a new list and leaves its input alone.
#[test]
fn sorted_returns_a_new_list() {
    let mut rt = Runtime::new();
    let source = rt.new_tuple(ints(&[3, 1, 2])).unwrap();
    let ascending = rt.call_builtin(BuiltinFunction::Sorted, vec![source.clone()]).unwrap();
    assert_eq!(repr(&mut rt, &ascending), "[1, 2, 3]");
    let descending = rt
        .call_builtin(BuiltinFunction::Sorted, vec![source.clone(), Value::None, Value::None, Value::Bool(true)])
        .unwrap();
    assert_eq!(repr(&mut rt, &descending), "[3, 2, 1]");
    assert_eq!(repr(&mut rt, &source), "(3, 1, 2)");

    let mixed = rt.new_list(vec![Value::Int(1), Value::None]).unwrap();
    let err = rt.call_builtin(BuiltinFunction::Sorted, vec![mixed]).unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::TypeError));
}

/// User classes sort through their comparison methods.
#[test]
fn sorted_uses_rich_comparison() {
    let mut rt = Runtime::new();
    let weight = rt
        .define_class(
            "Weight",
            &[],
            Namespace::new()
                .method("__init__", Signature::new(["self", "kg"]), |rt, args| {
                    let [this, kg] = unpack(args)?;
                    rt.setattr(&this, "kg", kg)?;
                    Ok(Value::None)
                })
                .method("__ge__", Signature::new(["self", "other"]), |rt, args| {
                    let [this, other] = unpack(args)?;
                    let (a, b) = (rt.getattr(&this, "kg")?, rt.getattr(&other, "kg")?);
                    rt.ge(&a, &b).map(Value::Bool)
                })
                .method("__repr__", Signature::new(["self"]), |rt, args| {
                    let [this] = unpack(args)?;
                    let kg = rt.getattr(&this, "kg")?;
                    Ok(Value::from(format!("{}kg", rt.repr(&kg)?)))
                }),
        )
        .unwrap();
    let mut weights = Vec::new();
    for kg in [5, 2, 9] {
        weights.push(rt.instantiate(weight, vec![Value::Int(kg)]).unwrap());
    }
    let list = rt.new_list(weights).unwrap();
    let sorted = rt.call_builtin(BuiltinFunction::Sorted, vec![list]).unwrap();
    assert_eq!(repr(&mut rt, &sorted), "[2kg, 5kg, 9kg]");
}

// =============================================================================
// 3. print, len, repr, bool and attribute builtins
// =============================================================================

/// `print` writes `str` of each argument separated by spaces, ending with a newline.
#[test]
fn print_goes_to_the_installed_writer() {
    let mut rt = Runtime::new();
    let out = CollectStringPrint::new();
    rt.set_print(out.clone());

    let list = rt.new_list(vec![Value::from("a"), Value::Float(2.0)]).unwrap();
    rt.print(&[Value::from("items:"), list, Value::None]).unwrap();
    rt.call_builtin(BuiltinFunction::Print, vec![]).unwrap();
    rt.call_builtin(BuiltinFunction::Print, vec![Value::Int(1), Value::Bool(true)]).unwrap();

    assert_eq!(out.output(), "items: ['a', 2.0] None\n\n1 True\n");
}

/// Truthiness follows `__nonzero__`, then `__len__`.
#[test]
fn truth_values() {
    let mut rt = Runtime::new();
    let empty = rt.new_dict(vec![]).unwrap();
    assert!(!rt.truthy(&empty).unwrap());
    assert!(!rt.truthy(&Value::Float(0.0)).unwrap());
    assert!(rt.truthy(&Value::from(" ")).unwrap());

    let never = rt
        .define_class(
            "Never",
            &[],
            Namespace::new().method("__nonzero__", Signature::new(["self"]), |_, _| Ok(Value::Bool(false))),
        )
        .unwrap();
    let inst = rt.instantiate(never, vec![]).unwrap();
    assert_eq!(rt.call_builtin(BuiltinFunction::Bool, vec![inst]).unwrap(), Value::Bool(false));
    assert_eq!(rt.call_builtin(BuiltinFunction::Bool, vec![]).unwrap(), Value::Bool(false));
}

/// `len` needs `__len__`.
#[test]
fn len_of_values() {
    let mut rt = Runtime::new();
    assert_eq!(rt.len(&Value::from("héllo")).unwrap(), 5);
    let err = rt.len(&Value::Int(3)).unwrap_err();
    assert_eq!(rt.describe_error(&err).message(), Some("object of type 'int' has no len()"));
}

/// Built-in renderings of primitive and runtime values.
#[test]
fn repr_of_primitives() {
    let mut rt = Runtime::new();
    assert_eq!(repr(&mut rt, &Value::None), "None");
    assert_eq!(repr(&mut rt, &Value::Bool(true)), "True");
    assert_eq!(repr(&mut rt, &Value::Float(1.5)), "1.5");
    assert_eq!(repr(&mut rt, &Value::Float(3.0)), "3.0");
    assert_eq!(repr(&mut rt, &Value::NotImplemented), "NotImplemented");
    assert_eq!(repr(&mut rt, &Value::from("a\nb")), "'a\\nb'");

    let len = Value::from(BuiltinFunction::Len.to_function());
    assert_eq!(repr(&mut rt, &len), "<function len from module __builtin__>");
    let via_builtin = rt.call_builtin(BuiltinFunction::Repr, vec![Value::Int(-4)]).unwrap();
    assert_eq!(via_builtin, Value::from("-4"));
}

/// `getattr` with a default, `hasattr` and `setattr`.
#[test]
fn attribute_builtins() {
    let mut rt = Runtime::new();
    let cls = rt.define_class("Box", &[], Namespace::new()).unwrap();
    let inst = rt.instantiate(cls, vec![]).unwrap();

    rt.call_builtin(BuiltinFunction::Setattr, vec![inst.clone(), Value::from("w"), Value::Int(2)])
        .unwrap();
    let w = rt
        .call_builtin(BuiltinFunction::Getattr, vec![inst.clone(), Value::from("w")])
        .unwrap();
    assert_eq!(w, Value::Int(2));
    let missing = rt
        .call_builtin(BuiltinFunction::Getattr, vec![inst.clone(), Value::from("h"), Value::Int(0)])
        .unwrap();
    assert_eq!(missing, Value::Int(0));
    let err = rt
        .call_builtin(BuiltinFunction::Getattr, vec![inst.clone(), Value::from("h")])
        .unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::AttributeError));

    let has = rt.call_builtin(BuiltinFunction::Hasattr, vec![inst, Value::from("w")]).unwrap();
    assert_eq!(has, Value::Bool(true));
    assert_eq!(
        rt.call_builtin(BuiltinFunction::Callable, vec![Value::Class(cls)]).unwrap(),
        Value::Bool(true)
    );
}
