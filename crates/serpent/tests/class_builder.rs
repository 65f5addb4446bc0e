//! Tests for class construction and the override-depth merge rule.
//!
//! Classes are built from their bases in reverse declaration order; an inherited method
//! only replaces an entry that was defined at least as deep in the hierarchy.

use serpent::{ClassId, Namespace, RunResult, Runtime, Signature, Value};

/// A method body that ignores its arguments and returns a fixed tag.
fn returns(tag: &'static str) -> impl Fn(&mut Runtime, Vec<Value>) -> RunResult<Value> + 'static {
    move |_, _| Ok(Value::from(tag))
}

fn with_method(name: &str, tag: &'static str) -> Namespace {
    Namespace::new()
        .in_module("shapes")
        .method(name, Signature::new(["self"]), returns(tag))
}

fn call_m(rt: &mut Runtime, class_id: ClassId) -> Value {
    let inst = rt.instantiate(class_id, vec![]).unwrap();
    rt.call_method(&inst, "m", vec![]).unwrap()
}

// =============================================================================
// 1. Diamond resolution
// =============================================================================

/// With `m` overridden in both `B` and `C`, `D(B, C)` uses `B`'s version.
#[test]
fn diamond_prefers_first_base_when_both_override() {
    let mut rt = Runtime::new();
    let a = rt.define_class("A", &[], with_method("m", "A")).unwrap();
    let b = rt.define_class("B", &[a], with_method("m", "B")).unwrap();
    let c = rt.define_class("C", &[a], with_method("m", "C")).unwrap();
    let d = rt.define_class("D", &[b, c], Namespace::new()).unwrap();

    assert_eq!(call_m(&mut rt, d), Value::from("B"), "D(B, C).m should come from B");
}

/// An override in the second base beats the original reached through the first base.
#[test]
fn diamond_keeps_shallower_override_from_later_base() {
    let mut rt = Runtime::new();
    let a = rt.define_class("A", &[], with_method("m", "A")).unwrap();
    let b = rt.define_class("B", &[a], Namespace::new()).unwrap();
    let c = rt.define_class("C", &[a], with_method("m", "C")).unwrap();
    let d = rt.define_class("D", &[b, c], Namespace::new()).unwrap();

    assert_eq!(
        call_m(&mut rt, d),
        Value::from("C"),
        "C's direct override is shallower than A's method inherited through B"
    );
    let depth = rt.class_record(d).attr("m").and_then(|attr| attr.depth());
    assert_eq!(depth, Some(2), "the winning entry was defined one level above D");
}

/// A class that defines a method itself always uses it, whatever its bases do.
#[test]
fn own_definition_always_wins() {
    let mut rt = Runtime::new();
    let a = rt.define_class("A", &[], with_method("m", "A")).unwrap();
    let b = rt.define_class("B", &[a], with_method("m", "B")).unwrap();
    let d = rt.define_class("D", &[b, a], with_method("m", "D")).unwrap();

    assert_eq!(call_m(&mut rt, d), Value::from("D"));
    assert_eq!(rt.class_record(d).attr("m").and_then(|attr| attr.depth()), Some(1));
}

/// Depth grows by one per level of inheritance.
#[test]
fn depth_counts_inheritance_levels() {
    let mut rt = Runtime::new();
    let a = rt.define_class("A", &[], with_method("m", "A")).unwrap();
    let b = rt.define_class("B", &[a], Namespace::new()).unwrap();
    let c = rt.define_class("C", &[b], Namespace::new()).unwrap();

    let depth_of = |rt: &Runtime, id| rt.class_record(id).attr("m").and_then(|attr| attr.depth());
    assert_eq!(depth_of(&rt, a), Some(1));
    assert_eq!(depth_of(&rt, b), Some(2));
    assert_eq!(depth_of(&rt, c), Some(3));
}

// =============================================================================
// 2. Data attributes and metadata
// =============================================================================

/// Data attributes carry no depth; the base listed first wins.
#[test]
fn data_attributes_come_from_first_base() {
    let mut rt = Runtime::new();
    let b = rt
        .define_class("B", &[], Namespace::new().attr("colour", "blue"))
        .unwrap();
    let c = rt
        .define_class("C", &[], Namespace::new().attr("colour", "cyan"))
        .unwrap();
    let d = rt.define_class("D", &[b, c], Namespace::new()).unwrap();

    let colour = rt.getattr(&Value::Class(d), "colour").unwrap();
    assert_eq!(colour, Value::from("blue"));
    assert_eq!(rt.class_record(d).attr("colour").and_then(|attr| attr.depth()), None);
}

/// Classes report their name, module and bases.
#[test]
fn class_metadata_is_recorded() {
    let mut rt = Runtime::new();
    let a = rt.define_class("A", &[], with_method("m", "A")).unwrap();
    let b = rt.define_class("B", &[a], with_method("n", "B")).unwrap();

    let record = rt.class_record(b);
    assert_eq!(record.name(), "B");
    assert_eq!(record.module(), Some("shapes"));
    assert_eq!(record.qualified_name(), "shapes.B");
    assert_eq!(record.bases(), &[a]);

    let class = Value::Class(b);
    assert_eq!(rt.getattr(&class, "__name__").unwrap(), Value::from("B"));
    assert_eq!(rt.getattr(&class, "__module__").unwrap(), Value::from("shapes"));
    assert_eq!(rt.repr(&class).unwrap().as_ref(), "<class 'shapes.B'>");
}

/// Every class built goes into the arena and is counted by the heap statistics.
#[test]
fn defined_classes_are_registered() {
    let mut rt = Runtime::new();
    let before = rt.heap_stats();
    let a = rt.define_class("Widget", &[], with_method("m", "A")).unwrap();
    let after = rt.heap_stats();

    assert_eq!(after.classes, before.classes + 1);
    assert_eq!(rt.heap().find_class("Widget"), Some(a));
}

// =============================================================================
// 3. Subclass relationships
// =============================================================================

/// `isinstance(D(), A)` holds through either side of a diamond.
#[test]
fn isinstance_follows_every_base() {
    let mut rt = Runtime::new();
    let a = rt.define_class("A", &[], Namespace::new()).unwrap();
    let b = rt.define_class("B", &[a], Namespace::new()).unwrap();
    let c = rt.define_class("C", &[a], Namespace::new()).unwrap();
    let d = rt.define_class("D", &[b, c], Namespace::new()).unwrap();
    let other = rt.define_class("Other", &[], Namespace::new()).unwrap();
    let inst = rt.instantiate(d, vec![]).unwrap();

    for class_id in [a, b, c, d] {
        assert!(rt.isinstance(&inst, &Value::Class(class_id)).unwrap());
    }
    assert!(!rt.isinstance(&inst, &Value::Class(other)).unwrap());
    let either = rt.new_tuple(vec![Value::Class(other), Value::Class(c)]).unwrap();
    assert!(rt.isinstance(&inst, &either).unwrap(), "a tuple matches if any entry matches");
    assert!(rt.issubclass(&Value::Class(d), &Value::Class(a)).unwrap());
    assert!(!rt.issubclass(&Value::Class(a), &Value::Class(d)).unwrap());
}

/// Values without a class are never instances; a bad classinfo is a TypeError.
#[test]
fn isinstance_rejects_non_classes() {
    let mut rt = Runtime::new();
    let a = rt.define_class("A", &[], Namespace::new()).unwrap();
    assert!(!rt.isinstance(&Value::Int(3), &Value::Class(a)).unwrap());

    let err = rt.isinstance(&Value::Int(3), &Value::Int(4)).unwrap_err();
    assert_eq!(err.simple_type(), Some(serpent::ExcType::TypeError));

    let str_class = rt.builtin_class("str").unwrap();
    assert!(
        rt.isinstance(&Value::from("text"), &Value::Class(str_class)).unwrap(),
        "host text is an instance of str"
    );
}
