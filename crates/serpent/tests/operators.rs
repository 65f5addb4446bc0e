//! Tests for operator dispatch: forward and reflected special methods, the
//! `NotImplemented` sentinel, native fallbacks, in-place operators and comparisons.

use serpent::{
    BinaryOp, ClassId, CompareOp, DispatchStrategy, ExcType, Namespace, OperatorResult, RecordingTracer, RunResult,
    Runtime, Signature, TraceEvent, Value, unpack,
};

/// `Money(amount)`: adds to other `Money` and to plain numbers from the right.
fn money_class(rt: &mut Runtime) -> ClassId {
    let namespace = Namespace::new()
        .method("__init__", Signature::new(["self", "amount"]), |rt, args| {
            let [this, amount] = unpack(args)?;
            rt.setattr(&this, "amount", amount)?;
            Ok(Value::None)
        })
        .method("__add__", Signature::new(["self", "other"]), money_add)
        .method("__radd__", Signature::new(["self", "other"]), money_add);
    rt.define_class("Money", &[], namespace).unwrap()
}

fn money_add(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let mine = rt.getattr(&this, "amount")?;
    let theirs = match &other {
        Value::Int(_) | Value::Float(_) => other.clone(),
        _ => match rt.lookup_attr(&other, "amount") {
            Some(amount) => amount,
            None => return Ok(Value::NotImplemented),
        },
    };
    let total = rt.add(&mine, &theirs)?;
    let class = rt.getattr(&this, "__class__")?;
    rt.call(&class, vec![total])
}

fn amount(rt: &mut Runtime, value: &Value) -> Value {
    rt.getattr(value, "amount").unwrap()
}

// =============================================================================
// 1. Binary dispatch
// =============================================================================

/// Only the right operand knows the operator: `b.__radd__(a)` is the result.
#[test]
fn reflected_method_handles_primitive_left_operand() {
    let mut rt = Runtime::new();
    let money = money_class(&mut rt);
    let five = rt.instantiate(money, vec![Value::Int(5)]).unwrap();

    let sum = rt.add(&Value::Int(2), &five).unwrap();
    assert_eq!(amount(&mut rt, &sum), Value::Int(7));

    let result = rt.dispatch("__add__", "__radd__", &Value::Int(2), &five).unwrap();
    assert!(matches!(result, OperatorResult::Value(_)));
}

/// Forward dispatch is tried first and the left operand decides.
#[test]
fn forward_method_wins() {
    let mut rt = Runtime::new();
    let money = money_class(&mut rt);
    let a = rt.instantiate(money, vec![Value::Int(1)]).unwrap();
    let b = rt.instantiate(money, vec![Value::Int(2)]).unwrap();

    let tracer = RecordingTracer::new();
    rt.set_tracer(tracer.clone());
    let sum = rt.add(&a, &b).unwrap();
    assert_eq!(amount(&mut rt, &sum), Value::Int(3));
    assert!(
        tracer.events().contains(&TraceEvent::Dispatch {
            op: "__add__".to_owned(),
            strategy: DispatchStrategy::Forward,
        }),
        "expected a forward dispatch event, got {:?}",
        tracer.events()
    );
}

/// Two numbers without special methods use the native operator.
#[test]
fn primitives_use_native_arithmetic() {
    let mut rt = Runtime::new();
    assert_eq!(rt.add(&Value::Int(2), &Value::Int(3)).unwrap(), Value::Int(5));
    assert_eq!(rt.add(&Value::Int(2), &Value::Float(0.5)).unwrap(), Value::Float(2.5));
    assert_eq!(rt.div(&Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(-4));
    assert_eq!(rt.modulo(&Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(1));
    assert_eq!(
        rt.binary_op(BinaryOp::Pow, &Value::Int(2), &Value::Int(10)).unwrap(),
        Value::Int(1024)
    );
    assert_eq!(
        rt.binary_op(BinaryOp::FloorDiv, &Value::Float(7.0), &Value::Int(2)).unwrap(),
        Value::Float(3.0)
    );
}

/// Mismatched kinds that nobody handles raise TypeError.
#[test]
fn unsupported_operands_raise_type_error() {
    let mut rt = Runtime::new();
    let err = rt.add(&Value::Int(1), &Value::from("a")).unwrap_err();
    let exc = rt.describe_error(&err);
    assert_eq!(exc.type_name(), "TypeError");
    assert_eq!(exc.message(), Some("unsupported operand type(s) for +: 'int' and 'str'"));

    let err = rt.sub(&Value::None, &Value::Int(1)).unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::TypeError));
}

/// `NotImplemented` from the forward method moves on to the reflected one; from the
/// reflected method it ends dispatch.
#[test]
fn not_implemented_falls_through() {
    let mut rt = Runtime::new();
    let money = money_class(&mut rt);
    let plain = rt.define_class("Plain", &[], Namespace::new()).unwrap();
    let cash = rt.instantiate(money, vec![Value::Int(1)]).unwrap();
    let thing = rt.instantiate(plain, vec![]).unwrap();

    let result = rt.dispatch("__add__", "__radd__", &cash, &thing).unwrap();
    assert_eq!(result, OperatorResult::NotImplemented);
    let err = rt.add(&thing, &cash).unwrap_err();
    assert_eq!(
        rt.describe_error(&err).message(),
        Some("unsupported operand type(s) for +: 'Plain' and 'Money'")
    );
}

/// Division by zero and integer overflow are reported, not wrapped.
#[test]
fn arithmetic_errors() {
    let mut rt = Runtime::new();
    let err = rt.div(&Value::Int(1), &Value::Int(0)).unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::ZeroDivisionError));
    let err = rt.add(&Value::Int(i64::MAX), &Value::Int(1)).unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::OverflowError));
    assert!(
        rt.exception_matches(&err, rt.exc_class(ExcType::ArithmeticError)),
        "OverflowError is an ArithmeticError"
    );
}

// =============================================================================
// 2. In-place operators
// =============================================================================

/// `+=` on a list extends it in place.
#[test]
fn inplace_add_mutates_lists() {
    let mut rt = Runtime::new();
    let list = rt.new_list(vec![Value::Int(1)]).unwrap();
    let more = rt.new_list(vec![Value::Int(2), Value::Int(3)]).unwrap();

    let result = rt.inplace_op(BinaryOp::Add, &list, &more).unwrap();
    assert_eq!(result, list, "__iadd__ returns the same list object");
    assert_eq!(rt.len(&list).unwrap(), 3);
}

/// Without `__iadd__` the binary operator produces a new object.
#[test]
fn inplace_falls_back_to_binary() {
    let mut rt = Runtime::new();
    let money = money_class(&mut rt);
    let cash = rt.instantiate(money, vec![Value::Int(1)]).unwrap();

    let result = rt.inplace_op(BinaryOp::Add, &cash, &Value::Int(4)).unwrap();
    assert_ne!(result, cash);
    assert_eq!(amount(&mut rt, &result), Value::Int(5));
    assert_eq!(
        rt.inplace_op(BinaryOp::Mul, &Value::Int(3), &Value::Int(4)).unwrap(),
        Value::Int(12)
    );
}

// =============================================================================
// 3. Comparisons
// =============================================================================

fn version_class(rt: &mut Runtime) -> ClassId {
    let namespace = Namespace::new()
        .method("__init__", Signature::new(["self", "n"]), |rt, args| {
            let [this, n] = unpack(args)?;
            rt.setattr(&this, "n", n)?;
            Ok(Value::None)
        })
        .method("__ge__", Signature::new(["self", "other"]), |rt, args| {
            let [this, other] = unpack(args)?;
            let a = rt.getattr(&this, "n")?;
            let b = rt.getattr(&other, "n")?;
            rt.ge(&a, &b).map(Value::Bool)
        })
        .method("__eq__", Signature::new(["self", "other"]), |rt, args| {
            let [this, other] = unpack(args)?;
            let Some(b) = rt.lookup_attr(&other, "n") else {
                return Ok(Value::NotImplemented);
            };
            let a = rt.getattr(&this, "n")?;
            rt.eq(&a, &b).map(Value::Bool)
        });
    rt.define_class("Version", &[], namespace).unwrap()
}

/// `<` is the negation of `>=`, so defining `__ge__` is enough for both.
#[test]
fn less_than_is_negated_greater_equal() {
    let mut rt = Runtime::new();
    let version = version_class(&mut rt);
    let v1 = rt.instantiate(version, vec![Value::Int(1)]).unwrap();
    let v2 = rt.instantiate(version, vec![Value::Int(2)]).unwrap();

    assert!(rt.lt(&v1, &v2).unwrap());
    assert!(!rt.lt(&v2, &v1).unwrap());
    assert!(rt.ge(&v2, &v1).unwrap());
}

/// The negation also applies to unordered floats, which is a known limitation.
#[test]
fn nan_ordering_follows_negation() {
    let mut rt = Runtime::new();
    let nan = Value::Float(f64::NAN);
    assert!(!rt.ge(&nan, &Value::Float(1.0)).unwrap());
    assert!(!rt.gt(&nan, &Value::Float(1.0)).unwrap());
    assert!(rt.lt(&nan, &Value::Float(1.0)).unwrap(), "lt is computed as not ge");
}

/// Equality uses `__eq__` when defined and identity otherwise.
#[test]
fn equality_falls_back_to_identity() {
    let mut rt = Runtime::new();
    let version = version_class(&mut rt);
    let plain = rt.define_class("Plain", &[], Namespace::new()).unwrap();
    let a = rt.instantiate(version, vec![Value::Int(1)]).unwrap();
    let b = rt.instantiate(version, vec![Value::Int(1)]).unwrap();
    let p = rt.instantiate(plain, vec![]).unwrap();
    let q = rt.instantiate(plain, vec![]).unwrap();

    assert!(rt.eq(&a, &b).unwrap(), "__eq__ compares the payload");
    assert!(!rt.eq(&p, &q).unwrap(), "distinct plain instances are unequal");
    assert!(rt.eq(&p, &p).unwrap());
    assert!(rt.ne(&p, &q).unwrap());
    assert!(rt.eq(&Value::Int(1), &Value::Float(1.0)).unwrap());
    assert!(rt.eq(&Value::from("ab"), &Value::from("ab")).unwrap());
}

/// Ordering values with no common protocol is a TypeError.
#[test]
fn unorderable_values() {
    let mut rt = Runtime::new();
    let err = rt.gt(&Value::Int(1), &Value::None).unwrap_err();
    assert_eq!(
        rt.describe_error(&err).message(),
        Some("'>' not supported between instances of 'int' and 'NoneType'")
    );
    assert!(rt.lt(&Value::from("apple"), &Value::from("banana")).unwrap());
}

/// Chains short-circuit on the first false link.
#[test]
fn comparison_chains() {
    let mut rt = Runtime::new();
    let values = [Value::Int(1), Value::Int(2), Value::Int(3)];
    assert!(rt.compare_chain(&values, &[CompareOp::Lt, CompareOp::Lt]).unwrap());
    assert!(!rt.compare_chain(&values, &[CompareOp::Lt, CompareOp::Gt]).unwrap());

    let list = rt.new_list(vec![Value::Int(2)]).unwrap();
    let chain = [Value::Int(2), list.clone(), list];
    assert!(rt.compare_chain(&chain, &[CompareOp::In, CompareOp::Is]).unwrap());

    let op: CompareOp = "not in".parse().unwrap();
    assert_eq!(op, CompareOp::NotIn);
    let err = rt.compare_chain(&values, &[CompareOp::Lt]).unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::ValueError));
}

/// Membership goes through `__contains__`; text supports substring tests.
#[test]
fn membership() {
    let mut rt = Runtime::new();
    assert!(rt.contains(&Value::from("hello"), &Value::from("ell")).unwrap());
    let err = rt.contains(&Value::Int(3), &Value::Int(1)).unwrap_err();
    assert_eq!(
        rt.describe_error(&err).message(),
        Some("argument of type 'int' is not iterable")
    );
}
