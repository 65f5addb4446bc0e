// Use codspeed-criterion-compat when running on CodSpeed (CI), real criterion otherwise (for flamegraphs)
#[cfg(codspeed)]
use codspeed_criterion_compat::{Bencher, Criterion, black_box, criterion_group, criterion_main};
#[cfg(not(codspeed))]
use criterion::{Bencher, Criterion, black_box, criterion_group, criterion_main};
use serpent::{ClassId, Namespace, RunResult, Runtime, Signature, Value, unpack};

fn vector_add(rt: &mut Runtime, args: Vec<Value>) -> RunResult<Value> {
    let [this, other] = unpack(args)?;
    let (x1, x2) = (rt.getattr(&this, "x")?, rt.getattr(&other, "x")?);
    let x = rt.add(&x1, &x2)?;
    let cls = rt.getattr(&this, "__class__")?;
    rt.call(&cls, vec![x])
}

/// A one-field vector class with `__add__`, three levels below its method definitions.
fn vector_class(rt: &mut Runtime) -> ClassId {
    let base = Namespace::new()
        .method("__init__", Signature::new(["self", "x"]), |rt, args| {
            let [this, x] = unpack(args)?;
            rt.setattr(&this, "x", x)?;
            Ok(Value::None)
        })
        .method("__add__", Signature::new(["self", "other"]), vector_add)
        .method("norm", Signature::new(["self"]), |rt, args| {
            let [this] = unpack(args)?;
            rt.getattr(&this, "x")
        });
    let base = rt.define_class("Base", &[], base).unwrap();
    let middle = rt.define_class("Middle", &[base], Namespace::new()).unwrap();
    rt.define_class("Vector", &[middle], Namespace::new()).unwrap()
}

/// Inherited method lookup and bound call.
fn method_call(bench: &mut Bencher) {
    let mut rt = Runtime::new();
    let cls = vector_class(&mut rt);
    let v = rt.instantiate(cls, vec![Value::Int(3)]).unwrap();
    assert_eq!(rt.call_method(&v, "norm", vec![]).unwrap(), Value::Int(3));

    bench.iter(|| black_box(rt.call_method(&v, "norm", vec![]).unwrap()));
}

/// Operator dispatch through a user `__add__`, allocating the result.
fn user_operator(bench: &mut Bencher) {
    let mut rt = Runtime::new();
    let cls = vector_class(&mut rt);
    let a = rt.instantiate(cls, vec![Value::Int(1)]).unwrap();
    let b = rt.instantiate(cls, vec![Value::Int(2)]).unwrap();

    bench.iter(|| black_box(rt.add(&a, &b).unwrap()));
}

/// Native fallback for primitive arithmetic.
fn native_operator(bench: &mut Bencher) {
    let mut rt = Runtime::new();
    bench.iter(|| black_box(rt.add(&Value::Int(40), &Value::Int(2)).unwrap()));
}

/// Building a list comprehension over a range.
fn listcomp_1000(bench: &mut Bencher) {
    let mut rt = Runtime::new();
    let double = Value::from(serpent::Function::new("double", Signature::new(["x"]), |rt, args| {
        let [x] = unpack(args)?;
        rt.add(&x, &x)
    }));

    bench.iter(|| {
        let source = rt.range(0, 1000, 1).unwrap();
        black_box(rt.listcomp(vec![source], double.clone(), vec![]).unwrap())
    });
}

/// Dict insertion and lookup with string keys.
fn dict_roundtrip(bench: &mut Bencher) {
    let mut rt = Runtime::new();
    let keys: Vec<Value> = (0..50).map(|i| Value::from(format!("key{i}"))).collect();

    bench.iter(|| {
        let d = rt.new_dict(vec![]).unwrap();
        for (i, key) in (0..).zip(&keys) {
            rt.setitem(&d, key, Value::Int(i)).unwrap();
        }
        for key in &keys {
            black_box(rt.getitem(&d, key).unwrap());
        }
    });
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("method_call", method_call);
    c.bench_function("user_operator", user_operator);
    c.bench_function("native_operator", native_operator);
    c.bench_function("listcomp_1000", listcomp_1000);
    c.bench_function("dict_roundtrip", dict_roundtrip);
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
