//! Tests for the module registry: resolution, package attachment, caching and reload.

use std::{cell::Cell, rc::Rc};

use pretty_assertions::assert_eq;
use serpent::{
    ExcType, Function, ModuleRef, RecordingTracer, RunResult, Runtime, RuntimeConfig, Signature, TraceEvent,
    Value,
};

/// Registers `file` with an initializer that counts its runs and sets `loads`.
fn counting_module(rt: &mut Runtime, file: &str) -> Rc<Cell<i64>> {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    rt.register_module(file, move |_rt, module| {
        counter.set(counter.get() + 1);
        module.set_attr("loads", counter.get());
        Ok(())
    });
    runs
}

fn module_of(value: &Value) -> &ModuleRef {
    match value {
        Value::Module(module) => module,
        other => panic!("expected a module, got {other:?}"),
    }
}

// =============================================================================
// 1. Built-in modules
// =============================================================================

/// `import os.path` binds `os`, with `path` attached as an attribute.
#[test]
fn dotted_import_returns_the_top_package() {
    let mut rt = Runtime::new();
    let os = rt.import("os.path", "", "").unwrap();
    assert_eq!(module_of(&os).name(), "os");

    let path = rt.getattr(&os, "path").unwrap();
    assert_eq!(module_of(&path).name(), "os.path");
    assert_eq!(rt.getattr(&path, "__file__").unwrap(), Value::from("<builtin>/os/path.py"));

    let join = rt.getattr(&path, "join").unwrap();
    let joined = rt
        .call(&join, vec![Value::from("a"), Value::from("b"), Value::from("/c"), Value::from("d")])
        .unwrap();
    assert_eq!(joined, Value::from("/c/d"));

    let normpath = rt.getattr(&path, "normpath").unwrap();
    assert_eq!(rt.call(&normpath, vec![Value::from("a//b/../c/.")]).unwrap(), Value::from("a/c"));

    let again = rt.import("os.path", "", "").unwrap();
    assert!(module_of(&again).ptr_eq(module_of(&os)), "the cached package is returned");
}

/// `__builtin__` exposes the builtin functions, classes and exceptions.
#[test]
fn builtin_module_contents() {
    let mut rt = Runtime::new();
    let builtins = rt.import("__builtin__", "", "").unwrap();

    let len = rt.getattr(&builtins, "len").unwrap();
    let list = rt.new_list(vec![Value::Int(1), Value::Int(2)]).unwrap();
    assert_eq!(rt.call(&len, vec![list]).unwrap(), Value::Int(2));

    let dict = rt.builtin_class("dict").unwrap();
    assert_eq!(rt.getattr(&builtins, "dict").unwrap(), Value::Class(dict));
    let key_error = rt.exc_class(ExcType::KeyError);
    assert_eq!(rt.getattr(&builtins, "KeyError").unwrap(), Value::Class(key_error));
    assert_eq!(rt.getattr(&builtins, "None").unwrap(), Value::None);

    let import = rt.getattr(&builtins, "__import__").unwrap();
    let os = rt.call(&import, vec![Value::from("os")]).unwrap();
    assert_eq!(rt.getattr(&os, "sep").unwrap(), Value::from("/"));
}

// =============================================================================
// 2. Resolution
// =============================================================================

/// Unknown modules raise ImportError; malformed names raise ValueError.
#[test]
fn unresolvable_names() {
    let mut rt = Runtime::new();
    let err = rt.import("nowhere", "", "").unwrap_err();
    let exc = rt.describe_error(&err);
    assert_eq!(exc.type_name(), "ImportError");
    assert_eq!(exc.message(), Some("no module named nowhere"));

    let err = rt.import("a..b", "", "").unwrap_err();
    assert_eq!(err.simple_type(), Some(ExcType::ValueError));
}

/// Modules next to the importing file resolve relatively and take the importer's package
/// as their name prefix.
#[test]
fn relative_imports_inside_a_package() {
    let mut rt = Runtime::new();
    rt.register_module("pkg/__init__.py", |_, _| Ok(()));
    rt.register_module("pkg/helper.py", |_, module| {
        module.set_attr("answer", Value::Int(42));
        Ok(())
    });
    rt.register_module("pkg/util.py", |rt, module| {
        let helper = rt.import("helper", "pkg.util", "pkg/util.py")?;
        module.set_attr("helper", helper);
        Ok(())
    });

    let pkg = rt.import("pkg.util", "", "main.py").unwrap();
    assert_eq!(module_of(&pkg).name(), "pkg");

    let util = rt.getattr(&pkg, "util").unwrap();
    let helper = rt.getattr(&util, "helper").unwrap();
    assert_eq!(module_of(&helper).name(), "pkg.helper");
    assert_eq!(rt.getattr(&helper, "answer").unwrap(), Value::Int(42));
    assert!(rt.loaded_module("pkg.helper").is_some());
    assert!(rt.loaded_module("helper").is_none());
}

/// Search path entries are tried after the importer's directory.
#[test]
fn search_path_roots() {
    let mut rt = Runtime::with_config(RuntimeConfig {
        search_path: vec!["/opt/lib".to_owned()],
        ..RuntimeConfig::default()
    });
    counting_module(&mut rt, "/opt/lib/vendor.py");

    let vendor = rt.import("vendor", "app", "src/app.py").unwrap();
    assert_eq!(module_of(&vendor).name(), "vendor");
    assert_eq!(module_of(&vendor).file(), "/opt/lib/vendor.py");
}

/// Plain files shadow packages of the same name; `./x.py` and `x.py` are one source.
#[test]
fn registration_keys_are_normalized() {
    let mut rt = Runtime::new();
    rt.register_module("./tools.py", |_, module| {
        module.set_attr("kind", "file");
        Ok(())
    });
    rt.register_module("tools/__init__.py", |_, module| {
        module.set_attr("kind", "package");
        Ok(())
    });
    let tools = rt.import("tools", "", "").unwrap();
    assert_eq!(rt.getattr(&tools, "kind").unwrap(), Value::from("file"));
}

// =============================================================================
// 3. Caching and reload
// =============================================================================

/// Initializers run once per import and again on reload, on the same module object.
#[test]
fn reload_reruns_the_initializer() {
    let mut rt = Runtime::new();
    let runs = counting_module(&mut rt, "config.py");

    let first = rt.import("config", "", "").unwrap();
    let second = rt.import("config", "", "").unwrap();
    assert_eq!(runs.get(), 1);
    assert!(module_of(&first).ptr_eq(module_of(&second)));

    let reloaded = rt.reload(&first).unwrap();
    assert_eq!(runs.get(), 2);
    assert!(module_of(&reloaded).ptr_eq(module_of(&first)));
    assert_eq!(rt.getattr(&first, "loads").unwrap(), Value::Int(2));

    let err = rt.reload(&Value::Int(1)).unwrap_err();
    assert_eq!(rt.describe_error(&err).message(), Some("reload() argument must be module"));
}

/// A failing initializer leaves nothing cached, so a later import retries.
#[test]
fn failed_initialization_is_not_cached() {
    let mut rt = Runtime::new();
    let attempts = Rc::new(Cell::new(0));
    let counter = attempts.clone();
    rt.register_module("flaky.py", move |rt, _| -> RunResult<()> {
        counter.set(counter.get() + 1);
        if counter.get() == 1 {
            return Err(rt.raise_new(ExcType::RuntimeError, "first load fails"));
        }
        Ok(())
    });

    assert!(rt.import("flaky", "", "").is_err());
    assert!(rt.loaded_module("flaky").is_none());
    rt.import("flaky", "", "").unwrap();
    assert_eq!(attempts.get(), 2);
}

/// Module attributes can be written and deleted like instance slots.
#[test]
fn module_attributes() {
    let mut rt = Runtime::new();
    rt.register_module("state.py", |_, _| Ok(()));
    let state = rt.import("state", "", "").unwrap();

    rt.setattr(&state, "counter", Value::Int(1)).unwrap();
    assert_eq!(rt.getattr(&state, "counter").unwrap(), Value::Int(1));
    assert_eq!(rt.getattr(&state, "__name__").unwrap(), Value::from("state"));
    rt.delattr(&state, "counter").unwrap();
    assert!(!rt.hasattr(&state, "counter"));

    let shout = Function::new("shout", Signature::new(["text"]), |rt, args| {
        let [text] = serpent::unpack(args)?;
        rt.call_method(&text, "upper", vec![])
    });
    rt.setattr(&state, "shout", Value::from(shout)).unwrap();
    let result = rt.call_method(&state, "shout", vec![Value::from("hi")]).unwrap();
    assert_eq!(result, Value::from("HI"), "module functions are not bound");
}

/// Every initializer run is reported to the tracer.
#[test]
fn module_loads_are_traced() {
    let mut rt = Runtime::new();
    let tracer = RecordingTracer::new();
    rt.set_tracer(tracer.clone());
    rt.import("os.path", "", "").unwrap();

    let loads: Vec<(String, String)> = tracer
        .events()
        .into_iter()
        .filter_map(|event| match event {
            TraceEvent::ModuleLoaded { name, file } => Some((name, file)),
            _ => None,
        })
        .collect();
    assert_eq!(
        loads,
        [
            ("os".to_owned(), "<builtin>/os/__init__.py".to_owned()),
            ("os.path".to_owned(), "<builtin>/os/path.py".to_owned()),
        ]
    );
}
