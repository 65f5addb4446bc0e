//! Modules, the module registry and the import machinery.
//!
//! A module source is registered under a file name such as `"pkg/util.py"` together with an
//! initializer that fills in the module's attributes. Importing resolves a dotted name to
//! one of those files by trying each search root in turn (`"."`, `"<builtin>"`, then the
//! configured roots), runs the initializer once, and caches the module by name.
//!
//! The `__builtin__`, `os` and `os.path` modules are registered when a runtime is created.

pub mod path;

use std::{cell::RefCell, fmt, rc::Rc};

use ahash::AHashMap;
use indexmap::IndexMap;
use strum::IntoEnumIterator;

use crate::{
    ExcType, Runtime,
    builtins::BuiltinFunction,
    exception_private::RunResult,
    function::{Function, Signature, unpack},
    types::string::text_of,
    value::Value,
};

/// Initializer run when a module is first imported and again on `reload`.
pub type ModuleInit = Rc<dyn Fn(&mut Runtime, &ModuleRef) -> RunResult<()>>;

/// Root searched for the modules that ship with the runtime.
const BUILTIN_ROOT: &str = "<builtin>";

#[derive(Debug)]
struct Module {
    name: String,
    file: String,
    attrs: IndexMap<String, Value>,
}

/// Shared handle to a module object.
#[derive(Clone)]
pub struct ModuleRef(Rc<RefCell<Module>>);

impl ModuleRef {
    fn new(name: &str, file: &str) -> Self {
        Self(Rc::new(RefCell::new(Module {
            name: name.to_owned(),
            file: file.to_owned(),
            attrs: IndexMap::new(),
        })))
    }

    /// Fully qualified module name, e.g. `"os.path"`.
    #[must_use]
    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Registered source file the module was loaded from.
    #[must_use]
    pub fn file(&self) -> String {
        self.0.borrow().file.clone()
    }

    /// An attribute, including the implicit `__name__` and `__file__`.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<Value> {
        let module = self.0.borrow();
        match name {
            "__name__" => Some(Value::from(module.name.as_str())),
            "__file__" => Some(Value::from(module.file.as_str())),
            _ => module.attrs.get(name).cloned(),
        }
    }

    pub fn set_attr(&self, name: &str, value: impl Into<Value>) {
        self.0.borrow_mut().attrs.insert(name.to_owned(), value.into());
    }

    pub fn remove_attr(&self, name: &str) -> Option<Value> {
        self.0.borrow_mut().attrs.shift_remove(name)
    }

    /// Names of the explicitly set attributes, in definition order.
    #[must_use]
    pub fn attr_names(&self) -> Vec<String> {
        self.0.borrow().attrs.keys().cloned().collect()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let module = self.0.borrow();
        write!(f, "<module '{}' from '{}'>", module.name, module.file)
    }
}

/// Registered module sources and the modules loaded from them.
pub(crate) struct ModuleRegistry {
    /// Initializers keyed by normalized file name.
    sources: AHashMap<String, ModuleInit>,
    /// Loaded modules keyed by qualified name.
    loaded: IndexMap<String, ModuleRef>,
    search_path: Vec<String>,
}

impl ModuleRegistry {
    pub fn new(search_path: Vec<String>) -> Self {
        Self {
            sources: AHashMap::new(),
            loaded: IndexMap::new(),
            search_path,
        }
    }

    /// Finds the source file for `name` as seen from `file`. The flag reports whether the
    /// matching root was relative to the importing file.
    fn resolve(&self, name: &str, file: &str) -> Option<(String, bool)> {
        let roots = [".", BUILTIN_ROOT]
            .into_iter()
            .chain(self.search_path.iter().map(String::as_str));
        let rel_name = name.replace('.', "/");
        for root in roots {
            let relative = !path::isabs(root) && !root.starts_with(BUILTIN_ROOT);
            let dir = if relative {
                path::normpath(&path::join(path::dirname(file), &[root]))
            } else {
                root.to_owned()
            };
            let base = path::join(&dir, &[rel_name.as_str()]);
            for candidate in [format!("{base}.py"), format!("{base}/__init__.py")] {
                let candidate = path::normpath(&candidate);
                if self.sources.contains_key(&candidate) {
                    return Some((candidate, relative));
                }
            }
        }
        None
    }
}

/// Name a relatively resolved module gets: the importing module's package plus `name`.
fn qualified_name(name: &str, from: &str) -> String {
    match from.rsplit_once('.') {
        Some((package, _)) => format!("{package}.{name}"),
        None => name.to_owned(),
    }
}

impl Runtime {
    /// Registers a module source under `file`, replacing any earlier registration.
    ///
    /// Modules already loaded from that file keep their attributes until reloaded.
    pub fn register_module(
        &mut self,
        file: &str,
        init: impl Fn(&mut Runtime, &ModuleRef) -> RunResult<()> + 'static,
    ) {
        self.modules.sources.insert(path::normpath(file), Rc::new(init));
    }

    /// A loaded module by qualified name.
    #[must_use]
    pub fn loaded_module(&self, name: &str) -> Option<ModuleRef> {
        self.modules.loaded.get(name).cloned()
    }

    /// Imports the dotted module `name` on behalf of the module `from` defined in `file`.
    ///
    /// Parent packages are imported first and each child is attached to its parent as an
    /// attribute. The result is the top-level package for a dotted name (`import os.path`
    /// binds `os`), otherwise the module itself. Each module's initializer runs once.
    pub fn import(&mut self, name: &str, from: &str, file: &str) -> RunResult<Value> {
        if self.modules.loaded.contains_key(name) {
            let top = name.split('.').next().unwrap_or(name);
            if let Some(module) = self.modules.loaded.get(top).or_else(|| self.modules.loaded.get(name)) {
                return Ok(Value::Module(module.clone()));
            }
        }
        let parts: Vec<&str> = name.split('.').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(ExcType::value_error(format!("invalid module name '{name}'")));
        }
        let parent = match name.rsplit_once('.') {
            Some((parent, _)) => Some(self.import(parent, from, file)?),
            None => None,
        };

        let Some((found, relative)) = self.modules.resolve(name, file) else {
            return Err(ExcType::import_error(format!("no module named {name}")));
        };
        let qualified = if relative {
            qualified_name(name, from)
        } else {
            name.to_owned()
        };
        let module = match self.modules.loaded.get(&qualified) {
            Some(module) => module.clone(),
            None => self.load_module(&qualified, &found)?,
        };

        let Some(parent) = parent else {
            return Ok(Value::Module(module));
        };
        let mut direct_parent = parent.clone();
        if let [_, middle @ .., last] = parts.as_slice() {
            for part in middle {
                direct_parent = self.getattr(&direct_parent, part)?;
            }
            self.setattr(&direct_parent, last, Value::Module(module))?;
        }
        Ok(parent)
    }

    /// Re-runs the initializer of a loaded module on the same module object.
    pub fn reload(&mut self, module: &Value) -> RunResult<Value> {
        let Value::Module(module) = module else {
            return Err(ExcType::type_error("reload() argument must be module"));
        };
        let (name, file) = (module.name(), module.file());
        let Some(init) = self.modules.sources.get(&file).cloned() else {
            return Err(ExcType::import_error(format!("no module named {name}")));
        };
        self.tracer.on_module_loaded(&name, &file);
        init(self, module)?;
        Ok(Value::Module(module.clone()))
    }

    fn load_module(&mut self, name: &str, file: &str) -> RunResult<ModuleRef> {
        let Some(init) = self.modules.sources.get(file).cloned() else {
            return Err(ExcType::import_error(format!("no module named {name}")));
        };
        let module = ModuleRef::new(name, file);
        // cached before running so circular imports see the partially initialized module
        self.modules.loaded.insert(name.to_owned(), module.clone());
        self.tracer.on_module_loaded(name, file);
        if let Err(err) = init(self, &module) {
            self.modules.loaded.shift_remove(name);
            return Err(err);
        }
        Ok(module)
    }
}

fn text_arg(value: &Value, func: &str) -> RunResult<String> {
    text_of(value)
        .map(|text| text.to_string())
        .ok_or_else(|| ExcType::type_error(format!("{func}() argument must be string")))
}

fn path_function(
    name: &'static str,
    op: impl Fn(&str) -> Value + 'static,
) -> Function {
    Function::new(name, Signature::new(["path"]), move |_rt, args| {
        let [path] = unpack(args)?;
        Ok(op(&text_arg(&path, name)?))
    })
    .with_module("os.path")
}

fn builtin_module(rt: &mut Runtime, module: &ModuleRef) -> RunResult<()> {
    for builtin in BuiltinFunction::iter() {
        let name: &'static str = builtin.into();
        module.set_attr(name, builtin.to_function());
    }
    for (name, class_id) in rt.builtins.public() {
        module.set_attr(name, class_id);
    }
    for exc_type in ExcType::iter() {
        let name: &'static str = exc_type.into();
        module.set_attr(name, rt.exc_class(exc_type));
    }
    module.set_attr("None", Value::None);
    module.set_attr("NotImplemented", Value::NotImplemented);
    module.set_attr("True", Value::Bool(true));
    module.set_attr("False", Value::Bool(false));

    let import = Signature::new(["name", "from", "file"])
        .with_default("from", "")
        .with_default("file", "");
    module.set_attr(
        "__import__",
        Function::new("__import__", import, |rt, args| {
            let [name, from, file] = unpack(args)?;
            let name = text_arg(&name, "__import__")?;
            let from = text_arg(&from, "__import__")?;
            let file = text_arg(&file, "__import__")?;
            rt.import(&name, &from, &file)
        })
        .with_module("__builtin__"),
    );
    module.set_attr(
        "reload",
        Function::new("reload", Signature::new(["module"]), |rt, args| {
            let [module] = unpack(args)?;
            rt.reload(&module)
        })
        .with_module("__builtin__"),
    );
    Ok(())
}

fn os_module(_rt: &mut Runtime, module: &ModuleRef) -> RunResult<()> {
    module.set_attr("sep", "/");
    module.set_attr("curdir", ".");
    module.set_attr("pardir", "..");
    Ok(())
}

fn os_path_module(_rt: &mut Runtime, module: &ModuleRef) -> RunResult<()> {
    let join = Function::new("join", Signature::new(["a", "p"]).with_var_args(), |rt, args| {
        let [first, rest] = unpack(args)?;
        let first = text_arg(&first, "join")?;
        let rest = rt.collect(&rest)?;
        let mut parts = Vec::with_capacity(rest.len());
        for part in &rest {
            parts.push(text_arg(part, "join")?);
        }
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        Ok(Value::from(path::join(&first, &parts)))
    })
    .with_module("os.path");
    let split = Function::new("split", Signature::new(["path"]), |rt, args| {
        let [p] = unpack(args)?;
        let p = text_arg(&p, "split")?;
        let (head, tail) = path::split(&p);
        rt.new_tuple(vec![Value::from(head), Value::from(tail)])
    })
    .with_module("os.path");

    module.set_attr("sep", "/");
    module.set_attr("join", join);
    module.set_attr("split", split);
    module.set_attr("isabs", path_function("isabs", |p| Value::Bool(path::isabs(p))));
    module.set_attr("dirname", path_function("dirname", |p| Value::from(path::dirname(p))));
    module.set_attr("basename", path_function("basename", |p| Value::from(path::basename(p))));
    module.set_attr("normpath", path_function("normpath", |p| Value::from(path::normpath(p))));
    Ok(())
}

/// Registers the modules every runtime starts with.
pub(crate) fn register_builtin_modules(rt: &mut Runtime) {
    rt.register_module("<builtin>/__builtin__.py", builtin_module);
    rt.register_module("<builtin>/os/__init__.py", os_module);
    rt.register_module("<builtin>/os/path.py", os_path_module);
}
