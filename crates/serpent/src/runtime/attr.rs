//! Attribute lookup and assignment.

use super::{AttributeBinding, Runtime};
use crate::{
    ExcType,
    exception_private::{RunError, RunResult},
    heap::ClassId,
    types::{BindTarget, InstanceRef, bind},
    value::Value,
};

impl Runtime {
    /// Looks up `name` on `target`, returning `None` when it does not exist.
    ///
    /// Instances check their own slots first, then their class's resolved attribute table;
    /// methods found on the class are bound for the access target (see [`bind`]).
    #[must_use]
    pub fn lookup_attr(&self, target: &Value, name: &str) -> Option<Value> {
        match target {
            Value::Instance(inst) => {
                if name == "__class__" {
                    return Some(Value::Class(inst.class_id()));
                }
                if let Some(value) = inst.slot(name) {
                    return Some(value);
                }
                self.instance_attr(target, inst.class_id(), name)
            }
            // primitive text behaves as an instance of `str`
            Value::Text(_) => match name {
                "__class__" => Some(Value::Class(self.builtins.str)),
                _ => self.instance_attr(target, self.builtins.str, name),
            },
            Value::Class(class_id) => {
                let record = self.heap.class(*class_id);
                match name {
                    "__name__" => Some(Value::from(record.name())),
                    "__module__" => Some(record.module().map_or(Value::None, Value::from)),
                    _ => record
                        .attr(name)
                        .map(|attr| bind(attr.value(), BindTarget::Class(*class_id))),
                }
            }
            Value::Function(func) => match name {
                "__name__" => Some(Value::from(func.name())),
                "__module__" => Some(func.module().map_or(Value::None, Value::from)),
                _ => None,
            },
            Value::Method(desc) => match name {
                "__name__" => Some(Value::from(desc.func().name())),
                "im_func" | "__func__" => Some(Value::Function(desc.func().clone())),
                "im_self" | "__self__" => Some(desc.receiver().cloned().unwrap_or_default()),
                "im_class" => desc.owner().map(Value::Class),
                _ => None,
            },
            Value::Module(module) => module.attr(name),
            _ => None,
        }
    }

    /// A class attribute of `class_id` bound for access through `receiver`.
    fn instance_attr(&self, receiver: &Value, class_id: ClassId, name: &str) -> Option<Value> {
        let attr = self.heap.class(class_id).attr(name)?;
        Some(bind(attr.value(), BindTarget::Instance { receiver, class_id }))
    }

    /// Looks up `name` on `target`, raising `AttributeError` when it does not exist.
    pub fn getattr(&self, target: &Value, name: &str) -> RunResult<Value> {
        self.lookup_attr(target, name)
            .ok_or_else(|| self.attribute_error(target, name))
    }

    #[must_use]
    pub fn hasattr(&self, target: &Value, name: &str) -> bool {
        self.lookup_attr(target, name).is_some()
    }

    /// Assigns an attribute.
    ///
    /// On an instance this writes a slot. On a class it patches the attribute table, wrapping
    /// functions the same way the class builder does; subclasses built earlier keep the
    /// table they resolved at build time.
    pub fn setattr(&mut self, target: &Value, name: &str, value: Value) -> RunResult<()> {
        match target {
            Value::Instance(inst) => {
                inst.set_slot(name, value);
                Ok(())
            }
            Value::Class(class_id) => {
                self.heap.class_mut(*class_id).patch_attr(name, &value, *class_id);
                Ok(())
            }
            Value::Module(module) => {
                module.set_attr(name, value);
                Ok(())
            }
            _ => Err(self.attribute_error(target, name)),
        }
    }

    pub fn delattr(&mut self, target: &Value, name: &str) -> RunResult<()> {
        let removed = match target {
            Value::Instance(inst) => inst.remove_slot(name).is_some(),
            Value::Class(class_id) => self.heap.class_mut(*class_id).remove_attr(name).is_some(),
            Value::Module(module) => module.remove_attr(name).is_some(),
            _ => false,
        };
        if removed {
            Ok(())
        } else {
            Err(self.attribute_error(target, name))
        }
    }

    /// Looks up and calls a method.
    pub fn call_method(&mut self, target: &Value, name: &str, args: Vec<Value>) -> RunResult<Value> {
        let method = self.getattr(target, name)?;
        self.call(&method, args)
    }

    /// An attribute usable as an operator implementation: present, not `None`, and callable
    /// without supplying a receiver.
    pub(crate) fn dispatch_method(&self, target: &Value, name: &str) -> Option<Value> {
        match self.lookup_attr(target, name)? {
            Value::None => None,
            Value::Method(desc) if desc.is_unbound() => None,
            method => Some(method),
        }
    }

    /// Copies the bound form of every class attribute into the instance's slots.
    pub(crate) fn snapshot_bindings(&self, inst: &InstanceRef) {
        if self.binding != AttributeBinding::Snapshot {
            return;
        }
        let class_id = inst.class_id();
        let receiver = Value::Instance(inst.clone());
        for (name, attr) in self.heap.class(class_id).attrs() {
            let bound = bind(
                attr.value(),
                BindTarget::Instance {
                    receiver: &receiver,
                    class_id,
                },
            );
            inst.set_slot(name, bound);
        }
    }

    pub(crate) fn attribute_error(&self, target: &Value, name: &str) -> RunError {
        match target {
            Value::Class(class_id) => ExcType::type_object_attribute_error(self.heap.class(*class_id).name(), name),
            _ => ExcType::attribute_error(self.type_name(target), name),
        }
    }
}
