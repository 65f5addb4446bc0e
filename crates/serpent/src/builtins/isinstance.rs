//! Implementation of `isinstance()` and `issubclass()`.

use crate::{
    ExcType, Runtime,
    exception_private::RunResult,
    heap::ClassId,
    types::{list::list_items, tuple::tuple_items},
    value::Value,
};

/// The classes named by a `classinfo` argument: one class, or a tuple/list of them (nested
/// tuples allowed). `None` when the argument is neither.
fn class_targets(classinfo: &Value, out: &mut Vec<ClassId>) -> Option<()> {
    if let Value::Class(id) = classinfo {
        out.push(*id);
        return Some(());
    }
    let items = tuple_items(classinfo)
        .map(|items| items.to_vec())
        .or_else(|| list_items(classinfo))?;
    for item in &items {
        class_targets(item, out)?;
    }
    Some(())
}

impl Runtime {
    /// The class of `value`, if it has one: instances report their class and primitive text
    /// reports `str`.
    #[must_use]
    pub fn class_of(&self, value: &Value) -> Option<ClassId> {
        match value {
            Value::Instance(inst) => Some(inst.class_id()),
            Value::Text(_) => Some(self.builtins.str),
            _ => None,
        }
    }

    /// Whether `sub` is `sup` or inherits from it, walking the bases depth-first and stopping
    /// at the first match.
    #[must_use]
    pub fn class_is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        if sub == sup {
            return true;
        }
        self.heap
            .class(sub)
            .bases()
            .iter()
            .any(|base| self.class_is_subclass(*base, sup))
    }

    /// `isinstance(value, classinfo)`.
    pub fn isinstance(&self, value: &Value, classinfo: &Value) -> RunResult<bool> {
        let mut targets = Vec::new();
        if class_targets(classinfo, &mut targets).is_none() {
            return Err(ExcType::type_error(
                "isinstance() arg 2 must be a class, or tuple of classes",
            ));
        }
        let Some(class_id) = self.class_of(value) else {
            return Ok(false);
        };
        Ok(targets.into_iter().any(|target| self.class_is_subclass(class_id, target)))
    }

    /// `issubclass(cls, classinfo)`.
    pub fn issubclass(&self, cls: &Value, classinfo: &Value) -> RunResult<bool> {
        let Value::Class(class_id) = cls else {
            return Err(ExcType::type_error("issubclass() arg 1 must be a class"));
        };
        let mut targets = Vec::new();
        if class_targets(classinfo, &mut targets).is_none() {
            return Err(ExcType::type_error(
                "issubclass() arg 2 must be a class, or tuple of classes",
            ));
        }
        Ok(targets.into_iter().any(|target| self.class_is_subclass(*class_id, target)))
    }
}
