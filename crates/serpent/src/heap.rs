//! The class arena.
//!
//! Every class defined in a [`Runtime`](crate::Runtime) is stored here and referenced by a
//! [`ClassId`]. Classes are never freed: the arena doubles as the registry of defined classes
//! and a `ClassId` stays valid for the lifetime of the runtime that issued it. Instances and
//! other values are reference counted and never stored here.

use std::fmt;

use crate::types::ClassRecord;

/// Index of a class in the [`Heap`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ClassId(usize);

impl ClassId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// Arena of class records plus allocation counters.
#[derive(Debug, Default)]
pub struct Heap {
    classes: Vec<ClassRecord>,
    instances_allocated: usize,
}

/// Snapshot of arena usage, see [`Runtime::heap_stats`](crate::Runtime::heap_stats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HeapStats {
    /// Number of classes defined, built-in classes included.
    pub classes: usize,
    /// Total number of resolved class attributes across all classes.
    pub class_attributes: usize,
    /// Number of instances allocated since the runtime was created.
    pub instances_allocated: usize,
}

impl Heap {
    /// Appends an empty class record and returns its id.
    ///
    /// The record is completed by the class builder once inherited attributes are merged,
    /// which needs the id to re-wrap methods for the new class.
    pub(crate) fn reserve_class(&mut self, name: &str) -> ClassId {
        let id = ClassId(self.classes.len());
        self.classes.push(ClassRecord::new(name));
        id
    }

    /// Returns the record for `id`.
    ///
    /// # Panics
    /// Panics if `id` was issued by a different runtime and is out of range.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &ClassRecord {
        &self.classes[id.0]
    }

    #[must_use]
    pub fn get_class(&self, id: ClassId) -> Option<&ClassRecord> {
        self.classes.get(id.0)
    }

    pub(crate) fn class_mut(&mut self, id: ClassId) -> &mut ClassRecord {
        &mut self.classes[id.0]
    }

    /// Finds the most recently defined class with the given name.
    #[must_use]
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.classes.iter().rposition(|cls| cls.name() == name).map(ClassId)
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassRecord)> {
        self.classes.iter().enumerate().map(|(i, cls)| (ClassId(i), cls))
    }

    pub(crate) fn note_instance(&mut self) {
        self.instances_allocated += 1;
    }

    #[must_use]
    pub fn stats(&self) -> HeapStats {
        HeapStats {
            classes: self.classes.len(),
            class_attributes: self.classes.iter().map(ClassRecord::attr_count).sum(),
            instances_allocated: self.instances_allocated,
        }
    }
}
