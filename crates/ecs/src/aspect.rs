use std::any::{Any, type_name};
use std::fmt;
use vesper_common::{EntityId, Transform};

/// Marker trait for data that can be attached to an entity.
pub trait Aspect: Any {}

impl Aspect for Transform {}

/// A type-erased view of an aspect handed to modules on attach and detach.
#[derive(Clone, Copy)]
pub struct AspectRef<'a> {
    entity: EntityId,
    type_name: &'static str,
    value: &'a dyn Any,
}

impl<'a> AspectRef<'a> {
    pub fn new<T: Aspect>(entity: EntityId, value: &'a T) -> Self {
        Self {
            entity,
            type_name: type_name::<T>(),
            value,
        }
    }

    pub(crate) fn erased(entity: EntityId, type_name: &'static str, value: &'a dyn Any) -> Self {
        Self {
            entity,
            type_name,
            value,
        }
    }

    /// The entity the aspect belongs to.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Fully qualified Rust type name of the aspect.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Aspect>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Aspect>(&self) -> Option<&'a T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for AspectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AspectRef")
            .field("entity", &self.entity)
            .field("type_name", &self.type_name)
            .finish()
    }
}
