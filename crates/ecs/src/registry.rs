use std::any::type_name;
use std::fmt;
use vesper_common::EntityId;

use crate::aspect::{Aspect, AspectRef};
use crate::module::{Module, ModuleDispatcher};
use crate::store::Aspects;

/// Errors from registry operations. All of them are caller bugs: the
/// operation is abandoned and the registry is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("entity {0} was never allocated")]
    UnallocatedEntity(EntityId),
    #[error("entity {entity} already has a {aspect} aspect")]
    DuplicateAspect {
        entity: EntityId,
        aspect: &'static str,
    },
    #[error("entity {entity} has no {aspect} aspect")]
    MissingAspect {
        entity: EntityId,
        aspect: &'static str,
    },
}

/// Entity allocator, aspect stores and module dispatch in one owner.
///
/// Attaching an aspect type an entity already holds is rejected; use
/// [`Registry::replace`] to overwrite on purpose.
#[derive(Default)]
pub struct Registry {
    next_id: u64,
    aspects: Aspects,
    modules: ModuleDispatcher,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh id. Ids are never reused.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next_id
    }

    pub fn is_allocated(&self, id: EntityId) -> bool {
        id.0 < self.next_id
    }

    /// Whether `id` still holds any aspect.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.aspects.contains_entity(id)
    }

    pub fn register_module<M: Module>(&mut self, module: M) {
        self.modules.register(module);
    }

    pub fn module<M: Module>(&self) -> Option<&M> {
        self.modules.get::<M>()
    }

    pub fn module_mut<M: Module>(&mut self) -> Option<&mut M> {
        self.modules.get_mut::<M>()
    }

    pub fn modules(&self) -> &ModuleDispatcher {
        &self.modules
    }

    pub fn aspects(&self) -> &Aspects {
        &self.aspects
    }

    pub fn get<T: Aspect>(&self, id: EntityId) -> Option<&T> {
        self.aspects.get::<T>(id)
    }

    pub fn get_mut<T: Aspect>(&mut self, id: EntityId) -> Option<&mut T> {
        self.aspects.get_mut::<T>(id)
    }

    pub fn has<T: Aspect>(&self, id: EntityId) -> bool {
        self.aspects.has::<T>(id)
    }

    /// Every aspect of type `T`, in attach order.
    pub fn iter<T: Aspect>(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.aspects.iter::<T>()
    }

    pub fn aspect_names(&self, id: EntityId) -> Vec<&'static str> {
        self.aspects.aspect_names(id)
    }

    /// Attach `aspect` to `id`, then run reveille on every module.
    pub fn add<T: Aspect>(&mut self, id: EntityId, aspect: T) -> Result<&mut T, RegistryError> {
        self.check_vacant::<T>(id)?;
        self.aspects.store_or_insert::<T>().insert(id, aspect);
        tracing::debug!(entity = %id, aspect = type_name::<T>(), "aspect attached");
        self.notify_attach::<T>(id);
        self.aspects
            .get_mut::<T>(id)
            .ok_or(RegistryError::MissingAspect {
                entity: id,
                aspect: type_name::<T>(),
            })
    }

    /// Like [`Registry::add`], building the aspect from its owning id.
    pub fn add_with<T, F>(&mut self, id: EntityId, factory: F) -> Result<&mut T, RegistryError>
    where
        T: Aspect,
        F: FnOnce(EntityId) -> T,
    {
        self.check_vacant::<T>(id)?;
        self.add(id, factory(id))
    }

    /// Overwrite the `T` aspect of `id`.
    ///
    /// Runs taps for the previous aspect (if any) before the swap and
    /// reveille for the new one after it. The entry keeps its iteration slot.
    pub fn replace<T: Aspect>(&mut self, id: EntityId, aspect: T) -> Result<Option<T>, RegistryError> {
        self.check_allocated(id)?;
        self.notify_detach::<T>(id);
        let previous = self.aspects.store_or_insert::<T>().insert(id, aspect);
        tracing::debug!(
            entity = %id,
            aspect = type_name::<T>(),
            replaced = previous.is_some(),
            "aspect replaced"
        );
        self.notify_attach::<T>(id);
        Ok(previous)
    }

    /// Detach the `T` aspect of `id`. Returns whether one was attached.
    ///
    /// Modules hear taps only when there was something to detach.
    pub fn remove<T: Aspect>(&mut self, id: EntityId) -> bool {
        if !self.has::<T>(id) {
            tracing::trace!(entity = %id, aspect = type_name::<T>(), "nothing to remove");
            return false;
        }
        self.take::<T>(id).is_ok()
    }

    /// Detach and return the `T` aspect of `id`, failing if there is none.
    pub fn take<T: Aspect>(&mut self, id: EntityId) -> Result<T, RegistryError> {
        let missing = RegistryError::MissingAspect {
            entity: id,
            aspect: type_name::<T>(),
        };
        if !self.notify_detach::<T>(id) {
            return Err(missing);
        }
        let removed = self
            .aspects
            .store_mut::<T>()
            .and_then(|store| store.remove(id))
            .ok_or(missing)?;
        tracing::debug!(entity = %id, aspect = type_name::<T>(), "aspect detached");
        Ok(removed)
    }

    /// Detach every aspect of `id`, running taps for each one in store
    /// creation order. Returns how many were removed.
    ///
    /// The id stays allocated and is never handed out again.
    pub fn retire(&mut self, id: EntityId) -> usize {
        let mut removed = 0;
        for slot in 0..self.aspects.store_count() {
            let store = self.aspects.erased(slot);
            let Some(value) = store.get_any(id) else {
                continue;
            };
            let aspect = AspectRef::erased(id, store.type_name(), value);
            self.modules.taps(aspect, &self.aspects);
            if self.aspects.erased_mut(slot).remove_entity(id) {
                removed += 1;
            }
        }
        tracing::debug!(entity = %id, removed, "entity retired");
        removed
    }

    fn check_allocated(&self, id: EntityId) -> Result<(), RegistryError> {
        if self.is_allocated(id) {
            Ok(())
        } else {
            Err(RegistryError::UnallocatedEntity(id))
        }
    }

    fn check_vacant<T: Aspect>(&self, id: EntityId) -> Result<(), RegistryError> {
        self.check_allocated(id)?;
        if self.has::<T>(id) {
            return Err(RegistryError::DuplicateAspect {
                entity: id,
                aspect: type_name::<T>(),
            });
        }
        Ok(())
    }

    fn notify_attach<T: Aspect>(&mut self, id: EntityId) {
        if let Some(value) = self.aspects.get::<T>(id) {
            self.modules.reveille(AspectRef::new(id, value), &self.aspects);
        }
    }

    /// Returns false when there was no aspect to announce.
    fn notify_detach<T: Aspect>(&mut self, id: EntityId) -> bool {
        match self.aspects.get::<T>(id) {
            Some(value) => {
                self.modules.taps(AspectRef::new(id, value), &self.aspects);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("allocated", &self.next_id)
            .field("aspects", &self.aspects)
            .field("modules", &self.modules)
            .finish()
    }
}
