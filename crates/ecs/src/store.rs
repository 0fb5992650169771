use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use vesper_common::EntityId;

use crate::aspect::Aspect;

/// Storage for every aspect of one type, keyed by entity.
///
/// Lookups go through a hash index. Entries are kept densely in attach order,
/// which is the order iteration yields them in. Removal shifts the entries
/// after the removed one down and re-indexes them, so it costs O(n) in the
/// store's length; retiring k entities from a store of n is O(k·n).
pub struct AspectStore<T> {
    index: HashMap<EntityId, usize>,
    entries: Vec<(EntityId, T)>,
}

impl<T> Default for AspectStore<T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<T> AspectStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        let slot = *self.index.get(&id)?;
        Some(&self.entries[slot].1)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let slot = *self.index.get(&id)?;
        Some(&mut self.entries[slot].1)
    }

    /// Insert or overwrite the value for `id`, returning the previous value.
    ///
    /// An overwrite keeps the entry's position in iteration order. Attach
    /// policy (reject vs. replace) is enforced by the registry, not here.
    pub fn insert(&mut self, id: EntityId, value: T) -> Option<T> {
        if let Some(&slot) = self.index.get(&id) {
            return Some(std::mem::replace(&mut self.entries[slot].1, value));
        }
        self.index.insert(id, self.entries.len());
        self.entries.push((id, value));
        None
    }

    /// Remove the value for `id`, keeping the others in attach order.
    /// O(n): every later entry moves down one slot.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let slot = self.index.remove(&id)?;
        let (_, value) = self.entries.remove(slot);
        for (offset, (moved, _)) in self.entries[slot..].iter().enumerate() {
            self.index.insert(*moved, slot + offset);
        }
        Some(value)
    }

    /// Iterate entries in attach order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.entries.iter_mut().map(|(id, value)| (*id, value))
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}

impl<T> fmt::Debug for AspectStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AspectStore")
            .field("aspect", &type_name::<T>())
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Object-safe face of an [`AspectStore`], used where the aspect type is not
/// known statically (retiring entities, tooling).
pub(crate) trait ErasedStore {
    fn type_name(&self) -> &'static str;
    fn len(&self) -> usize;
    fn contains(&self, id: EntityId) -> bool;
    fn get_any(&self, id: EntityId) -> Option<&dyn Any>;
    fn remove_entity(&mut self, id: EntityId) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Aspect> ErasedStore for AspectStore<T> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn len(&self) -> usize {
        AspectStore::len(self)
    }

    fn contains(&self, id: EntityId) -> bool {
        AspectStore::contains(self, id)
    }

    fn get_any(&self, id: EntityId) -> Option<&dyn Any> {
        self.get(id).map(|value| value as &dyn Any)
    }

    fn remove_entity(&mut self, id: EntityId) -> bool {
        self.remove(id).is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Aspect count for one store, for tooling output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    pub aspect: &'static str,
    pub len: usize,
}

/// Every aspect store, indexed by aspect type.
///
/// Stores are created lazily on the first insert of their type and are kept
/// in creation order.
#[derive(Default)]
pub struct Aspects {
    slots: HashMap<TypeId, usize>,
    stores: Vec<Box<dyn ErasedStore>>,
}

impl Aspects {
    pub fn new() -> Self {
        Self::default()
    }

    /// The typed store for `T`, if any aspect of that type was ever attached.
    pub fn store<T: Aspect>(&self) -> Option<&AspectStore<T>> {
        let slot = *self.slots.get(&TypeId::of::<T>())?;
        self.stores[slot].as_any().downcast_ref::<AspectStore<T>>()
    }

    pub(crate) fn store_mut<T: Aspect>(&mut self) -> Option<&mut AspectStore<T>> {
        let slot = *self.slots.get(&TypeId::of::<T>())?;
        self.stores[slot].as_any_mut().downcast_mut::<AspectStore<T>>()
    }

    pub(crate) fn store_or_insert<T: Aspect>(&mut self) -> &mut AspectStore<T> {
        let slot = match self.slots.get(&TypeId::of::<T>()) {
            Some(&slot) => slot,
            None => {
                let slot = self.stores.len();
                self.stores.push(Box::new(AspectStore::<T>::new()));
                self.slots.insert(TypeId::of::<T>(), slot);
                tracing::debug!(aspect = type_name::<T>(), "created aspect store");
                slot
            }
        };
        match self.stores[slot].as_any_mut().downcast_mut::<AspectStore<T>>() {
            Some(store) => store,
            None => unreachable!("store slot for {} holds another type", type_name::<T>()),
        }
    }

    pub(crate) fn store_count(&self) -> usize {
        self.stores.len()
    }

    pub(crate) fn erased(&self, slot: usize) -> &dyn ErasedStore {
        self.stores[slot].as_ref()
    }

    pub(crate) fn erased_mut(&mut self, slot: usize) -> &mut dyn ErasedStore {
        self.stores[slot].as_mut()
    }

    pub fn get<T: Aspect>(&self, id: EntityId) -> Option<&T> {
        self.store::<T>()?.get(id)
    }

    pub fn get_mut<T: Aspect>(&mut self, id: EntityId) -> Option<&mut T> {
        self.store_mut::<T>()?.get_mut(id)
    }

    pub fn has<T: Aspect>(&self, id: EntityId) -> bool {
        self.store::<T>().is_some_and(|store| store.contains(id))
    }

    /// Iterate every aspect of type `T` in attach order.
    pub fn iter<T: Aspect>(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.store::<T>().into_iter().flat_map(|store| store.iter())
    }

    /// Whether `id` holds at least one aspect of any type.
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.stores.iter().any(|store| store.contains(id))
    }

    /// Type names of every aspect attached to `id`, in store creation order.
    pub fn aspect_names(&self, id: EntityId) -> Vec<&'static str> {
        self.stores
            .iter()
            .filter(|store| store.contains(id))
            .map(|store| store.type_name())
            .collect()
    }

    pub fn summaries(&self) -> Vec<StoreSummary> {
        self.stores
            .iter()
            .map(|store| StoreSummary {
                aspect: store.type_name(),
                len: store.len(),
            })
            .collect()
    }
}

impl fmt::Debug for Aspects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.summaries()).finish()
    }
}
