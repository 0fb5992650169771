use std::collections::BTreeSet;
use vesper_common::EntityId;
use vesper_ecs::{AspectRef, Aspects, Module};

use crate::mesh::MeshFilter;

/// Tracks which entities have geometry resident on the backend.
///
/// A mesh becomes resident when its [`MeshFilter`] is attached and is
/// released when the filter is detached. Backends that upload buffers key
/// them off this set.
#[derive(Debug, Default)]
pub struct MeshResidency {
    resident: BTreeSet<EntityId>,
    uploads: usize,
}

impl MeshResidency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_resident(&self, id: EntityId) -> bool {
        self.resident.contains(&id)
    }

    pub fn resident(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.resident.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.resident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    /// Total uploads since creation, including released meshes.
    pub fn uploads(&self) -> usize {
        self.uploads
    }
}

impl Module for MeshResidency {
    fn on_attach(&mut self, aspect: AspectRef<'_>, _aspects: &Aspects) {
        if aspect.is::<MeshFilter>() && self.resident.insert(aspect.entity()) {
            self.uploads += 1;
            tracing::debug!(entity = %aspect.entity(), "mesh resident");
        }
    }

    fn on_detach(&mut self, aspect: AspectRef<'_>, _aspects: &Aspects) {
        if aspect.is::<MeshFilter>() && self.resident.remove(&aspect.entity()) {
            tracing::debug!(entity = %aspect.entity(), "mesh released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Quad;
    use vesper_ecs::Registry;

    #[test]
    fn follows_mesh_filter_lifetime() {
        let mut registry = Registry::new();
        registry.register_module(MeshResidency::new());

        let a = registry.allocate();
        let b = registry.allocate();
        registry.add(a, MeshFilter::new(Quad::default())).unwrap();
        registry.add(b, MeshFilter::new(Quad::new(2.0))).unwrap();
        registry.add(b, vesper_common::Transform::default()).unwrap();

        let residency = registry.module::<MeshResidency>().unwrap();
        assert_eq!(residency.resident().collect::<Vec<_>>(), vec![a, b]);

        registry.retire(a);
        let residency = registry.module::<MeshResidency>().unwrap();
        assert!(!residency.is_resident(a));
        assert!(residency.is_resident(b));
        assert_eq!(residency.len(), 1);
        assert_eq!(residency.uploads(), 2);
    }

    #[test]
    fn replacing_a_filter_keeps_residency() {
        let mut registry = Registry::new();
        registry.register_module(MeshResidency::new());
        let id = registry.allocate();
        registry.add(id, MeshFilter::new(Quad::default())).unwrap();
        registry
            .replace(id, MeshFilter::new(Quad::new(3.0)))
            .unwrap();

        let residency = registry.module::<MeshResidency>().unwrap();
        assert!(residency.is_resident(id));
        assert_eq!(residency.uploads(), 2);
    }
}
