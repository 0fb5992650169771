use std::fmt;
use vesper_common::{EntityId, Transform};
use vesper_ecs::{Registry, StoreSummary};
use vesper_kernel::Engine;
use vesper_render::{Camera, CameraTracker, MeshResidency};

/// Registry inspector for developer tooling.
///
/// Provides read-only queries against the registry for debugging and
/// command-line output.
pub struct RegistryInspector;

impl RegistryInspector {
    /// Produce a summary of the registry state.
    pub fn summary(registry: &Registry) -> RegistrySummary {
        RegistrySummary {
            allocated: registry.allocated(),
            modules: registry.modules().len(),
            stores: registry.aspects().summaries(),
            main_camera: registry.module::<CameraTracker>().and_then(|t| t.main()),
            resident_meshes: registry
                .module::<MeshResidency>()
                .map_or(0, |residency| residency.len()),
        }
    }

    /// Summary plus the engine's current camera.
    pub fn engine_summary(engine: &Engine) -> (RegistrySummary, Option<EntityId>) {
        (Self::summary(engine.registry()), engine.current_camera())
    }

    /// Everything attached to one entity, or `None` if it holds no aspects.
    pub fn inspect_entity(registry: &Registry, id: EntityId) -> Option<EntityInfo> {
        if !registry.is_alive(id) {
            return None;
        }
        let transform = registry.get::<Transform>(id).map(|t| {
            let p = t.position;
            let s = t.scale;
            ([p.x, p.y, p.z], [s.x, s.y, s.z])
        });
        let camera = registry.get::<Camera>(id).map(CameraInfo::from_camera);
        Some(EntityInfo {
            id,
            aspects: registry
                .aspect_names(id)
                .into_iter()
                .map(short_name)
                .collect(),
            position: transform.map(|(p, _)| p),
            scale: transform.map(|(_, s)| s),
            camera,
        })
    }

    /// Every live entity, in allocation order.
    pub fn list_entities(registry: &Registry) -> Vec<EntityId> {
        (0..registry.allocated())
            .map(EntityId)
            .filter(|&id| registry.is_alive(id))
            .collect()
    }
}

/// `vesper_render::camera::Camera` -> `Camera`.
fn short_name(name: &'static str) -> &'static str {
    name.rsplit("::").next().unwrap_or(name)
}

/// Summary of registry state for the inspector.
#[derive(Debug, Clone)]
pub struct RegistrySummary {
    pub allocated: u64,
    pub modules: usize,
    pub stores: Vec<StoreSummary>,
    pub main_camera: Option<EntityId>,
    pub resident_meshes: usize,
}

impl RegistrySummary {
    pub fn aspect_count(&self) -> usize {
        self.stores.iter().map(|store| store.len).sum()
    }
}

impl fmt::Display for RegistrySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Registry: entities={} aspects={} modules={} resident_meshes={}",
            self.allocated,
            self.aspect_count(),
            self.modules,
            self.resident_meshes
        )?;
        match self.main_camera {
            Some(id) => write!(f, " main_camera={id}")?,
            None => write!(f, " main_camera=none")?,
        }
        for store in &self.stores {
            write!(f, "\n  {}: {}", short_name(store.aspect), store.len)?;
        }
        Ok(())
    }
}

/// Camera parameters worth printing.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraInfo {
    pub orthographic: bool,
    pub viewport: [f32; 2],
    pub layers: u32,
    pub lighting: bool,
    pub alpha_blend: bool,
}

impl CameraInfo {
    fn from_camera(camera: &Camera) -> Self {
        let settings = camera.settings();
        Self {
            orthographic: camera.is_orthographic(),
            viewport: [settings.width, settings.height],
            layers: camera.layers().0,
            lighting: camera.uses_lighting(),
            alpha_blend: camera.uses_alpha_blend(),
        }
    }
}

/// Detailed info about a single entity.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub id: EntityId,
    pub aspects: Vec<&'static str>,
    pub position: Option<[f32; 3]>,
    pub scale: Option<[f32; 3]>,
    pub camera: Option<CameraInfo>,
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity {} [{}]", self.id, self.aspects.join(", "))?;
        if let Some(p) = self.position {
            write!(f, " pos=({:.2}, {:.2}, {:.2})", p[0], p[1], p[2])?;
        }
        if let Some(s) = self.scale {
            write!(f, " scale=({:.2}, {:.2}, {:.2})", s[0], s[1], s[2])?;
        }
        if let Some(camera) = &self.camera {
            write!(
                f,
                " {} {}x{} layers={:#b}",
                if camera.orthographic { "ortho" } else { "persp" },
                camera.viewport[0],
                camera.viewport[1],
                camera.layers
            )?;
        }
        Ok(())
    }
}
