use vesper_common::EntityId;
use vesper_ecs::{AspectRef, Aspects, Module, Registry};

use crate::camera::Camera;

/// Remembers the first camera ever attached as the main camera.
///
/// The reference is weak: if that camera is later detached the id stays
/// recorded, and [`CameraTracker::main_camera`] simply stops resolving it.
#[derive(Debug, Default)]
pub struct CameraTracker {
    main: Option<EntityId>,
}

impl CameraTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the main camera, whether or not it is still attached.
    pub fn main(&self) -> Option<EntityId> {
        self.main
    }

    pub fn main_camera<'r>(&self, registry: &'r Registry) -> Option<(EntityId, &'r Camera)> {
        let id = self.main?;
        registry.get::<Camera>(id).map(|camera| (id, camera))
    }
}

impl Module for CameraTracker {
    fn on_attach(&mut self, aspect: AspectRef<'_>, _aspects: &Aspects) {
        if self.main.is_none() && aspect.is::<Camera>() {
            tracing::debug!(camera = %aspect.entity(), "main camera assigned");
            self.main = Some(aspect.entity());
        }
    }

    fn on_detach(&mut self, aspect: AspectRef<'_>, _aspects: &Aspects) {
        if self.main == Some(aspect.entity()) && aspect.is::<Camera>() {
            tracing::debug!(camera = %aspect.entity(), "main camera detached");
        }
    }
}
