use std::rc::Rc;
use vesper_common::{EntityId, Transform};
use vesper_ecs::{Registry, RegistryError};
use vesper_input::InputSource;
use vesper_render::{
    Camera, CameraSettings, CameraTracker, DrawBackend, MeshFilter, MeshResidency, Quad,
    Mesh, RenderContext, RenderError, RenderPass, RenderStats, Renderer,
};

use crate::config::{EngineConfig, SceneObject};

/// Top-level engine context.
///
/// Owns the registry (with camera tracking and mesh residency modules
/// registered), the render context and the configuration.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    registry: Registry,
    render: RenderContext,
    pass: RenderPass,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let mut registry = Registry::new();
        registry.register_module(CameraTracker::new());
        registry.register_module(MeshResidency::new());
        Self {
            config,
            registry,
            render: RenderContext::new(),
            pass: RenderPass::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn render_context(&self) -> &RenderContext {
        &self.render
    }

    /// Spawn an entity carrying `transform` and a camera built from
    /// `settings`. The camera starts at the transform's pose with the
    /// configured freelook speeds; freelook itself is only switched on for
    /// the camera that becomes main, and only if the config enables it.
    pub fn spawn_camera(
        &mut self,
        transform: Transform,
        settings: CameraSettings,
    ) -> Result<EntityId, RegistryError> {
        let id = self.registry.allocate();
        self.registry.add(id, transform)?;

        let becomes_main = self
            .registry
            .module::<CameraTracker>()
            .is_some_and(|tracker| tracker.main().is_none());

        let mut camera = Camera::new(settings);
        camera.position = transform.position;
        camera.set_orientation(transform.rotation);
        camera.freelook = self.config.freelook;
        camera.freelook.enabled = self.config.freelook.enabled && becomes_main;
        self.registry.add(id, camera)?;

        tracing::debug!(camera = %id, "spawned camera");
        Ok(id)
    }

    /// [`Engine::spawn_camera`] with the configured default settings.
    pub fn spawn_default_camera(&mut self, transform: Transform) -> Result<EntityId, RegistryError> {
        let settings = self.config.camera_settings();
        self.spawn_camera(transform, settings)
    }

    pub fn spawn_renderer(
        &mut self,
        transform: Transform,
        renderer: Renderer,
        mesh: Option<MeshFilter>,
    ) -> Result<EntityId, RegistryError> {
        let id = self.registry.allocate();
        self.registry.add(id, transform)?;
        self.registry.add(id, renderer)?;
        if let Some(mesh) = mesh {
            self.registry.add(id, mesh)?;
        }
        Ok(id)
    }

    /// Spawn every object in the configured scene, in order.
    pub fn populate(&mut self) -> Result<Vec<EntityId>, RegistryError> {
        let scene = self.config.scene.clone();
        let ids = scene
            .iter()
            .map(|object| self.spawn_object(object))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(objects = ids.len(), "scene populated");
        Ok(ids)
    }

    fn spawn_object(&mut self, object: &SceneObject) -> Result<EntityId, RegistryError> {
        let transform = Transform {
            position: object.position,
            scale: object.scale,
            ..Transform::default()
        };
        let renderer = Renderer::new(object.layers).with_color(object.color);
        let mesh = object.quad.map(|half| MeshFilter::new(Quad::new(half)));
        self.spawn_renderer(transform, renderer, mesh)
    }

    /// The first camera ever attached, if it is still attached.
    pub fn main_camera(&self) -> Option<EntityId> {
        let tracker = self.registry.module::<CameraTracker>()?;
        tracker.main_camera(&self.registry).map(|(id, _)| id)
    }

    /// The camera most recently begun, if it is still attached.
    pub fn current_camera(&self) -> Option<EntityId> {
        self.render.current_camera(&self.registry).map(|(id, _)| id)
    }

    /// Advance the clock, every attached mesh and every freelook camera by
    /// `dt` seconds.
    ///
    /// A mesh shared by several filters is updated once. The transform is
    /// the camera's pose: each camera is re-seeded from it before moving,
    /// and only a camera that actually moved writes back.
    pub fn update(&mut self, input: &mut dyn InputSource, dt: f32) {
        self.render.advance(dt);

        let mut updated: Vec<&Rc<dyn Mesh>> = Vec::new();
        for (_, filter) in self.registry.iter::<MeshFilter>() {
            let mesh = filter.shared_mesh();
            if updated.iter().any(|seen| Rc::ptr_eq(seen, mesh)) {
                continue;
            }
            mesh.update(dt);
            updated.push(mesh);
        }

        let freelook: Vec<EntityId> = self
            .registry
            .iter::<Camera>()
            .filter(|(_, camera)| camera.freelook.enabled)
            .map(|(id, _)| id)
            .collect();

        for id in freelook {
            let pose = self.registry.get::<Transform>(id).copied();
            let Some(camera) = self.registry.get_mut::<Camera>(id) else {
                continue;
            };
            if let Some(pose) = pose {
                camera.position = pose.position;
                // q and -q are the same rotation
                if camera.orientation().dot(pose.rotation).abs() < 1.0 - 1e-6 {
                    camera.set_orientation(pose.rotation);
                }
            }

            let (position, angles) = (camera.position, camera.angles);
            camera.update(input, dt);
            if camera.position == position && camera.angles == angles {
                continue;
            }
            let (position, rotation) = (camera.position, camera.orientation());

            if let Some(transform) = self.registry.get_mut::<Transform>(id) {
                transform.position = position;
                transform.rotation = rotation;
            }
        }
    }

    /// Turn freelook on or off for one camera. Returns false if `id` has no
    /// camera.
    pub fn set_freelook(&mut self, id: EntityId, enabled: bool) -> bool {
        match self.registry.get_mut::<Camera>(id) {
            Some(camera) => {
                camera.freelook.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Resize the viewport and every camera with it.
    pub fn resize(&mut self, width: f32, height: f32) {
        let ids: Vec<EntityId> = self.registry.iter::<Camera>().map(|(id, _)| id).collect();
        for id in ids {
            if let Some(camera) = self.registry.get_mut::<Camera>(id) {
                camera.resize(width, height);
            }
        }
        if width > 0.0 && height > 0.0 {
            self.config.viewport.width = width;
            self.config.viewport.height = height;
        }
    }

    /// Draw one frame through `backend`.
    pub fn render(&mut self, backend: &mut dyn DrawBackend) -> Result<RenderStats, RenderError> {
        self.pass.render(&self.registry, &mut self.render, backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
    use vesper_input::{InputState, Key};
    use std::cell::Cell;
    use vesper_render::{Bounds, DrawCommand, LayerMask, RecordingBackend};

    #[test]
    fn first_camera_is_main() {
        let mut engine = Engine::default();
        assert!(engine.main_camera().is_none());

        let a = engine.spawn_default_camera(Transform::default()).unwrap();
        engine.spawn_default_camera(Transform::default()).unwrap();
        assert_eq!(engine.main_camera(), Some(a));

        engine.registry_mut().retire(a);
        assert!(engine.main_camera().is_none());
    }

    #[test]
    fn spawned_camera_matches_transform_pose() {
        let mut engine = Engine::default();
        let transform = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(0.5),
            ..Transform::default()
        };
        let id = engine.spawn_default_camera(transform).unwrap();
        let camera = engine.registry().get::<Camera>(id).unwrap();
        assert_eq!(camera.position, transform.position);
        assert!(camera.orientation().abs_diff_eq(transform.rotation, 1e-5));
        assert!(camera.freelook.enabled);
        assert_eq!(camera.settings().width, 800.0);
    }

    #[test]
    fn current_camera_follows_render() {
        let mut engine = Engine::default();
        let cam = engine.spawn_default_camera(Transform::default()).unwrap();
        assert!(engine.current_camera().is_none());

        let mut backend = RecordingBackend::new();
        engine.render(&mut backend).unwrap();
        assert_eq!(engine.current_camera(), Some(cam));

        engine.registry_mut().remove::<Camera>(cam);
        assert!(engine.current_camera().is_none());
    }

    #[test]
    fn update_writes_pose_back() {
        let mut engine = Engine::default();
        let cam = engine.spawn_default_camera(Transform::default()).unwrap();
        let mut input = InputState::for_window(800.0, 600.0);
        input.press(Key::W);

        engine.update(&mut input, 0.1);
        let transform = engine.registry().get::<Transform>(cam).unwrap();
        assert!(transform.position.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
        assert!((engine.render_context().elapsed() - 0.1).abs() < 1e-6);

        input.release_all();
        input.set_cursor_visible(false);
        input.set_cursor(input.window_center() + Vec2::new(50.0, 0.0));
        engine.update(&mut input, 0.1);
        let camera = engine.registry().get::<Camera>(cam).unwrap();
        let transform = engine.registry().get::<Transform>(cam).unwrap();
        assert!(camera.angles.y > 0.0);
        assert!(transform.rotation.abs_diff_eq(camera.orientation(), 1e-6));
    }

    #[test]
    fn idle_update_keeps_transform_edits() {
        let mut engine = Engine::default();
        let cam = engine.spawn_default_camera(Transform::default()).unwrap();
        let moved = Transform {
            position: Vec3::new(7.0, 0.0, 0.0),
            rotation: Quat::from_rotation_y(0.4),
            ..Transform::default()
        };
        *engine.registry_mut().get_mut::<Transform>(cam).unwrap() = moved;

        let mut input = InputState::for_window(800.0, 600.0);
        engine.update(&mut input, 0.1);
        assert_eq!(*engine.registry().get::<Transform>(cam).unwrap(), moved);

        // the next move starts from the edited pose
        input.press(Key::W);
        engine.update(&mut input, 0.1);
        let transform = engine.registry().get::<Transform>(cam).unwrap();
        let forward = Mat4::from_quat(moved.rotation).transform_vector3(Vec3::NEG_Z);
        assert!(transform.position.abs_diff_eq(moved.position + forward, 1e-5));
        assert!(transform.rotation.abs_diff_eq(moved.rotation, 1e-5));
    }

    #[test]
    fn freelook_drives_only_the_main_camera() {
        let mut engine = Engine::default();
        let scene = engine.spawn_default_camera(Transform::default()).unwrap();
        let hud = engine
            .spawn_camera(Transform::default(), CameraSettings::orthographic(800.0, 600.0))
            .unwrap();
        assert!(!engine.registry().get::<Camera>(hud).unwrap().freelook.enabled);

        let mut input = InputState::for_window(800.0, 600.0);
        input.set_cursor_visible(false);
        input.press(Key::W);
        engine.update(&mut input, 0.1);
        input.set_cursor(input.window_center() + Vec2::new(50.0, 0.0));
        engine.update(&mut input, 0.1);

        let scene_cam = engine.registry().get::<Camera>(scene).unwrap();
        assert!(scene_cam.angles.y > 0.0);
        assert_ne!(engine.registry().get::<Transform>(scene).unwrap().position, Vec3::ZERO);
        assert_eq!(*engine.registry().get::<Transform>(hud).unwrap(), Transform::default());

        // opting the second camera in makes it respond too
        assert!(engine.set_freelook(hud, true));
        engine.update(&mut input, 0.1);
        assert_ne!(engine.registry().get::<Transform>(hud).unwrap().position, Vec3::ZERO);
        assert!(!engine.set_freelook(EntityId(99), true));
    }

    #[test]
    fn config_can_disable_freelook() {
        let mut config = EngineConfig::default();
        config.freelook.enabled = false;
        let mut engine = Engine::new(config);
        let cam = engine.spawn_default_camera(Transform::default()).unwrap();
        let mut input = InputState::for_window(800.0, 600.0);
        input.press(Key::W);
        engine.update(&mut input, 0.1);
        assert_eq!(engine.registry().get::<Transform>(cam).unwrap().position, Vec3::ZERO);
    }

    #[derive(Debug, Default)]
    struct Ticking {
        ticks: Cell<u32>,
    }

    impl Mesh for Ticking {
        fn emit(&self, _ctx: &mut vesper_render::MeshContext<'_>) {}

        fn bounds(&self) -> Bounds {
            Bounds::new(Vec3::ZERO, Vec3::ZERO)
        }

        fn update(&self, _dt: f32) {
            self.ticks.set(self.ticks.get() + 1);
        }
    }

    #[test]
    fn shared_mesh_updates_once_per_frame() {
        let mut engine = Engine::default();
        let ticking = Rc::new(Ticking::default());
        let shared: Rc<dyn Mesh> = ticking.clone();
        for x in [0.0, 1.0] {
            engine
                .spawn_renderer(
                    Transform::from_position(Vec3::new(x, 0.0, 0.0)),
                    Renderer::default(),
                    Some(MeshFilter::shared(Rc::clone(&shared))),
                )
                .unwrap();
        }
        let own = Rc::new(Ticking::default());
        engine
            .spawn_renderer(
                Transform::default(),
                Renderer::default(),
                Some(MeshFilter::shared(own.clone())),
            )
            .unwrap();

        let mut input = InputState::new();
        engine.update(&mut input, 0.016);
        engine.update(&mut input, 0.016);
        assert_eq!(ticking.ticks.get(), 2);
        assert_eq!(own.ticks.get(), 2);
    }

    #[test]
    fn populate_spawns_scene() {
        let mut config = EngineConfig::default();
        config.scene = vec![
            SceneObject {
                quad: Some(1.0),
                ..SceneObject::default()
            },
            SceneObject {
                position: Vec3::X,
                layers: LayerMask(0b10),
                color: Vec4::new(0.0, 1.0, 0.0, 1.0),
                ..SceneObject::default()
            },
        ];
        let mut engine = Engine::new(config);
        let ids = engine.populate().unwrap();
        assert_eq!(ids.len(), 2);
        assert!(engine.registry().has::<MeshFilter>(ids[0]));
        assert!(!engine.registry().has::<MeshFilter>(ids[1]));
        let residency = engine.registry().module::<MeshResidency>().unwrap();
        assert!(residency.is_resident(ids[0]));

        engine.spawn_default_camera(Transform::default()).unwrap();
        let mut backend = RecordingBackend::new();
        let stats = engine.render(&mut backend).unwrap();
        // default camera sees layer 0 only
        assert_eq!(stats.drawn, 1);
        assert_eq!(stats.culled, 1);
        assert_eq!(backend.count(|c| matches!(c, DrawCommand::Begin(_))), 1);
    }

    #[test]
    fn resize_reaches_every_camera() {
        let mut engine = Engine::default();
        let a = engine.spawn_default_camera(Transform::default()).unwrap();
        let b = engine
            .spawn_camera(Transform::default(), CameraSettings::orthographic(320.0, 200.0))
            .unwrap();
        engine.resize(1280.0, 720.0);
        for id in [a, b] {
            let camera = engine.registry().get::<Camera>(id).unwrap();
            assert_eq!(camera.settings().width, 1280.0);
        }
        assert_eq!(engine.config().viewport.height, 720.0);

        engine.resize(0.0, 0.0);
        assert_eq!(engine.config().viewport.width, 1280.0);
    }
}
