use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vesper_render::{CameraSettings, Freelook, LayerMask};

/// Errors from loading or saving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// One drawable entity to spawn at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneObject {
    pub position: Vec3,
    pub scale: Vec3,
    pub layers: LayerMask,
    pub color: Vec4,
    /// Half extent of a quad mesh. Objects without one draw as axis gizmos.
    pub quad: Option<f32>,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            layers: LayerMask::default(),
            color: Vec4::ONE,
            quad: None,
        }
    }
}

/// Engine configuration. Every field has a default, so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub viewport: Viewport,
    /// Settings for cameras spawned without explicit ones. The viewport
    /// overrides their width and height.
    pub camera: CameraSettings,
    pub freelook: Freelook,
    pub scene: Vec<SceneObject>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            camera: CameraSettings::default(),
            freelook: Freelook::with_speeds(10.0, 0.005),
            scene: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load from JSON, or YAML when the extension is `.yaml` or `.yml`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let config: Self = if is_yaml(path) {
            serde_yaml::from_reader(file)?
        } else {
            serde_json::from_reader(file)?
        };
        tracing::debug!(path = %path.display(), objects = config.scene.len(), "loaded engine config");
        Ok(config)
    }

    /// Save in the format implied by the extension, as [`EngineConfig::load`]
    /// reads it.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        if is_yaml(path) {
            serde_yaml::to_writer(file, self)?;
        } else {
            serde_json::to_writer_pretty(file, self)?;
        }
        Ok(())
    }

    /// Default camera settings sized to the viewport.
    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            width: self.viewport.width,
            height: self.viewport.height,
            ..self.camera
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesper_render::Projection;

    #[test]
    fn defaults_match_camera_defaults() {
        let config = EngineConfig::default();
        let settings = config.camera_settings();
        assert_eq!(settings.width, 800.0);
        assert_eq!(settings.near, 0.1);
        assert_eq!(settings.far, 256.0);
        assert_eq!(settings.projection, Projection::Perspective { fov_degrees: 60.0 });
        assert!(config.freelook.enabled);
        assert_eq!(config.freelook.move_speed, 10.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(
            &path,
            r#"{ "viewport": { "width": 1024 }, "camera": { "projection": { "kind": "orthographic" }, "lighting": true } }"#,
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.viewport.width, 1024.0);
        assert_eq!(config.viewport.height, 600.0);
        assert_eq!(config.camera.projection, Projection::Orthographic);
        assert!(config.camera.lighting);
        assert!(!config.camera.alpha_blend);
        assert_eq!(config.camera_settings().width, 1024.0);
    }

    #[test]
    fn yaml_is_chosen_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yml");
        std::fs::write(
            &path,
            "freelook:\n  move_speed: 4.0\nscene:\n  - position: [1.0, 2.0, 3.0]\n    layers: 2\n    quad: 0.5\n",
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.freelook.move_speed, 4.0);
        assert_eq!(config.freelook.rotate_speed, 0.005);
        assert_eq!(config.scene.len(), 1);
        assert_eq!(config.scene[0].position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.scene[0].layers, LayerMask(2));
        assert_eq!(config.scene[0].scale, Vec3::ONE);
        assert_eq!(config.scene[0].quad, Some(0.5));
    }

    #[test]
    fn save_then_load_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::default();
        config.viewport.height = 720.0;
        config.scene.push(SceneObject {
            color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            ..SceneObject::default()
        });

        for name in ["engine.json", "engine.yaml"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(EngineConfig::load(&path).unwrap(), config);
        }
    }

    #[test]
    fn load_errors_are_classified() {
        let dir = tempfile::tempdir().unwrap();
        let missing = EngineConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            EngineConfig::load(&bad).unwrap_err(),
            ConfigError::Json(_)
        ));

        let bad_yaml = dir.path().join("bad.yaml");
        std::fs::write(&bad_yaml, "viewport: [1, 2").unwrap();
        assert!(matches!(
            EngineConfig::load(&bad_yaml).unwrap_err(),
            ConfigError::Yaml(_)
        ));
    }
}
