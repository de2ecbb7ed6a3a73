//! Scene configuration.
//!
//! A config file is optional. Missing sections and fields fall back to the
//! defaults below, so a file only needs to name what it changes:
//!
//! ```yaml
//! crown:
//!   distribution: volume
//!   point_count: 400
//!   radius: 2.0
//! growth:
//!   influence_distance: 0.8
//! ```

use crate::types::{FillMode, Rgba};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level scene configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub crown: CrownConfig,
    pub growth: GrowthSettings,
    pub lighting: LightingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fill_mode: FillMode,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tree Crown".into(),
            width: 640,
            height: 480,
            fill_mode: FillMode::Solid,
        }
    }
}

/// Initial camera placement and lens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub world_up: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -3.0),
            target: Vec3::ZERO,
            world_up: Vec3::Y,
            fov_y_degrees: 45.0,
            near: 0.01,
            far: 100.0,
        }
    }
}

/// Keyboard and mouse sensitivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// World units per second for walk and strafe.
    pub walk_speed: f32,
    /// Multiplier applied while Shift is held.
    pub sprint_multiplier: f32,
    /// Look rotation per pixel of mouse travel.
    pub look_degrees_per_pixel: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            sprint_multiplier: 3.0,
            look_degrees_per_pixel: 0.25,
        }
    }
}

/// How attraction points are spread over the crown sphere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointDistribution {
    /// Evenly spaced on the sphere surface.
    #[default]
    Surface,
    /// Uniformly random inside the sphere, seeded.
    Volume,
}

/// Crown volume and its attraction points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrownConfig {
    pub center: Vec3,
    pub radius: f32,
    pub point_count: usize,
    pub distribution: PointDistribution,
    pub seed: u64,
    /// Radius of the sphere drawn at each attraction point.
    pub marker_radius: f32,
}

impl Default for CrownConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 1.0,
            point_count: 28,
            distribution: PointDistribution::Surface,
            seed: 0,
            marker_radius: 0.1,
        }
    }
}

/// Space-colonization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthSettings {
    pub influence_distance: f32,
    pub kill_distance: f32,
    pub branch_length: f32,
    /// A branch with more children than this stops spawning new ones.
    pub max_children: usize,
    /// Iterations the trunk may grow straight up before giving up on
    /// reaching the crown.
    pub stall_iterations: u32,
    pub max_iterations: u32,
    /// Distance from the bottom of the crown down to the trunk base.
    pub trunk_offset: f32,
    /// Radius of the outermost branches.
    pub branch_radius: f32,
    /// Extra radius each branch has over its thickest child.
    pub branch_radius_increase: f32,
}

impl Default for GrowthSettings {
    fn default() -> Self {
        Self {
            influence_distance: 0.6,
            kill_distance: 0.15,
            branch_length: 0.1,
            max_children: 3,
            stall_iterations: 15,
            max_iterations: 500,
            trunk_offset: 0.5,
            branch_radius: 0.004,
            branch_radius_increase: 0.0025,
        }
    }
}

/// Directional light and material colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub light_direction: Vec3,
    pub diffuse_light: Rgba,
    pub diffuse_material: Rgba,
    pub ambient_light: Rgba,
    pub ambient_material: Rgba,
    pub specular_light: Rgba,
    pub specular_material: Rgba,
    pub specular_power: f32,
    pub crown_color: Rgba,
    pub marker_color: Rgba,
    pub branch_color: Rgba,
    pub clear_color: Rgba,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_direction: Vec3::new(0.0, 0.5, -0.5),
            diffuse_light: [0.8, 0.8, 0.8, 0.8],
            diffuse_material: [0.8, 0.8, 0.8, 0.8],
            ambient_light: [0.2, 0.2, 0.2, 0.2],
            ambient_material: [0.2, 0.2, 0.2, 0.2],
            specular_light: [1.0, 1.0, 1.0, 1.0],
            specular_material: [1.0, 1.0, 1.0, 1.0],
            specular_power: 10.0,
            crown_color: [0.196, 0.804, 0.196, 1.0],
            marker_color: [1.0, 1.0, 1.0, 1.0],
            branch_color: [0.545, 0.271, 0.075, 1.0],
            clear_color: [0.969, 0.745, 0.827, 1.0],
        }
    }
}

impl DemoConfig {
    /// Load a config file, picking the format from the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let config = match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&text)?,
            "json" => Self::from_json_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that no consumer could work with. Lens and distance
    /// ordering are validated again by the camera and growth crates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.crown.point_count == 0 {
            return Err(ConfigError::Invalid("crown.point_count must be > 0".into()));
        }
        let scalars = [
            ("camera.fov_y_degrees", self.camera.fov_y_degrees),
            ("camera.near", self.camera.near),
            ("camera.far", self.camera.far),
            ("controls.walk_speed", self.controls.walk_speed),
            ("controls.sprint_multiplier", self.controls.sprint_multiplier),
            ("controls.look_degrees_per_pixel", self.controls.look_degrees_per_pixel),
            ("crown.radius", self.crown.radius),
            ("crown.marker_radius", self.crown.marker_radius),
            ("growth.influence_distance", self.growth.influence_distance),
            ("growth.kill_distance", self.growth.kill_distance),
            ("growth.branch_length", self.growth.branch_length),
            ("growth.trunk_offset", self.growth.trunk_offset),
            ("growth.branch_radius", self.growth.branch_radius),
            ("growth.branch_radius_increase", self.growth.branch_radius_increase),
            ("lighting.specular_power", self.lighting.specular_power),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }
        if self.crown.radius <= 0.0 {
            return Err(ConfigError::Invalid("crown.radius must be > 0".into()));
        }
        if self.growth.branch_length <= 0.0 {
            return Err(ConfigError::Invalid("growth.branch_length must be > 0".into()));
        }
        if self.growth.branch_radius <= 0.0 || self.growth.branch_radius_increase < 0.0 {
            return Err(ConfigError::Invalid(
                "growth.branch_radius must be > 0 and growth.branch_radius_increase >= 0".into(),
            ));
        }
        let vectors = [
            ("camera.position", self.camera.position),
            ("camera.target", self.camera.target),
            ("camera.world_up", self.camera.world_up),
            ("crown.center", self.crown.center),
            ("lighting.light_direction", self.lighting.light_direction),
        ];
        for (name, v) in vectors {
            if !v.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }
        Ok(())
    }
}
