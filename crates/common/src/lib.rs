//! Shared types and scene configuration.
//!
//! # Invariants
//! - Configuration is plain data; each consuming crate validates what it owns.
//! - Every section has a default that reproduces the stock demo scene (640x480 window, 28 points).

pub mod config;
mod types;

pub use config::{
    CameraConfig, ConfigError, ControlsConfig, CrownConfig, DemoConfig, GrowthSettings,
    LightingConfig, PointDistribution, WindowConfig,
};
pub use types::{FillMode, Rgba};
