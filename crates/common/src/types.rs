use serde::{Deserialize, Serialize};

/// Linear RGBA color.
pub type Rgba = [f32; 4];

/// Rasterization mode for the crown and marker meshes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    #[default]
    Solid,
    Wireframe,
}

impl FillMode {
    pub fn label(self) -> &'static str {
        match self {
            FillMode::Solid => "solid",
            FillMode::Wireframe => "wireframe",
        }
    }
}

impl std::fmt::Display for FillMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
