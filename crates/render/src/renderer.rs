use crate::snapshot::FrameSnapshot;
use glam::Vec4Swizzles;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads a frame snapshot and produces output. It never mutates
/// the scene; the frame loop owns the camera and the attraction points.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, frame: &FrameSnapshot) -> Self::Output;
}

/// Text renderer for the CLI and tests.
///
/// Lists the camera, the crown and every marker with its position in world
/// space and normalized device coordinates.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &FrameSnapshot) -> String {
        let mut out = String::new();
        let visible = frame
            .markers
            .iter()
            .filter(|m| frame.is_visible(m.w_axis.xyz()))
            .count();

        out.push_str(&format!("=== Frame (fill={}) ===\n", frame.fill_mode));
        out.push_str(&format!(
            "Camera: eye=({:.2}, {:.2}, {:.2})\n",
            frame.eye.x, frame.eye.y, frame.eye.z
        ));
        match frame.crown {
            Some(crown) => {
                let c = crown.w_axis.xyz();
                out.push_str(&format!(
                    "Crown: center=({:.2}, {:.2}, {:.2}) radius={:.2}\n",
                    c.x,
                    c.y,
                    c.z,
                    crown.x_axis.xyz().length()
                ));
            }
            None => out.push_str("Crown: none\n"),
        }
        out.push_str(&format!(
            "Markers: {} ({} visible)\n",
            frame.markers.len(),
            visible
        ));
        out.push_str(&format!("Branches: {}\n", frame.branches.len()));

        for (i, marker) in frame.markers.iter().enumerate() {
            let p = marker.w_axis.xyz();
            out.push_str(&format!("  [{i:3}] pos=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
            match frame.project(p) {
                Some(ndc) => out.push_str(&format!(
                    " ndc=({:.3}, {:.3}, {:.3})\n",
                    ndc.x, ndc.y, ndc.z
                )),
                None => out.push_str(" behind camera\n"),
            }
        }

        tracing::debug!(markers = frame.markers.len(), visible, "text frame rendered");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use treecrown_camera::FlyCamera;
    use treecrown_common::FillMode;

    fn frame() -> FrameSnapshot {
        let mut cam = FlyCamera::with_lens(1.0, 1.0, 0.1, 50.0).unwrap();
        cam.set_position(Vec3::new(0.0, 0.0, -3.0));
        cam.update_view_matrix();
        FrameSnapshot::capture(&cam).unwrap()
    }

    #[test]
    fn empty_frame() {
        let output = DebugTextRenderer::new().render(&frame());
        assert!(output.contains("fill=solid"));
        assert!(output.contains("Crown: none"));
        assert!(output.contains("Markers: 0 (0 visible)"));
        assert!(output.contains("eye=(0.00, 0.00, -3.00)"));
    }

    #[test]
    fn lists_markers_with_visibility() {
        let mut frame = frame().with_fill_mode(FillMode::Wireframe);
        frame.crown = Some(Mat4::from_scale(Vec3::splat(2.0)));
        frame.markers = vec![
            Mat4::from_translation(Vec3::ZERO),
            Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)),
        ];

        let output = DebugTextRenderer::new().render(&frame);
        assert!(output.contains("fill=wireframe"));
        assert!(output.contains("radius=2.00"));
        assert!(output.contains("Markers: 2 (1 visible)"));
        assert!(output.contains("ndc="));
        assert!(output.contains("behind camera"));
    }

    #[test]
    fn one_line_per_header_and_marker() {
        let mut frame = frame();
        frame.markers = vec![Mat4::IDENTITY; 3];
        let output = DebugTextRenderer::new().render(&frame);
        assert!(output.ends_with('\n'));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5 + 3);
        assert!(lines[5].starts_with("  [  0] pos="));
        assert!(lines.iter().skip(5).all(|l| l.contains(" ndc=")));
    }
}
