use glam::{Mat4, Quat, Vec3, Vec4Swizzles};
use treecrown_camera::{CameraError, FlyCamera};
use treecrown_common::{FillMode, LightingConfig};
use treecrown_growth::{AttractionPointManager, CrownSphere};

/// Everything a renderer needs for one frame, copied out of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub view: Mat4,
    pub proj: Mat4,
    /// Camera position in world space, for specular lighting.
    pub eye: Vec3,
    /// Model transform of the unit sphere drawn as the crown.
    pub crown: Option<Mat4>,
    /// Model transforms of the unit spheres drawn at attraction points.
    pub markers: Vec<Mat4>,
    /// Model transforms of the unit tube drawn along each branch.
    pub branches: Vec<Mat4>,
    pub fill_mode: FillMode,
    pub lighting: LightingConfig,
}

impl FrameSnapshot {
    /// Start a snapshot from the camera's current matrices. Fails when the
    /// camera has no lens yet.
    pub fn capture(camera: &FlyCamera) -> Result<Self, CameraError> {
        Ok(Self {
            view: camera.view(),
            proj: camera.proj()?,
            eye: camera.position(),
            crown: None,
            markers: Vec::new(),
            branches: Vec::new(),
            fill_mode: FillMode::default(),
            lighting: LightingConfig::default(),
        })
    }

    pub fn with_crown(mut self, crown: &CrownSphere) -> Self {
        self.crown = Some(Mat4::from_scale_rotation_translation(
            Vec3::splat(crown.radius()),
            Quat::IDENTITY,
            crown.center(),
        ));
        self
    }

    /// One marker per attraction point, each point's transform scaled down
    /// to `radius`.
    pub fn with_markers(mut self, points: &AttractionPointManager, radius: f32) -> Self {
        let scale = Mat4::from_scale(Vec3::splat(radius));
        self.markers = points.transforms().map(|t| t * scale).collect();
        self
    }

    /// One tube per `(start, end, radius)` segment.
    pub fn with_branches(
        mut self,
        segments: impl IntoIterator<Item = (Vec3, Vec3, f32)>,
    ) -> Self {
        self.branches = segments
            .into_iter()
            .map(|(start, end, radius)| tube_transform(start, end, radius))
            .collect();
        self
    }

    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    pub fn with_lighting(mut self, lighting: LightingConfig) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }

    /// Project a world-space point to normalized device coordinates.
    /// `None` for points at or behind the eye plane.
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.view_proj() * world.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        Some(clip.xyz() / clip.w)
    }

    /// Whether a world-space point falls inside the view frustum.
    pub fn is_visible(&self, world: Vec3) -> bool {
        self.project(world).is_some_and(|ndc| {
            ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0 && (0.0..=1.0).contains(&ndc.z)
        })
    }
}

/// Maps the unit tube (radius 1, running from the origin to `+Y`) onto the
/// segment from `start` to `end`.
fn tube_transform(start: Vec3, end: Vec3, radius: f32) -> Mat4 {
    let axis = end - start;
    let rotation = Quat::from_rotation_arc(Vec3::Y, axis.normalize_or(Vec3::Y));
    Mat4::from_scale_rotation_translation(
        Vec3::new(radius, axis.length(), radius),
        rotation,
        start,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;
    use treecrown_common::PointDistribution;

    fn demo_camera() -> FlyCamera {
        let mut cam = FlyCamera::with_lens(FRAC_PI_4, 640.0 / 480.0, 0.01, 100.0).unwrap();
        cam.look_at(Vec3::new(0.0, 0.0, -3.0), Vec3::ZERO, Vec3::Y)
            .unwrap();
        cam.update_view_matrix();
        cam
    }

    #[test]
    fn capture_requires_lens() {
        let cam = FlyCamera::new();
        assert!(matches!(
            FrameSnapshot::capture(&cam),
            Err(CameraError::PreconditionViolated(_))
        ));
    }

    #[test]
    fn capture_copies_camera_state() {
        let cam = demo_camera();
        let frame = FrameSnapshot::capture(&cam).unwrap();
        assert_eq!(frame.view, cam.view());
        assert_eq!(frame.proj, cam.proj().unwrap());
        assert_eq!(frame.eye, Vec3::new(0.0, 0.0, -3.0));
        assert!(frame.markers.is_empty());
        assert!(frame.crown.is_none());
    }

    #[test]
    fn crown_in_front_of_camera_is_centered() {
        let frame = FrameSnapshot::capture(&demo_camera()).unwrap();
        let ndc = frame.project(Vec3::ZERO).unwrap();
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
        assert!(frame.is_visible(Vec3::ZERO));
    }

    #[test]
    fn points_behind_eye_do_not_project() {
        let frame = FrameSnapshot::capture(&demo_camera()).unwrap();
        assert!(frame.project(Vec3::new(0.0, 0.0, -5.0)).is_none());
        assert!(!frame.is_visible(Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn markers_follow_points_and_scale() {
        let crown = CrownSphere::new(Vec3::ZERO, 1.0).unwrap();
        let mut points = AttractionPointManager::new(0.6, 0.15).unwrap();
        crown.populate(&mut points, PointDistribution::Surface, 28, 0);

        let frame = FrameSnapshot::capture(&demo_camera())
            .unwrap()
            .with_crown(&crown)
            .with_markers(&points, 0.1);

        assert_eq!(frame.markers.len(), 28);
        for (marker, point) in frame.markers.iter().zip(points.iter()) {
            assert_eq!(marker.w_axis.xyz(), point.position());
            assert!((marker.x_axis.x - 0.1).abs() < 1e-6);
        }
        assert_eq!(frame.crown, Some(Mat4::IDENTITY));
    }

    #[test]
    fn builder_sets_mode_and_branches() {
        let frame = FrameSnapshot::capture(&demo_camera())
            .unwrap()
            .with_fill_mode(FillMode::Wireframe)
            .with_branches([(Vec3::ZERO, Vec3::Y, 0.5)]);
        assert_eq!(frame.fill_mode, FillMode::Wireframe);
        assert_eq!(frame.branches.len(), 1);
        assert!(frame.branches[0].abs_diff_eq(
            Mat4::from_scale(Vec3::new(0.5, 1.0, 0.5)),
            1e-6
        ));
    }

    #[test]
    fn tube_transform_spans_segment() {
        let start = Vec3::new(1.0, 2.0, 3.0);
        let end = Vec3::new(1.0, 2.0, 5.0);
        let m = tube_transform(start, end, 0.1);
        assert!(m.transform_point3(Vec3::ZERO).abs_diff_eq(start, 1e-6));
        assert!(m.transform_point3(Vec3::Y).abs_diff_eq(end, 1e-5));
        // The rim of the unit tube lands `radius` away from the axis.
        let rim = m.transform_point3(Vec3::X);
        assert!((rim.distance(start) - 0.1).abs() < 1e-6);
        assert!((rim - start).dot(end - start).abs() < 1e-6);
    }

    #[test]
    fn tube_transform_handles_downward_branch() {
        let m = tube_transform(Vec3::Y, Vec3::ZERO, 0.2);
        assert!(m.transform_point3(Vec3::Y).abs_diff_eq(Vec3::ZERO, 1e-5));
        assert!(m.is_finite());
    }
}
