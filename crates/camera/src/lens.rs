use crate::CameraError;
use glam::Mat4;
use std::f32::consts::PI;

/// Perspective frustum parameters and the window extents derived from them.
///
/// Only constructible through [`Lens::new`], so every `Lens` describes a
/// non-degenerate frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
    near_window_height: f32,
    far_window_height: f32,
}

impl Lens {
    /// Vertical field of view in radians, width/height aspect, and clip
    /// distances. Requires `0 < fov_y < π`, `aspect > 0`, `0 < near < far`.
    pub fn new(fov_y: f32, aspect: f32, near: f32, far: f32) -> Result<Self, CameraError> {
        if !fov_y.is_finite() || fov_y <= 0.0 || fov_y >= PI {
            return Err(CameraError::InvalidArgument(format!(
                "fov_y must be in (0, pi) radians, got {fov_y}"
            )));
        }
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(CameraError::InvalidArgument(format!(
                "aspect must be positive, got {aspect}"
            )));
        }
        if !near.is_finite() || !far.is_finite() || near <= 0.0 || near >= far {
            return Err(CameraError::InvalidArgument(format!(
                "clip planes must satisfy 0 < near < far, got near={near} far={far}"
            )));
        }

        let half_tan = (0.5 * fov_y).tan();
        Ok(Self {
            fov_y,
            aspect,
            near,
            far,
            near_window_height: 2.0 * near * half_tan,
            far_window_height: 2.0 * far * half_tan,
        })
    }

    /// Same frustum with a different aspect ratio (window resize).
    pub fn with_aspect(&self, aspect: f32) -> Result<Self, CameraError> {
        Self::new(self.fov_y, aspect, self.near, self.far)
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Horizontal field of view in radians.
    pub fn fov_x(&self) -> f32 {
        let half_width = 0.5 * self.near_window_width();
        2.0 * (half_width / self.near).atan()
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn near_window_width(&self) -> f32 {
        self.aspect * self.near_window_height
    }

    pub fn near_window_height(&self) -> f32 {
        self.near_window_height
    }

    pub fn far_window_width(&self) -> f32 {
        self.aspect * self.far_window_height
    }

    pub fn far_window_height(&self) -> f32 {
        self.far_window_height
    }

    /// Left-handed perspective projection mapping view depth `near..far` to
    /// NDC depth `0..1`.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const EPS: f32 = 1e-5;

    #[test]
    fn window_extents() {
        let lens = Lens::new(PI / 2.0, 2.0, 1.0, 10.0).unwrap();
        // tan(45deg) == 1, so height == 2 * distance
        assert!((lens.near_window_height() - 2.0).abs() < EPS);
        assert!((lens.far_window_height() - 20.0).abs() < EPS);
        assert!((lens.near_window_width() - 4.0).abs() < EPS);
        assert!((lens.far_window_width() - 40.0).abs() < EPS);
    }

    #[test]
    fn fov_x_equals_fov_y_for_square_aspect() {
        let lens = Lens::new(0.8, 1.0, 0.1, 100.0).unwrap();
        assert!((lens.fov_x() - 0.8).abs() < EPS);
    }

    #[test]
    fn fov_x_widens_with_aspect() {
        let lens = Lens::new(PI / 2.0, 2.0, 0.1, 100.0).unwrap();
        assert!((lens.fov_x() - 2.0 * 2.0_f32.atan()).abs() < EPS);
    }

    #[test]
    fn rejects_bad_clip_planes() {
        assert!(matches!(
            Lens::new(1.0, 1.0, 0.0, 10.0),
            Err(CameraError::InvalidArgument(_))
        ));
        assert!(Lens::new(1.0, 1.0, -1.0, 10.0).is_err());
        assert!(Lens::new(1.0, 1.0, 10.0, 10.0).is_err());
        assert!(Lens::new(1.0, 1.0, 10.0, 1.0).is_err());
        assert!(Lens::new(1.0, 1.0, 1.0, f32::INFINITY).is_err());
    }

    #[test]
    fn rejects_bad_fov_and_aspect() {
        assert!(Lens::new(0.0, 1.0, 1.0, 10.0).is_err());
        assert!(Lens::new(PI, 1.0, 1.0, 10.0).is_err());
        assert!(Lens::new(f32::NAN, 1.0, 1.0, 10.0).is_err());
        assert!(Lens::new(1.0, 0.0, 1.0, 10.0).is_err());
        assert!(Lens::new(1.0, -1.5, 1.0, 10.0).is_err());
    }

    #[test]
    fn projection_depth_range_is_zero_to_one() {
        let lens = Lens::new(PI / 4.0, 4.0 / 3.0, 0.5, 50.0).unwrap();
        let proj = lens.projection();

        let near = proj * Vec4::new(0.0, 0.0, 0.5, 1.0);
        assert!((near.z / near.w).abs() < EPS);

        let far = proj * Vec4::new(0.0, 0.0, 50.0, 1.0);
        assert!((far.z / far.w - 1.0).abs() < EPS);
    }

    #[test]
    fn with_aspect_keeps_other_parameters() {
        let lens = Lens::new(1.0, 1.0, 0.1, 10.0).unwrap();
        let wide = lens.with_aspect(16.0 / 9.0).unwrap();
        assert_eq!(wide.fov_y(), 1.0);
        assert_eq!(wide.near(), 0.1);
        assert_eq!(wide.far(), 10.0);
        assert!((wide.aspect() - 16.0 / 9.0).abs() < EPS);
        assert!(lens.with_aspect(0.0).is_err());
    }
}
