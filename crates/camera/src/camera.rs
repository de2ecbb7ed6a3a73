use crate::CameraError;
use crate::lens::Lens;
use glam::{Mat4, Quat, Vec3, Vec4};

/// Smallest squared length accepted for a direction built from user input.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// First-person fly camera.
///
/// Movement and rotation commands mutate the basis and position directly and
/// mark the view dirty. [`FlyCamera::update_view_matrix`] re-orthonormalizes
/// the basis once for the whole batch of commands and caches the view matrix.
/// [`FlyCamera::view`] is always current: while dirty it derives the matrix
/// from an orthonormalized copy without touching the stored basis.
///
/// Camera motion is driven by the frame loop and never by the growth data.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    position: Vec3,
    right: Vec3,
    up: Vec3,
    look: Vec3,
    lens: Option<Lens>,
    view: Mat4,
    proj: Mat4,
    dirty: bool,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FlyCamera {
    /// Camera at the origin looking down `+Z` with `+Y` up. No lens yet.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            right: Vec3::X,
            up: Vec3::Y,
            look: Vec3::Z,
            lens: None,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            dirty: false,
        }
    }

    /// Camera with a lens already set.
    pub fn with_lens(fov_y: f32, aspect: f32, near: f32, far: f32) -> Result<Self, CameraError> {
        let mut camera = Self::new();
        camera.set_lens(fov_y, aspect, near, far)?;
        Ok(camera)
    }

    // ===== POSITION AND BASIS =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Overwrite the eye position. Accepts a `Vec3`, `[f32; 3]` or `(x, y, z)`.
    /// The basis is left untouched.
    pub fn set_position(&mut self, position: impl Into<Vec3>) {
        self.position = position.into();
        self.dirty = true;
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn look(&self) -> Vec3 {
        self.look
    }

    /// True when commands were applied since the last `update_view_matrix`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Largest deviation of the stored basis from orthonormal: the maximum of
    /// `| |v| - 1 |` over the three axes and `|a . b|` over the three pairs.
    pub fn orthonormality_error(&self) -> f32 {
        let (r, u, l) = (self.right, self.up, self.look);
        [
            (r.length() - 1.0).abs(),
            (u.length() - 1.0).abs(),
            (l.length() - 1.0).abs(),
            r.dot(u).abs(),
            r.dot(l).abs(),
            u.dot(l).abs(),
        ]
        .into_iter()
        .fold(0.0, f32::max)
    }

    // ===== LENS =====

    /// The lens, if one has been set.
    pub fn lens(&self) -> Option<&Lens> {
        self.lens.as_ref()
    }

    /// Configure the perspective frustum and cache its projection.
    ///
    /// On error the previous lens and projection are kept.
    pub fn set_lens(
        &mut self,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Result<(), CameraError> {
        let lens = Lens::new(fov_y, aspect, near, far)?;
        self.proj = lens.projection();
        self.lens = Some(lens);
        tracing::debug!(fov_y, aspect, near, far, "camera lens set");
        Ok(())
    }

    /// Re-issue the current lens with a new aspect ratio.
    pub fn set_aspect(&mut self, aspect: f32) -> Result<(), CameraError> {
        let lens = self
            .lens
            .ok_or(CameraError::PreconditionViolated("set_aspect called before set_lens"))?;
        self.set_lens(lens.fov_y(), aspect, lens.near(), lens.far())
    }

    // ===== ORIENTATION =====

    /// Place the camera at `eye` looking toward `target`.
    ///
    /// Fails when `target == eye` or `world_up` is zero or parallel to the
    /// view direction; the camera is left unchanged in that case.
    pub fn look_at(
        &mut self,
        eye: impl Into<Vec3>,
        target: impl Into<Vec3>,
        world_up: impl Into<Vec3>,
    ) -> Result<(), CameraError> {
        let (eye, target, world_up) = (eye.into(), target.into(), world_up.into());
        if !(eye.is_finite() && target.is_finite() && world_up.is_finite()) {
            return Err(CameraError::InvalidArgument(
                "look_at arguments must be finite".into(),
            ));
        }

        let to_target = target - eye;
        if to_target.length_squared() < DEGENERATE_EPSILON {
            return Err(CameraError::InvalidArgument(format!(
                "look_at target {target} coincides with eye {eye}"
            )));
        }
        let look = to_target.normalize();

        let right = world_up.cross(look);
        if right.length_squared() < DEGENERATE_EPSILON {
            return Err(CameraError::InvalidArgument(format!(
                "world up {world_up} is zero or parallel to the view direction {look}"
            )));
        }
        let right = right.normalize();
        let up = look.cross(right);

        self.position = eye;
        self.right = right;
        self.up = up;
        self.look = look;
        self.dirty = true;
        tracing::debug!(%eye, %target, "camera look_at");
        Ok(())
    }

    /// Move along the right axis. Negative distances move left.
    pub fn strafe(&mut self, distance: f32) {
        if !distance.is_finite() {
            tracing::warn!(distance, "ignoring non-finite strafe");
            return;
        }
        self.position += self.right * distance;
        self.dirty = true;
    }

    /// Move along the look axis. Negative distances move backward.
    pub fn walk(&mut self, distance: f32) {
        if !distance.is_finite() {
            tracing::warn!(distance, "ignoring non-finite walk");
            return;
        }
        self.position += self.look * distance;
        self.dirty = true;
    }

    /// Rotate `up` and `look` about the camera's right axis.
    /// Positive angles (radians) tilt the view upward.
    pub fn pitch(&mut self, angle: f32) {
        if !angle.is_finite() {
            tracing::warn!(angle, "ignoring non-finite pitch");
            return;
        }
        // A right-handed turn about `right` tilts `look` down, hence the negation.
        let rotation = Quat::from_axis_angle(self.right.normalize(), -angle);
        self.up = rotation * self.up;
        self.look = rotation * self.look;
        self.dirty = true;
    }

    /// Rotate the whole basis about the world `+Y` axis.
    /// Positive angles (radians) turn right, from `+Z` toward `+X`.
    pub fn rotate_y(&mut self, angle: f32) {
        if !angle.is_finite() {
            tracing::warn!(angle, "ignoring non-finite yaw");
            return;
        }
        let rotation = Quat::from_rotation_y(angle);
        self.right = rotation * self.right;
        self.up = rotation * self.up;
        self.look = rotation * self.look;
        self.dirty = true;
    }

    // ===== MATRICES =====

    /// Re-orthonormalize the basis and rebuild the cached view matrix.
    /// Call once per frame after the frame's movement commands.
    pub fn update_view_matrix(&mut self) {
        let (right, up, look) = orthonormalize(self.right, self.look);
        self.right = right;
        self.up = up;
        self.look = look;
        self.view = look_to_view(self.position, right, up, look);
        self.dirty = false;
    }

    /// World-to-view transform.
    pub fn view(&self) -> Mat4 {
        if self.dirty {
            let (right, up, look) = orthonormalize(self.right, self.look);
            look_to_view(self.position, right, up, look)
        } else {
            self.view
        }
    }

    /// View-to-clip transform. Fails until a lens has been set.
    pub fn proj(&self) -> Result<Mat4, CameraError> {
        if self.lens.is_none() {
            return Err(CameraError::PreconditionViolated(
                "projection read before set_lens",
            ));
        }
        Ok(self.proj)
    }

    /// World-to-clip transform, `proj * view`.
    pub fn view_proj(&self) -> Result<Mat4, CameraError> {
        Ok(self.proj()? * self.view())
    }
}

/// Gram-Schmidt with `look` as the fixed axis. The old `up` is discarded and
/// rebuilt from `look` and `right`.
fn orthonormalize(right: Vec3, look: Vec3) -> (Vec3, Vec3, Vec3) {
    let look = look.normalize();
    let up = look.cross(right).normalize();
    let right = up.cross(look);
    (right, up, look)
}

/// Inverse of the camera's world transform: rows are the basis vectors, the
/// translation is the eye projected onto each axis.
fn look_to_view(position: Vec3, right: Vec3, up: Vec3, look: Vec3) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(right.x, up.x, look.x, 0.0),
        Vec4::new(right.y, up.y, look.y, 0.0),
        Vec4::new(right.z, up.z, look.z, 0.0),
        Vec4::new(
            -position.dot(right),
            -position.dot(up),
            -position.dot(look),
            1.0,
        ),
    )
}
