use treecrown_camera::FlyCamera;
use treecrown_common::FillMode;

/// A high-level action produced from raw input.
///
/// The frame loop consumes actions, never raw key codes, so the desktop app
/// and scripted CLI runs drive the camera the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Move along the view direction by a distance.
    Walk(f32),
    /// Move along the right axis by a distance.
    Strafe(f32),
    /// Tilt by an angle in radians, positive looks up.
    Pitch(f32),
    /// Turn about world up by an angle in radians, positive turns right.
    Yaw(f32),
    /// Switch between solid and wireframe rendering.
    SetFillMode(FillMode),
    /// Run one growth iteration.
    GrowStep,
    /// Resample points and restart growth.
    ResetGrowth,
    /// Show or hide the inspector panel.
    ToggleInspector,
}

impl Action {
    /// Whether this action moves or turns the camera.
    pub fn is_camera(&self) -> bool {
        matches!(
            self,
            Action::Walk(_) | Action::Strafe(_) | Action::Pitch(_) | Action::Yaw(_)
        )
    }

    /// Apply a camera action. Actions for which [`Action::is_camera`] is
    /// false leave the camera alone.
    pub fn apply_to_camera(&self, camera: &mut FlyCamera) {
        match *self {
            Action::Walk(d) => camera.walk(d),
            Action::Strafe(d) => camera.strafe(d),
            Action::Pitch(a) => camera.pitch(a),
            Action::Yaw(a) => camera.rotate_y(a),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn walk_moves_camera_forward() {
        let mut cam = FlyCamera::new();
        Action::Walk(2.0).apply_to_camera(&mut cam);
        assert_eq!(cam.position(), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn strafe_moves_camera_right() {
        let mut cam = FlyCamera::new();
        Action::Strafe(-1.0).apply_to_camera(&mut cam);
        assert_eq!(cam.position(), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn rotations_mark_camera_dirty() {
        let mut cam = FlyCamera::new();
        for action in [Action::Yaw(0.1), Action::Pitch(0.1)] {
            assert!(action.is_camera());
            action.apply_to_camera(&mut cam);
        }
        assert!(cam.is_dirty());
    }

    #[test]
    fn scene_actions_leave_camera_alone() {
        let mut cam = FlyCamera::new();
        for action in [
            Action::GrowStep,
            Action::ResetGrowth,
            Action::ToggleInspector,
            Action::SetFillMode(FillMode::Wireframe),
        ] {
            assert!(!action.is_camera());
            action.apply_to_camera(&mut cam);
        }
        assert!(!cam.is_dirty());
    }
}
