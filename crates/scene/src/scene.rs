use crate::SceneError;
use treecrown_camera::FlyCamera;
use treecrown_common::{DemoConfig, FillMode};
use treecrown_growth::{AttractionPointManager, CrownSphere, GrowthStep, TreeGrower};
use treecrown_input::Action;
use treecrown_render::FrameSnapshot;

/// Camera, crown and growth state, mutated only through actions.
#[derive(Debug, Clone)]
pub struct Scene {
    config: DemoConfig,
    camera: FlyCamera,
    crown: CrownSphere,
    points: AttractionPointManager,
    grower: TreeGrower,
    fill_mode: FillMode,
    last_frame: Option<FrameSnapshot>,
}

impl Scene {
    /// Build the scene described by `config`, with the lens aspect taken from
    /// the configured window size.
    pub fn new(config: DemoConfig) -> Result<Self, SceneError> {
        config.validate()?;

        let mut camera = FlyCamera::new();
        let cam = &config.camera;
        let aspect = config.window.width as f32 / config.window.height as f32;
        camera.set_lens(cam.fov_y_degrees.to_radians(), aspect, cam.near, cam.far)?;
        camera.look_at(cam.position, cam.target, cam.world_up)?;
        camera.update_view_matrix();

        let crown = CrownSphere::from_config(&config.crown)?;
        let mut points = AttractionPointManager::from_settings(&config.growth)?;
        crown.populate(
            &mut points,
            config.crown.distribution,
            config.crown.point_count,
            config.crown.seed,
        );
        let grower = TreeGrower::for_crown(&crown, &config.growth)?;

        Ok(Self {
            fill_mode: config.window.fill_mode,
            config,
            camera,
            crown,
            points,
            grower,
            last_frame: None,
        })
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    /// Direct camera access. A camera swapped in without a lens makes
    /// [`Scene::frame`] fall back to the last captured matrices.
    pub fn camera_mut(&mut self) -> &mut FlyCamera {
        &mut self.camera
    }

    pub fn crown(&self) -> &CrownSphere {
        &self.crown
    }

    pub fn points(&self) -> &AttractionPointManager {
        &self.points
    }

    pub fn grower(&self) -> &TreeGrower {
        &self.grower
    }

    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    pub fn set_fill_mode(&mut self, fill_mode: FillMode) {
        if self.fill_mode != fill_mode {
            tracing::info!(%fill_mode, "fill mode changed");
        }
        self.fill_mode = fill_mode;
    }

    /// Follow a window resize. Zero-sized windows (minimized) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SceneError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.camera.set_aspect(width as f32 / height as f32)?;
        Ok(())
    }

    /// Apply one action. Returns `false` for actions the scene does not
    /// handle, such as toggling UI panels.
    pub fn apply(&mut self, action: Action) -> bool {
        if action.is_camera() {
            action.apply_to_camera(&mut self.camera);
            return true;
        }
        match action {
            Action::SetFillMode(mode) => self.set_fill_mode(mode),
            Action::GrowStep => {
                self.grow_step();
            }
            Action::ResetGrowth => self.reset_growth(),
            _ => return false,
        }
        true
    }

    /// Run one growth iteration.
    pub fn grow_step(&mut self) -> GrowthStep {
        let step = self.grower.step(&mut self.points);
        tracing::debug!(
            ?step,
            branches = self.grower.branches().len(),
            points = self.points.len(),
            "grow step"
        );
        step
    }

    /// Resample the crown and restart the tree from its trunk.
    pub fn reset_growth(&mut self) {
        let crown = &self.config.crown;
        self.crown.populate(
            &mut self.points,
            crown.distribution,
            crown.point_count,
            crown.seed,
        );
        self.grower.reset();
        tracing::info!("growth reset");
    }

    /// Update the view matrix and capture this frame.
    ///
    /// If the camera cannot produce matrices, the last valid ones are reused
    /// with the current scene contents. `None` only when no frame has ever
    /// been captured.
    pub fn frame(&mut self) -> Option<&FrameSnapshot> {
        self.camera.update_view_matrix();
        let base = match FrameSnapshot::capture(&self.camera) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("frame capture failed, keeping last matrices: {e}");
                self.last_frame.take()?
            }
        };
        let frame = base
            .with_crown(&self.crown)
            .with_markers(&self.points, self.config.crown.marker_radius)
            .with_branches(self.grower.segments())
            .with_fill_mode(self.fill_mode)
            .with_lighting(self.config.lighting.clone());
        self.last_frame = Some(frame);
        self.last_frame.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn scene() -> Scene {
        Scene::new(DemoConfig::default()).unwrap()
    }

    #[test]
    fn default_scene_matches_demo() {
        let scene = scene();
        assert_eq!(scene.points().len(), 28);
        assert_eq!(scene.camera().position(), Vec3::new(0.0, 0.0, -3.0));
        assert!((scene.camera().look() - Vec3::Z).length() < 1e-6);
        let lens = scene.camera().lens().unwrap();
        assert!((lens.aspect() - 640.0 / 480.0).abs() < 1e-6);
        assert_eq!(scene.grower().branches().len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = DemoConfig::default();
        config.camera.near = 0.0;
        assert!(matches!(Scene::new(config), Err(SceneError::Camera(_))));

        let mut config = DemoConfig::default();
        config.growth.kill_distance = 1.0;
        assert!(matches!(Scene::new(config), Err(SceneError::Growth(_))));

        let mut config = DemoConfig::default();
        config.window.width = 0;
        assert!(matches!(Scene::new(config), Err(SceneError::Config(_))));
    }

    #[test]
    fn camera_actions_move_camera() {
        let mut scene = scene();
        assert!(scene.apply(Action::Walk(1.0)));
        assert!(scene.apply(Action::Strafe(0.5)));
        let frame = scene.frame().unwrap();
        assert!((frame.eye - Vec3::new(0.5, 0.0, -2.0)).length() < 1e-6);
    }

    #[test]
    fn toggle_inspector_is_not_handled() {
        let mut scene = scene();
        assert!(!scene.apply(Action::ToggleInspector));
    }

    #[test]
    fn fill_mode_action() {
        let mut scene = scene();
        assert!(scene.apply(Action::SetFillMode(FillMode::Wireframe)));
        assert_eq!(scene.fill_mode(), FillMode::Wireframe);
        assert_eq!(scene.frame().unwrap().fill_mode, FillMode::Wireframe);
    }

    #[test]
    fn grow_then_reset() {
        let mut scene = scene();
        assert!(scene.apply(Action::GrowStep));
        assert!(scene.grower().branches().len() > 1);

        for _ in 0..1_000 {
            if let GrowthStep::Finished(_) = scene.grow_step() {
                break;
            }
        }
        assert!(scene.grower().is_finished());
        assert!(scene.points().len() < 28);

        assert!(scene.apply(Action::ResetGrowth));
        assert_eq!(scene.points().len(), 28);
        assert_eq!(scene.grower().branches().len(), 1);
        assert!(!scene.grower().is_finished());
    }

    #[test]
    fn frame_contains_scene() {
        let mut scene = scene();
        scene.grow_step();
        let branches = scene.grower().branches().len();
        let frame = scene.frame().unwrap();
        assert_eq!(frame.markers.len(), 28);
        assert_eq!(frame.crown, Some(glam::Mat4::IDENTITY));
        assert_eq!(frame.branches.len(), branches);
        assert!(frame.is_visible(Vec3::ZERO));
    }

    #[test]
    fn lensless_camera_keeps_last_matrices() {
        let mut scene = scene();
        let first = scene.frame().unwrap().clone();

        // A camera swapped in without a lens cannot produce a projection.
        let mut bare = FlyCamera::new();
        bare.set_position(Vec3::new(4.0, 0.0, 0.0));
        *scene.camera_mut() = bare;
        scene.apply(Action::SetFillMode(FillMode::Wireframe));
        scene.grow_step();

        let branches = scene.grower().branches().len();
        let points = scene.points().len();
        let frame = scene.frame().unwrap();
        assert_eq!(frame.view, first.view);
        assert_eq!(frame.proj, first.proj);
        assert_eq!(frame.eye, first.eye);
        assert_eq!(frame.branches.len(), branches);
        assert_eq!(frame.markers.len(), points);
        assert_eq!(frame.fill_mode, FillMode::Wireframe);
        assert!(branches > first.branches.len());
    }

    #[test]
    fn lensless_camera_before_first_frame_yields_nothing() {
        let mut scene = scene();
        *scene.camera_mut() = FlyCamera::new();
        assert!(scene.frame().is_none());
    }

    #[test]
    fn resize_updates_aspect_and_ignores_zero() {
        let mut scene = scene();
        scene.resize(800, 400).unwrap();
        assert!((scene.camera().lens().unwrap().aspect() - 2.0).abs() < 1e-6);
        scene.resize(0, 400).unwrap();
        assert!((scene.camera().lens().unwrap().aspect() - 2.0).abs() < 1e-6);
    }
}
