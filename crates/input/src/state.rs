use crate::action::Action;
use std::collections::HashSet;
use treecrown_common::{ControlsConfig, FillMode};

/// Logical controls. The windowing layer maps its key codes onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Forward,
    Back,
    Left,
    Right,
    Sprint,
    Wireframe,
    Solid,
    Grow,
    Reset,
    ToggleInspector,
}

/// Held controls plus mouse-look state for one window.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Control>,
    looking: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press or release. Presses of one-shot controls return the
    /// action they trigger; held movement controls are read by
    /// [`InputState::movement`].
    pub fn key(&mut self, control: Control, pressed: bool) -> Option<Action> {
        if !pressed {
            self.held.remove(&control);
            return None;
        }
        // Key repeat arrives as further presses; only the first one counts.
        if !self.held.insert(control) {
            return None;
        }
        let action = match control {
            Control::Wireframe => Action::SetFillMode(FillMode::Wireframe),
            Control::Solid => Action::SetFillMode(FillMode::Solid),
            Control::Grow => Action::GrowStep,
            Control::Reset => Action::ResetGrowth,
            Control::ToggleInspector => Action::ToggleInspector,
            Control::Forward | Control::Back | Control::Left | Control::Right | Control::Sprint => {
                return None;
            }
        };
        tracing::debug!(?control, ?action, "control pressed");
        Some(action)
    }

    pub fn is_held(&self, control: Control) -> bool {
        self.held.contains(&control)
    }

    /// Start or stop mouse look (left button held).
    pub fn set_looking(&mut self, looking: bool) {
        self.looking = looking;
    }

    pub fn is_looking(&self) -> bool {
        self.looking
    }

    /// Forget every held control, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.looking = false;
    }

    /// Walk and strafe actions for a frame lasting `dt` seconds.
    pub fn movement(&self, dt: f32, controls: &ControlsConfig) -> Vec<Action> {
        let mut step = controls.walk_speed * dt;
        if self.is_held(Control::Sprint) {
            step *= controls.sprint_multiplier;
        }

        let mut actions = Vec::new();
        let forward = axis(self.is_held(Control::Forward), self.is_held(Control::Back));
        if forward != 0.0 {
            actions.push(Action::Walk(forward * step));
        }
        let sideways = axis(self.is_held(Control::Right), self.is_held(Control::Left));
        if sideways != 0.0 {
            actions.push(Action::Strafe(sideways * step));
        }
        actions
    }

    /// Pitch and yaw for a mouse delta in pixels. Moving the mouse right turns
    /// right, moving it down looks down. Empty unless mouse look is active.
    pub fn look(&self, dx: f64, dy: f64, controls: &ControlsConfig) -> Vec<Action> {
        if !self.looking {
            return Vec::new();
        }
        let per_pixel = controls.look_degrees_per_pixel.to_radians();
        let yaw = per_pixel * dx as f32;
        let pitch = -per_pixel * dy as f32;

        let mut actions = Vec::with_capacity(2);
        if pitch != 0.0 {
            actions.push(Action::Pitch(pitch));
        }
        if yaw != 0.0 {
            actions.push(Action::Yaw(yaw));
        }
        actions
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}
