use crate::render::NavigationInput;
use glam::Vec2;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pointer travel, in pixels, past which a press becomes a drag.
pub const CLICK_SLOP: f32 = 4.0;

#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub aim_left: bool,
    pub aim_right: bool,
    pub aim_up: bool,
    pub aim_down: bool,
    pub roll_left: bool,
    pub roll_right: bool,
}

impl InputState {
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) {
        match key {
            PhysicalKey::Code(KeyCode::KeyW) => self.move_forward = pressed,
            PhysicalKey::Code(KeyCode::KeyS) => self.move_backward = pressed,
            PhysicalKey::Code(KeyCode::KeyA) => self.move_left = pressed,
            PhysicalKey::Code(KeyCode::KeyD) => self.move_right = pressed,
            PhysicalKey::Code(KeyCode::ArrowLeft) => self.aim_left = pressed,
            PhysicalKey::Code(KeyCode::ArrowRight) => self.aim_right = pressed,
            PhysicalKey::Code(KeyCode::ArrowUp) => self.aim_up = pressed,
            PhysicalKey::Code(KeyCode::ArrowDown) => self.aim_down = pressed,
            PhysicalKey::Code(KeyCode::KeyQ) => self.roll_left = pressed,
            PhysicalKey::Code(KeyCode::KeyE) => self.roll_right = pressed,
            _ => {}
        }
    }

    /// Drops held keys, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    pub fn navigation(&self, look_delta: Vec2) -> NavigationInput {
        NavigationInput {
            move_forward: self.move_forward,
            move_backward: self.move_backward,
            move_left: self.move_left,
            move_right: self.move_right,
            aim_left: self.aim_left,
            aim_right: self.aim_right,
            aim_up: self.aim_up,
            aim_down: self.aim_down,
            roll_left: self.roll_left,
            roll_right: self.roll_right,
            look_delta,
        }
    }
}

/// Left-button tracker that tells drags (look around) from clicks.
#[derive(Default, Debug, Clone, Copy)]
pub struct PointerDrag {
    pressed_at: Option<Vec2>,
    last: Option<Vec2>,
    dragging: bool,
    /// Pixels moved while dragging since the last frame.
    accumulated: Vec2,
}

impl PointerDrag {
    pub fn press(&mut self, position: Vec2) {
        self.pressed_at = Some(position);
        self.last = Some(position);
        self.dragging = false;
    }

    pub fn moved(&mut self, position: Vec2) {
        let Some(start) = self.pressed_at else {
            self.last = Some(position);
            return;
        };
        if !self.dragging && position.distance(start) > CLICK_SLOP {
            self.dragging = true;
        }
        if self.dragging {
            if let Some(last) = self.last {
                self.accumulated += position - last;
            }
        }
        self.last = Some(position);
    }

    /// Returns true when the press ends as a click.
    pub fn release(&mut self) -> bool {
        let was_click = self.pressed_at.is_some() && !self.dragging;
        self.pressed_at = None;
        self.dragging = false;
        was_click
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    /// Look delta in radians of (yaw, pitch) since the last call. Dragging
    /// right turns right, dragging up looks up.
    pub fn take_look_delta(&mut self, sensitivity: f32) -> Vec2 {
        let delta = std::mem::take(&mut self.accumulated);
        Vec2::new(-delta.x, -delta.y) * sensitivity
    }
}
