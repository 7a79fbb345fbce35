use crate::config::MovementConfig;
use crate::render::Pose;
use crate::scene::SceneBounds;
use glam::{EulerRot, Quat, Vec2};

const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.0175;
/// Roll readback tolerance so a clamped pose is not recomposed every frame.
const ROLL_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigationInput {
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
    /// Pointer-drag look since the last frame, radians of (yaw, pitch).
    pub look_delta: Vec2,
}

impl NavigationInput {
    pub fn is_idle(&self) -> bool {
        *self == NavigationInput::default()
    }
}

/// First-person walk camera kept at eye height inside the scene bounds.
#[derive(Debug, Clone)]
pub struct BoundedNavigator {
    movement_speed: f32,
    look_speed: f32,
    roll_speed: f32,
    max_roll: f32,
    person_height: f32,
    padding: f32,
    bounds: Option<SceneBounds>,
    eye_height: Option<f32>,
}

impl BoundedNavigator {
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            movement_speed: config.movement_speed,
            look_speed: config.look_speed,
            roll_speed: config.roll_speed,
            max_roll: config.max_roll.abs(),
            person_height: config.person_height,
            padding: config.bounds_padding,
            bounds: None,
            eye_height: None,
        }
    }

    /// Installs the movement limits; `None` while the scene is still loading.
    pub fn set_bounds(&mut self, bounds: Option<SceneBounds>) {
        self.bounds = bounds;
        self.eye_height = bounds.map(|b| {
            safe_clamp(
                b.min.y + self.person_height,
                b.min.y + self.padding,
                b.max.y - self.padding,
            )
        });
        if let (Some(b), Some(eye)) = (bounds, self.eye_height) {
            log::info!(
                "Navigation bounds ({:.2}, {:.2}, {:.2})..({:.2}, {:.2}, {:.2}), eye height {:.2}",
                b.min.x,
                b.min.y,
                b.min.z,
                b.max.x,
                b.max.y,
                b.max.z,
                eye
            );
        }
    }

    pub fn bounds(&self) -> Option<SceneBounds> {
        self.bounds
    }

    pub fn eye_height(&self) -> Option<f32> {
        self.eye_height
    }

    pub fn max_roll(&self) -> f32 {
        self.max_roll
    }

    /// Applies one frame of input. Does nothing unless `free` is set.
    /// Returns true if the pose changed.
    pub fn update(&self, pose: &mut Pose, input: &NavigationInput, frame_dt: f32, free: bool) -> bool {
        if !free {
            return false;
        }
        let look_step = self.look_speed * frame_dt;
        let move_step = self.movement_speed * frame_dt;
        let mut changed = false;

        let mut yaw_delta = input.look_delta.x;
        let mut pitch_delta = input.look_delta.y;
        let mut roll_delta = 0.0;
        if input.aim_left {
            yaw_delta += look_step;
        }
        if input.aim_right {
            yaw_delta -= look_step;
        }
        if input.aim_up {
            pitch_delta += look_step;
        }
        if input.aim_down {
            pitch_delta -= look_step;
        }
        if input.roll_left {
            roll_delta += self.roll_speed * frame_dt;
        }
        if input.roll_right {
            roll_delta -= self.roll_speed * frame_dt;
        }

        let (yaw, pitch, roll) = pose.orientation.to_euler(EulerRot::YXZ);
        let rotated = yaw_delta != 0.0 || pitch_delta != 0.0 || roll_delta != 0.0;
        if rotated || roll.abs() > self.max_roll + ROLL_EPSILON {
            let pitch = (pitch + pitch_delta).clamp(-MAX_PITCH, MAX_PITCH);
            let roll = (roll + roll_delta).clamp(-self.max_roll, self.max_roll);
            pose.orientation = Quat::from_euler(EulerRot::YXZ, yaw + yaw_delta, pitch, roll);
            changed = true;
        }

        let mut forward = 0.0;
        let mut right = 0.0;
        if input.move_forward {
            forward += move_step;
        }
        if input.move_backward {
            forward -= move_step;
        }
        if input.move_left {
            right -= move_step;
        }
        if input.move_right {
            right += move_step;
        }
        if forward != 0.0 || right != 0.0 {
            pose.position += pose.forward() * forward + pose.right() * right;
            changed = true;
        }

        self.constrain(pose) || changed
    }

    /// Pins the eye height and clamps x/z into the padded bounds.
    pub fn constrain(&self, pose: &mut Pose) -> bool {
        let (Some(bounds), Some(eye_height)) = (self.bounds, self.eye_height) else {
            return false;
        };
        let before = pose.position;
        pose.position.y = eye_height;
        pose.position.x = safe_clamp(
            pose.position.x,
            bounds.min.x + self.padding,
            bounds.max.x - self.padding,
        );
        pose.position.z = safe_clamp(
            pose.position.z,
            bounds.min.z + self.padding,
            bounds.max.z - self.padding,
        );
        pose.position != before
    }
}

/// Clamp that tolerates an inverted range by collapsing onto its midpoint.
fn safe_clamp(value: f32, min: f32, max: f32) -> f32 {
    if min > max {
        (min + max) * 0.5
    } else {
        value.clamp(min, max)
    }
}
