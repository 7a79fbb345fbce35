use std::time::{Duration, Instant};
use winit::window::Window;

/// Longest frame step fed to navigation, so a stalled frame does not teleport
/// the camera.
const MAX_FRAME_DT: f32 = 0.1;
const TITLE_INTERVAL: Duration = Duration::from_millis(500);

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_title_time: Instant,
    frames_since_title: u32,
    pub frame_dt: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String, now: Instant) -> Self {
        Self {
            last_frame_time: None,
            last_title_time: now,
            frames_since_title: 0,
            frame_dt: 1.0 / 60.0,
            base_title,
        }
    }

    /// Advances to `now`. Every half second the window title shows the frame
    /// rate and `status`.
    pub fn update(&mut self, window: Option<&Window>, now: Instant, status: &str) {
        let step = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_millis(16),
        };
        self.last_frame_time = Some(now);
        self.frame_dt = step.as_secs_f32().clamp(0.0, MAX_FRAME_DT);

        self.frames_since_title = self.frames_since_title.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_title_time);
        if elapsed < TITLE_INTERVAL {
            return;
        }
        let fps = self.frames_since_title as f32 / elapsed.as_secs_f32();
        if let Some(window) = window {
            window.set_title(&format!("{} - {:.1} fps - {}", self.base_title, fps, status));
        }
        self.frames_since_title = 0;
        self.last_title_time = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_step_is_clamped() {
        let start = Instant::now();
        let mut timing = FrameTiming::new("test".to_string(), start);
        timing.update(None, start, "free");
        assert!((timing.frame_dt - 0.016).abs() < 1e-6);
        timing.update(None, start + Duration::from_millis(20), "free");
        assert!((timing.frame_dt - 0.02).abs() < 1e-4);
        timing.update(None, start + Duration::from_secs(5), "free");
        assert_eq!(timing.frame_dt, MAX_FRAME_DT);
    }
}
