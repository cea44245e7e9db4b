use image::Rgba;
use std::time::Duration;

/// Cubic ease-out over `t` in [0, 1]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Linear blend between two colours, `t` in [0, 1]
pub fn lerp_color(from: Rgba<u8>, to: Rgba<u8>, t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let mut out = [0u8; 4];
    for (channel, value) in out.iter_mut().enumerate() {
        let a = f32::from(from[channel]);
        let b = f32::from(to[channel]);
        *value = (a + (b - a) * t).round() as u8;
    }
    Rgba(out)
}

/// A level eased toward 0.0 or 1.0 over a fixed duration.
///
/// Times are offsets from an arbitrary monotonic origin, so the transition
/// runs on the same injectable clock as the detection loop.
#[derive(Debug, Clone)]
pub struct LevelTransition {
    from: f32,
    to: f32,
    started: Duration,
    duration: Duration,
}

impl LevelTransition {
    pub fn new(initial: f32, duration: Duration) -> Self {
        Self {
            from: initial,
            to: initial,
            started: Duration::ZERO,
            duration,
        }
    }

    /// Head toward `target`, starting from wherever the level is at `now`
    pub fn retarget(&mut self, target: f32, now: Duration) {
        if target == self.to {
            return;
        }
        self.from = self.level(now);
        self.to = target;
        self.started = now;
    }

    /// Eased progress of the running transition, 1.0 once finished
    pub fn progress(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started);
        ease_out(elapsed.as_secs_f32() / self.duration.as_secs_f32())
    }

    pub fn is_settled(&self, now: Duration) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn level(&self, now: Duration) -> f32 {
        self.from + (self.to - self.from) * self.progress(now)
    }
}
