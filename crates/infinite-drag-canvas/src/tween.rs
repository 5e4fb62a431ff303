//! Minimal time-based scalar tweens for camera zoom.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    /// Quadratic ease-out: fast start, gentle landing.
    Power2Out,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Power2Out => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    ease: Ease,
    /// Whether each update should re-run tile wrapping.
    pub rewrap_on_update: bool,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration_secs: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration: duration_secs.max(0.0),
            elapsed: 0.0,
            ease,
            rewrap_on_update: false,
        }
    }

    pub fn with_rewrap(mut self) -> Self {
        self.rewrap_on_update = true;
        self
    }

    /// Advances by `dt` seconds and returns the eased value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = self.ease.apply(self.elapsed / self.duration);
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}
