//! Drag tracking, release momentum and offset smoothing.
//!
//! The controller never touches the scene. It owns the offsets that drive the
//! tile-grid root and reports camera zoom requests back to the engine.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One named speed band of the release profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBand {
    /// Release speed (pointer px per event) at which this band's values apply.
    pub speed: f32,
    pub damping: f32,
    pub distance_multiplier: f32,
}

/// Release speed → momentum profile table. The profile is interpolated
/// linearly between neighbouring bands and held flat outside them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumBands {
    pub idle: SpeedBand,
    pub slow: SpeedBand,
    pub medium: SpeedBand,
    pub fast: SpeedBand,
    pub min_damping: f32,
    pub max_damping: f32,
    pub min_distance_multiplier: f32,
    pub max_distance_multiplier: f32,
}

impl Default for MomentumBands {
    fn default() -> Self {
        Self {
            idle: SpeedBand { speed: 0.01, damping: 0.90, distance_multiplier: 2.0 },
            slow: SpeedBand { speed: 5.0, damping: 0.93, distance_multiplier: 1.2 },
            medium: SpeedBand { speed: 20.0, damping: 0.95, distance_multiplier: 0.8 },
            fast: SpeedBand { speed: 50.0, damping: 0.95, distance_multiplier: 0.8 },
            min_damping: 0.90,
            max_damping: 0.99,
            min_distance_multiplier: 0.5,
            max_distance_multiplier: 4.0,
        }
    }
}

impl MomentumBands {
    fn bands(&self) -> [SpeedBand; 4] {
        [self.idle, self.slow, self.medium, self.fast]
    }

    /// Derives the coast profile for a release at `release_speed`.
    pub fn profile_for(&self, release_speed: f32) -> MomentumProfile {
        let bands = self.bands();
        let first = bands[0];
        let last = bands[bands.len() - 1];

        let (damping, distance) = if !(release_speed > first.speed) {
            // Also catches NaN.
            (first.damping, first.distance_multiplier)
        } else if release_speed >= last.speed {
            (last.damping, last.distance_multiplier)
        } else {
            let upper = bands
                .iter()
                .position(|b| release_speed < b.speed)
                .unwrap_or(bands.len() - 1);
            let (lo, hi) = (bands[upper - 1], bands[upper]);
            let range = (hi.speed - lo.speed).max(f32::EPSILON);
            let t = ((release_speed - lo.speed) / range).clamp(0.0, 1.0);
            (
                lo.damping + t * (hi.damping - lo.damping),
                lo.distance_multiplier + t * (hi.distance_multiplier - lo.distance_multiplier),
            )
        };

        MomentumProfile {
            damping_factor: damping.clamp(self.min_damping, self.max_damping),
            distance_multiplier: distance
                .clamp(self.min_distance_multiplier, self.max_distance_multiplier),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let bands = self.bands();
        if bands.windows(2).any(|w| w[0].speed >= w[1].speed) {
            return Err("momentum bands must have strictly increasing speeds".into());
        }
        if !(self.min_damping > 0.0 && self.min_damping <= self.max_damping && self.max_damping < 1.0) {
            return Err(format!(
                "damping bounds must satisfy 0 < min <= max < 1 (got {}..{})",
                self.min_damping, self.max_damping
            ));
        }
        if !(self.min_distance_multiplier >= 0.0
            && self.min_distance_multiplier <= self.max_distance_multiplier)
        {
            return Err("distance multiplier bounds are inverted".into());
        }
        Ok(())
    }
}

/// Empirically tuned feel parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Base lerp factor of `current` toward `target` per frame.
    pub smoothing: f32,
    /// Lerp factor used while dragging faster than `fast_drag_threshold`.
    pub fast_drag_smoothing: f32,
    pub fast_drag_threshold: f32,
    /// World units per pointer pixel while dragging.
    pub drag_multiplier: f32,
    /// Velocity components at or below this are snapped to zero.
    pub min_velocity: f32,
    pub momentum: MomentumBands,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.4,
            fast_drag_smoothing: 0.6,
            fast_drag_threshold: 25.0,
            drag_multiplier: 0.2,
            min_velocity: 0.05,
            momentum: MomentumBands::default(),
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [("smoothing", self.smoothing), ("fast_drag_smoothing", self.fast_drag_smoothing)] {
            if !(v > 0.0 && v <= 1.0) {
                return Err(format!("{name} must be in (0, 1] (got {v})"));
            }
        }
        if !(self.min_velocity > 0.0) {
            return Err(format!("min_velocity must be positive (got {})", self.min_velocity));
        }
        self.momentum.validate()
    }
}

/// How far and how long the grid coasts after a release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumProfile {
    pub damping_factor: f32,
    pub distance_multiplier: f32,
}

/// Offsets driving the tile-grid root.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OffsetState {
    pub current: Vec2,
    pub target: Vec2,
    pub previous: Vec2,
}

impl OffsetState {
    /// Shifts all three offsets by the same amount.
    pub fn translate(&mut self, by: Vec2) {
        self.current += by;
        self.target += by;
        self.previous += by;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragState {
    pub is_dragging: bool,
    pub previous_pointer: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    Idle,
    Dragging,
    Coasting,
}

/// Side effects the engine must carry out for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    /// Drag started; pull the camera back.
    ZoomOut,
    /// Drag released; return the camera, re-wrapping while it moves.
    ZoomIn,
}

#[derive(Debug, Clone)]
pub struct DragMomentumController {
    pub config: MotionConfig,
    drag: DragState,
    offsets: OffsetState,
    profile: MomentumProfile,
}

impl DragMomentumController {
    pub fn new(config: MotionConfig) -> Self {
        let profile = config.momentum.profile_for(0.0);
        Self {
            config,
            drag: DragState::default(),
            offsets: OffsetState::default(),
            profile,
        }
    }

    pub fn phase(&self) -> MotionPhase {
        if self.drag.is_dragging {
            MotionPhase::Dragging
        } else if self.is_coasting() {
            MotionPhase::Coasting
        } else {
            MotionPhase::Idle
        }
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging
    }

    pub fn velocity(&self) -> Vec2 {
        self.drag.velocity
    }

    pub fn offsets(&self) -> &OffsetState {
        &self.offsets
    }

    pub fn offsets_mut(&mut self) -> &mut OffsetState {
        &mut self.offsets
    }

    pub fn profile(&self) -> MomentumProfile {
        self.profile
    }

    fn is_coasting(&self) -> bool {
        let min = self.config.min_velocity;
        self.drag.velocity.x.abs() > min || self.drag.velocity.y.abs() > min
    }

    pub fn pointer_down(&mut self, pointer: Vec2) -> MotionEvent {
        self.drag.is_dragging = true;
        self.drag.velocity = Vec2::ZERO;
        self.drag.previous_pointer = pointer;
        // An interrupted coast must not jump the grid on the first move.
        self.offsets.target = self.offsets.current;
        MotionEvent::ZoomOut
    }

    pub fn pointer_move(&mut self, pointer: Vec2) {
        if !self.drag.is_dragging {
            return;
        }
        let delta = pointer - self.drag.previous_pointer;
        let m = self.config.drag_multiplier;
        // Screen y grows downward, world y upward.
        self.offsets.target.x += delta.x * m;
        self.offsets.target.y -= delta.y * m;
        self.drag.velocity = delta;
        self.drag.previous_pointer = pointer;
    }

    /// Ends a drag. Returns `None` if no drag was active.
    pub fn pointer_up(&mut self) -> Option<MotionEvent> {
        if !self.drag.is_dragging {
            return None;
        }
        self.drag.is_dragging = false;
        let release_speed = self.drag.velocity.length();
        self.profile = self.config.momentum.profile_for(release_speed);
        log::debug!(
            "release speed {:.2} -> damping {:.3}, distance x{:.2}",
            release_speed,
            self.profile.damping_factor,
            self.profile.distance_multiplier
        );
        Some(MotionEvent::ZoomIn)
    }

    /// Momentum step. Runs only while coasting.
    pub fn apply_momentum(&mut self) {
        if self.drag.is_dragging || !self.is_coasting() {
            return;
        }
        let v = self.drag.velocity;
        let k = self.profile.distance_multiplier;
        self.offsets.target.x += v.x * k;
        self.offsets.target.y -= v.y * k;

        let min = self.config.min_velocity;
        let mut next = v * self.profile.damping_factor;
        if next.x.abs() <= min {
            next.x = 0.0;
        }
        if next.y.abs() <= min {
            next.y = 0.0;
        }
        self.drag.velocity = next;
    }

    /// Smoothing factor for this frame.
    pub fn active_smoothing(&self) -> f32 {
        if self.drag.is_dragging && self.drag.velocity.length() > self.config.fast_drag_threshold {
            self.config.fast_drag_smoothing
        } else {
            self.config.smoothing
        }
    }

    /// Lerps `current` toward `target`; returns `current - previous` for the frame.
    pub fn smooth(&mut self) -> Vec2 {
        let s = self.active_smoothing();
        self.offsets.current = self.offsets.current.lerp(self.offsets.target, s);
        self.offsets.current - self.offsets.previous
    }

    /// Marks the current offset as consumed by the root transform.
    pub fn commit_frame(&mut self) {
        self.offsets.previous = self.offsets.current;
    }
}
