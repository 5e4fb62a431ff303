//! Keeps the tile-grid root within one tile period so nine replicas are enough
//! to cover any pan distance.

use crate::motion::OffsetState;
use glam::Vec2;

/// Below this per-axis delta the root is left untouched for the frame.
pub const MIN_ROOT_DELTA: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfiniteTileWrapper {
    tile_size: Vec2,
}

impl InfiniteTileWrapper {
    pub fn new(tile_size: Vec2) -> Self {
        Self { tile_size }
    }

    pub fn tile_size(&self) -> Vec2 {
        self.tile_size
    }

    /// Moves the root by this frame's offset delta.
    pub fn apply_delta(root: &mut Vec2, delta: Vec2) {
        if delta.x.abs() > MIN_ROOT_DELTA || delta.y.abs() > MIN_ROOT_DELTA {
            *root += delta;
        }
    }

    /// Brings `root` back into `(-dim/2, dim/2]` on each axis. When `offsets`
    /// is given (an active drag) they receive the same correction so the next
    /// frame's delta stays continuous. Returns the applied correction.
    pub fn wrap(&self, root: &mut Vec2, offsets: Option<&mut OffsetState>) -> Vec2 {
        let wrapped = Vec2::new(
            wrap_axis(root.x, self.tile_size.x),
            wrap_axis(root.y, self.tile_size.y),
        );
        if wrapped == *root {
            return Vec2::ZERO;
        }
        let correction = wrapped - *root;
        *root = wrapped;
        if let Some(offsets) = offsets {
            offsets.translate(correction);
        }
        correction
    }
}

/// `value` shifted by whole periods into `(-dim/2, dim/2]`.
fn wrap_axis(value: f32, dim: f32) -> f32 {
    if !(dim > 0.0) || !value.is_finite() {
        return value;
    }
    let half = dim / 2.0;
    let mut v = value;
    if v > half {
        v -= ((v - half) / dim).ceil() * dim;
    } else if v <= -half {
        v += (((-half - v) / dim).floor() + 1.0) * dim;
    }
    // Rounding on large values can leave it one period out.
    while v > half {
        v -= dim;
    }
    while v <= -half {
        v += dim;
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wrapper() -> InfiniteTileWrapper {
        InfiniteTileWrapper::new(Vec2::new(1400.0, 800.0))
    }

    #[test]
    fn crossing_half_tile_subtracts_a_full_tile() {
        let w = wrapper();
        let mut root = Vec2::new(705.0, 0.0);
        let c = w.wrap(&mut root, None);
        assert_eq!(c, Vec2::new(-1400.0, 0.0));
        assert_eq!(root, Vec2::new(-695.0, 0.0));
    }

    #[test]
    fn negative_crossing_adds_a_full_tile() {
        let w = wrapper();
        let mut root = Vec2::new(0.0, -401.0);
        w.wrap(&mut root, None);
        assert_eq!(root, Vec2::new(0.0, 399.0));
    }

    #[test]
    fn root_inside_bounds_is_untouched() {
        let w = wrapper();
        for p in [
            Vec2::ZERO,
            Vec2::new(700.0, 400.0),
            Vec2::new(-699.9, -399.9),
            Vec2::new(123.0, -45.0),
        ] {
            let mut root = p;
            assert_eq!(w.wrap(&mut root, None), Vec2::ZERO);
            assert_eq!(root, p);
        }
    }

    #[test]
    fn lower_edge_belongs_to_the_upper_bound() {
        let w = wrapper();
        let mut root = Vec2::new(-700.0, -400.0);
        w.wrap(&mut root, None);
        assert_eq!(root, Vec2::new(700.0, 400.0));
    }

    #[test]
    fn offsets_follow_the_root_while_dragging() {
        let w = wrapper();
        let mut root = Vec2::new(710.0, 0.0);
        let mut offsets = OffsetState {
            current: Vec2::new(710.0, 5.0),
            target: Vec2::new(720.0, 5.0),
            previous: Vec2::new(705.0, 5.0),
        };
        w.wrap(&mut root, Some(&mut offsets));
        assert_eq!(offsets.current, Vec2::new(-690.0, 5.0));
        assert_eq!(offsets.target, Vec2::new(-680.0, 5.0));
        assert_eq!(offsets.previous, Vec2::new(-695.0, 5.0));
        // Next frame's delta is unchanged by the wrap.
        assert_eq!(offsets.current - offsets.previous, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn tiny_deltas_do_not_move_the_root() {
        let mut root = Vec2::new(10.0, 10.0);
        InfiniteTileWrapper::apply_delta(&mut root, Vec2::new(0.0005, -0.0005));
        assert_eq!(root, Vec2::new(10.0, 10.0));
        InfiniteTileWrapper::apply_delta(&mut root, Vec2::new(0.5, 0.0));
        assert_eq!(root, Vec2::new(10.5, 10.0));
    }

    proptest! {
        #[test]
        fn wrap_is_idempotent(x in -2.0e5f32..2.0e5, y in -2.0e5f32..2.0e5) {
            let w = wrapper();
            let mut root = Vec2::new(x, y);
            w.wrap(&mut root, None);
            let once = root;
            prop_assert_eq!(w.wrap(&mut root, None), Vec2::ZERO);
            prop_assert_eq!(root, once);
        }

        #[test]
        fn root_never_drifts_out_of_the_tile(
            deltas in proptest::collection::vec((-900.0f32..900.0, -900.0f32..900.0), 1..400)
        ) {
            let w = wrapper();
            let mut root = Vec2::ZERO;
            for (dx, dy) in deltas {
                InfiniteTileWrapper::apply_delta(&mut root, Vec2::new(dx, dy));
                w.wrap(&mut root, None);
                prop_assert!(root.x > -700.0 && root.x <= 700.0, "x={}", root.x);
                prop_assert!(root.y > -400.0 && root.y <= 400.0, "y={}", root.y);
            }
        }
    }
}
