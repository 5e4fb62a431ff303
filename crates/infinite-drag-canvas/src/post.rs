//! Post-processing parameters, GPU uniform layouts, and CPU mirrors of the
//! vignette and lens-warp shaders.
//!
//! The GPU passes live in `renderer::pipelines::post_stack`; everything here
//! is plain data so the math can be checked without a device.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// What the lens warp samples when the distorted coordinate leaves the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarpBoundary {
    /// Toroidal: sample at the fractional part of the coordinate.
    #[default]
    Wrap,
    /// Paint `PostParams::fallback_color`.
    Fallback,
}

impl WarpBoundary {
    fn as_u32(self) -> u32 {
        match self {
            WarpBoundary::Wrap => 0,
            WarpBoundary::Fallback => 1,
        }
    }
}

impl std::str::FromStr for WarpBoundary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wrap" => Ok(Self::Wrap),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!("unknown warp boundary '{other}' (expected wrap|fallback)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostParams {
    pub vignette_start: f32,
    pub vignette_falloff: f32,
    pub vignette_strength: f32,
    /// Radial distortion coefficient `k`. Negative values barrel.
    pub warp_strength: f32,
    pub warp_boundary: WarpBoundary,
    pub fallback_color: [f32; 4],

    pub vignette_on: bool,
    pub warp_on: bool,
}

impl Default for PostParams {
    fn default() -> Self {
        Self {
            vignette_start: 0.65,
            vignette_falloff: 0.6,
            vignette_strength: 1.75,
            warp_strength: -0.05,
            warp_boundary: WarpBoundary::Wrap,
            fallback_color: [0.0, 0.0, 0.0, 1.0],

            vignette_on: true,
            warp_on: true,
        }
    }
}

// -------------------- Uniform Buffers --------------------

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Default, Debug, PartialEq)]
pub struct UboVignette {
    pub start: f32,
    pub falloff: f32,
    pub strength: f32,
    pub aspect_ratio: f32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Default, Debug, PartialEq)]
pub struct UboWarp {
    pub fallback_color: [f32; 4],
    pub strength: f32,
    pub aspect_ratio: f32,
    /// 0 = wrap, 1 = fallback color.
    pub boundary: u32,
    pub _pad: f32,
}

const _: [(); 16] = [(); core::mem::size_of::<UboVignette>()];
const _: [(); 32] = [(); core::mem::size_of::<UboWarp>()];

/// Viewport-dependent state shared by both aspect-aware passes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostState {
    aspect_ratio: f32,
}

impl Default for PostState {
    fn default() -> Self {
        Self { aspect_ratio: 1.0 }
    }
}

impl PostState {
    pub fn new(width: u32, height: u32) -> Self {
        let mut state = Self::default();
        state.set_viewport(width, height);
        state
    }

    /// Sets the aspect used by vignette and warp alike. Zero sizes are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn vignette_uniform(&self, params: &PostParams) -> UboVignette {
        UboVignette {
            start: params.vignette_start,
            falloff: params.vignette_falloff,
            strength: params.vignette_strength,
            aspect_ratio: self.aspect_ratio,
        }
    }

    pub fn warp_uniform(&self, params: &PostParams) -> UboWarp {
        UboWarp {
            fallback_color: params.fallback_color,
            strength: params.warp_strength,
            aspect_ratio: self.aspect_ratio,
            boundary: params.warp_boundary.as_u32(),
            _pad: 0.0,
        }
    }
}

// -------------------- CPU Mirrors --------------------

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Brightness multiplier the vignette applies at `uv` (0..1, origin top-left).
pub fn vignette_attenuation(uv: Vec2, u: &UboVignette) -> f32 {
    let centered = (uv - Vec2::splat(0.5)) * Vec2::new(u.aspect_ratio, 1.0);
    let intensity = smoothstep(u.start, u.start + u.falloff, centered.length());
    (1.0 - intensity * u.strength).max(0.0)
}

/// Source coordinate the lens warp samples for output `uv`. `None` means the
/// fallback color is painted.
pub fn lens_warp_uv(uv: Vec2, u: &UboWarp) -> Option<Vec2> {
    let aspect = Vec2::new(u.aspect_ratio, 1.0);
    let p = (uv * 2.0 - Vec2::ONE) * aspect;
    let distorted = p * (1.0 + u.strength * p.length_squared()) / aspect;
    let sample = distorted * 0.5 + Vec2::splat(0.5);

    if u.boundary == WarpBoundary::Fallback.as_u32() {
        let inside = (0.0..=1.0).contains(&sample.x) && (0.0..=1.0).contains(&sample.y);
        inside.then_some(sample)
    } else {
        Some(sample - sample.floor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_updates_both_aspect_uniforms() {
        let params = PostParams::default();
        let mut state = PostState::new(800, 800);
        state.set_viewport(1920, 1080);
        assert_eq!(state.vignette_uniform(&params).aspect_ratio, 1920.0 / 1080.0);
        assert_eq!(state.warp_uniform(&params).aspect_ratio, 1920.0 / 1080.0);

        state.set_viewport(0, 1080);
        assert_eq!(state.aspect_ratio(), 1920.0 / 1080.0);
    }

    #[test]
    fn vignette_leaves_center_and_darkens_corners() {
        let u = PostState::new(1600, 900).vignette_uniform(&PostParams::default());
        assert_eq!(vignette_attenuation(Vec2::splat(0.5), &u), 1.0);
        assert!(vignette_attenuation(Vec2::ZERO, &u) < 0.5);
    }

    #[test]
    fn vignette_is_circular_after_aspect_correction() {
        let params = PostParams {
            vignette_start: 0.2,
            vignette_falloff: 0.5,
            ..Default::default()
        };
        let u = PostState::new(2000, 1000).vignette_uniform(&params);
        // 0.35 of the height up, and the same pixel distance sideways.
        let up = vignette_attenuation(Vec2::new(0.5, 0.5 - 0.35), &u);
        let side = vignette_attenuation(Vec2::new(0.5 + 0.35 / 2.0, 0.5), &u);
        assert!(up < 1.0);
        assert!((up - side).abs() < 1e-5, "up={up} side={side}");
    }

    #[test]
    fn warp_keeps_center_fixed() {
        let u = PostState::new(1280, 720).warp_uniform(&PostParams::default());
        let c = lens_warp_uv(Vec2::splat(0.5), &u).unwrap();
        assert!((c - Vec2::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn barrel_warp_pulls_samples_toward_center() {
        let u = PostState::new(1000, 1000).warp_uniform(&PostParams::default());
        let s = lens_warp_uv(Vec2::new(0.9, 0.5), &u).unwrap();
        assert!(s.x < 0.9 && s.x > 0.5);
        assert!((s.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn out_of_frame_samples_wrap_or_fall_back() {
        let params = PostParams {
            warp_strength: 0.5,
            ..Default::default()
        };
        let state = PostState::new(1000, 1000);

        let wrap = state.warp_uniform(&params);
        let s = lens_warp_uv(Vec2::new(0.99, 0.5), &wrap).unwrap();
        assert!((0.0..1.0).contains(&s.x));

        let fallback = state.warp_uniform(&PostParams {
            warp_boundary: WarpBoundary::Fallback,
            ..params
        });
        assert_eq!(lens_warp_uv(Vec2::new(0.99, 0.5), &fallback), None);
        assert!(lens_warp_uv(Vec2::splat(0.5), &fallback).is_some());
    }

    #[test]
    fn boundary_parses_from_cli_names() {
        assert_eq!("wrap".parse::<WarpBoundary>(), Ok(WarpBoundary::Wrap));
        assert_eq!("fallback".parse::<WarpBoundary>(), Ok(WarpBoundary::Fallback));
        assert!("clamp".parse::<WarpBoundary>().is_err());
    }
}
