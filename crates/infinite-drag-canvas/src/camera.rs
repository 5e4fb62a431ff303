use crate::tween::{Ease, Tween};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Resting distance from the card plane.
    pub distance: f32,
    /// Distance multiplier applied while dragging.
    pub zoom_out_factor: f32,
    pub zoom_out_secs: f32,
    pub zoom_in_secs: f32,
    /// Scene clear color, linear RGB.
    pub background: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 70.0,
            near: 0.1,
            far: 1000.0,
            distance: 400.0,
            zoom_out_factor: 1.25,
            zoom_out_secs: 0.15,
            zoom_in_secs: 0.35,
            background: [0.0103, 0.0103, 0.0103], // #1a1a1a
        }
    }
}

/// A ray in world space. `dir` is normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// Distance along the ray to the `z = plane_z` plane, if it is ahead.
    pub fn hit_plane_z(&self, plane_z: f32) -> Option<f32> {
        if self.dir.z.abs() < f32::EPSILON {
            return None;
        }
        let t = (plane_z - self.origin.z) / self.dir.z;
        (t >= 0.0).then_some(t)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// Perspective camera looking down -Z at the card plane.
#[derive(Debug, Clone)]
pub struct Camera {
    pub config: CameraConfig,
    pub aspect: f32,
    /// Current distance from the card plane (animated by zoom tweens).
    pub z: f32,
    zoom: Option<Tween>,
}

impl Camera {
    pub fn new(config: CameraConfig, aspect: f32) -> Self {
        Self {
            config,
            aspect: if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 },
            z: config.distance,
            zoom: None,
        }
    }

    pub fn rest_z(&self) -> f32 {
        self.config.distance
    }

    pub fn zoomed_out_z(&self) -> f32 {
        self.config.distance * self.config.zoom_out_factor
    }

    /// Updates the aspect ratio; degenerate sizes keep the previous value.
    pub fn set_viewport(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.aspect = width as f32 / height as f32;
        true
    }

    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_y_deg.to_radians(),
            self.aspect,
            self.config.near,
            self.config.far,
        )
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(Vec3::new(0.0, 0.0, self.z), Vec3::ZERO, Vec3::Y)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    /// Ray through a point in normalized device coordinates (y up).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_proj().inverse();
        // wgpu clip space: depth 0 at the near plane, 1 at the far plane.
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray {
            origin: near,
            dir: (far - near).normalize(),
        }
    }

    /// Starts a zoom toward `to`, replacing any zoom in flight.
    pub fn zoom_to(&mut self, to: f32, secs: f32, rewrap: bool) {
        let tween = Tween::new(self.z, to, secs, Ease::Power2Out);
        self.zoom = Some(if rewrap { tween.with_rewrap() } else { tween });
    }

    pub fn zoom_out(&mut self) {
        self.zoom_to(self.zoomed_out_z(), self.config.zoom_out_secs, false);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_to(self.rest_z(), self.config.zoom_in_secs, true);
    }

    /// Steps the zoom tween. Returns `Some(rewrap)` if the camera moved.
    pub fn advance(&mut self, dt: f32) -> Option<bool> {
        let tween = self.zoom.as_mut()?;
        self.z = tween.advance(dt);
        let rewrap = tween.rewrap_on_update;
        if tween.is_finished() {
            self.zoom = None;
        }
        Some(rewrap)
    }

    pub fn is_zooming(&self) -> bool {
        self.zoom.is_some()
    }
}

/// Converts a pointer position in viewport pixels to NDC.
pub fn pointer_to_ndc(pointer: Vec2, width: u32, height: u32) -> Option<Vec2> {
    if width == 0 || height == 0 {
        return None;
    }
    Some(Vec2::new(
        pointer.x / width as f32 * 2.0 - 1.0,
        -(pointer.y / height as f32) * 2.0 + 1.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_points_straight_at_the_plane() {
        let cam = Camera::new(CameraConfig::default(), 16.0 / 9.0);
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        let t = ray.hit_plane_z(0.0).unwrap();
        let hit = ray.at(t);
        assert!(hit.x.abs() < 0.05 && hit.y.abs() < 0.05, "hit={hit:?}");
    }

    #[test]
    fn top_edge_ray_hits_half_the_visible_height() {
        let cam = Camera::new(CameraConfig::default(), 1.0);
        let ray = cam.ray_from_ndc(Vec2::new(0.0, 1.0));
        let hit = ray.at(ray.hit_plane_z(0.0).unwrap());
        let expected = 400.0 * (35.0f32).to_radians().tan();
        assert!((hit.y - expected).abs() < 1.0, "hit.y={} expected {}", hit.y, expected);
    }

    #[test]
    fn pointer_maps_to_ndc_with_y_up() {
        assert_eq!(pointer_to_ndc(Vec2::new(0.0, 0.0), 800, 600), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(pointer_to_ndc(Vec2::new(400.0, 300.0), 800, 600), Some(Vec2::ZERO));
        assert_eq!(pointer_to_ndc(Vec2::ZERO, 0, 600), None);
    }

    #[test]
    fn zoom_out_then_in_returns_to_rest() {
        let mut cam = Camera::new(CameraConfig::default(), 1.0);
        cam.zoom_out();
        assert_eq!(cam.advance(1.0), Some(false));
        assert_eq!(cam.z, 500.0);
        assert!(!cam.is_zooming());

        cam.zoom_in();
        assert_eq!(cam.advance(0.1), Some(true));
        assert!(cam.z < 500.0 && cam.z > 400.0);
        cam.advance(1.0);
        assert_eq!(cam.z, 400.0);
        assert_eq!(cam.advance(0.1), None);
    }

    #[test]
    fn new_zoom_overrides_the_one_in_flight() {
        let mut cam = Camera::new(CameraConfig::default(), 1.0);
        cam.zoom_out();
        cam.advance(0.05);
        let mid = cam.z;
        cam.zoom_in();
        cam.advance(0.0);
        assert_eq!(cam.z, mid);
        cam.advance(1.0);
        assert_eq!(cam.z, 400.0);
    }

    #[test]
    fn zero_sized_viewport_keeps_aspect() {
        let mut cam = Camera::new(CameraConfig::default(), 2.0);
        assert!(!cam.set_viewport(0, 100));
        assert_eq!(cam.aspect, 2.0);
        assert!(cam.set_viewport(300, 100));
        assert_eq!(cam.aspect, 3.0);
    }
}
