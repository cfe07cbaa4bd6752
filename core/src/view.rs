//! Damped orbit camera
//!
//! Spherical coordinates around a target point. Pointer input adds angular
//! velocity; [`OrbitCamera::update`] applies it and lets it decay, which gives
//! the same soft stop as a damped orbit control.

use glam::{Mat4, Vec2, Vec3};

use crate::raycast::Ray;

const MIN_DISTANCE: f32 = 2.0;
const MAX_DISTANCE: f32 = 20.0;
/// Keep pitch short of the poles so the view basis stays defined
const PITCH_LIMIT: f32 = 1.45;

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Orbit input is ignored while false (during a new-part drag)
    pub enabled: bool,
    /// Fraction of the pending rotation applied (and removed) per update
    pub damping: f32,
    velocity: Vec2,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_at(Vec3::new(0.0, 1.5, 8.0), Vec3::new(0.0, 0.5, 0.0))
    }
}

impl OrbitCamera {
    /// Camera at `eye` orbiting `target`
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(MIN_DISTANCE);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);
        Self {
            target,
            distance,
            yaw,
            pitch,
            fov_y: 45.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
            enabled: true,
            damping: 0.05,
            velocity: Vec2::ZERO,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye()).normalize_or(Vec3::NEG_Z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Convert a pixel position inside a viewport of `size` to NDC (+Y up)
    pub fn pixel_to_ndc(pos: Vec2, size: Vec2) -> Vec2 {
        let size = size.max(Vec2::ONE);
        Vec2::new(pos.x / size.x * 2.0 - 1.0, 1.0 - pos.y / size.y * 2.0)
    }

    /// World-space ray through a point in normalized device coordinates
    pub fn ray_from_ndc(&self, ndc: Vec2, aspect: f32) -> Ray {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        let forward = self.forward();
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        let up = right.cross(forward);

        let half_h = (0.5 * self.fov_y).tan();
        let half_w = half_h * aspect;
        let dir = forward + right * (ndc.x * half_w) + up * (ndc.y * half_h);
        Ray::new(self.eye(), dir)
    }

    /// Queue an orbit by the given angles (radians)
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        if !self.enabled {
            return;
        }
        self.velocity += Vec2::new(delta_yaw, delta_pitch);
    }

    /// Multiply the distance by `factor`, clamped to the zoom range
    pub fn zoom(&mut self, factor: f32) {
        if !self.enabled || !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Apply a share of the pending rotation. Call once per frame.
    pub fn update(&mut self) {
        let step = self.velocity * self.damping.clamp(0.0, 1.0);
        self.velocity -= step;
        self.yaw += step.x;
        self.pitch = (self.pitch + step.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        if self.velocity.length_squared() < 1e-10 {
            self.velocity = Vec2::ZERO;
        }
    }

    /// Drop any pending rotation
    pub fn settle(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    pub fn is_moving(&self) -> bool {
        self.velocity != Vec2::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pose() {
        let cam = OrbitCamera::default();
        assert!((cam.eye() - Vec3::new(0.0, 1.5, 8.0)).length() < 1e-4);
        assert!((cam.fov_y.to_degrees() - 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let cam = OrbitCamera::default();
        let ray = cam.ray_from_ndc(Vec2::ZERO, 1.5);
        assert!(ray.direction.dot(cam.forward()) > 0.9999);
    }

    #[test]
    fn test_ray_matches_projection() {
        // A point projected to NDC lies on the ray through that NDC
        let cam = OrbitCamera::default();
        let aspect = 16.0 / 9.0;
        let point = Vec3::new(0.7, 1.1, -0.4);
        let clip = cam.view_projection(aspect) * point.extend(1.0);
        let ndc = Vec2::new(clip.x / clip.w, clip.y / clip.w);

        let ray = cam.ray_from_ndc(ndc, aspect);
        let to_point = (point - ray.origin).normalize();
        assert!(to_point.dot(ray.direction) > 0.99999);
    }

    #[test]
    fn test_pixel_to_ndc() {
        let size = Vec2::new(200.0, 100.0);
        assert_eq!(OrbitCamera::pixel_to_ndc(Vec2::ZERO, size), Vec2::new(-1.0, 1.0));
        assert_eq!(OrbitCamera::pixel_to_ndc(size, size), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_orbit_disabled() {
        let mut cam = OrbitCamera::default();
        cam.enabled = false;
        cam.orbit(1.0, 0.5);
        cam.zoom(0.5);
        cam.update();
        assert_eq!(cam, OrbitCamera::default().with_enabled(false));
    }

    #[test]
    fn test_orbit_damping_converges() {
        let mut cam = OrbitCamera::default();
        let start = cam.yaw;
        cam.orbit(0.5, 0.0);
        cam.update();
        assert!((cam.yaw - start - 0.025).abs() < 1e-6);
        for _ in 0..1000 {
            cam.update();
        }
        assert!((cam.yaw - start - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_pitch_and_zoom_clamped() {
        let mut cam = OrbitCamera::default();
        cam.damping = 1.0;
        cam.orbit(0.0, 10.0);
        cam.update();
        assert!(cam.pitch <= PITCH_LIMIT);
        cam.zoom(100.0);
        assert_eq!(cam.distance, MAX_DISTANCE);
        cam.zoom(0.0001);
        assert_eq!(cam.distance, MIN_DISTANCE);
    }

    impl OrbitCamera {
        fn with_enabled(mut self, enabled: bool) -> Self {
            self.enabled = enabled;
            self
        }
    }
}
