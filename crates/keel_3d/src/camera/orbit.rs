//! Orbit camera controller
//!
//! Keeps an explicit camera position and target, like a turntable viewer.
//! Rotation and zoom work in spherical coordinates around the target and
//! are clamped to the active [`OrbitBounds`]. Panning slides camera and
//! target together and may hold the camera height fixed.

use super::{CameraTransform, OrbitBounds, TARGET_HEIGHT};
use keel_core::{Quat, Vec2, Vec3};

/// Orbit camera controller
///
/// # Example
///
/// ```ignore
/// let mut orbit = OrbitController::new(OrbitBounds::OCEAN);
/// orbit.recenter(Vec2::new(0.0, 1.5));
/// let transform = orbit.update();
/// ```
#[derive(Clone, Debug)]
pub struct OrbitController {
    /// Camera position
    pub position: Vec3,
    /// Point to orbit around
    pub target: Vec3,
    bounds: OrbitBounds,

    /// Rotation sensitivity (radians per pixel)
    pub rotation_speed: f32,
    /// Zoom sensitivity (fraction of distance per wheel unit)
    pub zoom_speed: f32,
    /// Pan sensitivity (world units per pixel, scaled by distance)
    pub pan_speed: f32,

    /// Enable rotation
    pub rotate_enabled: bool,
    /// Enable zooming
    pub zoom_enabled: bool,
    /// Enable panning
    pub pan_enabled: bool,

    /// Camera height held while a pan gesture is active
    frozen_height: Option<f32>,
}

impl OrbitController {
    /// Create a controller looking at the origin from the middle of `bounds`
    pub fn new(bounds: OrbitBounds) -> Self {
        let mut orbit = Self {
            position: Vec3::ZERO,
            target: Vec3::new(0.0, TARGET_HEIGHT, 0.0),
            bounds,
            rotation_speed: 0.005,
            zoom_speed: 0.1,
            pan_speed: 0.002,
            rotate_enabled: true,
            zoom_enabled: true,
            pan_enabled: true,
            frozen_height: None,
        };
        let polar = (bounds.min_polar + bounds.max_polar) * 0.5;
        let distance = (bounds.min_distance + bounds.max_distance) * 0.5;
        orbit.set_spherical(distance, polar, std::f32::consts::FRAC_PI_4);
        orbit
    }

    pub fn bounds(&self) -> OrbitBounds {
        self.bounds
    }

    /// Switch bound profile and pull the camera back inside it
    pub fn set_bounds(&mut self, bounds: OrbitBounds) {
        self.bounds = bounds;
        if !self.is_panning() {
            self.clamp_to_bounds();
        }
    }

    /// Distance, polar angle and azimuth of the camera around the target
    pub fn spherical(&self) -> (f32, f32, f32) {
        let offset = self.position - self.target;
        let distance = offset.length();
        if distance < 1e-6 {
            return (0.0, 0.0, 0.0);
        }
        let polar = (offset.y / distance).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);
        (distance, polar, azimuth)
    }

    /// Place the camera on the orbit, clamped to the bounds
    pub fn set_spherical(&mut self, distance: f32, polar: f32, azimuth: f32) {
        let distance = self.bounds.clamp_distance(distance);
        let polar = self.bounds.clamp_polar(polar);
        let (sin_p, cos_p) = polar.sin_cos();
        let (sin_a, cos_a) = azimuth.sin_cos();
        self.position = Vec3::new(
            self.target.x + distance * sin_p * sin_a,
            self.target.y + distance * cos_p,
            self.target.z + distance * sin_p * cos_a,
        );
    }

    fn clamp_to_bounds(&mut self) {
        let (distance, polar, azimuth) = self.spherical();
        self.set_spherical(distance, polar, azimuth);
    }

    /// Move the target to the hull's horizontal center at the fixed height
    pub fn recenter(&mut self, center: Vec2) {
        self.target = Vec3::new(center.x, TARGET_HEIGHT, center.y);
    }

    /// Orbit by a pointer delta in pixels
    pub fn rotate(&mut self, delta: Vec2) {
        if !self.rotate_enabled {
            return;
        }
        let (distance, polar, azimuth) = self.spherical();
        self.set_spherical(
            distance,
            polar - delta.y * self.rotation_speed,
            azimuth - delta.x * self.rotation_speed,
        );
    }

    /// Zoom by a wheel delta, positive zooms in
    pub fn zoom(&mut self, delta: f32) {
        if !self.zoom_enabled || delta == 0.0 {
            return;
        }
        let (distance, polar, azimuth) = self.spherical();
        self.set_spherical(distance - delta * self.zoom_speed * distance, polar, azimuth);
    }

    /// Slide camera and target in the horizontal plane by a pointer delta
    pub fn pan(&mut self, delta: Vec2) {
        if !self.pan_enabled {
            return;
        }
        let (distance, _, azimuth) = self.spherical();
        let scale = self.pan_speed * distance.max(1.0);
        let right = Vec3::new(azimuth.cos(), 0.0, -azimuth.sin());
        let forward = Vec3::new(-azimuth.sin(), 0.0, -azimuth.cos());
        let offset = right * (-delta.x * scale) + forward * (delta.y * scale);

        self.position = self.position + offset;
        self.target = self.target + offset;
        if let Some(height) = self.frozen_height {
            self.position.y = height;
        }
    }

    /// Start a pan-only gesture: rotate and zoom off, camera height held
    pub fn begin_pan(&mut self) {
        if self.frozen_height.is_none() {
            self.frozen_height = Some(self.position.y);
        }
        self.rotate_enabled = false;
        self.zoom_enabled = false;
    }

    /// End a pan-only gesture
    pub fn end_pan(&mut self) {
        self.frozen_height = None;
        self.rotate_enabled = true;
        self.zoom_enabled = true;
    }

    pub fn is_panning(&self) -> bool {
        self.frozen_height.is_some()
    }

    /// Current camera transform
    ///
    /// Outside a pan gesture the camera is pulled back inside the bounds,
    /// which matters after [`recenter`](Self::recenter) moved the target.
    pub fn update(&mut self) -> CameraTransform {
        match self.frozen_height {
            Some(height) => self.position.y = height,
            None => self.clamp_to_bounds(),
        }

        let direction = self.target - self.position;
        let rotation = if direction.length() < 1e-6 {
            Quat::IDENTITY
        } else {
            Quat::look_rotation(direction, Vec3::UP)
        };
        CameraTransform {
            position: self.position,
            rotation,
            target: self.target,
        }
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(OrbitBounds::OCEAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_starts_inside_bounds() {
        let orbit = OrbitController::new(OrbitBounds::OCEAN);
        let (distance, polar, _) = orbit.spherical();
        assert!((distance - 6.5).abs() < EPS);
        assert!(polar >= OrbitBounds::OCEAN.min_polar - EPS);
        assert!(polar <= OrbitBounds::OCEAN.max_polar + EPS);
    }

    #[test]
    fn test_rotate_clamps_polar() {
        let mut orbit = OrbitController::default();
        orbit.rotate(Vec2::new(0.0, 10_000.0));
        let (_, polar, _) = orbit.spherical();
        assert!((polar - OrbitBounds::OCEAN.min_polar).abs() < EPS);
        orbit.rotate(Vec2::new(0.0, -10_000.0));
        let (_, polar, _) = orbit.spherical();
        assert!((polar - OrbitBounds::OCEAN.max_polar).abs() < EPS);
    }

    #[test]
    fn test_zoom_clamps_distance() {
        let mut orbit = OrbitController::default();
        for _ in 0..100 {
            orbit.zoom(1.0);
        }
        assert!((orbit.spherical().0 - OrbitBounds::OCEAN.min_distance).abs() < EPS);
        for _ in 0..100 {
            orbit.zoom(-1.0);
        }
        assert!((orbit.spherical().0 - OrbitBounds::OCEAN.max_distance).abs() < EPS);
    }

    #[test]
    fn test_switching_profile_pulls_camera_in() {
        let mut orbit = OrbitController::new(OrbitBounds::DRY_DOCK);
        for _ in 0..100 {
            orbit.zoom(-1.0);
        }
        orbit.set_bounds(OrbitBounds::OCEAN);
        assert!(orbit.spherical().0 <= OrbitBounds::OCEAN.max_distance + EPS);
    }

    #[test]
    fn test_recenter_pins_target_height() {
        let mut orbit = OrbitController::default();
        orbit.recenter(Vec2::new(2.0, -3.0));
        let transform = orbit.update();
        assert_eq!(transform.target, Vec3::new(2.0, TARGET_HEIGHT, -3.0));
    }

    #[test]
    fn test_pan_holds_height_and_disables_rotate() {
        let mut orbit = OrbitController::default();
        let height = orbit.position.y;
        orbit.begin_pan();
        orbit.rotate(Vec2::new(50.0, 50.0));
        orbit.zoom(3.0);
        assert_eq!(orbit.position.y, height);
        for i in 0..20 {
            orbit.pan(Vec2::new(i as f32 * 3.0, -(i as f32) * 7.0));
            orbit.recenter(Vec2::new(0.5, 0.5));
            orbit.update();
            assert!((orbit.position.y - height).abs() < EPS);
        }
        orbit.end_pan();
        assert!(orbit.rotate_enabled && orbit.zoom_enabled);
    }

    #[test]
    fn test_camera_looks_at_target() {
        let mut orbit = OrbitController::default();
        let transform = orbit.update();
        let forward = transform.rotation.rotate_vec3(Vec3::new(0.0, 0.0, -1.0));
        let expected = (transform.target - transform.position).normalize();
        assert!((forward - expected).length() < 1e-3);
    }
}
