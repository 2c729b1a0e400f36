//! First-person camera for rendering and picking.

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

/// First-person camera state.
///
/// Orientation follows the scene-graph convention: yaw turns around +Y,
/// pitch tilts around the camera's local X axis, and with both at zero the
/// camera looks down -Z.
#[derive(Debug, Clone)]
pub struct FirstPersonCamera {
    /// Eye position in world space.
    pub position: Vec3,

    /// View angles (pitch, yaw, roll) in radians.
    pub angles: Vec3,

    /// Vertical field of view in degrees.
    pub fov: f32,

    pub near: f32,
    pub far: f32,

    /// Viewport width / height.
    pub aspect: f32,
}

impl Default for FirstPersonCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            angles: Vec3::ZERO,
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl FirstPersonCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Match the aspect ratio to a viewport. Degenerate sizes are ignored.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// Orientation as a quaternion (yaw, then pitch, then roll).
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.angles.y, self.angles.x, self.angles.z)
    }

    /// World-to-camera transform. Built from the orientation directly, so
    /// it stays valid looking straight up or down.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Direction the camera looks.
    pub fn forward(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.angles.x.sin_cos();
        let (sin_yaw, cos_yaw) = self.angles.y.sin_cos();

        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Unit direction from the eye through a screen point given in
    /// normalized device coordinates (x right, y up, both in [-1, 1]).
    pub fn screen_direction(&self, ndc: Vec2) -> Vec3 {
        let inverse = self.view_projection_matrix().inverse();
        // Depth 0 is the near plane for `perspective_rh`.
        let on_near_plane = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let direction = (on_near_plane - self.position).normalize_or_zero();

        if direction == Vec3::ZERO || !direction.is_finite() {
            self.forward()
        } else {
            direction
        }
    }

    /// Update camera from player state.
    pub fn update_from_player(&mut self, eye_position: Vec3, view_angles: Vec3) {
        self.position = eye_position;
        self.angles = view_angles;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_forward_direction() {
        let mut camera = FirstPersonCamera::default();

        // Zero angles look down -Z
        assert_close(camera.forward(), Vec3::NEG_Z);

        // Negative yaw turns to the right (+X)
        camera.angles.y = -std::f32::consts::FRAC_PI_2;
        assert_close(camera.forward(), Vec3::X);
    }

    #[test]
    fn test_rotation_matches_forward() {
        let mut camera = FirstPersonCamera::default();
        camera.angles = Vec3::new(0.3, 1.1, 0.0);

        let rotated = camera.rotation() * Vec3::NEG_Z;
        assert_close(rotated, camera.forward());
    }

    #[test]
    fn test_screen_center_is_forward() {
        let mut camera = FirstPersonCamera::new(Vec3::new(1.0, 1.4, 5.0));
        camera.angles = Vec3::new(-0.4, 0.7, 0.0);

        assert_close(camera.screen_direction(Vec2::ZERO), camera.forward());
    }

    #[test]
    fn test_screen_edges_follow_fov() {
        let camera = FirstPersonCamera::new(Vec3::new(0.0, 1.4, 5.0));
        let half_fov = (camera.fov * 0.5).to_radians();

        let top = camera.screen_direction(Vec2::new(0.0, 1.0));
        assert!((top.y.atan2(-top.z) - half_fov).abs() < 1e-3);

        let right = camera.screen_direction(Vec2::new(1.0, 0.0));
        let expected = (half_fov.tan() * camera.aspect).atan();
        assert!((right.x.atan2(-right.z) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_looking_straight_down() {
        let mut camera = FirstPersonCamera::new(Vec3::new(0.0, 3.0, 0.0));
        camera.angles.x = -std::f32::consts::FRAC_PI_2;

        assert_close(camera.screen_direction(Vec2::ZERO), Vec3::NEG_Y);
    }

    #[test]
    fn test_resize() {
        let mut camera = FirstPersonCamera::default();
        camera.resize(800.0, 600.0);
        assert!((camera.aspect - 4.0 / 3.0).abs() < 1e-6);

        camera.resize(0.0, 600.0);
        assert!((camera.aspect - 4.0 / 3.0).abs() < 1e-6);
    }
}
