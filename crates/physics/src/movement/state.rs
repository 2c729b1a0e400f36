//! Per-frame input and view state.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Abstract input for a single frame.
///
/// This is the player's intent after device handling: which way they want
/// to move, how far the pointer moved, and whether they asked to interact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerCommand {
    /// Movement axes, each in [-1, 1].
    /// `x`: strafe (positive = right). `y`: forward (positive = forward).
    pub move_axis: Vec2,

    /// Look delta accumulated since the previous frame.
    /// `x`: horizontal (positive = turn right). `y`: vertical (positive = down).
    pub look_delta: Vec2,

    /// One-shot interact request.
    pub interact: bool,
}

impl PlayerCommand {
    /// Input deflection, capped at one.
    #[inline]
    pub fn move_magnitude(&self) -> f32 {
        self.move_axis.length().min(1.0)
    }

    #[inline]
    pub fn has_look(&self) -> bool {
        self.look_delta != Vec2::ZERO
    }
}

/// Where the player is looking.
///
/// Yaw turns around world +Y and pitch around the view's local X axis. With
/// both at zero the view looks down -Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub yaw: f32,
    pub pitch: f32,
    /// Eye height above the body origin (meters).
    pub eye_offset: f32,
}

impl ViewState {
    pub fn new(eye_offset: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            eye_offset,
        }
    }

    /// View angles as (pitch, yaw, roll).
    pub fn angles(&self) -> Vec3 {
        Vec3::new(self.pitch, self.yaw, 0.0)
    }

    /// Full look direction including pitch.
    pub fn look_direction(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();

        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Look direction flattened onto the ground plane.
    pub fn forward_direction(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(-sin_yaw, 0.0, -cos_yaw)
    }

    /// Horizontal right vector: forward × up.
    pub fn right_direction(&self) -> Vec3 {
        self.forward_direction().cross(Vec3::Y).normalize()
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_view_directions() {
        let mut view = ViewState::default();

        // Facing -Z
        let forward = view.forward_direction();
        assert!(forward.x.abs() < 1e-6);
        assert!((forward.z + 1.0).abs() < 1e-6);
        assert!((view.right_direction() - Vec3::X).length() < 1e-6);

        // Quarter turn left faces -X
        view.yaw = FRAC_PI_2;
        let forward = view.forward_direction();
        assert!((forward.x + 1.0).abs() < 1e-6);
        assert!(forward.z.abs() < 1e-6);
        assert!((view.right_direction() + Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_forward_ignores_pitch() {
        let mut view = ViewState::default();
        view.pitch = 1.2;

        assert_eq!(view.forward_direction().y, 0.0);
        assert!(view.look_direction().y > 0.9);
    }

    #[test]
    fn test_move_magnitude_capped() {
        let command = PlayerCommand {
            move_axis: Vec2::new(1.0, 1.0),
            ..Default::default()
        };
        assert_eq!(command.move_magnitude(), 1.0);

        let command = PlayerCommand {
            move_axis: Vec2::new(0.0, 0.5),
            ..Default::default()
        };
        assert_eq!(command.move_magnitude(), 0.5);
    }
}
