//! Player controller tuning.
//!
//! Two presets cover the control schemes the game ships with: desktop
//! mouse-look and touch, where vertical swipes raise or lower the eye
//! instead of pitching the view.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::PhysicsError;

/// What the vertical look axis does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LookMode {
    /// Rotate the view up and down, clamped to `pitch_limit`.
    Pitch,

    /// Leave pitch alone and move the eye up and down instead.
    HeightPan {
        /// Meters of eye travel per unit of look delta.
        speed: f32,
        /// Lowest eye offset above the body origin (meters).
        min_offset: f32,
        /// Highest eye offset above the body origin (meters).
        max_offset: f32,
    },
}

/// Which rotations the player body may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationLock {
    /// Only spin around the vertical axis; never tips over.
    YawOnly,
    /// No rotation at all.
    Full,
}

impl RotationLock {
    /// Per-axis angular factor to hand to the engine.
    pub fn angular_factor(self) -> Vec3 {
        match self {
            RotationLock::YawOnly => Vec3::Y,
            RotationLock::Full => Vec3::ZERO,
        }
    }
}

/// Configuration for [`PlayerController`](super::PlayerController).
///
/// Distances in meters, speeds in meters/second, angles in radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Horizontal speed at full input deflection.
    pub move_speed: f32,

    /// Radians of rotation per unit of look delta (pixels for a mouse).
    pub look_sensitivity: f32,

    /// Input magnitude below which the player is treated as idle.
    pub deadzone: f32,

    /// Multiplier applied to horizontal velocity on idle frames.
    ///
    /// Close to zero: a near-instant stop with a hint of slide.
    pub idle_damping: f32,

    /// Eye height above the body origin.
    pub eye_offset: f32,

    /// Largest absolute pitch.
    pub pitch_limit: f32,

    pub look_mode: LookMode,

    pub rotation_lock: RotationLock,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

impl ControllerConfig {
    /// Mouse-look: vertical look pitches the view.
    pub fn desktop() -> Self {
        Self {
            move_speed: 5.0,
            look_sensitivity: 0.002,
            deadzone: 0.05,
            idle_damping: 0.1,
            eye_offset: 0.5,
            pitch_limit: std::f32::consts::FRAC_PI_2,
            look_mode: LookMode::Pitch,
            rotation_lock: RotationLock::Full,
        }
    }

    /// Touch: vertical swipes pan the eye height.
    pub fn touch() -> Self {
        Self {
            look_mode: LookMode::HeightPan {
                speed: 0.01,
                min_offset: 0.2,
                max_offset: 1.5,
            },
            rotation_lock: RotationLock::YawOnly,
            ..Self::desktop()
        }
    }

    /// Reject tuning the controller cannot run with.
    ///
    /// Every bound used to clamp the view must be finite and ordered, so
    /// per-frame updates never see an empty range.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let finite = [
            self.move_speed,
            self.look_sensitivity,
            self.deadzone,
            self.idle_damping,
            self.eye_offset,
            self.pitch_limit,
        ];
        if finite.iter().any(|value| !value.is_finite()) {
            return Err(PhysicsError::InvalidControllerConfig("values must be finite"));
        }
        if self.move_speed < 0.0 {
            return Err(PhysicsError::InvalidControllerConfig("move_speed must not be negative"));
        }
        if self.deadzone < 0.0 {
            return Err(PhysicsError::InvalidControllerConfig("deadzone must not be negative"));
        }
        if !(0.0..1.0).contains(&self.idle_damping) {
            return Err(PhysicsError::InvalidControllerConfig("idle_damping must be in [0, 1)"));
        }
        if self.pitch_limit < 0.0 {
            return Err(PhysicsError::InvalidControllerConfig("pitch_limit must not be negative"));
        }

        if let LookMode::HeightPan {
            speed,
            min_offset,
            max_offset,
        } = self.look_mode
        {
            if !(speed.is_finite() && min_offset.is_finite() && max_offset.is_finite()) {
                return Err(PhysicsError::InvalidControllerConfig("height pan values must be finite"));
            }
            if min_offset > max_offset {
                return Err(PhysicsError::InvalidControllerConfig(
                    "height pan min_offset exceeds max_offset",
                ));
            }
        }
        Ok(())
    }
}
