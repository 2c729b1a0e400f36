//! Simulation configuration.
//!
//! Values are in simulation units (meters, seconds, kilograms).

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Configuration for the scene's dynamics world and stepping policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Gravity acceleration (meters/second²).
    pub gravity: Vec3,

    /// Upper bound on the wall-clock delta fed to one step (seconds).
    pub max_frame_delta: f32,

    /// Maximum fixed sub-steps taken in one frame.
    pub max_sub_steps: u32,

    /// Size of one internal sub-step (seconds).
    pub fixed_sub_step: f32,

    /// Where released pool bodies are parked, far outside play bounds.
    pub park_position: Vec3,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
            max_frame_delta: 0.1,
            max_sub_steps: 10,
            fixed_sub_step: 1.0 / 60.0,
            park_position: Vec3::new(0.0, -1000.0, 0.0),
        }
    }
}

impl PhysicsConfig {
    /// Clamp a wall-clock frame delta to the stepping budget.
    ///
    /// Negative or non-finite deltas (clock going backwards, first frame)
    /// clamp to zero.
    pub fn clamp_delta(&self, frame_delta: f32) -> f32 {
        if !frame_delta.is_finite() || frame_delta <= 0.0 {
            return 0.0;
        }
        frame_delta.min(self.max_frame_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PhysicsConfig::default();
        assert_eq!(config.gravity, Vec3::new(0.0, -9.82, 0.0));
        assert_eq!(config.max_sub_steps, 10);
        assert!(config.park_position.y < -100.0);
    }

    #[test]
    fn test_clamp_delta() {
        let config = PhysicsConfig::default();

        assert_eq!(config.clamp_delta(0.016), 0.016);
        assert_eq!(config.clamp_delta(5.0), 0.1);
        assert_eq!(config.clamp_delta(-1.0), 0.0);
        assert_eq!(config.clamp_delta(f32::NAN), 0.0);
    }
}
