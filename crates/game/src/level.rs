//! The interface every level implements.
//!
//! A level builds its geometry through [`ScenePhysics`] during `setup`,
//! reads body state after each step in `update`, and reports what happened
//! as [`LevelEvent`]s for the UI. It never owns the physics world and never
//! removes a mesh without its body; both go through the lifecycle's APIs.

use boxroom_physics::ScenePhysics;
use boxroom_renderer::SceneGraph;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Mutable access to the scene's physics and meshes for one call.
pub struct LevelContext<'a> {
    pub physics: &'a mut ScenePhysics,
    pub scene: &'a mut dyn SceneGraph,
}

impl<'a> LevelContext<'a> {
    pub fn new(physics: &'a mut ScenePhysics, scene: &'a mut dyn SceneGraph) -> Self {
        Self { physics, scene }
    }
}

/// A ray from the eye, for aiming at the floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimRay {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl AimRay {
    /// Point where the ray meets the horizontal plane at `height`, if it
    /// points toward it.
    pub fn intersect_horizontal(&self, height: f32) -> Option<Vec3> {
        if self.direction.y.abs() < 1e-6 {
            return None;
        }
        let t = (height - self.origin.y) / self.direction.y;
        (t >= 0.0).then(|| self.origin + self.direction * t)
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// What a level sees each frame besides the physics world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelFrame {
    /// Unclamped wall-clock seconds since the previous frame.
    pub delta: f32,
    /// Interact was requested this frame.
    pub interact: bool,
    /// Where the player is aiming.
    pub aim: AimRay,
}

/// Something the player should hear about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LevelEvent {
    BlockSpawned { position: Vec3 },
    /// Every pooled block is in use; the spawn was refused.
    PoolExhausted,
    BlockDespawned,
    WrongLanding { count: u32, limit: u32 },
    ButtonPressed,
    DoorOpened,
    /// Too many wrong landings; a reset is scheduled.
    Failed { reset_in: f32 },
    Reset,
}

impl LevelEvent {
    /// Transient on-screen text for this event, with how long to show it.
    pub fn message(&self) -> Option<(String, Option<f32>)> {
        match self {
            LevelEvent::PoolExhausted => Some(("No blocks left, wait for one to vanish".to_string(), Some(1.0))),
            LevelEvent::WrongLanding { count, limit } => {
                Some((format!("Wrong spot ({}/{})", count, limit), Some(1.0)))
            }
            LevelEvent::Failed { .. } => Some(("You failed. Restarting...".to_string(), None)),
            LevelEvent::DoorOpened => Some(("Victory!".to_string(), None)),
            _ => None,
        }
    }
}

/// Level progress as saved to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub door_opened: bool,
    pub wrong_landings: u32,
    pub block_spawning_enabled: bool,
}

/// A playable level.
pub trait Level {
    fn name(&self) -> &str;

    /// Where the player body is created.
    fn player_start(&self) -> Vec3;

    /// Build the level's bodies. Called once, before the scene activates.
    fn setup(&mut self, ctx: &mut LevelContext<'_>) -> Result<(), GameError>;

    /// Run puzzle logic for one frame, after the world has stepped.
    fn update(&mut self, ctx: &mut LevelContext<'_>, frame: &LevelFrame) -> Vec<LevelEvent>;

    fn save_state(&self) -> LevelSnapshot;

    fn load_state(&mut self, ctx: &mut LevelContext<'_>, snapshot: &LevelSnapshot);

    /// Back to how `setup` left things.
    fn reset_to_initial_state(&mut self, ctx: &mut LevelContext<'_>);

    /// Return everything the level borrowed from the scene. The lifecycle
    /// removes the bodies themselves afterwards.
    fn dispose(&mut self, ctx: &mut LevelContext<'_>);
}
