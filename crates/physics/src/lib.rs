//! Boxroom physics core.
//!
//! Rigid-body integration for a first-person puzzle game: a dynamics world
//! behind the [`PhysicsEngine`] trait, paired mesh/body construction,
//! fixed-capacity body pools, a velocity-driven player controller, and the
//! per-scene lifecycle that owns all of it.
//!
//! # Architecture
//!
//! - **World**: [`ScenePhysics`] owns the engine and every body built for a
//!   scene. Bodies are created, moved, pooled and removed only through it.
//! - **Movement**: [`PlayerController`] writes input-driven velocity into
//!   the player body before each step and reports the eye position after.
//!
//! # Frame order
//!
//! 1. `PlayerController::apply_command` (velocity write)
//! 2. `ScenePhysics::step` (clamped, fixed sub-steps)
//! 3. `ScenePhysics::sync_visuals` (bodies onto meshes)
//! 4. camera from `PlayerController::eye_position`

pub mod config;
pub mod error;
pub mod movement;
pub mod world;

// Re-export commonly used types
pub use config::PhysicsConfig;
pub use error::PhysicsError;
pub use movement::{ControllerConfig, LookMode, PlayerCommand, PlayerController, RotationLock, ViewState};
pub use world::{
    BodyHandle, BodyTransform, BoxSpec, LifecycleState, MotionSnapshot, PhysicsEngine, PoolId, PoolSpec,
    PooledHandle, RapierEngine, ScenePhysics, StepReport, SyncReport, TrackedBody, TrackedId,
};
