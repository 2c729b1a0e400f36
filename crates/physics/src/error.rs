//! Errors raised by the physics core.
//!
//! Only programmer errors surface here: bad body dimensions, a controller
//! built over a body that is not simulated, or construction after the
//! scene has been torn down. Stale handles and repeated cleanup are not
//! errors; those operations report `false`/`None` instead.

use glam::Vec3;
use thiserror::Error;

use crate::world::{BodyHandle, LifecycleState};

/// Errors that can occur while building or driving the physics scene.
#[derive(Debug, Error, PartialEq)]
pub enum PhysicsError {
    #[error("box size must be positive and finite on every axis, got {0}")]
    InvalidSize(Vec3),

    #[error("body mass must be finite and non-negative, got {0}")]
    InvalidMass(f32),

    #[error("pool capacity must be at least one")]
    EmptyPool,

    #[error("operation not allowed while the scene is {0:?}")]
    WrongState(LifecycleState),

    #[error("body {0:?} is not known to the simulation")]
    UnknownBody(BodyHandle),

    #[error("body {0:?} is not registered with the simulation world")]
    BodyNotInWorld(BodyHandle),

    #[error("player body {0:?} is static; the controller needs a dynamic body")]
    StaticPlayerBody(BodyHandle),

    #[error("invalid controller config: {0}")]
    InvalidControllerConfig(&'static str),
}
