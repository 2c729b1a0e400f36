//! Game-level errors.

use boxroom_physics::PhysicsError;
use thiserror::Error;

/// Errors raised while encoding or decoding a save.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to encode save: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode save: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("save was written by format version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },
}

/// Errors raised while building or restoring a game.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("physics: {0}")]
    Physics(#[from] PhysicsError),

    #[error("save: {0}")]
    Save(#[from] SaveError),

    #[error("the player body no longer exists")]
    PlayerMissing,

    #[error("save belongs to level {found:?}, current level is {expected:?}")]
    WrongLevel { found: String, expected: String },
}
