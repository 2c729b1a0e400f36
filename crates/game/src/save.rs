//! Save snapshots.
//!
//! A save holds what is needed to put the player back where they were
//! (body motion and view) plus the level's own progress. Encoding is
//! compact binary; where the bytes are stored is up to the caller.

use boxroom_physics::{MotionSnapshot, ViewState};
use serde::{Deserialize, Serialize};

use crate::error::SaveError;
use crate::level::LevelSnapshot;

/// Bumped whenever the layout of [`GameSave`] changes.
pub const SAVE_FORMAT_VERSION: u32 = 1;

/// Everything written to a save slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSave {
    pub version: u32,
    /// Name of the level the save was taken in.
    pub level_name: String,
    pub player: MotionSnapshot,
    pub view: ViewState,
    pub level: LevelSnapshot,
}

impl GameSave {
    pub fn new(level_name: &str, player: MotionSnapshot, view: ViewState, level: LevelSnapshot) -> Self {
        Self {
            version: SAVE_FORMAT_VERSION,
            level_name: level_name.to_string(),
            player,
            view,
            level,
        }
    }

    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, SaveError> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    /// Decode from bytes, rejecting other format versions.
    pub fn decode(data: &[u8]) -> Result<Self, SaveError> {
        let (save, _): (GameSave, usize) = bincode::serde::decode_from_slice(data, bincode::config::standard())?;
        if save.version != SAVE_FORMAT_VERSION {
            return Err(SaveError::Version {
                found: save.version,
                expected: SAVE_FORMAT_VERSION,
            });
        }
        Ok(save)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;

    fn sample() -> GameSave {
        GameSave::new(
            "Button Drop",
            MotionSnapshot {
                position: Vec3::new(1.0, 0.9, -2.0),
                rotation: Quat::IDENTITY,
                linear_velocity: Vec3::new(0.5, -1.0, 0.0),
                angular_velocity: Vec3::ZERO,
            },
            ViewState {
                yaw: 0.3,
                pitch: -0.2,
                eye_offset: 0.5,
            },
            LevelSnapshot {
                door_opened: true,
                wrong_landings: 2,
                block_spawning_enabled: true,
            },
        )
    }

    #[test]
    fn test_encode_decode() {
        let save = sample();
        let bytes = save.encode().unwrap();
        assert_eq!(GameSave::decode(&bytes).unwrap(), save);
    }

    #[test]
    fn test_rejects_other_version() {
        let mut save = sample();
        save.version = SAVE_FORMAT_VERSION + 1;
        let bytes = save.encode().unwrap();

        match GameSave::decode(&bytes) {
            Err(SaveError::Version { found, expected }) => {
                assert_eq!(found, SAVE_FORMAT_VERSION + 1);
                assert_eq!(expected, SAVE_FORMAT_VERSION);
            }
            other => panic!("expected version error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_truncated() {
        let bytes = sample().encode().unwrap();
        assert!(matches!(
            GameSave::decode(&bytes[..bytes.len() / 2]),
            Err(SaveError::Decode(_))
        ));
    }
}
