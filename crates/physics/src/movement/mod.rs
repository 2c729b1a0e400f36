//! First-person player movement over a dynamic rigid body.
//!
//! The [`PlayerController`] turns abstract input into a horizontal velocity
//! written into the player's body before each step, leaving the vertical
//! component to gravity and contacts. Look input drives a [`ViewState`]
//! owned by the controller, not the body's rotation, so the body can stay
//! upright while the view turns freely.

mod config;
mod controller;
mod state;

pub use config::{ControllerConfig, LookMode, RotationLock};
pub use controller::PlayerController;
pub use state::{PlayerCommand, ViewState};
