//! Boxroom Game Logic
//!
//! Everything above the physics core: input folding, the level interface
//! and its concrete rooms, puzzle helpers, saves, and the frame driver.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Simulation                            │
//! │  ┌───────────┐   ┌──────────────┐   ┌──────────────────────┐  │
//! │  │ Input     │──►│ Player       │──►│ ScenePhysics         │  │
//! │  │ State     │   │ Controller   │   │ (step, sync visuals) │  │
//! │  └───────────┘   └──────────────┘   └──────────┬───────────┘  │
//! │                                                ▼              │
//! │                  ┌──────────────┐   ┌──────────────────────┐  │
//! │                  │ Camera       │◄──│ Level update         │  │
//! │                  └──────────────┘   │ (events for the UI)  │  │
//! │                                     └──────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod clock;
pub mod error;
pub mod input;
pub mod level;
pub mod levels;
pub mod mover;
pub mod puzzle;
pub mod save;
pub mod simulation;

// Re-export main types
pub use clock::FrameClock;
pub use error::{GameError, SaveError};
pub use input::{InputState, MovementInput};
pub use level::{AimRay, Level, LevelContext, LevelEvent, LevelFrame, LevelSnapshot};
pub use levels::{ButtonDropConfig, ButtonDropLevel};
pub use save::GameSave;
pub use simulation::{Simulation, SimulationConfig};
