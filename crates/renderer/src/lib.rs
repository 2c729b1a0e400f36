//! Boxroom Renderer
//!
//! The rendering side of the physics/visual pairing. Nothing here draws
//! pixels: the crate defines the scene-graph surface that the physics core
//! writes transforms into, plus the first-person camera the player
//! controller drives.
//!
//! # Contents
//!
//! - [`SceneGraph`]: box meshes with color, world transform and visibility
//! - [`MeshScene`]: retained in-memory scene graph, used by the headless
//!   driver and by tests
//! - [`FirstPersonCamera`]: eye position plus yaw/pitch view angles
//!
//! A real backend (WebGL, wgpu, ...) implements [`SceneGraph`] and reads
//! the camera each frame.

pub mod camera;
pub mod mesh;

pub use camera::FirstPersonCamera;
pub use mesh::{BoxMesh, Color, MeshId, MeshScene, SceneGraph};
