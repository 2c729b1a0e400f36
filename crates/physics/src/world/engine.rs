//! The dynamics-world surface the scene is built on.
//!
//! This is the shape of a conventional discrete dynamics world: bodies are
//! created detached, then added to and removed from the world, and the world
//! is advanced with `step_simulation(dt, max_sub_steps, fixed_sub_step)`.
//! [`RapierEngine`](super::RapierEngine) is the implementation used by the
//! game; any other engine exposing the same operations can be substituted.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque reference to a rigid body owned by a [`PhysicsEngine`].
///
/// Handles are never reused by an engine, so a handle to a destroyed body
/// stays invalid forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Rigid-body dynamics world.
///
/// All operations on an unknown or destroyed handle are no-ops (mutators)
/// or return `None`/`false` (queries).
pub trait PhysicsEngine {
    /// Set the world's gravity vector.
    fn set_gravity(&mut self, gravity: Vec3);

    fn gravity(&self) -> Vec3;

    /// Create a box-shaped body at `position` with identity orientation.
    ///
    /// A mass of zero creates a static body. The body starts detached from
    /// the world; call [`add_rigid_body`](Self::add_rigid_body) to simulate it.
    fn create_box_body(&mut self, half_extents: Vec3, mass: f32, position: Vec3) -> BodyHandle;

    /// Free a body. Detaches it from the world first if needed.
    ///
    /// Returns `false` if the handle was unknown.
    fn destroy_body(&mut self, handle: BodyHandle) -> bool;

    /// Register a body with the world. Returns `false` if it was already
    /// registered or is unknown.
    fn add_rigid_body(&mut self, handle: BodyHandle) -> bool;

    /// Unregister a body from the world. Returns `false` if it was not
    /// registered or is unknown.
    fn remove_rigid_body(&mut self, handle: BodyHandle) -> bool;

    /// Whether the body is currently registered with the world.
    fn in_world(&self, handle: BodyHandle) -> bool;

    /// Number of bodies currently registered with the world.
    fn world_body_count(&self) -> usize;

    /// Number of bodies that exist, registered or not.
    fn body_count(&self) -> usize;

    /// Advance the world by `time_step` seconds using at most `max_sub_steps`
    /// internal steps of `fixed_sub_step` seconds each.
    ///
    /// Returns the number of internal steps actually taken.
    fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32, fixed_sub_step: f32) -> u32;

    /// Current world position and orientation.
    fn world_transform(&self, handle: BodyHandle) -> Option<(Vec3, Quat)>;

    /// Overwrite position and orientation. Wakes the body.
    fn set_world_transform(&mut self, handle: BodyHandle, position: Vec3, rotation: Quat);

    fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec3>;

    /// Overwrite linear velocity. Wakes the body.
    fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3);

    fn angular_velocity(&self, handle: BodyHandle) -> Option<Vec3>;

    /// Overwrite angular velocity. Wakes the body.
    fn set_angular_velocity(&mut self, handle: BodyHandle, velocity: Vec3);

    /// Per-axis angular motion factor. A zero component locks rotation
    /// around that world axis.
    fn set_angular_factor(&mut self, handle: BodyHandle, factor: Vec3);

    /// Wake the body so it keeps simulating even if it looks still.
    fn activate(&mut self, handle: BodyHandle);

    /// Whether the body is awake. Static and unknown bodies report `false`.
    fn is_active(&self, handle: BodyHandle) -> bool;

    /// Mass the body was created with (zero for static bodies).
    fn mass(&self, handle: BodyHandle) -> Option<f32>;
}
