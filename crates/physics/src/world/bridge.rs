//! Transform bridge between simulated bodies and their meshes.
//!
//! Reads go from the body's current world transform into the scene graph.
//! Writes (teleports) go the other way and always clear momentum and wake
//! the body, so a repositioned body neither keeps stale velocity nor stays
//! asleep at its new location.

use boxroom_renderer::{MeshId, SceneGraph};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::engine::{BodyHandle, PhysicsEngine};

/// Rigid transform of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl BodyTransform {
    /// Identity orientation at `position`.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Everything persistence needs to restore a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSnapshot {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// Current transform of a body, or `None` for an unknown handle.
pub fn read_transform<E: PhysicsEngine>(engine: &E, body: BodyHandle) -> Option<BodyTransform> {
    engine
        .world_transform(body)
        .map(|(position, rotation)| BodyTransform { position, rotation })
}

/// Position, orientation and both velocities of a body.
pub fn snapshot<E: PhysicsEngine>(engine: &E, body: BodyHandle) -> Option<MotionSnapshot> {
    let (position, rotation) = engine.world_transform(body)?;
    Some(MotionSnapshot {
        position,
        rotation,
        linear_velocity: engine.linear_velocity(body)?,
        angular_velocity: engine.angular_velocity(body)?,
    })
}

/// Move a body to `position` with identity orientation and zero velocity.
pub fn teleport<E: PhysicsEngine>(engine: &mut E, body: BodyHandle, position: Vec3) {
    engine.set_world_transform(body, position, Quat::IDENTITY);
    engine.set_linear_velocity(body, Vec3::ZERO);
    engine.set_angular_velocity(body, Vec3::ZERO);
    engine.activate(body);
}

/// Copy a body's transform onto its mesh.
///
/// Returns `false` if the body no longer exists; the mesh is left as is.
pub fn sync_mesh<E: PhysicsEngine>(
    engine: &E,
    scene: &mut dyn SceneGraph,
    body: BodyHandle,
    mesh: MeshId,
) -> bool {
    match read_transform(engine, body) {
        Some(transform) => {
            scene.set_transform(mesh, transform.position, transform.rotation);
            true
        }
        None => false,
    }
}
