//! Scripted motion for static bodies (sliding doors, elevators).

use boxroom_physics::{PhysicsEngine, ScenePhysics, TrackedId};
use boxroom_renderer::SceneGraph;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Moves one static body toward a target at a fixed speed.
///
/// The simulation never moves mass-zero bodies, so each frame the mover
/// repositions the body and its mesh together through
/// [`ScenePhysics::move_static`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicMover {
    body: TrackedId,
    position: Vec3,
    target: Vec3,
    /// Meters per second.
    pub speed: f32,
}

impl KinematicMover {
    pub fn new(body: TrackedId, position: Vec3, speed: f32) -> Self {
        Self {
            body,
            position,
            target: position,
            speed,
        }
    }

    /// Start moving toward `target`.
    pub fn move_to(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Jump straight to `position` and stop there.
    pub fn snap_to<E: PhysicsEngine>(
        &mut self,
        physics: &mut ScenePhysics<E>,
        scene: &mut dyn SceneGraph,
        position: Vec3,
    ) {
        self.position = position;
        self.target = position;
        physics.move_static(scene, self.body, position);
    }

    /// Advance by `delta` seconds. Returns `true` on the frame the target
    /// is reached.
    pub fn update<E: PhysicsEngine>(
        &mut self,
        physics: &mut ScenePhysics<E>,
        scene: &mut dyn SceneGraph,
        delta: f32,
    ) -> bool {
        if self.is_idle() {
            return false;
        }

        let to_target = self.target - self.position;
        let step = self.speed * delta.max(0.0);
        let arrived = to_target.length() <= step;

        self.position = if arrived {
            self.target
        } else {
            self.position + to_target.normalize() * step
        };
        physics.move_static(scene, self.body, self.position);
        arrived
    }

    pub fn is_idle(&self) -> bool {
        self.position == self.target
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn body(&self) -> TrackedId {
        self.body
    }
}
