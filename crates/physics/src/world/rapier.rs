//! [`PhysicsEngine`] implemented on Rapier.
//!
//! World membership maps onto Rapier's enabled flag: a detached body keeps
//! its slot in the body set but takes no part in broad-phase, solver or
//! queries until it is enabled again.

use std::fmt;

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use super::engine::{BodyHandle, PhysicsEngine};

/// Added before flooring the sub-step count so that e.g. `0.1 / (1/60)`
/// yields six steps despite f32 rounding.
const SUB_STEP_EPSILON: f32 = 1e-4;

/// Bookkeeping for one body created through the engine.
struct BodyRecord {
    handle: RigidBodyHandle,
    mass: f32,
}

/// Rapier-backed discrete dynamics world.
pub struct RapierEngine {
    /// Rapier physics pipeline.
    physics_pipeline: PhysicsPipeline,
    /// Step size and solver parameters.
    integration_parameters: IntegrationParameters,
    /// Island manager (sleeping and activation).
    island_manager: IslandManager,
    /// Broad phase collision detection.
    broad_phase: DefaultBroadPhase,
    /// Narrow phase collision detection.
    narrow_phase: NarrowPhase,
    /// Impulse joints.
    impulse_joint_set: ImpulseJointSet,
    /// Multibody joints.
    multibody_joint_set: MultibodyJointSet,
    /// Continuous collision detection solver.
    ccd_solver: CCDSolver,
    /// Rigid body set.
    rigid_body_set: RigidBodySet,
    /// Collider set.
    collider_set: ColliderSet,
    /// World gravity.
    gravity: Vector<Real>,
    /// Bodies indexed by `BodyHandle`. Slots of destroyed bodies stay `None`.
    records: Vec<Option<BodyRecord>>,
    /// Simulation time not yet consumed by a fixed sub-step.
    local_time: f32,
}

impl RapierEngine {
    /// Create an empty world with zero gravity.
    pub fn new() -> Self {
        Self {
            physics_pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, 0.0, 0.0],
            records: Vec::new(),
            local_time: 0.0,
        }
    }

    fn record(&self, handle: BodyHandle) -> Option<&BodyRecord> {
        self.records.get(handle.0 as usize).and_then(Option::as_ref)
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        let record = self.record(handle)?;
        self.rigid_body_set.get(record.handle)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let rapier_handle = self.record(handle)?.handle;
        self.rigid_body_set.get_mut(rapier_handle)
    }
}

impl Default for RapierEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RapierEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapierEngine")
            .field("bodies", &self.body_count())
            .field("in_world", &self.world_body_count())
            .field("gravity", &self.gravity())
            .finish()
    }
}

impl PhysicsEngine for RapierEngine {
    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = vector![gravity.x, gravity.y, gravity.z];
    }

    fn gravity(&self) -> Vec3 {
        Vec3::new(self.gravity.x, self.gravity.y, self.gravity.z)
    }

    fn create_box_body(&mut self, half_extents: Vec3, mass: f32, position: Vec3) -> BodyHandle {
        let builder = if mass > 0.0 {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let rigid_body = builder
            .translation(vector![position.x, position.y, position.z])
            .enabled(false)
            .build();
        let rapier_handle = self.rigid_body_set.insert(rigid_body);

        // Rapier derives the inertia tensor from the collider's mass
        // properties; static bodies never use it.
        let mut collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z);
        if mass > 0.0 {
            collider = collider.mass(mass);
        }
        self.collider_set
            .insert_with_parent(collider.build(), rapier_handle, &mut self.rigid_body_set);

        let handle = BodyHandle(self.records.len() as u32);
        self.records.push(Some(BodyRecord {
            handle: rapier_handle,
            mass: mass.max(0.0),
        }));
        handle
    }

    fn destroy_body(&mut self, handle: BodyHandle) -> bool {
        let Some(record) = self
            .records
            .get_mut(handle.0 as usize)
            .and_then(Option::take)
        else {
            return false;
        };

        self.rigid_body_set.remove(
            record.handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        true
    }

    fn add_rigid_body(&mut self, handle: BodyHandle) -> bool {
        match self.body_mut(handle) {
            Some(body) if !body.is_enabled() => {
                body.set_enabled(true);
                body.wake_up(true);
                true
            }
            _ => false,
        }
    }

    fn remove_rigid_body(&mut self, handle: BodyHandle) -> bool {
        match self.body_mut(handle) {
            Some(body) if body.is_enabled() => {
                body.set_enabled(false);
                true
            }
            _ => false,
        }
    }

    fn in_world(&self, handle: BodyHandle) -> bool {
        self.body(handle).map_or(false, |body| body.is_enabled())
    }

    fn world_body_count(&self) -> usize {
        self.records
            .iter()
            .flatten()
            .filter_map(|record| self.rigid_body_set.get(record.handle))
            .filter(|body| body.is_enabled())
            .count()
    }

    fn body_count(&self) -> usize {
        self.records.iter().flatten().count()
    }

    fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32, fixed_sub_step: f32) -> u32 {
        if max_sub_steps == 0 || fixed_sub_step <= 0.0 {
            return 0;
        }

        self.local_time += time_step.max(0.0);
        let available = (self.local_time / fixed_sub_step + SUB_STEP_EPSILON).floor() as u32;
        if available == 0 {
            return 0;
        }
        self.local_time = (self.local_time - available as f32 * fixed_sub_step).max(0.0);

        // Time beyond the sub-step budget is dropped rather than carried,
        // otherwise one slow frame would make the next one slower.
        let steps = available.min(max_sub_steps);
        self.integration_parameters.dt = fixed_sub_step;

        for _ in 0..steps {
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
        }

        steps
    }

    fn world_transform(&self, handle: BodyHandle) -> Option<(Vec3, Quat)> {
        let body = self.body(handle)?;
        let pos = body.translation();
        let rot = body.rotation();

        Some((
            Vec3::new(pos.x, pos.y, pos.z),
            Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
        ))
    }

    fn set_world_transform(&mut self, handle: BodyHandle, position: Vec3, rotation: Quat) {
        if let Some(body) = self.body_mut(handle) {
            let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
                rotation.w, rotation.x, rotation.y, rotation.z,
            ));
            let isometry = Isometry::from_parts(
                Translation3::new(position.x, position.y, position.z),
                rotation,
            );
            body.set_position(isometry, true);
        }
    }

    fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        let vel = self.body(handle)?.linvel();
        Some(Vec3::new(vel.x, vel.y, vel.z))
    }

    fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.set_linvel(vector![velocity.x, velocity.y, velocity.z], true);
        }
    }

    fn angular_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        let vel = self.body(handle)?.angvel();
        Some(Vec3::new(vel.x, vel.y, vel.z))
    }

    fn set_angular_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.set_angvel(vector![velocity.x, velocity.y, velocity.z], true);
        }
    }

    fn set_angular_factor(&mut self, handle: BodyHandle, factor: Vec3) {
        if let Some(body) = self.body_mut(handle) {
            body.set_enabled_rotations(factor.x != 0.0, factor.y != 0.0, factor.z != 0.0, true);
        }
    }

    fn activate(&mut self, handle: BodyHandle) {
        if let Some(body) = self.body_mut(handle) {
            body.wake_up(true);
        }
    }

    fn is_active(&self, handle: BodyHandle) -> bool {
        self.body(handle)
            .map_or(false, |body| body.is_dynamic() && body.is_enabled() && !body.is_sleeping())
    }

    fn mass(&self, handle: BodyHandle) -> Option<f32> {
        self.record(handle).map(|record| record.mass)
    }
}
