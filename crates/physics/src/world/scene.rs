//! Scene physics lifecycle.
//!
//! [`ScenePhysics`] owns the dynamics world for one scene together with the
//! table of every body built for that scene, the body pools, and the
//! stepping policy. Level code never touches the engine directly: bodies are
//! built, moved, attached, detached and removed through this type, so the
//! table and the world's actual membership cannot drift apart.
//!
//! ```text
//! Constructing ──activate──▶ Active ──dispose──▶ Disposing ──▶ Disposed
//!      │                                                          ▲
//!      └──────────────────────────dispose─────────────────────────┘
//! ```

use boxroom_renderer::{Color, MeshId, SceneGraph};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::bridge::{self, BodyTransform, MotionSnapshot};
use super::engine::{BodyHandle, PhysicsEngine};
use super::factory::{self, BoxSpec};
use super::pool::{BodyPool, PoolId, PoolSpec, PooledBody, PooledHandle};
use super::rapier::RapierEngine;
use crate::config::PhysicsConfig;
use crate::error::PhysicsError;

/// Lifecycle of a scene's physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// World built, level geometry being created. Not stepping yet.
    Constructing,
    /// Stepping every frame.
    Active,
    /// Teardown in progress.
    Disposing,
    /// Every body has been removed. Terminal.
    Disposed,
}

/// Key into the scene's body table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackedId(pub u32);

/// A mesh and the body it mirrors.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedBody {
    pub mesh: MeshId,
    pub body: BodyHandle,
    /// Dynamic bodies are copied onto their mesh every frame.
    pub needs_sync: bool,
    /// Mirrors the engine's registration of `body`.
    pub in_world: bool,
    /// Full box dimensions.
    pub size: Vec3,
}

/// What one call to [`ScenePhysics::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepReport {
    /// Wall-clock delta as supplied.
    pub frame_delta: f32,
    /// Delta actually handed to the engine.
    pub clamped_delta: f32,
    /// Fixed sub-steps the engine took.
    pub sub_steps: u32,
    /// The scene was not active, nothing was simulated.
    pub skipped: bool,
}

/// Outcome of copying body transforms onto meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub synced: usize,
    /// Bodies whose transform could not be read. Their meshes keep the
    /// previous frame's transform.
    pub failed: usize,
}

/// Physics world and body bookkeeping for one scene.
#[derive(Debug)]
pub struct ScenePhysics<E: PhysicsEngine = RapierEngine> {
    config: PhysicsConfig,
    engine: E,
    state: LifecycleState,
    /// Indexed by `TrackedId`; removed entries stay `None`.
    bodies: Vec<Option<TrackedBody>>,
    pools: Vec<BodyPool>,
}

impl ScenePhysics<RapierEngine> {
    /// Build a Rapier world configured from `config`.
    pub fn new(config: PhysicsConfig) -> Self {
        Self::with_engine(RapierEngine::new(), config)
    }
}

impl<E: PhysicsEngine> ScenePhysics<E> {
    /// Take ownership of `engine` and apply the configured gravity.
    pub fn with_engine(mut engine: E, config: PhysicsConfig) -> Self {
        engine.set_gravity(config.gravity);
        log::debug!("scene physics constructing, gravity {:?}", config.gravity);

        Self {
            config,
            engine,
            state: LifecycleState::Constructing,
            bodies: Vec::new(),
            pools: Vec::new(),
        }
    }

    /// Start stepping. Only valid once, from `Constructing`.
    pub fn activate(&mut self) -> Result<(), PhysicsError> {
        if self.state != LifecycleState::Constructing {
            return Err(PhysicsError::WrongState(self.state));
        }
        self.state = LifecycleState::Active;
        log::debug!(
            "scene physics active with {} bodies in world",
            self.engine.world_body_count()
        );
        Ok(())
    }

    fn accepts_bodies(&self) -> Result<(), PhysicsError> {
        match self.state {
            LifecycleState::Constructing | LifecycleState::Active => Ok(()),
            state => Err(PhysicsError::WrongState(state)),
        }
    }

    // ------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------

    /// Build a mesh + body pair, register the body and track both.
    pub fn create_body(&mut self, scene: &mut dyn SceneGraph, spec: &BoxSpec) -> Result<TrackedId, PhysicsError> {
        self.accepts_bodies()?;

        let built = factory::create_body(&mut self.engine, scene, spec)?;
        let id = TrackedId(self.bodies.len() as u32);
        self.bodies.push(Some(TrackedBody {
            mesh: built.mesh,
            body: built.body,
            needs_sync: spec.is_dynamic(),
            in_world: true,
            size: spec.size,
        }));
        Ok(id)
    }

    /// Unregister, free and forget a body and its mesh in one go.
    ///
    /// Returns `false` if `id` was already removed.
    pub fn remove_body(&mut self, scene: &mut dyn SceneGraph, id: TrackedId) -> bool {
        let Some(tracked) = self.bodies.get_mut(id.0 as usize).and_then(Option::take) else {
            log::debug!("remove_body: {:?} already removed", id);
            return false;
        };

        if tracked.in_world {
            self.engine.remove_rigid_body(tracked.body);
        }
        self.engine.destroy_body(tracked.body);
        scene.remove(tracked.mesh);
        true
    }

    /// Attach or detach a tracked body without destroying it. The mesh is
    /// shown exactly when the body is in the world.
    ///
    /// Returns `false` if `id` is unknown or already in the requested state.
    pub fn set_body_in_world(&mut self, scene: &mut dyn SceneGraph, id: TrackedId, in_world: bool) -> bool {
        let Some(tracked) = self.bodies.get_mut(id.0 as usize).and_then(Option::as_mut) else {
            log::warn!("set_body_in_world: unknown body {:?}", id);
            return false;
        };
        if tracked.in_world == in_world {
            return false;
        }

        if in_world {
            self.engine.add_rigid_body(tracked.body);
        } else {
            self.engine.remove_rigid_body(tracked.body);
        }
        tracked.in_world = in_world;
        scene.set_visible(tracked.mesh, in_world);
        true
    }

    /// Move a static body and its mesh together.
    ///
    /// The simulation never moves static bodies, so scripted motion (doors,
    /// elevators) goes through here. Returns `false` for unknown or dynamic
    /// bodies.
    pub fn move_static(&mut self, scene: &mut dyn SceneGraph, id: TrackedId, position: Vec3) -> bool {
        let Some(tracked) = self.tracked(id) else {
            return false;
        };
        if tracked.needs_sync {
            log::warn!("move_static: {:?} is dynamic, use teleport", id);
            return false;
        }

        let (body, mesh) = (tracked.body, tracked.mesh);
        self.engine.set_world_transform(body, position, Quat::IDENTITY);
        scene.set_transform(mesh, position, Quat::IDENTITY);
        true
    }

    // ------------------------------------------------------------------
    // Pools
    // ------------------------------------------------------------------

    /// Preallocate a pool. Its bodies start parked and detached.
    pub fn create_pool(&mut self, scene: &mut dyn SceneGraph, spec: PoolSpec) -> Result<PoolId, PhysicsError> {
        self.accepts_bodies()?;

        let id = PoolId(self.pools.len() as u32);
        let pool = BodyPool::preallocate(id, spec, self.config.park_position, &mut self.engine, scene)?;
        self.pools.push(pool);
        Ok(id)
    }

    /// Take a body from `pool` at `position`, or `None` if the pool is
    /// exhausted or the scene is being torn down.
    pub fn acquire(
        &mut self,
        scene: &mut dyn SceneGraph,
        pool: PoolId,
        position: Vec3,
        color: Color,
    ) -> Option<PooledHandle> {
        if self.accepts_bodies().is_err() {
            log::warn!("acquire from {:?} while {:?}", pool, self.state);
            return None;
        }
        self.pools
            .get_mut(pool.0 as usize)?
            .acquire(&mut self.engine, scene, position, color)
    }

    /// Return a pooled body. Stale handles are ignored.
    pub fn release(&mut self, scene: &mut dyn SceneGraph, handle: PooledHandle) -> bool {
        match self.pools.get_mut(handle.pool.0 as usize) {
            Some(pool) => pool.release(&mut self.engine, scene, handle),
            None => false,
        }
    }

    pub fn pool(&self, id: PoolId) -> Option<&BodyPool> {
        self.pools.get(id.0 as usize)
    }

    /// The slot behind a live pooled handle.
    pub fn pooled(&self, handle: PooledHandle) -> Option<&PooledBody> {
        self.pool(handle.pool)?.get(handle)
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Advance the world by one frame's worth of wall-clock time.
    ///
    /// The delta is clamped to `max_frame_delta` before stepping so a stall
    /// (backgrounded window, debugger) costs at most one bounded step.
    pub fn step(&mut self, frame_delta: f32) -> StepReport {
        if self.state != LifecycleState::Active {
            log::warn!("step skipped while {:?}", self.state);
            return StepReport {
                frame_delta,
                skipped: true,
                ..Default::default()
            };
        }

        let clamped_delta = self.config.clamp_delta(frame_delta);
        let sub_steps =
            self.engine
                .step_simulation(clamped_delta, self.config.max_sub_steps, self.config.fixed_sub_step);

        if clamped_delta < frame_delta {
            log::debug!("frame delta {:.3}s clamped to {:.3}s", frame_delta, clamped_delta);
        }
        log::trace!("stepped {} sub-steps", sub_steps);

        StepReport {
            frame_delta,
            clamped_delta,
            sub_steps,
            skipped: false,
        }
    }

    /// Copy every simulated body's transform onto its mesh.
    ///
    /// A body that cannot be read is counted and skipped; the rest of the
    /// scene is still synced.
    pub fn sync_visuals(&self, scene: &mut dyn SceneGraph) -> SyncReport {
        let mut report = SyncReport::default();

        let tracked = self
            .bodies
            .iter()
            .flatten()
            .filter(|tracked| tracked.needs_sync && tracked.in_world)
            .map(|tracked| (tracked.body, tracked.mesh));
        let pooled = self
            .pools
            .iter()
            .flat_map(BodyPool::in_use)
            .map(|slot| (slot.body, slot.mesh));

        for (body, mesh) in tracked.chain(pooled) {
            if bridge::sync_mesh(&self.engine, scene, body, mesh) {
                report.synced += 1;
            } else {
                log::warn!("sync: body {:?} has no transform", body);
                report.failed += 1;
            }
        }

        report
    }

    /// Tear down every body and pool.
    ///
    /// Each tracked body is unregistered and freed exactly once. Calling
    /// this again is a no-op returning zero.
    pub fn dispose(&mut self, scene: &mut dyn SceneGraph) -> usize {
        match self.state {
            LifecycleState::Disposing | LifecycleState::Disposed => {
                log::debug!("dispose: already {:?}", self.state);
                return 0;
            }
            LifecycleState::Constructing | LifecycleState::Active => {}
        }
        self.state = LifecycleState::Disposing;

        let mut removed = 0;
        for index in 0..self.bodies.len() {
            if self.remove_body(scene, TrackedId(index as u32)) {
                removed += 1;
            }
        }
        self.bodies.clear();

        for pool in &mut self.pools {
            removed += pool.dispose(&mut self.engine, scene);
        }
        self.pools.clear();

        self.state = LifecycleState::Disposed;
        log::debug!("scene physics disposed, {} bodies removed", removed);
        removed
    }

    // ------------------------------------------------------------------
    // Body access
    // ------------------------------------------------------------------

    pub fn tracked(&self, id: TrackedId) -> Option<&TrackedBody> {
        self.bodies.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn body_of(&self, id: TrackedId) -> Option<BodyHandle> {
        self.tracked(id).map(|tracked| tracked.body)
    }

    pub fn mesh_of(&self, id: TrackedId) -> Option<MeshId> {
        self.tracked(id).map(|tracked| tracked.mesh)
    }

    /// Number of live tracked bodies (pool slots excluded).
    pub fn tracked_count(&self) -> usize {
        self.bodies.iter().flatten().count()
    }

    /// Whether `body` is currently registered with the world.
    pub fn is_registered(&self, body: BodyHandle) -> bool {
        self.engine.in_world(body)
    }

    /// Whether `body` exists at all, registered or not.
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.engine.world_transform(body).is_some()
    }

    pub fn mass(&self, body: BodyHandle) -> Option<f32> {
        self.engine.mass(body)
    }

    pub fn transform(&self, body: BodyHandle) -> Option<BodyTransform> {
        bridge::read_transform(&self.engine, body)
    }

    pub fn snapshot(&self, body: BodyHandle) -> Option<MotionSnapshot> {
        bridge::snapshot(&self.engine, body)
    }

    pub fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.engine.linear_velocity(body)
    }

    pub fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        self.engine.set_linear_velocity(body, velocity);
    }

    pub fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.engine.angular_velocity(body)
    }

    pub fn set_angular_velocity(&mut self, body: BodyHandle, velocity: Vec3) {
        self.engine.set_angular_velocity(body, velocity);
    }

    pub fn set_angular_factor(&mut self, body: BodyHandle, factor: Vec3) {
        self.engine.set_angular_factor(body, factor);
    }

    pub fn wake(&mut self, body: BodyHandle) {
        self.engine.activate(body);
    }

    pub fn is_awake(&self, body: BodyHandle) -> bool {
        self.engine.is_active(body)
    }

    /// Reposition a body with identity orientation and no momentum.
    ///
    /// Static bodies are never synced, so their mesh is moved here too.
    /// Returns `false` for an unknown body.
    pub fn teleport(&mut self, scene: &mut dyn SceneGraph, body: BodyHandle, position: Vec3) -> bool {
        if !self.contains(body) {
            log::warn!("teleport: unknown body {:?}", body);
            return false;
        }
        bridge::teleport(&mut self.engine, body, position);
        self.place_static_mesh(scene, body, position, Quat::IDENTITY);
        true
    }

    /// Restore a saved motion state: teleport, then reapply velocities.
    pub fn restore(&mut self, scene: &mut dyn SceneGraph, body: BodyHandle, snapshot: &MotionSnapshot) -> bool {
        if !self.contains(body) {
            log::warn!("restore: unknown body {:?}", body);
            return false;
        }
        self.engine
            .set_world_transform(body, snapshot.position, snapshot.rotation);
        self.engine.set_linear_velocity(body, snapshot.linear_velocity);
        self.engine.set_angular_velocity(body, snapshot.angular_velocity);
        self.engine.activate(body);
        self.place_static_mesh(scene, body, snapshot.position, snapshot.rotation);
        true
    }

    fn place_static_mesh(&self, scene: &mut dyn SceneGraph, body: BodyHandle, position: Vec3, rotation: Quat) {
        let mesh = self
            .bodies
            .iter()
            .flatten()
            .find(|tracked| tracked.body == body && !tracked.needs_sync)
            .map(|tracked| tracked.mesh);
        if let Some(mesh) = mesh {
            scene.set_transform(mesh, position, rotation);
        }
    }

    pub fn world_body_count(&self) -> usize {
        self.engine.world_body_count()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Read-only view of the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: PhysicsEngine> Drop for ScenePhysics<E> {
    fn drop(&mut self) {
        if !matches!(self.state, LifecycleState::Disposed) && self.engine.body_count() > 0 {
            log::warn!(
                "scene physics dropped while {:?} with {} bodies; call dispose first",
                self.state,
                self.engine.body_count()
            );
        }
    }
}
