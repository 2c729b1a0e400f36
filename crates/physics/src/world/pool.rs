//! Fixed-capacity pool of dynamic box bodies.
//!
//! Slots are built once, up front, and then cycle between two states for
//! the rest of the scene:
//!
//! - **released**: parked far below the level, mesh hidden, body detached
//!   from the world so it costs nothing in the broadphase and cannot be
//!   seen by landing checks;
//! - **acquired**: teleported to the spawn point with zero velocity, body
//!   registered, mesh visible.
//!
//! The pool never grows. When every slot is in use, `acquire` returns
//! `None` and the caller decides what to tell the player.

use boxroom_renderer::{Color, MeshId, SceneGraph};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::bridge;
use super::engine::{BodyHandle, PhysicsEngine};
use super::factory::{self, BoxSpec};
use crate::error::PhysicsError;

/// Shape of every body in a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSpec {
    /// Number of slots, fixed for the lifetime of the pool.
    pub capacity: usize,

    /// Full box dimensions (meters).
    pub size: Vec3,

    /// Mass of each body. Must be positive.
    pub mass: f32,
}

impl PoolSpec {
    /// Pool of unit-mass cubes.
    pub fn cubes(capacity: usize, edge: f32) -> Self {
        Self {
            capacity,
            size: Vec3::splat(edge),
            mass: 1.0,
        }
    }
}

/// Identifies a pool within one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolId(pub u32);

/// Reference to one acquisition of a pool slot.
///
/// The generation is bumped on every acquire, so a handle kept after its
/// slot was released (and possibly handed out again) no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PooledHandle {
    pub pool: PoolId,
    pub slot: u32,
    pub generation: u32,
}

/// One preallocated slot.
#[derive(Debug, Clone, PartialEq)]
pub struct PooledBody {
    pub mesh: MeshId,
    pub body: BodyHandle,
    pub in_use: bool,
    generation: u32,
}

impl PooledBody {
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A fixed set of reusable dynamic bodies.
#[derive(Debug)]
pub struct BodyPool {
    id: PoolId,
    spec: PoolSpec,
    slots: Vec<PooledBody>,
    park_position: Vec3,
    disposed: bool,
}

impl BodyPool {
    /// Build every slot, detached and parked.
    pub(crate) fn preallocate<E: PhysicsEngine>(
        id: PoolId,
        spec: PoolSpec,
        park_position: Vec3,
        engine: &mut E,
        scene: &mut dyn SceneGraph,
    ) -> Result<Self, PhysicsError> {
        if spec.capacity == 0 {
            return Err(PhysicsError::EmptyPool);
        }
        if !spec.mass.is_finite() || spec.mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(spec.mass));
        }

        let template = BoxSpec::new(spec.size, spec.mass, park_position, Color::WHITE).hidden();
        template.validate()?;

        let mut slots = Vec::with_capacity(spec.capacity);
        for _ in 0..spec.capacity {
            let built = factory::create_detached(engine, scene, &template)?;
            slots.push(PooledBody {
                mesh: built.mesh,
                body: built.body,
                in_use: false,
                generation: 0,
            });
        }

        log::debug!("pool {:?}: preallocated {} bodies", id, spec.capacity);

        Ok(Self {
            id,
            spec,
            slots,
            park_position,
            disposed: false,
        })
    }

    /// Hand out the first free slot, placed at `position` with zero velocity.
    pub(crate) fn acquire<E: PhysicsEngine>(
        &mut self,
        engine: &mut E,
        scene: &mut dyn SceneGraph,
        position: Vec3,
        color: Color,
    ) -> Option<PooledHandle> {
        if self.disposed {
            log::warn!("pool {:?}: acquire after dispose", self.id);
            return None;
        }

        let Some(index) = self.slots.iter().position(|slot| !slot.in_use) else {
            log::warn!("pool {:?}: exhausted ({} in use)", self.id, self.slots.len());
            return None;
        };

        let slot = &mut self.slots[index];
        slot.in_use = true;
        slot.generation = slot.generation.wrapping_add(1);

        // Reposition before attaching so the body never appears at the
        // parking spot inside the world.
        bridge::teleport(engine, slot.body, position);
        engine.add_rigid_body(slot.body);

        scene.set_color(slot.mesh, color);
        scene.set_transform(slot.mesh, position, glam::Quat::IDENTITY);
        scene.set_visible(slot.mesh, true);

        Some(PooledHandle {
            pool: self.id,
            slot: index as u32,
            generation: slot.generation,
        })
    }

    /// Return a slot to the pool. Returns `false` if the handle is stale or
    /// the slot is already released.
    pub(crate) fn release<E: PhysicsEngine>(
        &mut self,
        engine: &mut E,
        scene: &mut dyn SceneGraph,
        handle: PooledHandle,
    ) -> bool {
        let Some(index) = self.resolve(handle) else {
            log::debug!("pool {:?}: ignoring release of {:?}", self.id, handle);
            return false;
        };
        self.park(index, engine, scene);
        true
    }

    /// Release every acquired slot and free all bodies and meshes.
    ///
    /// Returns the number of bodies freed; zero on repeated calls.
    pub(crate) fn dispose<E: PhysicsEngine>(&mut self, engine: &mut E, scene: &mut dyn SceneGraph) -> usize {
        if self.disposed {
            return 0;
        }

        for index in 0..self.slots.len() {
            if self.slots[index].in_use {
                self.park(index, engine, scene);
            }
        }

        let mut freed = 0;
        for slot in self.slots.drain(..) {
            if engine.destroy_body(slot.body) {
                freed += 1;
            }
            scene.remove(slot.mesh);
        }

        self.disposed = true;
        log::debug!("pool {:?}: disposed {} bodies", self.id, freed);
        freed
    }

    fn park<E: PhysicsEngine>(&mut self, index: usize, engine: &mut E, scene: &mut dyn SceneGraph) {
        let slot = &mut self.slots[index];
        slot.in_use = false;

        engine.remove_rigid_body(slot.body);
        bridge::teleport(engine, slot.body, self.park_position);

        scene.set_visible(slot.mesh, false);
        scene.set_transform(slot.mesh, self.park_position, glam::Quat::IDENTITY);
    }

    /// Slot index for a live handle into this pool.
    fn resolve(&self, handle: PooledHandle) -> Option<usize> {
        if handle.pool != self.id {
            return None;
        }
        let index = handle.slot as usize;
        let slot = self.slots.get(index)?;
        (slot.in_use && slot.generation == handle.generation).then_some(index)
    }

    /// The slot behind a live handle.
    pub fn get(&self, handle: PooledHandle) -> Option<&PooledBody> {
        self.resolve(handle).map(|index| &self.slots[index])
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn spec(&self) -> &PoolSpec {
        &self.spec
    }

    /// Fixed number of slots. Zero once disposed.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.in_use).count()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Acquired slots, for per-frame sync.
    pub fn in_use(&self) -> impl Iterator<Item = &PooledBody> + '_ {
        self.slots.iter().filter(|slot| slot.in_use)
    }

    pub fn slots(&self) -> &[PooledBody] {
        &self.slots
    }
}
