//! Paired mesh + body construction.
//!
//! Every wall, floor, door, button and movable block goes through here, so
//! a mesh and its body always share dimensions and starting position. The
//! functions are crate-private: outside code reaches them only through
//! [`ScenePhysics`](super::ScenePhysics), which records what was built.

use boxroom_renderer::{Color, MeshId, SceneGraph};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::engine::{BodyHandle, PhysicsEngine};
use crate::error::PhysicsError;

/// Description of a box-shaped object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpec {
    /// Full dimensions (meters).
    pub size: Vec3,

    /// Mass in kilograms. Zero makes the body static.
    pub mass: f32,

    /// Center position in world space.
    pub position: Vec3,

    pub color: Color,

    /// Whether the mesh is drawn. Collision is unaffected.
    pub visible: bool,
}

impl BoxSpec {
    pub fn new(size: Vec3, mass: f32, position: Vec3, color: Color) -> Self {
        Self {
            size,
            mass,
            position,
            color,
            visible: true,
        }
    }

    /// A static (mass zero) box.
    pub fn fixed(size: Vec3, position: Vec3, color: Color) -> Self {
        Self::new(size, 0.0, position, color)
    }

    /// A cube with the given edge length.
    pub fn cube(edge: f32, mass: f32, position: Vec3, color: Color) -> Self {
        Self::new(Vec3::splat(edge), mass, position, color)
    }

    /// Same box, but with no visible mesh.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.mass > 0.0
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        self.size * 0.5
    }

    /// Check the preconditions: positive finite size, non-negative finite mass.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let size_ok = self.size.is_finite() && self.size.cmpgt(Vec3::ZERO).all();
        if !size_ok {
            return Err(PhysicsError::InvalidSize(self.size));
        }
        if !self.mass.is_finite() || self.mass < 0.0 {
            return Err(PhysicsError::InvalidMass(self.mass));
        }
        Ok(())
    }
}

/// The two halves of a freshly built object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltBody {
    pub body: BodyHandle,
    pub mesh: MeshId,
}

/// Build a mesh and body from `spec` and register the body with the world.
pub(crate) fn create_body<E: PhysicsEngine>(
    engine: &mut E,
    scene: &mut dyn SceneGraph,
    spec: &BoxSpec,
) -> Result<BuiltBody, PhysicsError> {
    let built = create_detached(engine, scene, spec)?;
    engine.add_rigid_body(built.body);
    scene.set_visible(built.mesh, spec.visible);
    Ok(built)
}

/// Build a mesh and body from `spec` without registering the body.
///
/// The mesh starts hidden; whoever attaches the body later shows it.
pub(crate) fn create_detached<E: PhysicsEngine>(
    engine: &mut E,
    scene: &mut dyn SceneGraph,
    spec: &BoxSpec,
) -> Result<BuiltBody, PhysicsError> {
    spec.validate()?;

    let body = engine.create_box_body(spec.half_extents(), spec.mass, spec.position);
    let mesh = scene.add_box(spec.size, spec.color, spec.position);
    scene.set_visible(mesh, false);

    log::trace!(
        "built box {:?} mass={} at {:?} -> {:?}/{:?}",
        spec.size,
        spec.mass,
        spec.position,
        body,
        mesh
    );

    Ok(BuiltBody { body, mesh })
}
