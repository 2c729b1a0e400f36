//! Scene-graph boundary for box meshes.
//!
//! The physics core only ever creates axis-aligned box meshes, so the
//! surface is deliberately small: create a box of given dimensions and
//! color, move it, hide it, remove it.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Identifier of a mesh inside a scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u32);

/// An sRGB color packed as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Self = Self(0xffffff);
    pub const GRAY: Self = Self(0x808080);
    pub const RED: Self = Self(0xff4444);
    pub const GREEN: Self = Self(0x00ff00);

    /// Build from a packed `0xRRGGBB` value. Bits above 24 are dropped.
    pub const fn from_hex(hex: u32) -> Self {
        Self(hex & 0x00ff_ffff)
    }

    /// Red, green, blue in `0.0..=1.0`.
    pub fn to_rgb(self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b]
    }
}

/// A renderable box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxMesh {
    /// Full dimensions (not half-extents).
    pub size: Vec3,
    pub color: Color,
    pub position: Vec3,
    pub rotation: Quat,
    pub visible: bool,
}

/// The operations the physics core needs from a renderer.
///
/// Implementations must tolerate calls with ids they no longer know about;
/// those calls are no-ops.
pub trait SceneGraph {
    /// Create a box mesh and add it to the rendered scene.
    fn add_box(&mut self, size: Vec3, color: Color, position: Vec3) -> MeshId;

    /// Remove a mesh from the scene. Returns `false` if it was not present.
    fn remove(&mut self, id: MeshId) -> bool;

    /// Set world position and orientation.
    fn set_transform(&mut self, id: MeshId, position: Vec3, rotation: Quat);

    fn set_visible(&mut self, id: MeshId, visible: bool);

    fn set_color(&mut self, id: MeshId, color: Color);

    /// Look up a mesh.
    fn get(&self, id: MeshId) -> Option<&BoxMesh>;
}

/// Retained in-memory scene graph.
#[derive(Debug, Default)]
pub struct MeshScene {
    meshes: Vec<Option<BoxMesh>>,
}

impl MeshScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of meshes currently in the scene.
    pub fn len(&self) -> usize {
        self.meshes.iter().filter(|m| m.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of meshes that would be drawn.
    pub fn visible_count(&self) -> usize {
        self.meshes.iter().flatten().filter(|m| m.visible).count()
    }

    /// Iterate over live meshes.
    pub fn iter(&self) -> impl Iterator<Item = (MeshId, &BoxMesh)> + '_ {
        self.meshes
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.as_ref().map(|m| (MeshId(i as u32), m)))
    }

    fn slot_mut(&mut self, id: MeshId) -> Option<&mut BoxMesh> {
        self.meshes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }
}

impl SceneGraph for MeshScene {
    fn add_box(&mut self, size: Vec3, color: Color, position: Vec3) -> MeshId {
        // Ids are never reused so a stale id cannot alias a newer mesh.
        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(Some(BoxMesh {
            size,
            color,
            position,
            rotation: Quat::IDENTITY,
            visible: true,
        }));
        id
    }

    fn remove(&mut self, id: MeshId) -> bool {
        match self.meshes.get_mut(id.0 as usize) {
            Some(slot) => slot.take().is_some(),
            None => false,
        }
    }

    fn set_transform(&mut self, id: MeshId, position: Vec3, rotation: Quat) {
        if let Some(mesh) = self.slot_mut(id) {
            mesh.position = position;
            mesh.rotation = rotation;
        } else {
            log::trace!("set_transform on missing mesh {:?}", id);
        }
    }

    fn set_visible(&mut self, id: MeshId, visible: bool) {
        if let Some(mesh) = self.slot_mut(id) {
            mesh.visible = visible;
        }
    }

    fn set_color(&mut self, id: MeshId, color: Color) {
        if let Some(mesh) = self.slot_mut(id) {
            mesh.color = color;
        }
    }

    fn get(&self, id: MeshId) -> Option<&BoxMesh> {
        self.meshes.get(id.0 as usize).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove() {
        let mut scene = MeshScene::new();
        let id = scene.add_box(Vec3::ONE, Color::RED, Vec3::new(0.0, 1.0, 0.0));

        assert_eq!(scene.len(), 1);
        assert_eq!(scene.get(id).map(|m| m.color), Some(Color::RED));

        assert!(scene.remove(id));
        assert!(!scene.remove(id));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_ids_not_reused() {
        let mut scene = MeshScene::new();
        let first = scene.add_box(Vec3::ONE, Color::WHITE, Vec3::ZERO);
        scene.remove(first);
        let second = scene.add_box(Vec3::ONE, Color::WHITE, Vec3::ZERO);

        assert_ne!(first, second);
        assert!(scene.get(first).is_none());
    }

    #[test]
    fn test_stale_id_is_ignored() {
        let mut scene = MeshScene::new();
        scene.set_transform(MeshId(42), Vec3::ONE, Quat::IDENTITY);
        scene.set_visible(MeshId(42), false);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_visibility() {
        let mut scene = MeshScene::new();
        let a = scene.add_box(Vec3::ONE, Color::WHITE, Vec3::ZERO);
        scene.add_box(Vec3::ONE, Color::WHITE, Vec3::ZERO);

        scene.set_visible(a, false);
        assert_eq!(scene.visible_count(), 1);
    }

    #[test]
    fn test_color_components() {
        let [r, g, b] = Color::from_hex(0xff8000).to_rgb();
        assert_eq!(r, 1.0);
        assert!((g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(b, 0.0);
    }
}
