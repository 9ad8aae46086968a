//! Proxy and scene meshes plus material instances.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;

use crate::command_buffer::TextureHandle;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Primitive assembly mode of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    /// Independent line segments (index pairs).
    Lines,
    /// Connected line strip.
    LineStrip,
    /// Independent triangles (index triples).
    #[default]
    Triangles,
}

/// A single drawable sub-surface of a mesh.
///
/// An empty index list means the vertices are used in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Surface {
    /// Primitive mode.
    pub mode: PrimitiveMode,
    /// Vertex positions in mesh space.
    pub vertices: Vec<Vec3>,
    /// Vertex indices.
    pub indices: Vec<u32>,
}

impl Surface {
    /// Creates a surface.
    #[must_use]
    pub fn new(mode: PrimitiveMode, vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            mode,
            vertices,
            indices,
        }
    }

    /// Returns the effective index list (sequential when no indices are stored).
    #[must_use]
    pub fn resolved_indices(&self) -> Vec<u32> {
        if self.indices.is_empty() {
            (0..self.vertices.len() as u32).collect()
        } else {
            self.indices.clone()
        }
    }

    /// Number of primitives (segments or triangles) the surface draws.
    #[must_use]
    pub fn primitive_count(&self) -> usize {
        let count = if self.indices.is_empty() {
            self.vertices.len()
        } else {
            self.indices.len()
        };
        match self.mode {
            PrimitiveMode::Lines => count / 2,
            PrimitiveMode::LineStrip => count.saturating_sub(1),
            PrimitiveMode::Triangles => count / 3,
        }
    }
}

/// A named list of surfaces with a process-unique id.
///
/// Backends key their GPU buffer caches by [`Mesh::id`].
#[derive(Debug, Clone)]
pub struct Mesh {
    id: u64,
    name: String,
    surfaces: Vec<Surface>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            surfaces: Vec::new(),
        }
    }

    /// Creates a mesh with a single surface.
    pub fn with_surface(name: impl Into<String>, surface: Surface) -> Self {
        let mut mesh = Self::new(name);
        mesh.add_surface(surface);
        mesh
    }

    /// Returns the mesh id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the mesh name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a surface and returns its index.
    pub fn add_surface(&mut self, surface: Surface) -> usize {
        self.surfaces.push(surface);
        self.surfaces.len() - 1
    }

    /// Returns a surface by index.
    pub fn surface(&self, index: usize) -> Option<&Surface> {
        self.surfaces.get(index)
    }

    /// Returns all surfaces.
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    /// Number of surfaces.
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }
}

/// A shared material definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name (usually its resource path).
    pub name: String,
    /// Whether instances blend with what is behind them.
    pub translucent: bool,
}

impl Material {
    /// Creates a material.
    pub fn new(name: impl Into<String>, translucent: bool) -> Self {
        Self {
            name: name.into(),
            translucent,
        }
    }

    /// Creates an instance with no texture overrides.
    pub fn create_instance(&self) -> MaterialInstance {
        MaterialInstance {
            material: self.clone(),
            textures: HashMap::new(),
        }
    }
}

/// A material plus per-instance texture overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInstance {
    /// The source material.
    pub material: Material,
    textures: HashMap<String, TextureHandle>,
}

impl MaterialInstance {
    /// Overrides a named texture slot.
    pub fn set_texture(&mut self, slot: impl Into<String>, texture: Option<TextureHandle>) {
        let slot = slot.into();
        match texture {
            Some(texture) => {
                self.textures.insert(slot, texture);
            }
            None => {
                self.textures.remove(&slot);
            }
        }
    }

    /// Returns the texture bound to a slot.
    pub fn texture(&self, slot: &str) -> Option<TextureHandle> {
        self.textures.get(slot).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_ids_are_unique() {
        let a = Mesh::new("a");
        let b = Mesh::new("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_primitive_count() {
        let lines = Surface::new(
            PrimitiveMode::Lines,
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            vec![0, 1, 2, 3],
        );
        assert_eq!(lines.primitive_count(), 2);

        let strip = Surface::new(PrimitiveMode::LineStrip, vec![Vec3::ZERO; 5], vec![]);
        assert_eq!(strip.primitive_count(), 4);
        assert_eq!(strip.resolved_indices(), vec![0, 1, 2, 3, 4]);

        let tris = Surface::new(PrimitiveMode::Triangles, vec![Vec3::ZERO; 4], vec![0, 1, 2, 1, 3, 2]);
        assert_eq!(tris.primitive_count(), 2);
    }

    #[test]
    fn test_material_instance_textures() {
        let material = Material::new(".embedded/DefaultSprite.mtl", true);
        let mut instance = material.create_instance();
        assert!(instance.texture("texture0").is_none());
        instance.set_texture("texture0", Some(TextureHandle::new(3)));
        assert_eq!(instance.texture("texture0"), Some(TextureHandle::new(3)));
        instance.set_texture("texture0", None);
        assert!(instance.texture("texture0").is_none());
    }
}
