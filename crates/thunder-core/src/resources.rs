//! Resource loading seam.

use std::sync::Arc;

use crate::mesh::{Material, Mesh};

/// Loads engine resources by path.
///
/// Failures are reported as `None`; callers skip whatever depends on the
/// missing resource.
pub trait ResourceLoader {
    /// Loads a mesh.
    fn load_mesh(&self, path: &str) -> Option<Arc<Mesh>>;

    /// Loads a material.
    fn load_material(&self, path: &str) -> Option<Arc<Material>>;
}

/// A loader that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLoader;

impl ResourceLoader for NullLoader {
    fn load_mesh(&self, path: &str) -> Option<Arc<Mesh>> {
        log::debug!("no mesh at '{path}'");
        None
    }

    fn load_material(&self, path: &str) -> Option<Arc<Material>> {
        log::debug!("no material at '{path}'");
        None
    }
}
