//! The slice of the scene graph the pipeline walks.
//!
//! Nodes are tagged by kind instead of being downcast: the pipeline asks a
//! node whether it is drawable, a light or a disabled actor and otherwise
//! descends into its children.

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use crate::command_buffer::{CommandBuffer, Layer};
use crate::mesh::{MaterialInstance, Mesh};

/// A component that can submit draws.
pub trait Drawable {
    /// Object id written to the pick target. 0 opts out of picking.
    fn object_id(&self) -> u32;

    /// Submits draws for `layer`.
    ///
    /// In [`Layer::RAYCAST`] the flat color is already set to the encoded
    /// object id and must not be changed.
    fn draw(&self, buffer: &mut dyn CommandBuffer, layer: Layer);
}

/// A directional light.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels in.
    pub direction: Vec3,
    /// Light color; alpha is intensity.
    pub color: Vec4,
    /// Whether the light renders a shadow map.
    pub casts_shadows: bool,
    /// Center of the region covered by the shadow map.
    pub shadow_center: Vec3,
    /// Radius of the region covered by the shadow map.
    pub shadow_radius: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.5, -1.0, -0.3).normalize(),
            color: Vec4::ONE,
            casts_shadows: true,
            shadow_center: Vec3::ZERO,
            shadow_radius: 10.0,
        }
    }
}

impl DirectionalLight {
    /// Creates a shadow-casting light along `direction`.
    #[must_use]
    pub fn new(direction: Vec3) -> Self {
        Self {
            direction: direction.normalize_or(Vec3::NEG_Y),
            ..Default::default()
        }
    }

    /// Sets the shadow bounds.
    #[must_use]
    pub fn with_shadow_bounds(mut self, center: Vec3, radius: f32) -> Self {
        self.shadow_center = center;
        self.shadow_radius = radius;
        self
    }

    /// Enables or disables shadow casting.
    #[must_use]
    pub fn with_shadows(mut self, casts_shadows: bool) -> Self {
        self.casts_shadows = casts_shadows;
        self
    }
}

/// Node payload.
pub enum NodeKind {
    /// Grouping node with no behavior.
    Container,
    /// An actor; disabled actors hide their whole subtree.
    Actor { enabled: bool },
    /// A drawable component.
    Component(Box<dyn Drawable>),
    /// A directional light.
    Light(DirectionalLight),
}

impl std::fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Container => f.write_str("Container"),
            NodeKind::Actor { enabled } => f.debug_struct("Actor").field("enabled", enabled).finish(),
            NodeKind::Component(drawable) => f
                .debug_tuple("Component")
                .field(&drawable.object_id())
                .finish(),
            NodeKind::Light(light) => f.debug_tuple("Light").field(light).finish(),
        }
    }
}

/// A scene graph node.
#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    /// Creates a node without children.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// Creates an empty container.
    pub fn container(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Container)
    }

    /// Creates an actor.
    pub fn actor(name: impl Into<String>, enabled: bool) -> Self {
        Self::new(name, NodeKind::Actor { enabled })
    }

    /// Creates a drawable component node.
    pub fn component(name: impl Into<String>, drawable: impl Drawable + 'static) -> Self {
        Self::new(name, NodeKind::Component(Box::new(drawable)))
    }

    /// Creates a light node.
    pub fn light(name: impl Into<String>, light: DirectionalLight) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    /// Appends a child and returns `self`.
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Appends a child.
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Returns the drawable capability.
    pub fn as_drawable(&self) -> Option<&dyn Drawable> {
        match &self.kind {
            NodeKind::Component(drawable) => Some(drawable.as_ref()),
            _ => None,
        }
    }

    /// Returns the light capability.
    pub fn as_light(&self) -> Option<&DirectionalLight> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    /// True for an actor that is switched off.
    pub fn is_actor_disabled(&self) -> bool {
        matches!(self.kind, NodeKind::Actor { enabled: false })
    }
}

/// A scene: ambient light plus the root node.
#[derive(Debug)]
pub struct Scene {
    pub ambient: Vec4,
    pub root: Node,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self {
            ambient: Vec4::new(0.1, 0.1, 0.1, 1.0),
            root: Node::container("root"),
        }
    }

    /// Sets the ambient color.
    #[must_use]
    pub fn with_ambient(mut self, ambient: Vec4) -> Self {
        self.ambient = ambient;
        self
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Draws every surface of a mesh with a flat color.
#[derive(Debug, Clone)]
pub struct MeshRenderer {
    pub id: u32,
    pub mesh: Arc<Mesh>,
    pub transform: Mat4,
    pub color: Vec4,
    pub material: Option<MaterialInstance>,
    pub casts_shadows: bool,
}

impl MeshRenderer {
    /// Creates a renderer for `mesh` with pick id `id`.
    pub fn new(id: u32, mesh: Arc<Mesh>) -> Self {
        Self {
            id,
            mesh,
            transform: Mat4::IDENTITY,
            color: Vec4::ONE,
            material: None,
            casts_shadows: true,
        }
    }

    /// Sets the model transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the flat color.
    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    /// Sets the material.
    #[must_use]
    pub fn with_material(mut self, material: MaterialInstance) -> Self {
        self.material = Some(material);
        self
    }

    fn is_translucent(&self) -> bool {
        self.material
            .as_ref()
            .is_some_and(|m| m.material.translucent)
    }

    fn takes_part(&self, layer: Layer) -> bool {
        if layer.contains(Layer::RAYCAST) {
            self.id != 0
        } else if layer.contains(Layer::SHADOWCAST) {
            self.casts_shadows
        } else if layer.contains(Layer::TRANSLUCENT) {
            self.is_translucent()
        } else if layer.contains(Layer::DEFAULT) {
            !self.is_translucent()
        } else {
            false
        }
    }
}

impl Drawable for MeshRenderer {
    fn object_id(&self) -> u32 {
        self.id
    }

    fn draw(&self, buffer: &mut dyn CommandBuffer, layer: Layer) {
        if !self.takes_part(layer) {
            return;
        }
        if !layer.intersects(Layer::RAYCAST | Layer::SHADOWCAST) {
            buffer.set_color(self.color);
        }
        for surface in 0..self.mesh.surface_count() {
            buffer.draw_mesh(
                self.transform,
                &self.mesh,
                surface,
                layer,
                self.material.as_ref(),
            );
        }
    }
}
