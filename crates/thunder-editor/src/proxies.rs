//! Proxy geometry and materials used to draw the transform handles.

use std::sync::Arc;

use glam::{Quat, Vec3};
use log::{debug, warn};
use thunder_core::{Material, MaterialInstance, Mesh, PrimitiveMode, ResourceLoader, Surface};

use crate::handle_tools::{HandleTools, SIDES};

/// Well-known path of the arrow-head cone mesh.
pub const CONE_PATH: &str = ".embedded/cone.fbx";
/// Well-known path of the billboard quad mesh.
pub const PLANE_PATH: &str = ".embedded/plane.fbx";
/// Well-known path of the gizmo material.
pub const GIZMO_MATERIAL_PATH: &str = ".embedded/gizmo.mtl";
/// Well-known path of the billboard sprite material.
pub const SPRITE_MATERIAL_PATH: &str = ".embedded/DefaultSprite.mtl";

/// Texture slot overridden on the sprite material by billboards.
pub const OVERRIDE_SLOT: &str = "texture0";

/// Length of the axis line in proxy units.
pub const AXIS_LENGTH: f32 = 5.0;
/// Radius of the rotation half ring in proxy units.
pub const CIRCLE_RADIUS: f32 = 5.0;

/// Surfaces of the procedural `"Move"` proxy mesh, in surface order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxySurface {
    /// Single axis line along +Y.
    Axis,
    /// Corner bracket lines between two scale axes.
    Scale,
    /// Filled band under the scale bracket.
    ScaleXy,
    /// Filled corner shown when scaling uniformly.
    ScaleXyz,
    /// Plane corner line.
    Move,
    /// Filled plane quad.
    MoveXy,
    /// Half ring in the local XZ plane.
    Circle,
}

impl ProxySurface {
    /// All surfaces in mesh order.
    pub const ALL: [Self; 7] = [
        Self::Axis,
        Self::Scale,
        Self::ScaleXy,
        Self::ScaleXyz,
        Self::Move,
        Self::MoveXy,
        Self::Circle,
    ];

    /// Surface index in the proxy mesh.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Builds the procedural proxy mesh.
pub fn build_move_proxy() -> Mesh {
    let mut mesh = Mesh::new("Move");

    mesh.add_surface(Surface::new(
        PrimitiveMode::Lines,
        vec![Vec3::ZERO, Vec3::new(0.0, AXIS_LENGTH, 0.0)],
        vec![0, 1],
    ));

    let bracket = vec![
        Vec3::new(0.0, 2.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 3.0, 0.0),
        Vec3::new(1.5, 1.5, 0.0),
    ];
    mesh.add_surface(Surface::new(PrimitiveMode::Lines, bracket.clone(), vec![0, 1, 2, 3]));
    mesh.add_surface(Surface::new(
        PrimitiveMode::Triangles,
        bracket,
        vec![0, 1, 2, 1, 3, 2],
    ));
    mesh.add_surface(Surface::new(
        PrimitiveMode::Triangles,
        vec![Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)],
        vec![0, 1, 2],
    ));

    mesh.add_surface(Surface::new(
        PrimitiveMode::Lines,
        vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 1.0, 0.0)],
        vec![0, 1],
    ));
    mesh.add_surface(Surface::new(
        PrimitiveMode::Triangles,
        vec![
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(2.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
        ],
        vec![0, 1, 2, 1, 3, 2],
    ));

    mesh.add_surface(Surface::new(
        PrimitiveMode::LineStrip,
        HandleTools::points_arc(Quat::IDENTITY, CIRCLE_RADIUS, 0.0, 180.0),
        Vec::new(),
    ));

    mesh
}

/// Proxy meshes and material instances shared by every handle draw.
///
/// Loaded resources that are missing stay `None` and the draws that need
/// them are skipped.
#[derive(Debug, Clone)]
pub struct HandleResources {
    /// Procedural proxy mesh, see [`ProxySurface`].
    pub proxy: Arc<Mesh>,
    /// Arrow-head cone.
    pub cone: Option<Arc<Mesh>>,
    /// Billboard quad.
    pub quad: Option<Arc<Mesh>>,
    /// Material for gizmo geometry.
    pub gizmo: Option<MaterialInstance>,
    /// Material for billboard sprites.
    pub sprite: Option<MaterialInstance>,
}

impl HandleResources {
    /// Builds the procedural proxy and loads the rest through `loader`.
    pub fn new(loader: &dyn ResourceLoader) -> Self {
        let cone = loader.load_mesh(CONE_PATH);
        let quad = loader.load_mesh(PLANE_PATH);
        let gizmo = loader
            .load_material(GIZMO_MATERIAL_PATH)
            .map(|m| m.create_instance());
        let sprite = loader
            .load_material(SPRITE_MATERIAL_PATH)
            .map(|m| m.create_instance());

        for (path, present) in [
            (CONE_PATH, cone.is_some()),
            (PLANE_PATH, quad.is_some()),
            (GIZMO_MATERIAL_PATH, gizmo.is_some()),
            (SPRITE_MATERIAL_PATH, sprite.is_some()),
        ] {
            if !present {
                warn!("handle resource {path} not found, dependent draws are skipped");
            }
        }

        Self {
            proxy: Arc::new(build_move_proxy()),
            cone,
            quad,
            gizmo,
            sprite,
        }
    }

    /// Resources backed by [`BuiltinResources`].
    pub fn builtin() -> Self {
        Self::new(&BuiltinResources)
    }
}

/// Procedural fallbacks for the well-known handle resource paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinResources;

impl BuiltinResources {
    /// Cone with its apex at `(0, 1, 0)` and a base of radius 0.25 at the origin.
    pub fn cone() -> Mesh {
        let radius = 0.25;
        let mut vertices = vec![Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO];
        vertices.extend((0..SIDES).map(|i| {
            let angle = (i as f32 / SIDES as f32) * std::f32::consts::TAU;
            Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
        }));

        let mut indices = Vec::with_capacity(SIDES as usize * 6);
        for i in 0..SIDES {
            let a = 2 + i;
            let b = 2 + (i + 1) % SIDES;
            indices.extend_from_slice(&[0, b, a, 1, a, b]);
        }
        Mesh::with_surface(
            CONE_PATH,
            Surface::new(PrimitiveMode::Triangles, vertices, indices),
        )
    }

    /// Unit quad in the XY plane centered on the origin.
    pub fn quad() -> Mesh {
        Mesh::with_surface(
            PLANE_PATH,
            Surface::new(
                PrimitiveMode::Triangles,
                vec![
                    Vec3::new(-0.5, -0.5, 0.0),
                    Vec3::new(0.5, -0.5, 0.0),
                    Vec3::new(-0.5, 0.5, 0.0),
                    Vec3::new(0.5, 0.5, 0.0),
                ],
                vec![0, 1, 2, 1, 3, 2],
            ),
        )
    }
}

impl ResourceLoader for BuiltinResources {
    fn load_mesh(&self, path: &str) -> Option<Arc<Mesh>> {
        match path {
            CONE_PATH => Some(Arc::new(Self::cone())),
            PLANE_PATH => Some(Arc::new(Self::quad())),
            _ => {
                debug!("no builtin mesh for {path}");
                None
            }
        }
    }

    fn load_material(&self, path: &str) -> Option<Arc<Material>> {
        match path {
            GIZMO_MATERIAL_PATH | SPRITE_MATERIAL_PATH => Some(Arc::new(Material::new(path, true))),
            _ => {
                debug!("no builtin material for {path}");
                None
            }
        }
    }
}
