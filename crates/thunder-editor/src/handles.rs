//! Transform handles: hit-testing, drawing and constraint resolution for the
//! move, rotate and scale gizmos.
//!
//! A [`Handles`] context replaces process-wide state. It is bound to a
//! command buffer for the duration of one gizmo pass:
//!
//! ```text
//! handles.set_mouse(cursor);
//! handles.begin_draw(&mut buffer, camera);
//! let target = handles.move_tool(&mut buffer, pivot, dragging);
//! handles.end_draw();
//! ```

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
use log::{debug, trace};
use thunder_core::{
    AxisMask, Camera, CommandBuffer, HandleOptions, Layer, Mesh, Plane, PrimitiveMode, Surface,
    TextureHandle,
};

use crate::handle_tools::HandleTools;
use crate::proxies::{HandleResources, ProxySurface, AXIS_LENGTH, OVERRIDE_SLOT};

/// Default draw color.
pub const NORMAL_COLOR: Vec4 = Vec4::new(1.0, 1.0, 1.0, 1.0);
/// Highlight for active axes.
pub const SELECTED_COLOR: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);
/// X axis color.
pub const X_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
/// Y axis color.
pub const Y_COLOR: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
/// Z axis color.
pub const Z_COLOR: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);
/// Inactive rotation rings.
pub const GREY_COLOR: Vec4 = Vec4::new(0.3, 0.3, 0.3, 0.6);

/// Size of the per-axis proxies relative to the gizmo model.
const CONE_SIZE: f32 = 0.2;
/// Scale of the camera-facing outer ring.
const OUTER_RING_SCALE: f32 = 1.2;
/// Offset of the arrow head along the axis line.
const CONE_OFFSET: f32 = 4.0;

/// Normal of the plane a manipulation under `mask` is constrained to.
///
/// `forward` is the camera view direction. Single axes use the camera-facing
/// plane that contains the axis; when the camera looks straight down the
/// axis that plane is degenerate and the next world axis is used instead
/// (X and Y fall back to Z, Z falls back to Y). Two axes use the coordinate
/// plane they span, all three axes the view plane. `None` for an empty mask.
pub fn constraint_plane_normal(mask: AxisMask, forward: Vec3) -> Option<Vec3> {
    let n = forward;
    let or_axis = |normal: Vec3, fallback: Vec3| {
        if normal.length_squared() <= f32::EPSILON {
            fallback
        } else {
            normal
        }
    };
    let normal = match mask {
        AxisMask::X => or_axis(Vec3::new(0.0, n.y, n.z), Vec3::Z),
        AxisMask::Y => or_axis(Vec3::new(n.x, 0.0, n.z), Vec3::Z),
        AxisMask::Z => or_axis(Vec3::new(n.x, n.y, 0.0), Vec3::Y),
        AxisMask::XY => Vec3::Z,
        AxisMask::YZ => Vec3::X,
        AxisMask::XZ => Vec3::Y,
        AxisMask::XYZ => n,
        _ => return None,
    };
    Some(normal)
}

/// Rotation whose local Y is `axis` and whose local +Z points at `toward`
/// projected onto the plane orthogonal to `axis`.
///
/// The proxy half ring lies in local XZ around +Z, so this turns it to face
/// `toward`.
fn facing_rotation(axis: Vec3, toward: Vec3) -> Quat {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut d = (toward - axis * toward.dot(axis)).normalize_or_zero();
    if d == Vec3::ZERO {
        d = axis.any_orthonormal_vector();
    }
    Quat::from_mat3(&Mat3::from_cols(axis.cross(d), axis, d))
}

/// One axis of the move and scale gizmos.
#[derive(Debug, Clone, Copy)]
struct AxisFrame {
    /// Maps proxy +Y onto the world axis.
    transform: Mat4,
    axis: AxisMask,
    color: Vec4,
    /// Plane drawn by the proxy in this frame.
    plane: AxisMask,
    /// Plane drawn by the proxy in this frame turned by [`plane_flip`].
    flipped: AxisMask,
}

fn plane_flip() -> Mat4 {
    Mat4::from_rotation_y(-FRAC_PI_2)
}

fn axis_frames(model: Mat4, offset: f32) -> [AxisFrame; 3] {
    let frame = |rotation: Quat, translation: Vec3| {
        model * Mat4::from_scale_rotation_translation(Vec3::splat(CONE_SIZE), rotation, translation)
    };
    [
        AxisFrame {
            transform: frame(
                Quat::from_rotation_z(-FRAC_PI_2) * Quat::from_rotation_y(-FRAC_PI_2),
                Vec3::new(offset, 0.0, 0.0),
            ),
            axis: AxisMask::X,
            color: X_COLOR,
            plane: AxisMask::XZ,
            flipped: AxisMask::XY,
        },
        AxisFrame {
            transform: frame(Quat::IDENTITY, Vec3::new(0.0, offset, 0.0)),
            axis: AxisMask::Y,
            color: Y_COLOR,
            plane: AxisMask::XY,
            flipped: AxisMask::YZ,
        },
        AxisFrame {
            transform: frame(
                Quat::from_rotation_z(FRAC_PI_2) * Quat::from_rotation_x(FRAC_PI_2),
                Vec3::new(0.0, 0.0, offset),
            ),
            axis: AxisMask::Z,
            color: Z_COLOR,
            plane: AxisMask::YZ,
            flipped: AxisMask::XZ,
        },
    ]
}

/// Gizmo state for one viewport.
#[derive(Debug, Clone)]
pub struct Handles {
    axes: AxisMask,
    color: Vec4,
    second_color: Vec4,
    mouse: Vec2,
    camera: Option<Camera>,
    tools: HandleTools,
    resources: HandleResources,
    options: HandleOptions,
}

impl Default for Handles {
    fn default() -> Self {
        Self::new(HandleResources::builtin(), HandleOptions::default())
    }
}

impl Handles {
    /// Creates a context around prepared proxy resources.
    pub fn new(resources: HandleResources, options: HandleOptions) -> Self {
        Self {
            axes: AxisMask::NONE,
            color: NORMAL_COLOR,
            second_color: NORMAL_COLOR,
            mouse: Vec2::ZERO,
            camera: None,
            tools: HandleTools::new(),
            resources,
            options,
        }
    }

    /// Returns the active axes.
    pub fn axes(&self) -> AxisMask {
        self.axes
    }

    /// Overrides the active axes.
    pub fn set_axes(&mut self, axes: AxisMask) {
        self.axes = axes;
    }

    /// Sets the cursor in normalized screen coordinates (top-left origin).
    pub fn set_mouse(&mut self, mouse: Vec2) {
        self.mouse = mouse;
        self.tools.set_mouse(mouse);
    }

    /// Returns the cursor.
    pub fn mouse(&self) -> Vec2 {
        self.mouse
    }

    /// Returns the primary draw color.
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Sets the primary draw color used by arrows, lines and billboards.
    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    /// Returns the secondary draw color (arrow heads).
    pub fn second_color(&self) -> Vec4 {
        self.second_color
    }

    /// Sets the secondary draw color.
    pub fn set_second_color(&mut self, color: Vec4) {
        self.second_color = color;
    }

    /// Returns the camera bound by the last [`Handles::begin_draw`].
    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Returns the hit-testing helpers.
    pub fn tools(&self) -> &HandleTools {
        &self.tools
    }

    /// Returns the proxy resources.
    pub fn resources(&self) -> &HandleResources {
        &self.resources
    }

    /// Returns the handle options.
    pub fn options(&self) -> &HandleOptions {
        &self.options
    }

    /// Replaces the handle options.
    pub fn set_options(&mut self, options: HandleOptions) {
        self.options = options;
    }

    /// Binds the camera and prepares `buffer` for gizmo drawing.
    ///
    /// Only depth is cleared so the gizmo draws over the scene color.
    pub fn begin_draw(&mut self, buffer: &mut dyn CommandBuffer, camera: Option<Camera>) {
        if let Some(camera) = &camera {
            let (view, projection) = camera.matrices();
            self.tools.set_view_projection(view, projection);
            buffer.set_view_projection(view, projection);
        } else {
            debug!("handles: no active camera, gizmos are skipped");
        }
        self.camera = camera;
        buffer.clear_render_target(false, Vec4::ZERO, true, 1.0);
    }

    /// Resets the draw colors.
    pub fn end_draw(&mut self) {
        self.color = NORMAL_COLOR;
        self.second_color = NORMAL_COLOR;
    }

    fn draw_proxy(&self, buffer: &mut dyn CommandBuffer, transform: Mat4, surface: ProxySurface) {
        buffer.draw_mesh(
            transform,
            &self.resources.proxy,
            surface.index(),
            Layer::TRANSLUCENT,
            self.resources.gizmo.as_ref(),
        );
    }

    fn near_proxy(&self, transform: Mat4, surface: ProxySurface) -> bool {
        self.tools
            .distance_to_mesh(transform, &self.resources.proxy, surface.index())
            <= self.options.sense
    }

    /// Draws an axis line with an arrow head at its tip.
    ///
    /// The line uses the primary color and the head the secondary one.
    pub fn draw_arrow(&self, buffer: &mut dyn CommandBuffer, transform: Mat4) {
        buffer.set_color(self.color);
        self.draw_proxy(buffer, transform, ProxySurface::Axis);

        if let Some(cone) = &self.resources.cone {
            buffer.set_color(self.second_color);
            buffer.draw_mesh(
                transform * Mat4::from_translation(Vec3::new(0.0, CONE_OFFSET, 0.0)),
                cone,
                0,
                Layer::TRANSLUCENT,
                self.resources.gizmo.as_ref(),
            );
        }
    }

    /// Draws line segments given as index pairs into `points`.
    pub fn draw_lines(
        &self,
        buffer: &mut dyn CommandBuffer,
        transform: Mat4,
        points: &[Vec3],
        indices: &[u32],
    ) {
        let lines = Mesh::with_surface(
            "Lines",
            Surface::new(PrimitiveMode::Lines, points.to_vec(), indices.to_vec()),
        );
        buffer.set_color(self.color);
        buffer.draw_mesh(
            transform,
            &lines,
            0,
            Layer::TRANSLUCENT,
            self.resources.gizmo.as_ref(),
        );
    }

    /// Draws a camera-facing sprite and reports whether the cursor is on it.
    ///
    /// `texture` is bound to the sprite's override slot. The sprite is only
    /// drawn when the quad and sprite resources are available; the hit test
    /// does not depend on them. Returns `false` without a camera.
    pub fn draw_billboard(
        &mut self,
        buffer: &mut dyn CommandBuffer,
        position: Vec3,
        size: Vec2,
        texture: Option<TextureHandle>,
    ) -> bool {
        let Some(camera) = &self.camera else {
            return false;
        };
        let model = Mat4::from_translation(position) * Mat4::from_scale(size.extend(1.0));
        let q = model * Mat4::from_quat(camera.rotation());
        let hit = self.tools.distance_to_point(q, Vec3::ZERO) <= self.options.sense;

        if let (Some(quad), Some(sprite)) = (&self.resources.quad, &mut self.resources.sprite) {
            sprite.set_texture(OVERRIDE_SLOT, texture);
            buffer.set_color(self.color);
            buffer.draw_mesh(q, quad, 0, Layer::TRANSLUCENT, Some(&*sprite));
        }
        hit
    }

    /// Hit-tests the move or scale gizmo. `plane_surface` is the proxy used
    /// for the two-axis handles.
    fn hit_linear(
        &self,
        model: Mat4,
        frames: &[AxisFrame; 3],
        plane_surface: ProxySurface,
    ) -> Option<AxisMask> {
        if self.tools.distance_to_point(model, Vec3::ZERO) <= self.options.sense {
            return Some(AxisMask::XYZ);
        }

        let flip = plane_flip();
        for plane in [AxisMask::XZ, AxisMask::XY, AxisMask::YZ] {
            let hit = frames.iter().any(|f| {
                (f.plane == plane && self.near_proxy(f.transform, plane_surface))
                    || (f.flipped == plane && self.near_proxy(f.transform * flip, plane_surface))
            });
            if hit {
                return Some(plane);
            }
        }

        frames
            .iter()
            .find(|f| self.near_proxy(f.transform, ProxySurface::Axis))
            .map(|f| f.axis)
    }

    /// Projects the cursor onto the constraint plane of the active axes.
    ///
    /// Axes in the mask take the intersection coordinate, the others keep
    /// the pivot's. An empty mask or a ray parallel to the plane returns the
    /// pivot unchanged.
    fn resolve(&self, camera: &Camera, pivot: Vec3) -> Vec3 {
        let Some(normal) = constraint_plane_normal(self.axes, camera.forward()) else {
            return pivot;
        };
        let plane = Plane::new(pivot, normal);
        match camera
            .cast_ray(self.mouse.x, self.mouse.y)
            .intersect_plane(&plane, true)
        {
            Some(hit) => self.axes.select(pivot, hit),
            None => pivot,
        }
    }

    /// Intersects the cursor ray with the plane through `point` with the
    /// given normal. `None` without a camera or when the ray is parallel.
    pub fn cursor_on_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let camera = self.camera.as_ref()?;
        camera
            .cast_ray(self.mouse.x, self.mouse.y)
            .intersect_plane(&Plane::new(point, normal), true)
    }

    /// Projects the cursor onto the constraint plane of the active axes at
    /// `pivot` without drawing or hit-testing. Returns `pivot` without a
    /// camera.
    pub fn resolve_cursor(&self, pivot: Vec3) -> Vec3 {
        match &self.camera {
            Some(camera) => self.resolve(camera, pivot),
            None => pivot,
        }
    }

    fn scale_gizmo_size(&self, camera: &Camera, position: Vec3) -> f32 {
        position.distance(camera.position) * (camera.fov * 0.5).cos() * self.options.scale
    }

    /// World-space length of the scale gizmo's axis handles at `position`.
    pub fn scale_handle_length(&self, position: Vec3) -> Option<f32> {
        let camera = self.camera.as_ref()?;
        Some(self.scale_gizmo_size(camera, position) * CONE_SIZE * AXIS_LENGTH)
    }

    /// Move gizmo at `position`. Returns the cursor constrained to the active
    /// axes. With `locked` set the active axes are not re-evaluated.
    pub fn move_tool(&mut self, buffer: &mut dyn CommandBuffer, position: Vec3, locked: bool) -> Vec3 {
        let Some(camera) = self.camera.clone() else {
            return position;
        };
        let scale = position.distance(camera.position) * camera.fov.cos() * self.options.scale;
        let model = Mat4::from_scale_rotation_translation(Vec3::splat(scale), Quat::IDENTITY, position);
        let frames = axis_frames(model, CONE_SIZE);
        let flip = plane_flip();

        if !locked {
            if let Some(axes) = self.hit_linear(model, &frames, ProxySurface::Move) {
                self.axes = axes;
            }
        }
        trace!("move gizmo at {position:?}, axes {:?}", self.axes);

        let axes = self.axes;
        for frame in &frames {
            self.second_color = frame.color;
            self.color = if axes.intersects(frame.axis) {
                SELECTED_COLOR
            } else {
                frame.color
            };
            self.draw_arrow(buffer, frame.transform);

            buffer.set_color(if axes == frame.plane { SELECTED_COLOR } else { frame.color });
            self.draw_proxy(buffer, frame.transform, ProxySurface::Move);
            buffer.set_color(if axes == frame.flipped { SELECTED_COLOR } else { frame.color });
            self.draw_proxy(buffer, frame.transform * flip, ProxySurface::Move);
        }

        let highlight = SELECTED_COLOR.truncate().extend(self.options.alpha);
        for frame in frames.iter().filter(|f| f.plane == axes) {
            buffer.set_color(highlight);
            self.draw_proxy(buffer, frame.transform, ProxySurface::MoveXy);
        }
        self.color = NORMAL_COLOR;
        self.second_color = NORMAL_COLOR;

        self.resolve(&camera, position)
    }

    /// Rotation gizmo at `position`: one ring per axis plus a camera-facing
    /// ring for free rotation.
    ///
    /// Returns the cursor constrained by the same plane rule as
    /// [`Handles::move_tool`]; use [`Handles::cursor_on_plane`] to measure
    /// angles around a specific axis.
    pub fn rotation_tool(
        &mut self,
        buffer: &mut dyn CommandBuffer,
        position: Vec3,
        locked: bool,
    ) -> Vec3 {
        let Some(camera) = self.camera.clone() else {
            return position;
        };
        let scale =
            position.distance(camera.position) * (camera.fov * 0.5).cos() * self.options.scale;
        let model = Mat4::from_scale_rotation_translation(Vec3::splat(scale), Quat::IDENTITY, position);
        let ring = |rotation: Quat| {
            model * Mat4::from_scale_rotation_translation(Vec3::splat(CONE_SIZE), rotation, Vec3::ZERO)
        };

        let camera_rotation = camera.rotation();
        let q1 = ring(facing_rotation(camera.forward(), camera_rotation * Vec3::Y));
        let q2 = q1 * Mat4::from_rotation_y(PI);
        let outer = Mat4::from_scale(Vec3::splat(OUTER_RING_SCALE));

        let to_camera = camera.position - position;
        let rings = [
            (ring(facing_rotation(Vec3::X, to_camera)), AxisMask::X, X_COLOR),
            (ring(facing_rotation(Vec3::Y, to_camera)), AxisMask::Y, Y_COLOR),
            (ring(facing_rotation(Vec3::Z, to_camera)), AxisMask::Z, Z_COLOR),
        ];

        if !locked {
            if self.near_proxy(q1 * outer, ProxySurface::Circle)
                || self.near_proxy(q2 * outer, ProxySurface::Circle)
            {
                self.axes = AxisMask::XYZ;
            } else if let Some((_, axis, _)) = rings
                .iter()
                .find(|(t, _, _)| self.near_proxy(*t, ProxySurface::Circle))
            {
                self.axes = *axis;
            }
        }
        trace!("rotation gizmo at {position:?}, axes {:?}", self.axes);

        let axes = self.axes;
        buffer.set_color(if axes == AxisMask::XYZ {
            SELECTED_COLOR
        } else {
            GREY_COLOR * 2.0
        });
        self.draw_proxy(buffer, q1 * outer, ProxySurface::Circle);
        self.draw_proxy(buffer, q2 * outer, ProxySurface::Circle);
        buffer.set_color(GREY_COLOR);
        self.draw_proxy(buffer, q1, ProxySurface::Circle);
        self.draw_proxy(buffer, q2, ProxySurface::Circle);

        for (transform, axis, color) in rings {
            if !locked || axes == axis {
                buffer.set_color(if axes == axis { SELECTED_COLOR } else { color });
                self.draw_proxy(buffer, transform, ProxySurface::Circle);
            }
        }
        buffer.set_color(NORMAL_COLOR);

        self.resolve(&camera, position)
    }

    /// Scale gizmo at `position`. The gizmo mirrors itself so its brackets
    /// always face the camera.
    ///
    /// Returns the cursor constrained by the same plane rule as
    /// [`Handles::move_tool`].
    pub fn scale_tool(&mut self, buffer: &mut dyn CommandBuffer, position: Vec3, locked: bool) -> Vec3 {
        let Some(camera) = self.camera.clone() else {
            return position;
        };
        let normal = position - camera.position;
        let size = self.scale_gizmo_size(&camera, position);
        let facing = |c: f32| if c < 0.0 { size } else { -size };
        let scale = Vec3::new(facing(normal.x), facing(normal.y), facing(normal.z));

        let model = Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, position);
        let frames = axis_frames(model, 0.0);
        let flip = plane_flip();

        if !locked {
            if let Some(axes) = self.hit_linear(model, &frames, ProxySurface::Scale) {
                self.axes = axes;
            }
        }
        trace!("scale gizmo at {position:?}, axes {:?}", self.axes);

        let axes = self.axes;
        let highlight = SELECTED_COLOR.truncate().extend(self.options.alpha);
        for frame in &frames {
            for (transform, plane) in [
                (frame.transform, frame.plane),
                (frame.transform * flip, frame.flipped),
            ] {
                buffer.set_color(frame.color);
                if axes == plane {
                    buffer.set_color(highlight);
                    self.draw_proxy(buffer, transform, ProxySurface::ScaleXy);
                    buffer.set_color(SELECTED_COLOR);
                }
                self.draw_proxy(buffer, transform, ProxySurface::Scale);
            }
            buffer.set_color(if axes.intersects(frame.axis) {
                SELECTED_COLOR
            } else {
                frame.color
            });
            self.draw_proxy(buffer, frame.transform, ProxySurface::Axis);
        }

        if axes == AxisMask::XYZ {
            buffer.set_color(highlight);
            for frame in &frames {
                self.draw_proxy(buffer, frame.transform, ProxySurface::ScaleXyz);
                self.draw_proxy(buffer, frame.transform * flip, ProxySurface::ScaleXyz);
            }
        }
        self.color = NORMAL_COLOR;

        self.resolve(&camera, position)
    }
}
