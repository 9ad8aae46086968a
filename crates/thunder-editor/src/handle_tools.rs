//! Screen-space geometry helpers for hit-testing handle proxies.
//!
//! Distances are measured in normalized screen units (`[0, 1]`, top-left
//! origin), the same space as the cursor passed to [`HandleTools::set_mouse`].

use glam::{Mat4, Quat, Vec2, Vec3};
use thunder_core::{project_point, Mesh, PrimitiveMode};

/// Number of segments in a full circle.
pub const SIDES: u32 = 32;

/// Projection state and cursor shared by the distance queries.
#[derive(Debug, Clone, Copy)]
pub struct HandleTools {
    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    mouse: Vec2,
}

impl Default for HandleTools {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            mouse: Vec2::ZERO,
        }
    }
}

impl HandleTools {
    /// Creates helpers with identity matrices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the matrices used to project proxies.
    pub fn set_view_projection(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
        self.view_projection = projection * view;
    }

    /// Sets the cursor in normalized screen coordinates.
    pub fn set_mouse(&mut self, mouse: Vec2) {
        self.mouse = mouse;
    }

    /// Returns the cursor.
    pub fn mouse(&self) -> Vec2 {
        self.mouse
    }

    /// Returns the view matrix.
    pub fn view(&self) -> Mat4 {
        self.view
    }

    /// Returns the projection matrix.
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    fn project(&self, transform: Mat4, point: Vec3) -> Option<Vec2> {
        project_point(transform.transform_point3(point), &self.view_projection).map(|p| p.truncate())
    }

    /// Distance from the cursor to a projected point, `f32::MAX` when the
    /// point is behind the camera.
    pub fn distance_to_point(&self, transform: Mat4, point: Vec3) -> f32 {
        self.project(transform, point)
            .map_or(f32::MAX, |p| p.distance(self.mouse))
    }

    /// Distance from the cursor to the projected primitives of a surface.
    ///
    /// Lines use index pairs, line strips consecutive points and triangles
    /// report 0 when the cursor is inside. Returns `f32::MAX` for a missing
    /// surface or one entirely behind the camera.
    pub fn distance_to_mesh(&self, transform: Mat4, mesh: &Mesh, surface: usize) -> f32 {
        let Some(surface) = mesh.surface(surface) else {
            return f32::MAX;
        };
        let points: Vec<Option<Vec2>> = surface
            .vertices
            .iter()
            .map(|&v| self.project(transform, v))
            .collect();
        let indices = surface.resolved_indices();
        let point = |i: u32| points.get(i as usize).copied().flatten();
        let segment = |a: u32, b: u32| match (point(a), point(b)) {
            (Some(a), Some(b)) => distance_to_segment(self.mouse, a, b),
            _ => f32::MAX,
        };

        match surface.mode {
            PrimitiveMode::Lines => indices
                .chunks_exact(2)
                .map(|pair| segment(pair[0], pair[1]))
                .fold(f32::MAX, f32::min),
            PrimitiveMode::LineStrip => indices
                .windows(2)
                .map(|pair| segment(pair[0], pair[1]))
                .fold(f32::MAX, f32::min),
            PrimitiveMode::Triangles => indices
                .chunks_exact(3)
                .map(|tri| match (point(tri[0]), point(tri[1]), point(tri[2])) {
                    (Some(a), Some(b), Some(c)) if point_in_triangle(self.mouse, a, b, c) => 0.0,
                    _ => segment(tri[0], tri[1])
                        .min(segment(tri[1], tri[2]))
                        .min(segment(tri[2], tri[0])),
                })
                .fold(f32::MAX, f32::min),
        }
    }

    /// Points on an arc of `radius` in the local XZ plane, rotated by
    /// `rotation`, from `start` to `end` degrees inclusive.
    pub fn points_arc(rotation: Quat, radius: f32, start: f32, end: f32) -> Vec<Vec3> {
        let sweep = end - start;
        let segments = ((sweep.abs() * SIDES as f32 / 360.0).ceil() as u32).max(1);
        (0..=segments)
            .map(|i| {
                let angle = (start + sweep * i as f32 / segments as f32).to_radians();
                rotation * Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
            })
            .collect()
    }
}

/// Distance from `p` to the segment `ab`.
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = (p - b).perp_dot(a - b);
    let d2 = (p - c).perp_dot(b - c);
    let d3 = (p - a).perp_dot(c - a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use thunder_core::{Camera, Surface};

    fn tools() -> HandleTools {
        let camera = Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0);
        let mut tools = HandleTools::new();
        let (view, projection) = camera.matrices();
        tools.set_view_projection(view, projection);
        tools
    }

    #[test]
    fn test_distance_to_projected_origin() {
        let mut tools = tools();
        tools.set_mouse(Vec2::new(0.5, 0.5));
        assert!(tools.distance_to_point(Mat4::IDENTITY, Vec3::ZERO) < 1e-5);
        tools.set_mouse(Vec2::new(0.6, 0.5));
        assert!((tools.distance_to_point(Mat4::IDENTITY, Vec3::ZERO) - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_point_behind_camera() {
        let tools = tools();
        assert_eq!(tools.distance_to_point(Mat4::IDENTITY, Vec3::new(0.0, 0.0, 10.0)), f32::MAX);
    }

    #[test]
    fn test_distance_to_line_mesh() {
        let mut tools = tools();
        let mesh = Mesh::with_surface(
            "line",
            Surface::new(
                PrimitiveMode::Lines,
                vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)],
                vec![0, 1],
            ),
        );
        tools.set_mouse(Vec2::new(0.55, 0.5));
        assert!(tools.distance_to_mesh(Mat4::IDENTITY, &mesh, 0) < 1e-5);
        tools.set_mouse(Vec2::new(0.5, 0.6));
        assert!((tools.distance_to_mesh(Mat4::IDENTITY, &mesh, 0) - 0.1).abs() < 1e-4);
        assert_eq!(tools.distance_to_mesh(Mat4::IDENTITY, &mesh, 3), f32::MAX);
    }

    #[test]
    fn test_inside_triangle_is_zero() {
        let mut tools = tools();
        let mesh = Mesh::with_surface(
            "tri",
            Surface::new(
                PrimitiveMode::Triangles,
                vec![
                    Vec3::new(-1.0, -1.0, 0.0),
                    Vec3::new(1.0, -1.0, 0.0),
                    Vec3::new(0.0, 1.0, 0.0),
                ],
                vec![0, 1, 2],
            ),
        );
        tools.set_mouse(Vec2::new(0.5, 0.5));
        assert_eq!(tools.distance_to_mesh(Mat4::IDENTITY, &mesh, 0), 0.0);
        tools.set_mouse(Vec2::new(0.95, 0.5));
        assert!(tools.distance_to_mesh(Mat4::IDENTITY, &mesh, 0) > 0.0);
    }

    #[test]
    fn test_arc_endpoints_and_count() {
        let arc = HandleTools::points_arc(Quat::IDENTITY, 5.0, 0.0, 180.0);
        assert_eq!(arc.len(), 17);
        assert!((arc[0] - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
        assert!((arc[16] - Vec3::new(-5.0, 0.0, 0.0)).length() < 1e-4);
        assert!(arc.iter().all(|p| p.y.abs() < 1e-6 && (p.length() - 5.0).abs() < 1e-4));
    }

    #[test]
    fn test_arc_respects_rotation() {
        let rotation = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let arc = HandleTools::points_arc(rotation, 1.0, 0.0, 360.0);
        assert_eq!(arc.len(), 33);
        assert!(arc.iter().all(|p| p.z.abs() < 1e-5));
    }

    #[test]
    fn test_segment_distance_clamps() {
        let d = distance_to_segment(Vec2::new(3.0, 0.0), Vec2::ZERO, Vec2::X);
        assert!((d - 2.0).abs() < 1e-6);
    }
}
