//! Camera and view management.

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::math::Ray;

/// Camera projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// Perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

/// A 3D camera for viewing the scene.
///
/// Screen-space helpers use normalized coordinates in `[0, 1]` with the
/// origin at the top-left corner, matching cursor coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Projection mode.
    pub projection_mode: ProjectionMode,
    /// Orthographic half height (used when `projection_mode` is Orthographic).
    pub ortho_scale: f32,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect_ratio,
            near: 0.01,
            far: 1000.0,
            projection_mode: ProjectionMode::Perspective,
            ortho_scale: 1.0,
        }
    }

    /// Creates a camera at `position` looking at `target`.
    #[must_use]
    pub fn looking_at(position: Vec3, target: Vec3, aspect_ratio: f32) -> Self {
        Self {
            position,
            target,
            ..Self::new(aspect_ratio)
        }
    }

    /// Sets the aspect ratio.
    pub fn set_ratio(&mut self, aspect_ratio: f32) {
        if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            self.aspect_ratio = aspect_ratio;
        }
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection_mode {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let half_height = self.ortho_scale;
                let half_width = half_height * self.aspect_ratio;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Returns `(view, projection)`.
    #[must_use]
    pub fn matrices(&self) -> (Mat4, Mat4) {
        (self.view_matrix(), self.projection_matrix())
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Returns the camera's forward direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Returns the camera orientation. The camera looks down its local -Z.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_mat4(&self.view_matrix().inverse()).normalize()
    }

    /// Casts a ray from the camera through a normalized screen position.
    #[must_use]
    pub fn cast_ray(&self, x: f32, y: f32) -> Ray {
        let inv_view_proj = self.view_projection_matrix().inverse();
        let ndc = Vec2::new(x * 2.0 - 1.0, 1.0 - y * 2.0);

        // wgpu-style NDC depth [0, 1]
        let near = inv_view_proj * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far = inv_view_proj * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);

        if near.w.abs() < 1e-6 || far.w.abs() < 1e-6 {
            return Ray::new(self.position, self.forward());
        }

        let origin = near.truncate() / near.w;
        let direction = far.truncate() / far.w - origin;
        if direction.length_squared() < 1e-12 {
            return Ray::new(self.position, self.forward());
        }
        Ray::new(origin, direction)
    }

    /// Projects a world point to normalized screen space.
    ///
    /// Returns `(x, y, depth)` or `None` when the point is behind the camera.
    #[must_use]
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        project_point(world, &self.view_projection_matrix())
    }

    /// Recovers a world point from normalized screen space and depth.
    #[must_use]
    pub fn unproject(screen: Vec3, view: Mat4, projection: Mat4) -> Option<Vec3> {
        let inv_view_proj = (projection * view).inverse();
        let ndc = Vec4::new(screen.x * 2.0 - 1.0, 1.0 - screen.y * 2.0, screen.z, 1.0);
        let world = inv_view_proj * ndc;
        if world.w.abs() < 1e-9 {
            return None;
        }
        Some(world.truncate() / world.w)
    }
}

/// Projects a world point through a view-projection matrix into normalized
/// top-left screen space.
#[must_use]
pub fn project_point(world: Vec3, view_projection: &Mat4) -> Option<Vec3> {
    let clip = *view_projection * world.extend(1.0);
    if clip.w <= 1e-6 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    Some(Vec3::new((ndc.x + 1.0) * 0.5, (1.0 - ndc.y) * 0.5, ndc.z))
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_defaults() {
        let camera = Camera::default();
        assert_eq!(camera.projection_mode, ProjectionMode::Perspective);
        assert!((camera.fov.to_degrees() - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_perspective_shrinks_with_distance() {
        let camera = Camera::new(1.0);
        let near = camera.project(Vec3::new(0.5, 0.0, 1.0)).unwrap();
        let far = camera.project(Vec3::new(0.5, 0.0, -5.0)).unwrap();
        assert!(near.x > far.x);
    }

    #[test]
    fn test_center_ray_follows_forward() {
        let camera = Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0);
        let ray = camera.cast_ray(0.5, 0.5);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_project_center() {
        let camera = Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0);
        let screen = camera.project(Vec3::ZERO).unwrap();
        assert!((screen.x - 0.5).abs() < 1e-5);
        assert!((screen.y - 0.5).abs() < 1e-5);
        assert!(camera.project(Vec3::new(0.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn test_project_unproject_roundtrip() {
        let camera = Camera::looking_at(Vec3::new(2.0, 3.0, 5.0), Vec3::ZERO, 1.5);
        let world = Vec3::new(0.3, -0.2, 0.1);
        let screen = camera.project(world).unwrap();
        let (view, proj) = camera.matrices();
        let back = Camera::unproject(screen, view, proj).unwrap();
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn test_upper_half_of_screen_looks_up() {
        let camera = Camera::looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0);
        let ray = camera.cast_ray(0.5, 0.25);
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn test_rotation_maps_neg_z_to_forward() {
        let camera = Camera::looking_at(Vec3::new(3.0, 1.0, 4.0), Vec3::ZERO, 1.0);
        let forward = camera.rotation() * Vec3::NEG_Z;
        assert!((forward - camera.forward()).length() < 1e-4);
    }
}
