//! Shadow map helpers.

use glam::{Mat4, Vec3};

/// Default shadow map resolution.
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Computes the light view and projection matrices for a directional light.
///
/// The orthographic volume is centered on `scene_center` and encloses a
/// sphere of `scene_radius`.
#[must_use]
pub fn light_view_projection(scene_center: Vec3, scene_radius: f32, light_dir: Vec3) -> (Mat4, Mat4) {
    let light_dir = light_dir.normalize_or(Vec3::NEG_Y);
    let scene_radius = scene_radius.max(1e-3);
    let light_pos = scene_center - light_dir * scene_radius * 2.0;

    // Find a stable up vector that's not parallel to light direction
    let up = if light_dir.y.abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    };

    let view = Mat4::look_at_rh(light_pos, scene_center, up);
    let proj = Mat4::orthographic_rh(
        -scene_radius,
        scene_radius,
        -scene_radius,
        scene_radius,
        0.1,
        scene_radius * 4.0,
    );
    (view, proj)
}

/// Computes the combined light view-projection matrix.
#[must_use]
pub fn compute_light_matrix(scene_center: Vec3, scene_radius: f32, light_dir: Vec3) -> Mat4 {
    let (view, proj) = light_view_projection(scene_center, scene_radius, light_dir);
    proj * view
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_maps_inside_volume() {
        let m = compute_light_matrix(Vec3::new(1.0, 2.0, 3.0), 5.0, Vec3::new(0.3, -1.0, 0.2));
        let p = m.project_point3(Vec3::new(1.0, 2.0, 3.0));
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&p.z));
    }

    #[test]
    fn test_default_size_matches_options() {
        let options = thunder_core::PipelineOptions::default();
        assert_eq!(options.shadow_map_size, SHADOW_MAP_SIZE);
    }

    #[test]
    fn test_vertical_light_is_finite() {
        let m = compute_light_matrix(Vec3::ZERO, 10.0, Vec3::NEG_Y);
        assert!(m.is_finite());
    }

    #[test]
    fn test_sphere_fits() {
        let m = compute_light_matrix(Vec3::ZERO, 4.0, Vec3::new(-1.0, -1.0, 0.0));
        for corner in [Vec3::X * 4.0, Vec3::Y * 4.0, Vec3::Z * 4.0, Vec3::NEG_Z * 4.0] {
            let p = m.project_point3(corner);
            assert!(p.x.abs() <= 1.0 + 1e-4);
            assert!(p.y.abs() <= 1.0 + 1e-4);
            assert!((0.0..=1.0).contains(&p.z));
        }
    }
}
