use glam::{Quat, Vec3};
use log::trace;
use thunder_core::{AxisMask, CommandBuffer, SnapOptions};

use super::{pivot, snap, EditorTool, SelectedObject, TransformUpdate};
use crate::handles::Handles;

/// Rotates the selection around its pivot.
///
/// Single-axis handles rotate around that world axis, the camera-facing ring
/// around the view direction.
#[derive(Debug, Clone, Default)]
pub struct RotateTool {
    snap: SnapOptions,
    pivot: Vec3,
    axis: Option<Vec3>,
    start: Option<Vec3>,
    angle: f32,
    saved: Vec<SelectedObject>,
}

impl RotateTool {
    /// Creates a rotate tool with the given snapping.
    pub fn new(snap: SnapOptions) -> Self {
        Self {
            snap,
            ..Self::default()
        }
    }

    /// Angle of the current drag in degrees, after snapping.
    pub fn angle(&self) -> f32 {
        self.angle
    }
}

fn rotation_axis(handles: &Handles) -> Option<Vec3> {
    match handles.axes() {
        AxisMask::X => Some(Vec3::X),
        AxisMask::Y => Some(Vec3::Y),
        AxisMask::Z => Some(Vec3::Z),
        AxisMask::XYZ => handles.camera().map(|c| c.forward()),
        _ => None,
    }
}

/// Signed angle in radians from `from` to `to` around `axis`.
fn signed_angle(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    axis.dot(from.cross(to)).atan2(from.dot(to))
}

impl EditorTool for RotateTool {
    fn name(&self) -> &'static str {
        "Rotate"
    }

    fn icon(&self) -> &'static str {
        "icons/rotate.png"
    }

    fn begin_control(&mut self, handles: &Handles, selection: &[SelectedObject]) {
        self.saved = selection.to_vec();
        self.pivot = pivot(selection).unwrap_or_default();
        self.axis = rotation_axis(handles);
        self.start = self
            .axis
            .and_then(|axis| handles.cursor_on_plane(self.pivot, axis))
            .map(|hit| hit - self.pivot);
        self.angle = 0.0;
    }

    fn update(
        &mut self,
        handles: &mut Handles,
        buffer: &mut dyn CommandBuffer,
        selection: &[SelectedObject],
        is_drag: bool,
    ) -> Vec<TransformUpdate> {
        let Some(position) = pivot(selection) else {
            return Vec::new();
        };
        handles.rotation_tool(buffer, position, is_drag);
        if !is_drag {
            return Vec::new();
        }

        let (Some(axis), Some(start)) = (self.axis, self.start) else {
            return Vec::new();
        };
        let Some(hit) = handles.cursor_on_plane(self.pivot, axis) else {
            return Vec::new();
        };
        let degrees = snap(
            signed_angle(start, hit - self.pivot, axis).to_degrees(),
            self.snap.rotate_step,
        );
        self.angle = degrees;
        trace!("rotate {degrees} degrees around {axis:?}");

        let delta = Quat::from_axis_angle(axis, degrees.to_radians());
        self.saved
            .iter()
            .map(|object| {
                let to_parent = object.parent_rotation.inverse();
                let world = self.pivot + delta * (object.world_position - self.pivot);
                TransformUpdate {
                    position: Some(object.position + to_parent * (world - object.world_position)),
                    rotation: Some(to_parent * delta * object.parent_rotation * object.rotation),
                    ..TransformUpdate::new(object.id)
                }
            })
            .collect()
    }

    fn set_snap(&mut self, snap: SnapOptions) {
        self.snap = snap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use thunder_core::{Camera, RecordingCommandBuffer};

    fn drag(
        tool: &mut RotateTool,
        axes: AxisMask,
        selection: &[SelectedObject],
        from: Vec2,
        to: Vec2,
    ) -> Vec<TransformUpdate> {
        let mut buffer = RecordingCommandBuffer::new();
        let mut handles = Handles::default();
        handles.set_axes(axes);
        handles.set_mouse(from);
        handles.begin_draw(
            &mut buffer,
            Some(Camera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 1.0)),
        );
        tool.begin_control(&handles, selection);
        handles.set_mouse(to);
        tool.update(&mut handles, &mut buffer, selection, true)
    }

    #[test]
    fn test_signed_angle() {
        let angle = signed_angle(Vec3::X, Vec3::Y, Vec3::Z);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((signed_angle(Vec3::Y, Vec3::X, Vec3::Z) + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(signed_angle(Vec3::ZERO, Vec3::X, Vec3::Z), 0.0);
    }

    #[test]
    fn test_quarter_turn_around_z() {
        let mut tool = RotateTool::default();
        let selection = [
            SelectedObject::new(1, Vec3::new(-1.0, 0.0, 0.0)),
            SelectedObject::new(2, Vec3::new(1.0, 0.0, 0.0)),
        ];
        let updates = drag(
            &mut tool,
            AxisMask::Z,
            &selection,
            Vec2::new(0.7, 0.5),
            Vec2::new(0.5, 0.3),
        );
        assert!((tool.angle() - 90.0).abs() < 1e-2);
        assert_eq!(updates.len(), 2);

        let moved = updates[1].position.unwrap();
        assert!((moved - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-3);
        let rotation = updates[1].rotation.unwrap();
        assert!((rotation * Vec3::X - Vec3::Y).length() < 1e-3);
    }

    #[test]
    fn test_angle_snaps_to_step() {
        let mut tool = RotateTool::new(SnapOptions::default().with_rotate_step(30.0));
        let selection = [SelectedObject::new(1, Vec3::ZERO)];
        let updates = drag(
            &mut tool,
            AxisMask::Z,
            &selection,
            Vec2::new(0.7, 0.5),
            Vec2::new(0.7, 0.3),
        );
        assert_eq!(tool.angle(), 30.0);
        assert_eq!(updates[0].position, Some(Vec3::ZERO));
    }

    #[test]
    fn test_plane_mask_does_not_rotate() {
        let mut tool = RotateTool::default();
        let selection = [SelectedObject::new(1, Vec3::ZERO)];
        let updates = drag(
            &mut tool,
            AxisMask::XY,
            &selection,
            Vec2::new(0.7, 0.5),
            Vec2::new(0.5, 0.3),
        );
        assert!(updates.is_empty());
    }

    #[test]
    fn test_free_rotation_uses_view_axis() {
        let mut tool = RotateTool::default();
        let selection = [SelectedObject::new(1, Vec3::ZERO)];
        let updates = drag(
            &mut tool,
            AxisMask::XYZ,
            &selection,
            Vec2::new(0.7, 0.5),
            Vec2::new(0.5, 0.3),
        );
        // view axis is -Z, so a counter-clockwise screen drag is -90 around it
        assert!((tool.angle() + 90.0).abs() < 1e-2);
        let rotation = updates[0].rotation.unwrap();
        assert!((rotation * Vec3::X - Vec3::Y).length() < 1e-3);
    }
}
