use glam::Vec3;
use log::trace;
use thunder_core::{CommandBuffer, SnapOptions};

use super::{pivot, snap_vec, EditorTool, SelectedObject, TransformUpdate};
use crate::handles::Handles;

/// Translates the selection along the active handle axes.
#[derive(Debug, Clone, Default)]
pub struct MoveTool {
    snap: SnapOptions,
    world: Vec3,
    saved_world: Vec3,
    saved: Vec<SelectedObject>,
}

impl MoveTool {
    /// Creates a move tool with the given snapping.
    pub fn new(snap: SnapOptions) -> Self {
        Self {
            snap,
            ..Self::default()
        }
    }

    /// Last cursor position resolved by the gizmo.
    pub fn world(&self) -> Vec3 {
        self.world
    }
}

impl EditorTool for MoveTool {
    fn name(&self) -> &'static str {
        "Move"
    }

    fn icon(&self) -> &'static str {
        "icons/move.png"
    }

    fn begin_control(&mut self, handles: &Handles, selection: &[SelectedObject]) {
        if let Some(position) = pivot(selection) {
            self.world = handles.resolve_cursor(position);
        }
        self.saved_world = self.world;
        self.saved = selection.to_vec();
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
        self.world = handles.move_tool(buffer, position, is_drag);
        if !is_drag || handles.camera().is_none() {
            return Vec::new();
        }

        let delta = snap_vec(self.world - self.saved_world, self.snap.move_grid);
        trace!("move delta {delta:?}");
        self.saved
            .iter()
            .map(|object| TransformUpdate {
                position: Some(object.position + object.parent_rotation.inverse() * delta),
                ..TransformUpdate::new(object.id)
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
    use glam::{Quat, Vec2};
    use thunder_core::{AxisMask, Camera, RecordingCommandBuffer};

    fn front_camera() -> Camera {
        Camera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 1.0)
    }

    fn drag(
        tool: &mut MoveTool,
        handles: &mut Handles,
        selection: &[SelectedObject],
        from: Vec2,
        to: Vec2,
    ) -> Vec<TransformUpdate> {
        let mut buffer = RecordingCommandBuffer::new();
        handles.set_mouse(from);
        handles.begin_draw(&mut buffer, Some(front_camera()));
        tool.begin_control(handles, selection);
        handles.set_mouse(to);
        tool.update(handles, &mut buffer, selection, true)
    }

    #[test]
    fn test_name_and_icon() {
        let tool = MoveTool::default();
        assert_eq!(tool.name(), "Move");
        assert!(tool.icon().ends_with(".png"));
    }

    #[test]
    fn test_hover_produces_no_updates() {
        let mut tool = MoveTool::default();
        let mut handles = Handles::default();
        let mut buffer = RecordingCommandBuffer::new();
        handles.begin_draw(&mut buffer, Some(front_camera()));
        let selection = [SelectedObject::new(1, Vec3::ZERO)];
        assert!(tool.update(&mut handles, &mut buffer, &selection, false).is_empty());
        assert!(buffer.draws().count() > 0);
    }

    #[test]
    fn test_empty_selection_draws_nothing() {
        let mut tool = MoveTool::default();
        let mut handles = Handles::default();
        let mut buffer = RecordingCommandBuffer::new();
        handles.begin_draw(&mut buffer, Some(front_camera()));
        assert!(tool.update(&mut handles, &mut buffer, &[], true).is_empty());
        assert_eq!(buffer.draws().count(), 0);
    }

    #[test]
    fn test_drag_along_x() {
        let mut tool = MoveTool::default();
        let mut handles = Handles::default();
        handles.set_axes(AxisMask::X);
        let selection = [SelectedObject::new(3, Vec3::ZERO)];
        let updates = drag(
            &mut tool,
            &mut handles,
            &selection,
            Vec2::new(0.5, 0.5),
            Vec2::new(0.7, 0.3),
        );
        assert_eq!(updates.len(), 1);
        let position = updates[0].position.unwrap();
        assert_eq!(updates[0].id, 3);
        assert!(position.x > 0.0);
        assert_eq!(position.y, 0.0);
        assert_eq!(position.z, 0.0);
        assert!(updates[0].rotation.is_none());
    }

    #[test]
    fn test_drag_snaps_to_grid() {
        let mut tool = MoveTool::new(SnapOptions::default().with_move_grid(Vec3::splat(1.0)));
        let mut handles = Handles::default();
        handles.set_axes(AxisMask::XY);
        let selection = [SelectedObject::new(3, Vec3::ZERO)];
        let updates = drag(
            &mut tool,
            &mut handles,
            &selection,
            Vec2::new(0.5, 0.5),
            Vec2::new(0.9, 0.2),
        );
        let position = updates[0].position.unwrap();
        assert_eq!(position, position.trunc());
        assert!(position.x >= 1.0);
    }

    #[test]
    fn test_delta_is_rotated_into_parent_space() {
        let mut tool = MoveTool::default();
        let mut handles = Handles::default();
        handles.set_axes(AxisMask::X);
        let parent = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let selection = [SelectedObject::new(5, Vec3::ZERO)
            .with_local_position(Vec3::new(1.0, 0.0, 0.0))
            .with_parent_rotation(parent)];
        let updates = drag(
            &mut tool,
            &mut handles,
            &selection,
            Vec2::new(0.5, 0.5),
            Vec2::new(0.7, 0.5),
        );
        let position = updates[0].position.unwrap();
        // world +X is parent -Y
        assert!((position.x - 1.0).abs() < 1e-4);
        assert!(position.y < 0.0);
    }

    #[test]
    fn test_press_away_from_origin_starts_at_rest() {
        let mut tool = MoveTool::default();
        let mut handles = Handles::default();
        handles.set_axes(AxisMask::X);
        let camera = Camera::looking_at(Vec3::new(5.0, 0.0, 10.0), Vec3::new(5.0, 0.0, 0.0), 1.0);
        let selection = [SelectedObject::new(2, Vec3::new(5.0, 0.0, 0.0))];
        let mut buffer = RecordingCommandBuffer::new();
        handles.set_mouse(Vec2::new(0.5, 0.5));
        handles.begin_draw(&mut buffer, Some(camera));

        tool.begin_control(&handles, &selection);
        let updates = tool.update(&mut handles, &mut buffer, &selection, true);
        let position = updates[0].position.unwrap();
        assert!((position - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-3);

        handles.set_mouse(Vec2::new(0.8, 0.5));
        let updates = tool.update(&mut handles, &mut buffer, &selection, true);
        assert!(updates[0].position.unwrap().x > 5.0);
    }
}
