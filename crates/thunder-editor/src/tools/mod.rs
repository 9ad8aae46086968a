//! Editor tools that turn gizmo interaction into transform edits.
//!
//! A tool is driven once per frame with the current selection. While the
//! user drags, it measures the cursor against the state captured by
//! [`EditorTool::begin_control`] and returns the transforms to apply.

mod move_tool;
mod rotate_tool;
mod scale_tool;

pub use move_tool::MoveTool;
pub use rotate_tool::RotateTool;
pub use scale_tool::ScaleTool;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thunder_core::{CommandBuffer, SnapOptions};

use crate::handles::Handles;

/// Snapshot of a selected object's transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectedObject {
    /// Object id.
    pub id: u32,
    /// Position relative to the parent.
    pub position: Vec3,
    /// Position in world space.
    pub world_position: Vec3,
    /// Rotation relative to the parent.
    pub rotation: Quat,
    /// Scale relative to the parent.
    pub scale: Vec3,
    /// World rotation of the parent, identity for root objects.
    pub parent_rotation: Quat,
}

impl SelectedObject {
    /// A root object at `position` with no rotation and unit scale.
    pub fn new(id: u32, position: Vec3) -> Self {
        Self {
            id,
            position,
            world_position: position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            parent_rotation: Quat::IDENTITY,
        }
    }

    /// Sets the parent-relative position, keeping the world position.
    #[must_use]
    pub fn with_local_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the parent-relative rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the scale.
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the parent's world rotation.
    #[must_use]
    pub fn with_parent_rotation(mut self, rotation: Quat) -> Self {
        self.parent_rotation = rotation;
        self
    }
}

/// New transform components for one object. `None` leaves a component as is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformUpdate {
    /// Object id.
    pub id: u32,
    /// New parent-relative position.
    pub position: Option<Vec3>,
    /// New parent-relative rotation.
    pub rotation: Option<Quat>,
    /// New scale.
    pub scale: Option<Vec3>,
}

impl TransformUpdate {
    /// An update that changes nothing.
    pub fn new(id: u32) -> Self {
        Self {
            id,
            position: None,
            rotation: None,
            scale: None,
        }
    }
}

/// A gizmo-driven editing tool.
pub trait EditorTool {
    /// Display name.
    fn name(&self) -> &'static str;

    /// Icon resource path.
    fn icon(&self) -> &'static str;

    /// Captures the drag start state.
    fn begin_control(&mut self, handles: &Handles, selection: &[SelectedObject]);

    /// Draws the gizmo and, while `is_drag` is set, returns the edits the
    /// drag produces relative to [`EditorTool::begin_control`].
    fn update(
        &mut self,
        handles: &mut Handles,
        buffer: &mut dyn CommandBuffer,
        selection: &[SelectedObject],
        is_drag: bool,
    ) -> Vec<TransformUpdate>;

    /// Replaces the snapping steps.
    fn set_snap(&mut self, snap: SnapOptions);
}

/// Centroid of the selection's world positions.
pub fn pivot(selection: &[SelectedObject]) -> Option<Vec3> {
    if selection.is_empty() {
        return None;
    }
    let sum: Vec3 = selection.iter().map(|s| s.world_position).sum();
    Some(sum / selection.len() as f32)
}

/// Truncates `value` to a multiple of `step`. Steps of zero or less leave
/// the value unchanged.
pub fn snap(value: f32, step: f32) -> f32 {
    if step > 0.0 {
        step * (value / step).trunc()
    } else {
        value
    }
}

/// Per-axis [`snap`].
pub fn snap_vec(value: Vec3, grid: Vec3) -> Vec3 {
    Vec3::new(
        snap(value.x, grid.x),
        snap(value.y, grid.y),
        snap(value.z, grid.z),
    )
}
