use glam::Vec3;
use log::trace;
use thunder_core::{AxisMask, CommandBuffer, SnapOptions};

use super::{pivot, snap, EditorTool, SelectedObject, TransformUpdate};
use crate::handles::Handles;

/// Smallest factor a drag can produce.
const MIN_FACTOR: f32 = 0.01;

/// Scales the selection by how far the cursor moved away from the pivot.
///
/// Dragging by one handle length away from the pivot doubles the scale,
/// dragging back towards it shrinks the selection.
#[derive(Debug, Clone, Default)]
pub struct ScaleTool {
    snap: SnapOptions,
    world: Vec3,
    saved_world: Vec3,
    pivot: Vec3,
    length: f32,
    axes: AxisMask,
    saved: Vec<SelectedObject>,
}

impl ScaleTool {
    /// Creates a scale tool with the given snapping.
    pub fn new(snap: SnapOptions) -> Self {
        Self {
            snap,
            ..Self::default()
        }
    }

    /// Scale factor of the current drag, per axis.
    pub fn factor(&self) -> Vec3 {
        if self.length <= f32::EPSILON {
            return Vec3::ONE;
        }
        let from = self.saved_world - self.pivot;
        let to = self.world - self.pivot;
        let factor = |a: f32, b: f32| {
            let f = 1.0 + (b.abs() - a.abs()) / self.length;
            (1.0 + snap(f - 1.0, self.snap.scale_step)).max(MIN_FACTOR)
        };

        if self.axes == AxisMask::XYZ {
            return Vec3::splat(factor(from.length(), to.length()));
        }
        let mut result = Vec3::ONE;
        for i in 0..3 {
            if self.axes.contains(AxisMask::axis(i)) {
                result[i] = factor(from[i], to[i]);
            }
        }
        result
    }
}

impl EditorTool for ScaleTool {
    fn name(&self) -> &'static str {
        "Scale"
    }

    fn icon(&self) -> &'static str {
        "icons/scale.png"
    }

    fn begin_control(&mut self, handles: &Handles, selection: &[SelectedObject]) {
        self.pivot = pivot(selection).unwrap_or_default();
        self.world = handles.resolve_cursor(self.pivot);
        self.saved_world = self.world;
        self.length = handles.scale_handle_length(self.pivot).unwrap_or_default();
        self.axes = handles.axes();
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
        self.world = handles.scale_tool(buffer, position, is_drag);
        if !is_drag || handles.camera().is_none() {
            return Vec::new();
        }

        let factor = self.factor();
        trace!("scale factor {factor:?}");
        self.saved
            .iter()
            .map(|object| TransformUpdate {
                scale: Some(object.scale * factor),
                ..TransformUpdate::new(object.id)
            })
            .collect()
    }

    fn set_snap(&mut self, snap: SnapOptions) {
        self.snap = snap;
    }
}
