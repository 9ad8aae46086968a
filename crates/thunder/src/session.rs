//! An editor viewport: the render pipeline plus the active transform tool.

use glam::Vec2;
use log::debug;
use thunder_core::{CommandBuffer, Options, Scene, SnapOptions, TextureHandle};
use thunder_editor::{
    EditorTool, HandleResources, Handles, MoveTool, SelectedObject, TransformUpdate,
};
use thunder_render::{Pipeline, COLOR_MAP, DEPTH_MAP};

/// Owns the pipeline, the handles context and the active tool of one
/// viewport.
///
/// A frame is `frame`, then `update_tool` for the gizmo overlay, then
/// `finish` to run the post chain and submit.
pub struct EditorSession<B: CommandBuffer> {
    pipeline: Pipeline<B>,
    handles: Handles,
    tool: Box<dyn EditorTool>,
    snap: SnapOptions,
    dragging: bool,
}

impl<B: CommandBuffer> EditorSession<B> {
    /// Creates a session with the move tool active.
    pub fn new(buffer: B, options: &Options, resources: HandleResources) -> Self {
        Self {
            pipeline: Pipeline::new(buffer, options.pipeline.clone()),
            handles: Handles::new(resources, options.handles.clone()),
            tool: Box::new(MoveTool::new(options.snap.clone())),
            snap: options.snap.clone(),
            dragging: false,
        }
    }

    /// Creates a session with default options and builtin handle resources.
    pub fn with_defaults(buffer: B) -> Self {
        Self::new(buffer, &Options::default(), HandleResources::builtin())
    }

    /// Returns the pipeline.
    pub fn pipeline(&self) -> &Pipeline<B> {
        &self.pipeline
    }

    /// Returns the pipeline mutably.
    pub fn pipeline_mut(&mut self) -> &mut Pipeline<B> {
        &mut self.pipeline
    }

    /// Returns the handles context.
    pub fn handles(&self) -> &Handles {
        &self.handles
    }

    /// Returns the handles context mutably.
    pub fn handles_mut(&mut self) -> &mut Handles {
        &mut self.handles
    }

    /// Returns the active tool.
    pub fn tool(&self) -> &dyn EditorTool {
        self.tool.as_ref()
    }

    /// Activates a tool. Any drag in progress is dropped.
    pub fn set_tool(&mut self, mut tool: Box<dyn EditorTool>) {
        tool.set_snap(self.snap.clone());
        debug!("active tool: {}", tool.name());
        self.tool = tool;
        self.dragging = false;
    }

    /// Replaces the snapping steps of the active and future tools.
    pub fn set_snap(&mut self, snap: SnapOptions) {
        self.tool.set_snap(snap.clone());
        self.snap = snap;
    }

    /// Resizes the viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pipeline.resize(width, height);
    }

    /// Renders the scene into the color target.
    pub fn frame(&mut self, scene: &Scene, frame_index: u64) {
        self.pipeline.draw(scene, frame_index);
    }

    /// Draws the active tool's gizmo over the color target and returns the
    /// edits of the drag in progress.
    ///
    /// The cursor comes from the pipeline's active controller. A drag starts
    /// on the first call with `is_drag` set.
    pub fn update_tool(
        &mut self,
        selection: &[SelectedObject],
        is_drag: bool,
    ) -> Vec<TransformUpdate> {
        let Some(color) = self.pipeline.pipeline_texture(COLOR_MAP) else {
            return Vec::new();
        };
        let depth = self.pipeline.pipeline_texture(DEPTH_MAP);
        let camera = self.pipeline.active_camera();
        let (width, height) = self.pipeline.screen_size();
        let mouse = self
            .pipeline
            .cursor()
            .map_or(Vec2::ZERO, |c| c / Vec2::new(width as f32, height as f32));

        let buffer = self.pipeline.buffer_mut();
        buffer.set_render_target(Some(color), depth);
        buffer.set_viewport(0, 0, width, height);

        self.handles.set_mouse(mouse);
        self.handles.begin_draw(buffer, camera);
        if is_drag && !self.dragging {
            self.tool.begin_control(&self.handles, selection);
        }
        self.dragging = is_drag;
        let updates = self
            .tool
            .update(&mut self.handles, buffer, selection, is_drag);
        self.handles.end_draw();
        updates
    }

    /// Runs the post chain on the color target, submits the frame and
    /// returns the texture to present.
    pub fn finish(&mut self) -> Option<TextureHandle> {
        let presented = self
            .pipeline
            .pipeline_texture(COLOR_MAP)
            .map(|color| self.pipeline.post_process(color));
        self.pipeline.buffer_mut().submit();
        presented
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;
    use thunder_core::{
        AxisMask, Camera, CameraController, Command, Mesh, MeshRenderer, Node, PrimitiveMode,
        RecordingCommandBuffer, SharedController, Surface,
    };
    use thunder_editor::{RotateTool, ScaleTool};

    use super::*;

    fn session_with_camera(cursor: Vec2) -> EditorSession<RecordingCommandBuffer> {
        let mut session = EditorSession::with_defaults(RecordingCommandBuffer::new());
        session.resize(100, 100);
        let mut controller = CameraController::new(Camera::looking_at(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            1.0,
        ));
        controller.cursor = cursor;
        let controller: SharedController = controller.shared();
        session.pipeline_mut().set_controller(Some(controller));
        session
    }

    fn scene() -> Scene {
        let mesh = Arc::new(Mesh::with_surface(
            "triangle",
            Surface::new(
                PrimitiveMode::Triangles,
                vec![Vec3::ZERO, Vec3::X, Vec3::Y],
                vec![0, 1, 2],
            ),
        ));
        let mut scene = Scene::new();
        scene
            .root
            .add_child(Node::component("triangle", MeshRenderer::new(1, mesh)));
        scene
    }

    #[test]
    fn test_gizmo_draws_into_color_target() {
        let mut session = session_with_camera(Vec2::new(5.0, 5.0));
        session.frame(&scene(), 0);
        let selection = [SelectedObject::new(1, Vec3::ZERO)];
        assert!(session.update_tool(&selection, false).is_empty());

        let color = session.pipeline().pipeline_texture(COLOR_MAP);
        let gizmo_draws: Vec<_> = session
            .pipeline()
            .buffer()
            .draws()
            .filter(|d| d.mesh_name == "Move")
            .collect();
        assert!(!gizmo_draws.is_empty());
        assert!(gizmo_draws.iter().all(|d| d.color_target == color));
        assert_eq!(session.handles().mouse(), Vec2::new(0.05, 0.05));
    }

    #[test]
    fn test_drag_moves_selection() {
        let mut session = session_with_camera(Vec2::new(50.0, 50.0));
        session.handles_mut().set_axes(AxisMask::X);
        let selection = [SelectedObject::new(4, Vec3::ZERO)];
        session.frame(&scene(), 0);
        // hover over the pivot, then grab it without re-testing the mask
        session.update_tool(&selection, true);

        let controller: SharedController = {
            let mut c = CameraController::new(Camera::looking_at(
                Vec3::new(0.0, 0.0, 10.0),
                Vec3::ZERO,
                1.0,
            ));
            c.cursor = Vec2::new(80.0, 50.0);
            c.shared()
        };
        session.pipeline_mut().set_controller(Some(controller));
        let updates = session.update_tool(&selection, true);
        assert_eq!(updates.len(), 1);
        assert!(updates[0].position.unwrap().x > 0.0);
    }

    fn offset_session(cursor: Vec2) -> EditorSession<RecordingCommandBuffer> {
        let mut session = EditorSession::with_defaults(RecordingCommandBuffer::new());
        session.resize(100, 100);
        session.handles_mut().set_axes(AxisMask::X);
        let mut controller = CameraController::new(Camera::looking_at(
            Vec3::new(5.0, 0.0, 10.0),
            Vec3::new(5.0, 0.0, 0.0),
            1.0,
        ));
        controller.cursor = cursor;
        let controller: SharedController = controller.shared();
        session.pipeline_mut().set_controller(Some(controller));
        session
    }

    #[test]
    fn test_press_without_hover_does_not_jump() {
        let selection = [SelectedObject::new(4, Vec3::new(5.0, 0.0, 0.0))];
        let mut session = offset_session(Vec2::new(50.0, 50.0));
        let updates = session.update_tool(&selection, true);
        let position = updates[0].position.unwrap();
        assert!((position - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-3);

        session.set_tool(Box::new(ScaleTool::default()));
        let updates = session.update_tool(&selection, true);
        let scale = updates[0].scale.unwrap();
        assert!((scale - Vec3::ONE).length() < 1e-3);
    }

    #[test]
    fn test_drag_after_press_follows_cursor() {
        let selection = [SelectedObject::new(4, Vec3::new(5.0, 0.0, 0.0))];
        let mut session = offset_session(Vec2::new(50.0, 50.0));
        session.update_tool(&selection, true);

        let controller: SharedController = {
            let mut c = CameraController::new(Camera::looking_at(
                Vec3::new(5.0, 0.0, 10.0),
                Vec3::new(5.0, 0.0, 0.0),
                1.0,
            ));
            c.cursor = Vec2::new(80.0, 50.0);
            c.shared()
        };
        session.pipeline_mut().set_controller(Some(controller));
        let updates = session.update_tool(&selection, true);
        let position = updates[0].position.unwrap();
        assert!(position.x > 5.0);
        assert_eq!(position.y, 0.0);
    }

    #[test]
    fn test_set_tool_switches_gizmo() {
        let mut session = session_with_camera(Vec2::new(5.0, 5.0));
        assert_eq!(session.tool().name(), "Move");
        session.set_tool(Box::new(RotateTool::default()));
        assert_eq!(session.tool().name(), "Rotate");
        session.update_tool(&[SelectedObject::new(1, Vec3::ZERO)], false);
        let circles = session
            .pipeline()
            .buffer()
            .draws()
            .filter(|d| d.mesh_name == "Move" && d.surface == 6)
            .count();
        assert_eq!(circles, 7);

        session.set_tool(Box::new(ScaleTool::default()));
        assert_eq!(session.tool().name(), "Scale");
    }

    #[test]
    fn test_finish_without_effects_presents_color_target() {
        let mut session = session_with_camera(Vec2::ZERO);
        session.frame(&scene(), 0);
        let presented = session.finish();
        assert_eq!(presented, session.pipeline().pipeline_texture(COLOR_MAP));
        assert_eq!(
            session.pipeline().buffer().commands().last(),
            Some(&Command::Submit)
        );
    }

    #[test]
    fn test_no_camera_draws_no_gizmo() {
        let mut session = EditorSession::with_defaults(RecordingCommandBuffer::new());
        let updates = session.update_tool(&[SelectedObject::new(1, Vec3::ZERO)], true);
        assert!(updates.is_empty());
        assert_eq!(session.pipeline().buffer().draws().count(), 0);
    }
}
