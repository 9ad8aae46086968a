//! Camera controllers.
//!
//! A controller owns the camera the user steers and receives the result of
//! picking. The pipeline holds a local controller (an editor viewport) and an
//! engine controller, and prefers the local one.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::camera::Camera;

/// Source of the active camera and sink for selection.
pub trait Controller {
    /// The camera this controller drives, if any.
    fn active_camera(&self) -> Option<Camera>;

    /// Cursor position to pick at, in top-left framebuffer pixels.
    fn select_geometry(&self) -> Vec2;

    /// Receives the ids under the cursor (zero or one entry).
    fn set_selected_objects(&mut self, objects: &[u32]);

    /// True while the user is dragging.
    fn is_drag(&self) -> bool {
        false
    }
}

/// Controller shared between the pipeline and its owner.
pub type SharedController = Rc<RefCell<dyn Controller>>;

/// A minimal controller holding a camera, a cursor and the last selection.
#[derive(Debug, Clone, Default)]
pub struct CameraController {
    pub camera: Option<Camera>,
    pub cursor: Vec2,
    pub drag: bool,
    selection: Vec<u32>,
}

impl CameraController {
    /// Creates a controller for `camera`.
    #[must_use]
    pub fn new(camera: Camera) -> Self {
        Self {
            camera: Some(camera),
            ..Default::default()
        }
    }

    /// Wraps the controller for sharing with a pipeline.
    #[must_use]
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// The last selection received from the pipeline.
    pub fn selection(&self) -> &[u32] {
        &self.selection
    }
}

impl Controller for CameraController {
    fn active_camera(&self) -> Option<Camera> {
        self.camera.clone()
    }

    fn select_geometry(&self) -> Vec2 {
        self.cursor
    }

    fn set_selected_objects(&mut self, objects: &[u32]) {
        self.selection = objects.to_vec();
    }

    fn is_drag(&self) -> bool {
        self.drag
    }
}
