//! thunder-rs: the editor viewport of the thunder engine.
//!
//! A frame renders shadows, resolves the object under the cursor, draws
//! the scene and finally overlays the transform gizmo of the active tool.
//!
//! # Quick Start
//!
//! ```no_run
//! use thunder::*;
//!
//! init_logging();
//!
//! let mut session = EditorSession::with_defaults(RecordingCommandBuffer::new());
//! session.resize(1280, 720);
//! let controller = CameraController::new(Camera::looking_at(
//!     Vec3::new(4.0, 3.0, 6.0),
//!     Vec3::ZERO,
//!     16.0 / 9.0,
//! ));
//! let controller: SharedController = controller.shared();
//! session.pipeline_mut().set_controller(Some(controller));
//!
//! let scene = Scene::new();
//! let selection = [SelectedObject::new(1, Vec3::ZERO)];
//! session.frame(&scene, 0);
//! let edits = session.update_tool(&selection, false);
//! let presented = session.finish();
//! # let _ = (edits, presented);
//! ```
//!
//! # Crates
//!
//! - `thunder-core`: command buffer seam, camera, scene slice, options
//! - `thunder-render`: [`Pipeline`], post effects and the wgpu backend
//! - `thunder-editor`: [`Handles`] and the editor tools

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

mod error;
mod headless;
mod session;

pub use error::{Error, Result};
pub use headless::{render_to_file, render_to_image};
pub use session::EditorSession;

pub use thunder_core::{
    project_point, AxisMask, Camera, CameraController, Command, CommandBuffer, Controller,
    DirectionalLight, Drawable, HandleOptions, Layer, Material, MaterialInstance, Mesh,
    MeshRenderer, Node, NodeKind, Options, PickResult, PipelineOptions, PostEffectKind,
    PrimitiveMode, RecordingCommandBuffer, ResourceLoader, Scene, SharedController, SnapOptions,
    Surface, TextureFormat, TextureHandle, ThunderError, ToneMappingConfig,
};
pub use thunder_core::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use thunder_editor::{
    constraint_plane_normal, snap, snap_vec, BuiltinResources, EditorTool, HandleResources,
    HandleTools, Handles, MoveTool, RotateTool, ScaleTool, SelectedObject, TransformUpdate,
};
pub use thunder_render::{
    FxaaPass, Pipeline, PostEffect, RenderError, ToneMapPass, WgpuCommandBuffer, COLOR_MAP,
    DEPTH_MAP, SELECT_MAP, SHADOW_MAP,
};

/// Installs the `env_logger` backend for the `log` facade.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
