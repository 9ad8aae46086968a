//! Core types for thunder-rs.
//!
//! This crate holds everything the render pipeline and the transform handles
//! share:
//! - [`CommandBuffer`] draw submission trait and the CPU [`RecordingCommandBuffer`]
//! - [`Camera`], [`Ray`], [`Plane`] and [`AxisMask`]
//! - meshes, materials and the scene graph slice the pipeline walks
//! - [`Controller`] and [`ResourceLoader`] seams
//! - the pick-id codec and configuration options

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Pixel and index math converts between integer widths on purpose
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::many_single_char_names)]

pub mod camera;
pub mod command_buffer;
pub mod controller;
pub mod error;
pub mod math;
pub mod mesh;
pub mod options;
pub mod pick;
pub mod recording;
pub mod resources;
pub mod scene;

pub use camera::{project_point, Camera, ProjectionMode};
pub use command_buffer::{
    CommandBuffer, FrameStats, GlobalValue, Layer, TextureFormat, TextureHandle, Viewport,
};
pub use controller::{CameraController, Controller, SharedController};
pub use error::{Result, ThunderError};
pub use math::{AxisMask, Plane, Ray};
pub use mesh::{Material, MaterialInstance, Mesh, PrimitiveMode, Surface};
pub use options::{
    HandleOptions, Options, PipelineOptions, PostEffectKind, SnapOptions, ToneMappingConfig,
};
pub use pick::{decode_id, encode_id, id_to_color, PickResult};
pub use recording::{Command, DrawCall, RecordingCommandBuffer};
pub use resources::{NullLoader, ResourceLoader};
pub use scene::{DirectionalLight, Drawable, MeshRenderer, Node, NodeKind, Scene};

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
