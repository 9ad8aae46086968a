//! Editor interaction layer for thunder-rs.
//!
//! - [`Handles`]: move, rotate and scale gizmos with hit-testing and
//!   constraint-plane resolution
//! - [`HandleTools`]: screen-space distance queries against proxy meshes
//! - [`HandleResources`]: the procedural proxy mesh and loaded gizmo assets
//! - [`EditorTool`] implementations that turn drags into transform edits

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::float_cmp)]

pub mod handle_tools;
pub mod handles;
pub mod proxies;
pub mod tools;

pub use handle_tools::{distance_to_segment, HandleTools, SIDES};
pub use handles::{
    constraint_plane_normal, Handles, GREY_COLOR, NORMAL_COLOR, SELECTED_COLOR, X_COLOR, Y_COLOR,
    Z_COLOR,
};
pub use proxies::{build_move_proxy, BuiltinResources, HandleResources, ProxySurface};
pub use tools::{
    pivot, snap, snap_vec, EditorTool, MoveTool, RotateTool, ScaleTool, SelectedObject,
    TransformUpdate,
};
