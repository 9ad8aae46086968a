//! Object-id picking.
//!
//! Ids are written to the pick target as little-endian RGBA8, so id
//! `0x11223344` is stored as the texel `[0x44, 0x33, 0x22, 0x11]`. Id 0 is
//! the cleared background and never names an object.

use glam::{Vec3, Vec4};

/// Encodes an object id into an RGBA8 texel.
#[must_use]
pub const fn encode_id(id: u32) -> [u8; 4] {
    id.to_le_bytes()
}

/// Decodes an RGBA8 texel. Returns `None` for the background.
#[must_use]
pub const fn decode_id(texel: [u8; 4]) -> Option<u32> {
    match u32::from_le_bytes(texel) {
        0 => None,
        id => Some(id),
    }
}

/// Returns the flat color that rasterizes to the texel of `id`.
#[must_use]
pub fn id_to_color(id: u32) -> Vec4 {
    let [r, g, b, a] = encode_id(id);
    Vec4::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        f32::from(a) / 255.0,
    )
}

/// Result of a pick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickResult {
    /// The object under the cursor, if any.
    pub object: Option<u32>,
    /// World position under the cursor, recovered from the depth target.
    pub world_position: Option<Vec3>,
    /// Raw depth under the cursor.
    pub depth: Option<f32>,
}

impl PickResult {
    /// A pick that hit nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true when no object was hit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.object.is_none()
    }

    /// The selection list forwarded to controllers (zero or one id).
    #[must_use]
    pub fn selection(&self) -> Vec<u32> {
        self.object.into_iter().collect()
    }
}
