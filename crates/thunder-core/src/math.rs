//! Rays, planes and the constraint axis mask used by the handles.

use std::ops::{BitAnd, BitOr, BitOrAssign};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Tolerance below which a ray is treated as parallel to a plane.
const PARALLEL_EPSILON: f32 = 1e-6;

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Vec3,
    /// Normalized ray direction.
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray, normalizing the direction.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Returns the point at parameter `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersects the ray with a plane.
    ///
    /// With `two_sided` set, intersections behind the origin are accepted as
    /// well, which is what the handles want when the constraint plane passes
    /// behind the camera.
    #[must_use]
    pub fn intersect_plane(&self, plane: &Plane, two_sided: bool) -> Option<Vec3> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (plane.d - plane.normal.dot(self.origin)) / denom;
        if t < 0.0 && !two_sided {
            return None;
        }
        Some(self.at(t))
    }
}

/// An infinite plane stored as point, unit normal and signed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub point: Vec3,
    /// Unit normal.
    pub normal: Vec3,
    /// Signed distance from the origin (`normal · point`).
    pub d: f32,
}

impl Plane {
    /// Creates a plane through `point` with the given normal.
    #[must_use]
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            point,
            normal,
            d: normal.dot(point),
        }
    }

    /// Signed distance from `p` to the plane.
    #[must_use]
    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.d
    }
}

/// Set of world axes taking part in a manipulation.
///
/// One axis constrains motion to a line, two axes to a plane and all three
/// mean free (or uniform) manipulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AxisMask(u8);

impl AxisMask {
    /// No axis.
    pub const NONE: Self = Self(0);
    /// X axis.
    pub const X: Self = Self(1);
    /// Y axis.
    pub const Y: Self = Self(2);
    /// Z axis.
    pub const Z: Self = Self(4);
    /// XY plane.
    pub const XY: Self = Self(1 | 2);
    /// YZ plane.
    pub const YZ: Self = Self(2 | 4);
    /// XZ plane.
    pub const XZ: Self = Self(1 | 4);
    /// All three axes.
    pub const XYZ: Self = Self(1 | 2 | 4);

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Builds a mask from raw bits, dropping anything above Z.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Returns the single-axis mask for a component index (0 = X).
    #[must_use]
    pub const fn axis(index: usize) -> Self {
        match index {
            0 => Self::X,
            1 => Self::Y,
            2 => Self::Z,
            _ => Self::NONE,
        }
    }

    /// Returns true if every axis in `other` is also in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if `self` and `other` share an axis.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if no axis is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of axes in the mask.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Copies the components of `source` selected by the mask into `target`.
    #[must_use]
    pub fn select(self, target: Vec3, source: Vec3) -> Vec3 {
        let mut result = target;
        for i in 0..3 {
            if self.contains(Self::axis(i)) {
                result[i] = source[i];
            }
        }
        result
    }
}

impl BitOr for AxisMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AxisMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for AxisMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}
