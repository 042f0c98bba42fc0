//! Small geometry helpers shared across the pipeline: axis-aligned bounding
//! boxes and the fixed direction-offset tables used by every grid-walking
//! algorithm in this crate.

use glam::{IVec2, Vec3A};

/// An axis-aligned bounding box in 3D world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb3d {
    /// The minimum corner.
    pub min: Vec3A,
    /// The maximum corner.
    pub max: Vec3A,
}

impl Aabb3d {
    /// Creates a new AABB from a min and max corner.
    pub fn new(min: impl Into<Vec3A>, max: impl Into<Vec3A>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Computes the AABB enclosing a set of points. Returns `None` if `verts` is empty.
    pub fn from_verts(verts: &[Vec3A]) -> Option<Self> {
        let mut iter = verts.iter();
        let first = *iter.next()?;
        let mut aabb = Self {
            min: first,
            max: first,
        };
        for v in iter {
            aabb.min = aabb.min.min(*v);
            aabb.max = aabb.max.max(*v);
        }
        Some(aabb)
    }

    /// Expands this AABB to also contain `other`.
    pub fn merge(&mut self, other: &Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Returns `true` if the two AABBs overlap, including touching.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// An axis-aligned bounding box in 2D, quantized cell coordinates (xz-plane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Aabb2d {
    /// The minimum corner.
    pub min: IVec2,
    /// The maximum corner.
    pub max: IVec2,
}

impl Aabb2d {
    /// Returns `true` if the two boxes overlap, including touching.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// Fixed neighbor direction order used throughout the pipeline: `0=-x, 1=+z, 2=+x, 3=-z`.
pub const DIR_OFFSET_X: [i8; 4] = [-1, 0, 1, 0];
/// Fixed neighbor direction order used throughout the pipeline: `0=-x, 1=+z, 2=+x, 3=-z`.
pub const DIR_OFFSET_Z: [i8; 4] = [0, 1, 0, -1];

/// The x-axis offset for the given direction (`direction & 3` is taken, so any integer is valid).
#[inline]
pub fn dir_offset_x(direction: u8) -> i8 {
    DIR_OFFSET_X[direction as usize & 0x3]
}

/// The z-axis offset for the given direction (`direction & 3` is taken, so any integer is valid).
#[inline]
pub fn dir_offset_z(direction: u8) -> i8 {
    DIR_OFFSET_Z[direction as usize & 0x3]
}

/// Rotates a direction clockwise by one step.
#[inline]
pub fn rotate_cw(direction: u8) -> u8 {
    (direction + 1) & 0x3
}

/// Rotates a direction counterclockwise by one step.
#[inline]
pub fn rotate_ccw(direction: u8) -> u8 {
    (direction + 3) & 0x3
}

/// The opposite direction, i.e. `(direction + 2) % 4`.
#[inline]
pub fn opposite(direction: u8) -> u8 {
    (direction + 2) & 0x3
}
