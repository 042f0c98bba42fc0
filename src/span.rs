//! A span is a voxel column interval within one xz-column of a [`Heightfield`](crate::heightfield::Heightfield).
//!
//! Spans are allocated from a [`Spans`] arena; a span's `next` pointer is a
//! [`SpanKey`] handle into that arena rather than a borrowed reference, so the
//! column lists can be mutated freely without fighting the borrow checker.

use slotmap::SlotMap;
use std::ops::{Deref, DerefMut};

slotmap::new_key_type! {
    /// A key for a span in [`Spans`].
    pub struct SpanKey;
}

/// The arena backing all spans in one [`Heightfield`](crate::heightfield::Heightfield).
///
/// Removing a span recycles its slot, so this doubles as the pool-plus-freelist
/// the original design calls for.
#[derive(Debug, Clone)]
pub struct Spans(SlotMap<SpanKey, Span>);

impl Deref for Spans {
    type Target = SlotMap<SpanKey, Span>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Spans {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Spans {
    const DEFAULT_CAPACITY: usize = 1024;

    pub(crate) fn with_min_capacity(min_capacity: usize) -> Self {
        let capacity = min_capacity.max(Self::DEFAULT_CAPACITY);
        Self(SlotMap::with_capacity_and_key(capacity))
    }
}

/// A vertical interval within one xz-column: `(min, max, area, next)`.
///
/// `min < max`; both should stay within `[0, 2^13)` to match the original
/// packed representation, though this port stores them as plain `u16` since
/// the bit-packing saved no useful alignment in Rust.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Span {
    min: u16,
    max: u16,
    area: AreaType,
    next: Option<SpanKey>,
}

pub(crate) struct SpanBuilder {
    pub(crate) min: u16,
    pub(crate) max: u16,
    pub(crate) area: AreaType,
    pub(crate) next: Option<SpanKey>,
}

impl SpanBuilder {
    pub(crate) fn build(self) -> Span {
        Span {
            min: self.min,
            max: self.max,
            area: self.area,
            next: self.next,
        }
    }
}

impl Span {
    pub(crate) const MAX_HEIGHT: u16 = u16::MAX;

    /// The floor height, in cell units.
    #[inline]
    pub fn min(&self) -> u16 {
        self.min
    }

    #[inline]
    pub(crate) fn set_min(&mut self, min: u16) {
        self.min = min;
    }

    /// The ceiling height, in cell units.
    #[inline]
    pub fn max(&self) -> u16 {
        self.max
    }

    #[inline]
    pub(crate) fn set_max(&mut self, max: u16) {
        self.max = max;
    }

    /// The area type of this span.
    #[inline]
    pub fn area(&self) -> AreaType {
        self.area
    }

    #[inline]
    pub(crate) fn set_area(&mut self, area: impl Into<AreaType>) {
        self.area = area.into();
    }

    /// The key of the next-higher span in the column, if any.
    #[inline]
    pub fn next(&self) -> Option<SpanKey> {
        self.next
    }

    #[inline]
    pub(crate) fn set_next(&mut self, next: impl Into<Option<SpanKey>>) {
        self.next = next.into();
    }
}

/// The area type id of a span or polygon.
///
/// `0` ([`AreaType::NOT_WALKABLE`]) and `63` ([`AreaType::WALKABLE`]) are
/// reserved. The rest are free for user-defined area types, e.g. to assign
/// different traversal costs to mud, water, or roads. When two spans merge
/// during rasterization, the resulting area is the maximum of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct AreaType(pub u8);

impl Default for AreaType {
    fn default() -> Self {
        Self::NOT_WALKABLE
    }
}

impl From<u8> for AreaType {
    fn from(value: u8) -> Self {
        AreaType(value)
    }
}

impl AreaType {
    /// Spans/triangles with this area type are not walkable.
    pub const NOT_WALKABLE: Self = Self(0);
    /// The default area type assigned to walkable triangles.
    pub const WALKABLE: Self = Self(63);

    /// `true` for every area type other than [`AreaType::NOT_WALKABLE`].
    #[inline]
    pub fn is_walkable(&self) -> bool {
        *self != Self::NOT_WALKABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        SpanBuilder {
            min: 2,
            max: 10,
            area: AreaType(4),
            next: None,
        }
        .build()
    }

    #[test]
    fn can_retrieve_span_data_after_building() {
        let span = span();
        assert_eq!(span.min(), 2);
        assert_eq!(span.max(), 10);
        assert_eq!(span.area(), AreaType(4));
        assert_eq!(span.next(), None);
    }

    #[test]
    fn walkable_area_is_nonzero() {
        assert!(AreaType::WALKABLE.is_walkable());
        assert!(!AreaType::NOT_WALKABLE.is_walkable());
    }

    #[test]
    fn merging_areas_keeps_the_max() {
        assert_eq!(AreaType(3).max(AreaType(9)), AreaType(9));
    }
}
