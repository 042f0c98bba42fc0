//! A compact cell indexes the run of [`CompactSpan`](crate::compact_span::CompactSpan)s
//! belonging to one xz-column of a [`CompactHeightfield`](crate::compact_heightfield::CompactHeightfield).

/// Points at the contiguous slice `spans[index..index + count]` for one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct CompactCell {
    /// Index of the column's first span in the compact heightfield's flat span array.
    pub index: u32,
    /// Number of spans in the column.
    pub count: u32,
}

impl CompactCell {
    pub(crate) fn new(index: u32, count: u32) -> Self {
        Self { index, count }
    }
}
