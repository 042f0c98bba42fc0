//! Region identifiers assigned to spans and, later, polygons during
//! partitioning. Kept as a full `u16` rather than the original's 8-bit
//! monotone-partition id, so watershed partitioning never wraps around on
//! large inputs (see the region-id width decision in the design notes).

bitflags::bitflags! {
    /// A region id, with the high bit reserved to flag a border region.
    ///
    /// `0` ([`RegionId::NONE`]) means unassigned. The low 15 bits are not
    /// really independent flags, but the running region counter; `bitflags`
    /// is used here the same way the original does, as a typed wrapper over
    /// a `u16` with one reserved marker bit rather than as a true flag set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct RegionId: u16 {
        /// No region assigned.
        const NONE = 0;
        /// Flag bit marking a region that touches the heightfield's outer border.
        const BORDER_REGION = 0x8000;
    }
}

impl RegionId {
    /// Mask of the bits that carry the numeric id, excluding flag bits.
    const ID_MASK: u16 = 0x7fff;

    /// Wraps a raw id (flags and all).
    #[inline]
    pub fn from_raw(raw: u16) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// The raw bit pattern, flags included.
    #[inline]
    pub fn raw(self) -> u16 {
        self.bits()
    }

    /// The numeric id with flag bits masked off.
    #[inline]
    pub fn id(self) -> u16 {
        self.bits() & Self::ID_MASK
    }

    /// `true` if the border-region flag is set.
    #[inline]
    pub fn is_border(self) -> bool {
        self.contains(Self::BORDER_REGION)
    }

    /// Returns this id with the border flag set.
    #[inline]
    pub fn with_border_flag(self) -> Self {
        self | Self::BORDER_REGION
    }

    /// Returns this id with the border flag cleared.
    #[inline]
    pub fn without_border_flag(self) -> Self {
        self.difference(Self::BORDER_REGION)
    }

    /// `true` if this is [`RegionId::NONE`] (ignoring flag bits).
    #[inline]
    pub fn is_none(self) -> bool {
        self.id() == 0
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<u16> for RegionId {
    fn from(value: u16) -> Self {
        Self::from_raw(value)
    }
}
