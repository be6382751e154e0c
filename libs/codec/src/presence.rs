//! Field-presence bitset for partial ("patch") updates
//!
//! An edit transmission carries one `u32` of flags ahead of the fields it
//! governs. Flag *i* is set iff optional field *i* was assigned through its
//! setter after construction; unset fields must leave the receiver's state
//! untouched. Flag indices are fixed per message type and never reused.
//!
//! Two field layouts share this bitset:
//! - **positional**: every slot is written, unset slots hold placeholders
//! - **sparse**: only set fields are written, in ascending flag order

use std::fmt;

use crate::error::ProtocolResult;
use crate::reader::TransmissionReader;
use crate::wire::{WireDecode, WireEncode};
use crate::writer::TransmissionWriter;

/// Number of flags a presence bitset can hold
pub const PRESENCE_CAPACITY: u8 = 32;

/// Compact set of up to 32 presence flags
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PresenceBits(u32);

impl PresenceBits {
    /// No field set
    pub const EMPTY: Self = Self(0);

    #[inline(always)]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Bitmask for the first `count` flags
    pub const fn mask_of_first(count: u8) -> u32 {
        assert!(count <= PRESENCE_CAPACITY, "presence index out of range");
        if count == PRESENCE_CAPACITY {
            u32::MAX
        } else {
            (1u32 << count) - 1
        }
    }

    #[inline]
    pub fn set(&mut self, index: u8) {
        self.0 |= Self::bit(index);
    }

    #[inline]
    pub fn clear(&mut self, index: u8) {
        self.0 &= !Self::bit(index);
    }

    #[inline]
    pub fn is_set(self, index: u8) -> bool {
        self.0 & Self::bit(index) != 0
    }

    /// True iff any flag is set
    #[inline]
    pub fn any(self) -> bool {
        self.0 != 0
    }

    #[inline]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Keep only the flags in `mask`
    #[inline]
    pub fn retain(&mut self, mask: u32) {
        self.0 &= mask;
    }

    /// Flags set in either bitset
    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Indices of set flags in ascending order
    pub fn iter_set(self) -> impl Iterator<Item = u8> {
        (0..PRESENCE_CAPACITY).filter(move |&index| self.is_set(index))
    }

    #[inline]
    fn bit(index: u8) -> u32 {
        assert!(
            index < PRESENCE_CAPACITY,
            "presence index {index} exceeds capacity {PRESENCE_CAPACITY}"
        );
        1u32 << index
    }
}

impl fmt::Debug for PresenceBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter_set()).finish()
    }
}

impl WireEncode for PresenceBits {
    #[inline]
    fn encode(&self, writer: &mut TransmissionWriter) {
        writer.write_u32(self.0);
    }
}

impl WireDecode for PresenceBits {
    #[inline]
    fn decode(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
        reader.read_u32().map(Self)
    }
}
