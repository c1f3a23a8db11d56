//! The `FR` flag register.
//!
//! `FR` is an 8-bit register; bit 0 is the zero flag, bit 1 is the carry
//! flag. The remaining six bits are reserved and must survive every
//! single-bit flag operation untouched, so this wraps a raw byte rather
//! than truncating to the two known bits.

use bitflags::bitflags;

bitflags! {
    /// Flag bits within `FR`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u8 {
        /// Zero flag (bit 0) — set by `CMP` when its operands are equal.
        const ZERO = 1 << 0;
        /// Carry flag (bit 1) — set by arithmetic/shift overflow or by
        /// `CMP` when the destination is less than the source.
        const CARRY = 1 << 1;
    }
}

impl Flags {
    /// Reconstruct `FR` from its raw byte, preserving reserved bits.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    /// The raw byte value of `FR`, including reserved bits.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.bits()
    }

    /// Set or clear a single flag without disturbing any other bit.
    #[inline]
    pub fn set_flag(&mut self, flag: Self, value: bool) {
        self.set(flag, value);
    }
}
