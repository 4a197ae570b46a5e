//! Bit-range extraction and insertion over 64-bit register images
//!
//! A [`BitField`] names an inclusive `[high:low]` run of bits. Fields are
//! built once, as constants in the per-family tables, so no bit range is ever
//! parsed at run time.

use std::fmt;

/// An inclusive `[high:low]` bit range within a 64-bit register
///
/// A field with `high == low` is a single-bit flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitField {
    high: u8,
    low: u8,
}

impl BitField {
    /// Create a field covering bits `high` down to `low`, both inclusive
    ///
    /// # Panics
    ///
    /// Panics (at compile time when used in a `const`) if `low > high` or
    /// `high > 63`.
    pub const fn new(high: u8, low: u8) -> Self {
        assert!(low <= high, "bit field low bit above high bit");
        assert!(high <= 63, "bit field beyond bit 63");
        Self { high, low }
    }

    /// Create a single-bit flag field
    pub const fn bit(bit: u8) -> Self {
        Self::new(bit, bit)
    }

    pub const fn high(&self) -> u8 {
        self.high
    }

    pub const fn low(&self) -> u8 {
        self.low
    }

    /// Number of bits covered by the field
    pub const fn width(&self) -> u32 {
        (self.high - self.low) as u32 + 1
    }

    pub const fn is_flag(&self) -> bool {
        self.high == self.low
    }

    /// Largest value the field can hold
    pub const fn max_value(&self) -> u64 {
        if self.width() == 64 {
            u64::MAX
        } else {
            (1u64 << self.width()) - 1
        }
    }

    /// Mask of the field's bits in register position
    pub const fn mask(&self) -> u64 {
        self.max_value() << self.low
    }

    pub const fn fits(&self, value: u64) -> bool {
        value <= self.max_value()
    }

    pub const fn overlaps(&self, other: &BitField) -> bool {
        self.mask() & other.mask() != 0
    }

    /// Extract the field from a register image
    ///
    /// The result is always unsigned and lies in `[0, max_value()]`.
    pub const fn decode(&self, image: u64) -> u64 {
        if self.is_flag() {
            (image >> self.high) & 1
        } else {
            (image >> self.low) & self.max_value()
        }
    }

    /// Replace the field's bits in `image` with `value`
    ///
    /// Bits outside the field are left untouched. A value that does not fit
    /// the field width leaves the image unchanged; callers that need to
    /// report such values check [`BitField::fits`] first.
    pub const fn encode(&self, image: u64, value: u64) -> u64 {
        if !self.fits(value) {
            return image;
        }

        if self.is_flag() {
            if value == 1 {
                image | (1u64 << self.high)
            } else {
                image & !(1u64 << self.high)
            }
        } else {
            (image & !self.mask()) | (value << self.low)
        }
    }
}

impl fmt::Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.high, self.low)
    }
}
