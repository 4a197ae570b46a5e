//! Register images and typed register layouts

use std::fmt;

use crate::bitfield::BitField;

/// Raw 64-bit content of one MSR or one PCI configuration register
///
/// An image is read fresh before each decode/modify sequence and is only ever
/// mutated one field at a time through [`BitField::encode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegisterImage(u64);

impl RegisterImage {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Decode one field
    pub const fn get(self, field: BitField) -> u64 {
        field.decode(self.0)
    }

    pub const fn flag(self, field: BitField) -> bool {
        field.decode(self.0) == 1
    }

    /// Encode one field in place (no-op when `value` does not fit)
    pub fn set(&mut self, field: BitField, value: u64) {
        self.0 = field.encode(self.0, value);
    }

    pub fn set_flag(&mut self, field: BitField, on: bool) {
        self.set(field, u64::from(on));
    }

    /// Return a copy with one field replaced
    pub const fn with(self, field: BitField, value: u64) -> Self {
        Self(field.encode(self.0, value))
    }
}

impl From<u64> for RegisterImage {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<RegisterImage> for u64 {
    fn from(image: RegisterImage) -> Self {
        image.0
    }
}

impl fmt::Display for RegisterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::LowerHex for RegisterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Trait for register layouts that can be converted to/from register images
///
/// Unlike a plain value conversion, [`RegisterLayout::apply`] takes the image
/// the layout was decoded from, so read-modify-write sequences keep reserved
/// and unrelated bits intact.
///
/// # Example
///
/// ```
/// use amdctl_raw::msr::PStateLimit;
/// use amdctl_raw::{RegisterImage, RegisterLayout};
///
/// let image = RegisterImage::new(0x0000_0000_0000_0040);
/// let mut limit = PStateLimit::from_image(image);
/// assert_eq!(limit.max_value, 4);
///
/// limit.max_value = 3;
/// assert_eq!(limit.apply(image).raw(), 0x30);
/// ```
pub trait RegisterLayout: Sized {
    /// Parse a register image into this layout
    fn from_image(image: RegisterImage) -> Self;

    /// Write this layout's fields over `base`, leaving other bits untouched
    fn apply(&self, base: RegisterImage) -> RegisterImage;

    /// Validate that the layout values fit their fields
    ///
    /// Returns `Ok(())` if valid, or an error message if invalid.
    fn validate(&self) -> Result<(), &'static str> {
        Ok(())
    }
}
