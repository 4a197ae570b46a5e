//! Family-specific register layouts
//!
//! Each AMD family documents its own P-state register layout, voltage
//! interface and core clock formula. This module provides one table per
//! family, consumed by [`crate::FamilyProfile::for_cpu`].
//!
//! ## Supported Families
//!
//! - **10h** (K10) - PVI or SVI, probed through D18F3
//! - **11h** (Puma) - FID offset 08h
//! - **12h** (Llano) - table-driven core divisor
//! - **14h** (Bobcat) - quarter-step divisor off the main PLL
//! - **15h** (Bulldozer family) - northbridge P-states in D18F5
//! - **16h** (Jaguar/Puma+) - SVI2, northbridge P-states in D18F5
//! - **17h/19h** (Zen) - FID/DID ratio, zero-based P-state numbering

pub mod fam10h;
pub mod fam11h;
pub mod fam12h;
pub mod fam14h;
pub mod fam15h;
pub mod fam16h;
pub mod zen;

use crate::bitfield::BitField;

/// Fields shared by every pre-Zen P-state definition register
pub mod legacy {
    use super::BitField;

    pub const CPU_FID: BitField = BitField::new(5, 0);
    pub const CPU_DID: BitField = BitField::new(8, 6);
    pub const CPU_VID: BitField = BitField::new(15, 9);
    pub const NB_VID: BitField = BitField::new(31, 25);
    pub const IDD_VALUE: BitField = BitField::new(39, 32);
    pub const IDD_DIV: BitField = BitField::new(41, 40);
    pub const PSTATE_EN: BitField = BitField::bit(63);
}
