//! P-state MSR addresses and the family-independent P-state registers
//!
//! The limit, status and COFVID status registers share one layout across
//! every supported family. The per-P-state definition registers do not; their
//! layouts live in [`crate::arch`].
//!
//! ## References
//!
//! - AMD BIOS and Kernel Developer's Guide (BKDG) for families 10h-16h,
//!   section "MSRs - MSRC001_xxxx"
//! - AMD Processor Programming Reference (PPR) for families 17h and 19h

use crate::bitfield::BitField;
use crate::register::{RegisterImage, RegisterLayout};

/// P-state Current Limit
pub const PSTATE_CURRENT_LIMIT: u32 = 0xC001_0061;

/// P-state Control
pub const PSTATE_CONTROL: u32 = 0xC001_0062;

/// P-state Status
pub const PSTATE_STATUS: u32 = 0xC001_0063;

/// First P-state definition register; P-state `n` lives at `PSTATE_BASE + n`
pub const PSTATE_BASE: u32 = 0xC001_0064;

/// COFVID Status (families 10h-16h)
pub const COFVID_STATUS: u32 = 0xC001_0071;

/// Highest P-state definition register slot any family provides
pub const MAX_PSTATES: usize = 8;

/// Address of the P-state definition register for slot `index`
pub const fn pstate_address(index: usize) -> u32 {
    PSTATE_BASE + index as u32
}

/// Limit register fields
pub mod limit {
    use super::BitField;

    /// Highest-performance P-state the core may currently use
    pub const CUR_PSTATE_LIMIT: BitField = BitField::new(2, 0);

    /// Lowest-performance P-state the core may use
    pub const PSTATE_MAX_VAL: BitField = BitField::new(6, 4);
}

/// Status register fields
pub mod status {
    use super::BitField;

    pub const CUR_PSTATE: BitField = BitField::new(2, 0);
}

/// COFVID status fields that are not part of the per-family P-state layout
pub mod cofvid {
    use super::BitField;

    /// Highest voltage the platform allows (smallest VID code)
    pub const MAX_VID: BitField = BitField::new(41, 35);

    /// Lowest voltage the platform allows (largest VID code)
    pub const MIN_VID: BitField = BitField::new(48, 42);

    pub const MAX_CPU_COF: BitField = BitField::new(54, 49);

    pub const CUR_PSTATE_LIMIT: BitField = BitField::new(58, 56);
}

/// P-state Current Limit register layout
///
/// ## Register Format
///
/// | Bits   | Field            | Description                          |
/// |--------|------------------|--------------------------------------|
/// | 2-0    | cur_limit        | Highest usable P-state (CurPstateLimit) |
/// | 6-4    | max_value        | Lowest usable P-state (PstateMaxVal) |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PStateLimit {
    pub cur_limit: u8,
    pub max_value: u8,
}

impl RegisterLayout for PStateLimit {
    fn from_image(image: RegisterImage) -> Self {
        Self {
            cur_limit: image.get(limit::CUR_PSTATE_LIMIT) as u8,
            max_value: image.get(limit::PSTATE_MAX_VAL) as u8,
        }
    }

    fn apply(&self, base: RegisterImage) -> RegisterImage {
        base.with(limit::CUR_PSTATE_LIMIT, u64::from(self.cur_limit))
            .with(limit::PSTATE_MAX_VAL, u64::from(self.max_value))
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.cur_limit > 7 {
            return Err("CurPstateLimit must be <= 7 (3 bits)");
        }
        if self.max_value > 7 {
            return Err("PstateMaxVal must be <= 7 (3 bits)");
        }
        Ok(())
    }
}

/// P-state Status register layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PStateStatus {
    pub current: u8,
}

impl RegisterLayout for PStateStatus {
    fn from_image(image: RegisterImage) -> Self {
        Self {
            current: image.get(status::CUR_PSTATE) as u8,
        }
    }

    fn apply(&self, base: RegisterImage) -> RegisterImage {
        base.with(status::CUR_PSTATE, u64::from(self.current))
    }
}

/// Platform limits reported by COFVID status
///
/// A zero VID bound means the platform does not report that bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CofVidLimits {
    pub max_vid: u8,
    pub min_vid: u8,
    pub max_cpu_cof: u8,
    pub cur_pstate_limit: u8,
}

impl RegisterLayout for CofVidLimits {
    fn from_image(image: RegisterImage) -> Self {
        Self {
            max_vid: image.get(cofvid::MAX_VID) as u8,
            min_vid: image.get(cofvid::MIN_VID) as u8,
            max_cpu_cof: image.get(cofvid::MAX_CPU_COF) as u8,
            cur_pstate_limit: image.get(cofvid::CUR_PSTATE_LIMIT) as u8,
        }
    }

    fn apply(&self, base: RegisterImage) -> RegisterImage {
        base.with(cofvid::MAX_VID, u64::from(self.max_vid))
            .with(cofvid::MIN_VID, u64::from(self.min_vid))
            .with(cofvid::MAX_CPU_COF, u64::from(self.max_cpu_cof))
            .with(cofvid::CUR_PSTATE_LIMIT, u64::from(self.cur_pstate_limit))
    }
}
