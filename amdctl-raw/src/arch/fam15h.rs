//! Family 15h (Bulldozer, Piledriver, Steamroller, Excavator) P-state
//! definitions
//!
//! Models 00h-0Fh use SVI with a 7-bit core VID. Models 10h and later use
//! SVI2 with an 8-bit core VID at bits 16:9. The northbridge has its own
//! P-states in D18F5x160 onwards: two on models 00h-0Fh, four after.
//!
//! ## Northbridge P-state Register Format (D18F5x1[6C:60])
//!
//! | Bits   | Field      |
//! |--------|------------|
//! | 0      | NbPstateEn |
//! | 6-1    | NbFid      |
//! | 7      | NbDid      |
//! | 16-10  | NbVid[6:0] |
//! | 21     | NbVid[7] (SVI2 models) |

use super::legacy;
use crate::bitfield::BitField;
use crate::convert::{ClockFormula, CurrentFormula, VoltageEncoding};
use crate::family::{CpuFamily, FamilyProfile, NbPStateLayout, PStateLayout, RegisterMap};
use crate::pci;

pub const PSTATE_COUNT: usize = 8;

/// First model using SVI2
pub const SVI2_FIRST_MODEL: u32 = 0x10;

/// D18F5x160: northbridge P-state 0
pub const NB_PSTATE_BASE: u32 = 0x160;

/// Northbridge P-state register fields
pub mod nb {
    use super::BitField;

    pub const NB_PSTATE_EN: BitField = BitField::bit(0);
    pub const NB_FID: BitField = BitField::new(6, 1);
    pub const NB_DID: BitField = BitField::bit(7);
    pub const NB_VID: BitField = BitField::new(16, 10);
    pub const NB_VID_HIGH: BitField = BitField::bit(21);
}

/// 8-bit CpuVid on SVI2 models
pub const CPU_VID_SVI2: BitField = BitField::new(16, 9);

pub const LAYOUT_SVI: PStateLayout = PStateLayout {
    cpu_vid: legacy::CPU_VID,
    cpu_did: legacy::CPU_DID,
    cpu_fid: legacy::CPU_FID,
    nb_vid: None,
    idd_value: legacy::IDD_VALUE,
    idd_div: legacy::IDD_DIV,
    enable: legacy::PSTATE_EN,
};

pub const LAYOUT_SVI2: PStateLayout = PStateLayout {
    cpu_vid: CPU_VID_SVI2,
    ..LAYOUT_SVI
};

/// Northbridge P-state table in D18F5
pub const fn nb_pstates(count: usize, svi2: bool) -> NbPStateLayout {
    NbPStateLayout {
        function: pci::EXTENDED_MISC_CONTROL,
        base_offset: NB_PSTATE_BASE,
        count,
        enable: nb::NB_PSTATE_EN,
        fid: nb::NB_FID,
        did: nb::NB_DID,
        vid: nb::NB_VID,
        vid_high: if svi2 { Some(nb::NB_VID_HIGH) } else { None },
    }
}

pub fn profile(model: u32) -> FamilyProfile {
    let svi2 = model >= SVI2_FIRST_MODEL;
    FamilyProfile {
        family: CpuFamily::Fam15h,
        model,
        pstate_count: PSTATE_COUNT,
        layout: if svi2 { LAYOUT_SVI2 } else { LAYOUT_SVI },
        voltage: if svi2 {
            VoltageEncoding::SVI2
        } else {
            VoltageEncoding::SVI
        },
        clock: ClockFormula::Shift { fid_offset: 0x10 },
        current: CurrentFormula::Divided,
        registers: RegisterMap::LEGACY,
        nb_pstates: Some(nb_pstates(if svi2 { 4 } else { 2 }, svi2)),
        zero_based_display: false,
        main_pll_mhz: None,
        vid_bounds: None,
    }
}
