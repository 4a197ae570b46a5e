//! Family 10h (K10) P-state definitions
//!
//! ## Register Format (MSRC001_00[68:64])
//!
//! | Bits   | Field     |
//! |--------|-----------|
//! | 5-0    | CpuFid    |
//! | 8-6    | CpuDid    |
//! | 15-9   | CpuVid    |
//! | 31-25  | NbVid     |
//! | 39-32  | IddValue  |
//! | 41-40  | IddDiv    |
//! | 63     | PstateEn  |
//!
//! The voltage interface is not visible from the MSRs. D18F3xA0[8]
//! (`PviMode`) selects between the parallel and serial VID encodings.

use super::legacy;
use crate::bitfield::BitField;
use crate::convert::{ClockFormula, CurrentFormula, VoltageEncoding};
use crate::family::{CpuFamily, FamilyProfile, PStateLayout, RegisterMap};

/// Family 10h exposes five P-states
pub const PSTATE_COUNT: usize = 5;

/// `PviMode` within the D18F3xA0 image
pub const PVI_MODE: BitField = BitField::bit(8);

pub const LAYOUT: PStateLayout = PStateLayout {
    cpu_vid: legacy::CPU_VID,
    cpu_did: legacy::CPU_DID,
    cpu_fid: legacy::CPU_FID,
    nb_vid: Some(legacy::NB_VID),
    idd_value: legacy::IDD_VALUE,
    idd_div: legacy::IDD_DIV,
    enable: legacy::PSTATE_EN,
};

pub fn profile(model: u32, pvi: bool) -> FamilyProfile {
    FamilyProfile {
        family: CpuFamily::Fam10h,
        model,
        pstate_count: PSTATE_COUNT,
        layout: LAYOUT,
        voltage: if pvi {
            VoltageEncoding::Parallel
        } else {
            VoltageEncoding::Serial
        },
        clock: ClockFormula::Shift { fid_offset: 0x10 },
        current: CurrentFormula::Divided,
        registers: RegisterMap::LEGACY,
        nb_pstates: None,
        zero_based_display: false,
        main_pll_mhz: None,
        vid_bounds: None,
    }
}
