//! Families 17h and 19h (Zen) P-state definitions
//!
//! ## Register Format (MSRC001_00[6B:64])
//!
//! | Bits   | Field     |
//! |--------|-----------|
//! | 7-0    | CpuFid    |
//! | 13-8   | CpuDfsId  |
//! | 21-14  | CpuVid    |
//! | 29-22  | IddValue  |
//! | 31-30  | IddDiv    |
//! | 63     | PstateEn  |
//!
//! The current operating point is one of the P-state registers, so there is
//! no COFVID status, and P-states are numbered from zero. Family 19h reports
//! current draw as `IddValue + IddDiv`.

use crate::bitfield::BitField;
use crate::convert::{ClockFormula, CurrentFormula, VoltageEncoding};
use crate::family::{CpuFamily, FamilyProfile, PStateLayout, RegisterMap};

pub const PSTATE_COUNT: usize = 8;

pub const LAYOUT: PStateLayout = PStateLayout {
    cpu_vid: BitField::new(21, 14),
    cpu_did: BitField::new(13, 8),
    cpu_fid: BitField::new(7, 0),
    nb_vid: None,
    idd_value: BitField::new(29, 22),
    idd_div: BitField::new(31, 30),
    enable: BitField::bit(63),
};

pub fn profile(family: CpuFamily, model: u32) -> FamilyProfile {
    FamilyProfile {
        family,
        model,
        pstate_count: PSTATE_COUNT,
        layout: LAYOUT,
        voltage: VoltageEncoding::SVI2,
        clock: ClockFormula::Ratio,
        current: if family == CpuFamily::Fam19h {
            CurrentFormula::Summed
        } else {
            CurrentFormula::Divided
        },
        registers: RegisterMap::ZEN,
        nb_pstates: None,
        zero_based_display: true,
        main_pll_mhz: None,
        vid_bounds: None,
    }
}
