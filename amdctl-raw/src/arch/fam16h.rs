//! Family 16h (Jaguar, Puma+) P-state definitions
//!
//! SVI2 throughout, with the family 15h SVI2 layouts for both the core
//! P-states and the four northbridge P-states in D18F5.

use super::fam15h;
use crate::convert::{ClockFormula, CurrentFormula, VoltageEncoding};
use crate::family::{CpuFamily, FamilyProfile, PStateLayout, RegisterMap};

pub const PSTATE_COUNT: usize = 8;

pub const NB_PSTATE_COUNT: usize = 4;

pub const LAYOUT: PStateLayout = fam15h::LAYOUT_SVI2;

pub fn profile(model: u32) -> FamilyProfile {
    FamilyProfile {
        family: CpuFamily::Fam16h,
        model,
        pstate_count: PSTATE_COUNT,
        layout: LAYOUT,
        voltage: VoltageEncoding::SVI2,
        clock: ClockFormula::Shift { fid_offset: 0x10 },
        current: CurrentFormula::Divided,
        registers: RegisterMap::LEGACY,
        nb_pstates: Some(fam15h::nb_pstates(NB_PSTATE_COUNT, true)),
        zero_based_display: false,
        main_pll_mhz: None,
        vid_bounds: None,
    }
}
