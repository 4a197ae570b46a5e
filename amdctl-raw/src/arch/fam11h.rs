//! Family 11h (Turion Ultra / Puma) P-state definitions
//!
//! Same register layout as family 10h, but the core clock adds 08h to the
//! FID instead of 10h and the interface is always serial.

use super::legacy;
use crate::convert::{ClockFormula, CurrentFormula, VoltageEncoding};
use crate::family::{CpuFamily, FamilyProfile, PStateLayout, RegisterMap};

pub const PSTATE_COUNT: usize = 8;

pub const LAYOUT: PStateLayout = PStateLayout {
    cpu_vid: legacy::CPU_VID,
    cpu_did: legacy::CPU_DID,
    cpu_fid: legacy::CPU_FID,
    nb_vid: Some(legacy::NB_VID),
    idd_value: legacy::IDD_VALUE,
    idd_div: legacy::IDD_DIV,
    enable: legacy::PSTATE_EN,
};

pub fn profile(model: u32) -> FamilyProfile {
    FamilyProfile {
        family: CpuFamily::Fam11h,
        model,
        pstate_count: PSTATE_COUNT,
        layout: LAYOUT,
        voltage: VoltageEncoding::SVI,
        clock: ClockFormula::Shift { fid_offset: 0x08 },
        current: CurrentFormula::Divided,
        registers: RegisterMap::LEGACY,
        nb_pstates: None,
        zero_based_display: false,
        main_pll_mhz: None,
        vid_bounds: None,
    }
}
