//! Family 12h (Llano) P-state definitions
//!
//! ## Register Format (MSRC001_00[6B:64])
//!
//! | Bits   | Field     |
//! |--------|-----------|
//! | 3-0    | CpuDid    |
//! | 8-4    | CpuFid    |
//! | 15-9   | CpuVid    |
//! | 31-25  | NbVid     |
//! | 39-32  | IddValue  |
//! | 41-40  | IddDiv    |
//! | 63     | PstateEn  |
//!
//! The core divisor is not a power of two; [`DIVISORS`] maps the DID code.

use super::legacy;
use crate::bitfield::BitField;
use crate::convert::{ClockFormula, CurrentFormula, VoltageEncoding};
use crate::family::{CpuFamily, FamilyProfile, PStateLayout, RegisterMap};

pub const PSTATE_COUNT: usize = 8;

/// Core divisor by DID code; codes past the table are reserved
pub const DIVISORS: [f64; 9] = [1.0, 1.5, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0, 16.0];

pub const LAYOUT: PStateLayout = PStateLayout {
    cpu_vid: legacy::CPU_VID,
    cpu_did: BitField::new(3, 0),
    cpu_fid: BitField::new(8, 4),
    nb_vid: Some(legacy::NB_VID),
    idd_value: legacy::IDD_VALUE,
    idd_div: legacy::IDD_DIV,
    enable: legacy::PSTATE_EN,
};

pub fn profile(model: u32) -> FamilyProfile {
    FamilyProfile {
        family: CpuFamily::Fam12h,
        model,
        pstate_count: PSTATE_COUNT,
        layout: LAYOUT,
        voltage: VoltageEncoding::SVI,
        clock: ClockFormula::DivisorTable {
            fid_offset: 0x10,
            divisors: &DIVISORS,
        },
        current: CurrentFormula::Divided,
        registers: RegisterMap::LEGACY,
        nb_pstates: None,
        zero_based_display: false,
        main_pll_mhz: None,
        vid_bounds: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisor_table() {
        let profile = profile(1);
        // FID 0Eh -> 3000 MHz undivided
        assert_eq!(profile.clock_speed_mhz(0x0E, 0), Some(3000.0));
        assert_eq!(profile.clock_speed_mhz(0x0E, 1), Some(2000.0));
        assert_eq!(profile.clock_speed_mhz(0x0E, 7), Some(250.0));
        assert_eq!(profile.multiplier(0x0E, 1), Some(20.0));
    }

    #[test]
    fn test_reserved_divisor() {
        let profile = profile(1);
        assert_eq!(profile.clock_speed_mhz(0x0E, 9), None);
        assert_eq!(profile.multiplier(0x0E, 15), None);
    }
}
