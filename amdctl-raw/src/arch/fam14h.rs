//! Family 14h (Bobcat) P-state definitions
//!
//! Bobcat has no core FID. The divisor is split into a most-significant
//! digit (bits 8:4) and a quarter-step digit (bits 3:0), and divides the
//! main PLL frequency read from D18F3xD4 at start-up. The profile carries the
//! quarter digit in the FID slot and the integer digit in the DID slot.

use super::legacy;
use crate::bitfield::BitField;
use crate::convert::{ClockFormula, CurrentFormula, VoltageEncoding};
use crate::family::{CpuFamily, FamilyProfile, PStateLayout, RegisterMap};

pub const PSTATE_COUNT: usize = 8;

/// Main PLL frequency assumed until the bootstrap reading replaces it
pub const DEFAULT_MAIN_PLL_MHZ: f64 = 3200.0;

/// CpuDidLSD
pub const CPU_DID_LSD: BitField = BitField::new(3, 0);

/// CpuDidMSD
pub const CPU_DID_MSD: BitField = BitField::new(8, 4);

pub const LAYOUT: PStateLayout = PStateLayout {
    cpu_vid: legacy::CPU_VID,
    cpu_did: CPU_DID_MSD,
    cpu_fid: CPU_DID_LSD,
    nb_vid: None,
    idd_value: legacy::IDD_VALUE,
    idd_div: legacy::IDD_DIV,
    enable: legacy::PSTATE_EN,
};

pub fn profile(model: u32) -> FamilyProfile {
    FamilyProfile {
        family: CpuFamily::Fam14h,
        model,
        pstate_count: PSTATE_COUNT,
        layout: LAYOUT,
        voltage: VoltageEncoding::SVI,
        clock: ClockFormula::QuarterDivisor {
            main_pll_mhz: DEFAULT_MAIN_PLL_MHZ,
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
    fn test_quarter_divisor() {
        let profile = profile(2);
        // MSD 0, LSD 0 -> divisor 1
        assert_eq!(profile.clock_speed_mhz(0, 0), Some(3200.0));
        // MSD 1, LSD 2 -> divisor 2.5
        assert_eq!(profile.clock_speed_mhz(2, 1), Some(1280.0));
        assert_eq!(profile.multiplier(2, 1), Some(12.8));
    }
}
