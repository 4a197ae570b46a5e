//! Conversions between encoded IDs and physical units
//!
//! Every formula here is selected once, when a [`crate::FamilyProfile`] is
//! built, and is a pure function of the encoded values afterwards.

/// Reference clock for the FID-based formulas, in MHz
pub const REFERENCE_CLOCK_MHZ: u64 = 100;

/// Voltage a VID of zero encodes, in mV
pub const VID_BASE_MV: f64 = 1550.0;

/// Voltage-ID encoding scheme
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoltageEncoding {
    /// Family 10h parallel VID interface: 25 mV steps below VID 32, then
    /// 12.5 mV steps from 1162.5 mV, saturating at VID 63
    Parallel,
    /// Family 10h serial VID interface: 12.5 mV steps, saturating at VID 124
    Serial,
    /// Linear encoding without saturation (`1550 - vid * step_mv`)
    Linear { step_mv: f64 },
}

impl VoltageEncoding {
    /// SVI: 12.5 mV per VID step
    pub const SVI: Self = Self::Linear { step_mv: 12.5 };

    /// SVI2: 6.25 mV per VID step
    pub const SVI2: Self = Self::Linear { step_mv: 6.25 };

    pub fn to_millivolts(&self, vid: u64) -> f64 {
        match *self {
            Self::Parallel => {
                if vid < 32 {
                    VID_BASE_MV - vid as f64 * 25.0
                } else {
                    1162.5 - vid.min(63) as f64 * 12.5
                }
            }
            Self::Serial => VID_BASE_MV - vid.min(124) as f64 * 12.5,
            Self::Linear { step_mv } => VID_BASE_MV - vid as f64 * step_mv,
        }
    }

    /// Largest VID with a distinct voltage under this encoding
    pub fn max_vid(&self) -> u64 {
        match *self {
            Self::Parallel => 63,
            Self::Serial => 124,
            Self::Linear { step_mv } => (VID_BASE_MV / step_mv) as u64,
        }
    }

    /// Exact-match inverse of [`VoltageEncoding::to_millivolts`]
    ///
    /// Returns the first VID in `0..=limit` whose voltage equals `millivolts`
    /// exactly. Requests between two steps find nothing.
    pub fn to_vid(&self, millivolts: f64, limit: u64) -> Option<u64> {
        (0..=limit.min(self.max_vid())).find(|&vid| self.to_millivolts(vid) == millivolts)
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Self::Parallel => "PVI (parallel)",
            Self::Serial => "SVI (serial)",
            Self::Linear { step_mv } if step_mv < 12.5 => "SVI2 (serial)",
            Self::Linear { .. } => "SVI (serial)",
        }
    }
}

/// Core clock formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockFormula {
    /// `100 * (fid + fid_offset) >> did`
    Shift { fid_offset: u64 },
    /// `100 * (fid + fid_offset) / DIVISORS[did]`
    DivisorTable {
        fid_offset: u64,
        divisors: &'static [f64],
    },
    /// `main_pll_mhz / (did_msd + did_lsd / 4 + 1)`, with the FID slot carrying
    /// the divisor's quarter digit
    QuarterDivisor { main_pll_mhz: f64 },
    /// `200 * fid / did`, DID counted in eighths
    Ratio,
}

impl ClockFormula {
    /// Core clock in MHz, or `None` when the divisor code is reserved
    pub fn clock_speed_mhz(&self, fid: u64, did: u64) -> Option<f64> {
        match *self {
            Self::Shift { fid_offset } => {
                let numerator = REFERENCE_CLOCK_MHZ * (fid + fid_offset);
                numerator.checked_shr(did as u32).map(|mhz| mhz as f64)
            }
            Self::DivisorTable {
                fid_offset,
                divisors,
            } => divisors
                .get(did as usize)
                .map(|div| (REFERENCE_CLOCK_MHZ * (fid + fid_offset)) as f64 / div),
            Self::QuarterDivisor { main_pll_mhz } => {
                Some(main_pll_mhz / (did as f64 + fid as f64 * 0.25 + 1.0))
            }
            Self::Ratio => {
                if did == 0 {
                    None
                } else {
                    Some(200.0 * fid as f64 / did as f64)
                }
            }
        }
    }

    /// Core clock as a multiple of the 100 MHz reference clock
    pub fn multiplier(&self, fid: u64, did: u64) -> Option<f64> {
        match *self {
            Self::Shift { fid_offset } => {
                if did >= 64 {
                    return None;
                }
                Some((fid + fid_offset) as f64 / (1u64 << did) as f64)
            }
            Self::DivisorTable {
                fid_offset,
                divisors,
            } => divisors
                .get(did as usize)
                .map(|div| (fid + fid_offset) as f64 / div),
            Self::QuarterDivisor { .. } | Self::Ratio => self
                .clock_speed_mhz(fid, did)
                .map(|mhz| mhz / REFERENCE_CLOCK_MHZ as f64),
        }
    }
}

/// Current-draw encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentFormula {
    /// `IddValue / {1, 10, 100}[IddDiv]`
    Divided,
    /// `IddValue + IddDiv`
    Summed,
}

/// IddDiv code meaning "current draw not reported"
pub const IDD_DIV_UNAVAILABLE: u64 = 3;

impl CurrentFormula {
    /// Current draw in amperes, or `None` when the divisor code is 3
    pub fn current_draw_amps(&self, value: u64, div: u64) -> Option<f64> {
        let divisor = match div {
            0 => 1.0,
            1 => 10.0,
            2 => 100.0,
            _ => return None,
        };

        match self {
            Self::Divided => Some(value as f64 / divisor),
            Self::Summed => Some((value + div) as f64),
        }
    }
}

/// Power draw in watts from current (A) and voltage (mV)
pub fn power_draw_watts(amps: f64, millivolts: f64) -> f64 {
    amps * millivolts / 1000.0
}
