//! Family profiles: the complete register model for one CPU family/model
//!
//! A [`FamilyProfile`] is resolved once from the detected family and model
//! and is read-only afterwards. Hardware-dependent parts of resolution (the
//! family 10h voltage-interface probe and the family 12h/14h bootstrap reads)
//! are supplied by the caller, so everything in this module stays pure.

use std::fmt;

use crate::arch;
use crate::bitfield::BitField;
use crate::convert::{ClockFormula, CurrentFormula, VoltageEncoding};
use crate::msr::{self, CofVidLimits};
use crate::pci::PciFunction;
use crate::register::{RegisterImage, RegisterLayout};

/// Errors raised while selecting a family profile
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("CPU family {family:#x} is not supported")]
    UnsupportedFamily { family: u32 },

    #[error("CPU family 10h requires the voltage interface (PVI/SVI) to be probed")]
    MissingVoltageProbe,
}

/// Supported AMD processor families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuFamily {
    /// K10
    Fam10h,
    /// Turion (Puma)
    Fam11h,
    /// Llano
    Fam12h,
    /// Bobcat
    Fam14h,
    /// Bulldozer/Piledriver/Steamroller/Excavator
    Fam15h,
    /// Jaguar/Puma+
    Fam16h,
    /// Zen/Zen+/Zen 2
    Fam17h,
    /// Zen 3/Zen 4
    Fam19h,
}

impl CpuFamily {
    /// Map a CPUID display family code to a supported family
    pub fn from_code(family: u32) -> Result<Self, ProfileError> {
        match family {
            0x10 => Ok(Self::Fam10h),
            0x11 => Ok(Self::Fam11h),
            0x12 => Ok(Self::Fam12h),
            0x14 => Ok(Self::Fam14h),
            0x15 => Ok(Self::Fam15h),
            0x16 => Ok(Self::Fam16h),
            0x17 => Ok(Self::Fam17h),
            0x19 => Ok(Self::Fam19h),
            _ => Err(ProfileError::UnsupportedFamily { family }),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::Fam10h => 0x10,
            Self::Fam11h => 0x11,
            Self::Fam12h => 0x12,
            Self::Fam14h => 0x14,
            Self::Fam15h => 0x15,
            Self::Fam16h => 0x16,
            Self::Fam17h => 0x17,
            Self::Fam19h => 0x19,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fam10h => "K10",
            Self::Fam11h => "Puma",
            Self::Fam12h => "Llano",
            Self::Fam14h => "Bobcat",
            Self::Fam15h => "Bulldozer",
            Self::Fam16h => "Jaguar",
            Self::Fam17h => "Zen",
            Self::Fam19h => "Zen 3",
        }
    }
}

impl fmt::Display for CpuFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}h ({})", self.code(), self.name())
    }
}

/// Bit layout of a P-state definition register
///
/// The same layout decodes COFVID status on families that have one; fields
/// that COFVID status does not carry are simply not read from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PStateLayout {
    pub cpu_vid: BitField,
    pub cpu_did: BitField,
    pub cpu_fid: BitField,
    /// Northbridge VID, on families that fold the northbridge into CPU P-states
    pub nb_vid: Option<BitField>,
    pub idd_value: BitField,
    pub idd_div: BitField,
    pub enable: BitField,
}

impl PStateLayout {
    /// All fields with their names, for diagnostics and table checks
    pub fn fields(&self) -> Vec<(&'static str, BitField)> {
        let mut fields = vec![
            ("CpuVid", self.cpu_vid),
            ("CpuDid", self.cpu_did),
            ("CpuFid", self.cpu_fid),
            ("IddValue", self.idd_value),
            ("IddDiv", self.idd_div),
            ("PstateEn", self.enable),
        ];
        if let Some(nb_vid) = self.nb_vid {
            fields.push(("NbVid", nb_vid));
        }
        fields
    }
}

/// Northbridge P-state registers in PCI configuration space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NbPStateLayout {
    pub function: PciFunction,
    pub base_offset: u32,
    pub count: usize,
    pub enable: BitField,
    pub fid: BitField,
    pub did: BitField,
    pub vid: BitField,
    /// Eighth VID bit, stored apart from the low seven on SVI2 parts
    pub vid_high: Option<BitField>,
}

impl NbPStateLayout {
    pub fn offset(&self, index: usize) -> u32 {
        self.base_offset + 4 * index as u32
    }

    pub fn max_vid(&self) -> u64 {
        match self.vid_high {
            Some(high) => (high.max_value() << self.vid.width()) | self.vid.max_value(),
            None => self.vid.max_value(),
        }
    }

    pub fn decode_vid(&self, image: RegisterImage) -> u64 {
        let low = image.get(self.vid);
        match self.vid_high {
            Some(high) => (image.get(high) << self.vid.width()) | low,
            None => low,
        }
    }

    /// Encode a VID, splitting it across the low and high fields (no-op when
    /// it does not fit)
    pub fn encode_vid(&self, image: RegisterImage, vid: u64) -> RegisterImage {
        if vid > self.max_vid() {
            return image;
        }
        let image = image.with(self.vid, vid & self.vid.max_value());
        match self.vid_high {
            Some(high) => image.with(high, vid >> self.vid.width()),
            None => image,
        }
    }

    /// Northbridge clock in MHz: `200 * (NbFid + 4) >> NbDid`
    pub fn clock_speed_mhz(&self, fid: u64, did: u64) -> Option<f64> {
        (200 * (fid + 4)).checked_shr(did as u32).map(|mhz| mhz as f64)
    }

    pub fn fields(&self) -> Vec<(&'static str, BitField)> {
        let mut fields = vec![
            ("NbPstateEn", self.enable),
            ("NbFid", self.fid),
            ("NbDid", self.did),
            ("NbVid", self.vid),
        ];
        if let Some(high) = self.vid_high {
            fields.push(("NbVid[7]", high));
        }
        fields
    }
}

/// MSR addresses a profile reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterMap {
    pub pstate_base: u32,
    pub limit: u32,
    pub status: u32,
    /// COFVID status, on families where the current operating point is not
    /// one of the P-state definition registers
    pub cofvid: Option<u32>,
}

impl RegisterMap {
    pub const LEGACY: Self = Self {
        pstate_base: msr::PSTATE_BASE,
        limit: msr::PSTATE_CURRENT_LIMIT,
        status: msr::PSTATE_STATUS,
        cofvid: Some(msr::COFVID_STATUS),
    };

    pub const ZEN: Self = Self {
        pstate_base: msr::PSTATE_BASE,
        limit: msr::PSTATE_CURRENT_LIMIT,
        status: msr::PSTATE_STATUS,
        cofvid: None,
    };

    pub fn pstate(&self, index: usize) -> u32 {
        self.pstate_base + index as u32
    }
}

/// Vendor-calibrated VID bounds from COFVID status
///
/// `max_vid` encodes the highest allowed voltage (smallest code), `min_vid`
/// the lowest (largest code). Zero means the bound is not reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VidBounds {
    pub max_vid: u64,
    pub min_vid: u64,
}

impl VidBounds {
    pub fn contains(&self, vid: u64) -> bool {
        (self.max_vid == 0 || vid >= self.max_vid) && (self.min_vid == 0 || vid <= self.min_vid)
    }
}

/// Hardware readings that seed the family 12h/14h profile constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bootstrap {
    /// D18F3xD4 image
    pub clock_control: RegisterImage,
    /// COFVID status image from core 0
    pub cofvid: RegisterImage,
}

/// `MainPllOpFreqId` in D18F3xD4
const MAIN_PLL_OP_FREQ_ID: BitField = BitField::new(5, 0);

/// Immutable register model for one detected CPU
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyProfile {
    pub family: CpuFamily,
    pub model: u32,
    pub pstate_count: usize,
    pub layout: PStateLayout,
    pub voltage: VoltageEncoding,
    pub clock: ClockFormula,
    pub current: CurrentFormula,
    pub registers: RegisterMap,
    pub nb_pstates: Option<NbPStateLayout>,
    /// Families 17h and 19h number P-states from zero for display
    pub zero_based_display: bool,
    pub main_pll_mhz: Option<f64>,
    pub vid_bounds: Option<VidBounds>,
}

impl FamilyProfile {
    /// Build the static profile for a family/model
    ///
    /// Family 10h needs the probed voltage interface in `voltage_probe`
    /// (`Some(true)` for PVI). The returned profile for families 12h and 14h
    /// still needs [`FamilyProfile::with_bootstrap`].
    pub fn for_cpu(
        family: u32,
        model: u32,
        voltage_probe: Option<bool>,
    ) -> Result<Self, ProfileError> {
        let family = CpuFamily::from_code(family)?;
        let profile = match family {
            CpuFamily::Fam10h => {
                let pvi = voltage_probe.ok_or(ProfileError::MissingVoltageProbe)?;
                arch::fam10h::profile(model, pvi)
            }
            CpuFamily::Fam11h => arch::fam11h::profile(model),
            CpuFamily::Fam12h => arch::fam12h::profile(model),
            CpuFamily::Fam14h => arch::fam14h::profile(model),
            CpuFamily::Fam15h => arch::fam15h::profile(model),
            CpuFamily::Fam16h => arch::fam16h::profile(model),
            CpuFamily::Fam17h | CpuFamily::Fam19h => arch::zen::profile(family, model),
        };
        Ok(profile)
    }

    pub fn requires_voltage_probe(family: CpuFamily) -> bool {
        family == CpuFamily::Fam10h
    }

    pub fn requires_bootstrap(&self) -> bool {
        matches!(self.family, CpuFamily::Fam12h | CpuFamily::Fam14h)
    }

    /// Seed the main PLL frequency and VID bounds from hardware readings
    pub fn with_bootstrap(mut self, bootstrap: Bootstrap) -> Self {
        let pll_id = bootstrap.clock_control.get(MAIN_PLL_OP_FREQ_ID);
        let main_pll_mhz = ((pll_id + 0x10) * 100) as f64;
        self.main_pll_mhz = Some(main_pll_mhz);

        if let ClockFormula::QuarterDivisor { .. } = self.clock {
            self.clock = ClockFormula::QuarterDivisor { main_pll_mhz };
        }

        let limits = CofVidLimits::from_image(bootstrap.cofvid);
        self.vid_bounds = Some(VidBounds {
            max_vid: u64::from(limits.max_vid),
            min_vid: u64::from(limits.min_vid),
        });
        self
    }

    /// P-state index as shown to the user
    pub fn display_index(&self, index: usize) -> usize {
        if self.zero_based_display {
            index
        } else {
            index + 1
        }
    }

    pub fn vid_to_millivolts(&self, vid: u64) -> f64 {
        self.voltage.to_millivolts(vid)
    }

    /// Exact-match millivolts to CPU VID, limited to what the VID field holds
    pub fn millivolts_to_vid(&self, millivolts: f64) -> Option<u64> {
        self.voltage
            .to_vid(millivolts, self.layout.cpu_vid.max_value())
    }

    /// Exact-match millivolts to northbridge VID
    pub fn millivolts_to_nb_vid(&self, millivolts: f64) -> Option<u64> {
        let limit = match (&self.nb_pstates, self.layout.nb_vid) {
            (Some(nb), _) => nb.max_vid(),
            (None, Some(field)) => field.max_value(),
            (None, None) => return None,
        };
        self.voltage.to_vid(millivolts, limit)
    }

    pub fn clock_speed_mhz(&self, fid: u64, did: u64) -> Option<f64> {
        self.clock.clock_speed_mhz(fid, did)
    }

    pub fn multiplier(&self, fid: u64, did: u64) -> Option<f64> {
        self.clock.multiplier(fid, did)
    }

    pub fn current_draw_amps(&self, value: u64, div: u64) -> Option<f64> {
        self.current.current_draw_amps(value, div)
    }

    /// Whether a northbridge voltage override has anywhere to go
    pub fn supports_nb_voltage(&self) -> bool {
        self.layout.nb_vid.is_some() || self.nb_pstates.is_some()
    }

    /// Check a requested VID against the bootstrapped platform bounds
    pub fn vid_within_bounds(&self, vid: u64) -> bool {
        self.vid_bounds.map_or(true, |bounds| bounds.contains(vid))
    }

    /// Pick FID/DID for a target clock on shift-based families
    ///
    /// The divisor is chosen by frequency band, then the lowest FID whose
    /// clock reaches the target. Returns `None` for other clock formulas
    /// and when no FID in range reaches the target.
    pub fn fid_did_for_mhz(&self, mhz: u64) -> Option<(u64, u64)> {
        let ClockFormula::Shift { fid_offset } = self.clock else {
            return None;
        };

        let did = match mhz {
            1600.. => 0,
            800..=1599 => 1,
            400..=799 => 2,
            200..=399 => 3,
            _ => 4,
        };
        if !self.layout.cpu_did.fits(did) {
            return None;
        }

        let max_fid = 0x2F.min(self.layout.cpu_fid.max_value());
        (0..=max_fid)
            .find(|&fid| ((100 * (fid + fid_offset)) >> did) >= mhz)
            .map(|fid| (fid, did))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_disjoint(fields: &[(&'static str, BitField)], what: &str) {
        for (i, (name_a, a)) in fields.iter().enumerate() {
            for (name_b, b) in &fields[i + 1..] {
                assert!(
                    !a.overlaps(b),
                    "{what}: {name_a} ({a}) overlaps {name_b} ({b})"
                );
            }
        }
    }

    fn all_profiles() -> Vec<FamilyProfile> {
        let mut profiles = vec![
            FamilyProfile::for_cpu(0x10, 0x04, Some(true)).unwrap(),
            FamilyProfile::for_cpu(0x10, 0x04, Some(false)).unwrap(),
        ];
        for (family, model) in [
            (0x11, 0x03),
            (0x12, 0x01),
            (0x14, 0x02),
            (0x15, 0x01),
            (0x15, 0x13),
            (0x15, 0x30),
            (0x16, 0x30),
            (0x17, 0x71),
            (0x19, 0x21),
        ] {
            profiles.push(FamilyProfile::for_cpu(family, model, None).unwrap());
        }
        profiles
    }

    #[test]
    fn test_layout_fields_never_overlap() {
        for profile in all_profiles() {
            assert_disjoint(&profile.layout.fields(), profile.family.name());
            if let Some(nb) = profile.nb_pstates {
                assert_disjoint(&nb.fields(), "northbridge");
            }
        }
    }

    #[test]
    fn test_pstate_counts_fit_limit_register() {
        for profile in all_profiles() {
            assert!(profile.pstate_count <= msr::MAX_PSTATES);
        }
    }

    #[test]
    fn test_unsupported_families() {
        for family in [0x0F, 0x13, 0x18, 0x1A] {
            assert!(matches!(
                FamilyProfile::for_cpu(family, 0, None),
                Err(ProfileError::UnsupportedFamily { family: f }) if f == family
            ));
        }
    }

    #[test]
    fn test_family_10h_requires_probe() {
        assert!(matches!(
            FamilyProfile::for_cpu(0x10, 0x02, None),
            Err(ProfileError::MissingVoltageProbe)
        ));
    }

    #[test]
    fn test_display_index() {
        let k10 = FamilyProfile::for_cpu(0x10, 0x02, Some(false)).unwrap();
        assert_eq!(k10.display_index(0), 1);
        let zen = FamilyProfile::for_cpu(0x17, 0x08, None).unwrap();
        assert_eq!(zen.display_index(0), 0);
    }

    #[test]
    fn test_bootstrap_seeds_pll_and_bounds() {
        let profile = FamilyProfile::for_cpu(0x14, 0x01, None).unwrap();
        assert!(profile.requires_bootstrap());

        let bootstrap = Bootstrap {
            clock_control: RegisterImage::new(0x10),
            cofvid: RegisterImage::new(0)
                .with(msr::cofvid::MAX_VID, 0x10)
                .with(msr::cofvid::MIN_VID, 0x50),
        };
        let profile = profile.with_bootstrap(bootstrap);

        assert_eq!(profile.main_pll_mhz, Some(3200.0));
        assert_eq!(
            profile.clock,
            ClockFormula::QuarterDivisor {
                main_pll_mhz: 3200.0
            }
        );
        assert!(profile.vid_within_bounds(0x10));
        assert!(profile.vid_within_bounds(0x50));
        assert!(!profile.vid_within_bounds(0x0F));
        assert!(!profile.vid_within_bounds(0x51));
    }

    #[test]
    fn test_zero_bounds_are_open() {
        let bounds = VidBounds::default();
        assert!(bounds.contains(0));
        assert!(bounds.contains(127));
    }

    #[test]
    fn test_serial_inverse_for_family_11h() {
        let profile = FamilyProfile::for_cpu(0x11, 0x03, None).unwrap();
        for vid in 0..=profile.voltage.max_vid() {
            let mv = profile.vid_to_millivolts(vid);
            assert_eq!(profile.millivolts_to_vid(mv), Some(vid));
        }
    }

    #[test]
    fn test_fid_did_for_mhz() {
        let profile = FamilyProfile::for_cpu(0x15, 0x02, None).unwrap();
        assert_eq!(profile.fid_did_for_mhz(3500), Some((0x13, 0)));
        assert_eq!(profile.fid_did_for_mhz(1400), Some((0x0C, 1)));
        assert_eq!(profile.fid_did_for_mhz(6300), Some((0x2F, 0)));
        assert_eq!(profile.fid_did_for_mhz(6301), None);
        assert_eq!(profile.fid_did_for_mhz(8000), None);

        let zen = FamilyProfile::for_cpu(0x17, 0x01, None).unwrap();
        assert_eq!(zen.fid_did_for_mhz(3500), None);
    }

    #[test]
    fn test_nb_vid_support() {
        let k10 = FamilyProfile::for_cpu(0x10, 0x02, Some(false)).unwrap();
        assert!(k10.supports_nb_voltage());
        let bobcat = FamilyProfile::for_cpu(0x14, 0x02, None).unwrap();
        assert!(!bobcat.supports_nb_voltage());
        assert_eq!(bobcat.millivolts_to_nb_vid(1200.0), None);
    }
}
