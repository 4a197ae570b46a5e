// Decoded P-state fields and the physical quantities derived from them

use amdctl_raw::{power_draw_watts, FamilyProfile, PStateLayout, RegisterImage};

/// Logical field values of one P-state (or COFVID status) image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PStateFields {
    /// `None` for COFVID status, which has no enable bit
    pub enabled: Option<bool>,
    pub cpu_vid: u64,
    pub cpu_fid: u64,
    pub cpu_did: u64,
    pub nb_vid: Option<u64>,
    pub idd_value: Option<u64>,
    pub idd_div: Option<u64>,
}

impl PStateFields {
    /// Decode a P-state definition register
    pub fn decode(layout: &PStateLayout, image: RegisterImage) -> Self {
        Self {
            enabled: Some(image.flag(layout.enable)),
            cpu_vid: image.get(layout.cpu_vid),
            cpu_fid: image.get(layout.cpu_fid),
            cpu_did: image.get(layout.cpu_did),
            nb_vid: layout.nb_vid.map(|field| image.get(field)),
            idd_value: Some(image.get(layout.idd_value)),
            idd_div: Some(image.get(layout.idd_div)),
        }
    }

    /// Decode COFVID status, which shares the VID/FID/DID positions but
    /// reports no current draw
    pub fn decode_status(layout: &PStateLayout, image: RegisterImage) -> Self {
        Self {
            enabled: None,
            idd_value: None,
            idd_div: None,
            ..Self::decode(layout, image)
        }
    }
}

/// Physical quantities for one decoded P-state
///
/// Recomputed from [`PStateFields`] whenever needed; `None` marks a quantity
/// the encoding does not provide (reserved divisor, current not reported).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub millivolts: f64,
    pub nb_millivolts: Option<f64>,
    pub clock_mhz: Option<f64>,
    pub multiplier: Option<f64>,
    pub current_amps: Option<f64>,
    pub power_watts: Option<f64>,
}

impl DerivedMetrics {
    pub fn compute(profile: &FamilyProfile, fields: &PStateFields) -> Self {
        let millivolts = profile.vid_to_millivolts(fields.cpu_vid);
        let current_amps = match (fields.idd_value, fields.idd_div) {
            (Some(value), Some(div)) => profile.current_draw_amps(value, div),
            _ => None,
        };

        Self {
            millivolts,
            nb_millivolts: fields.nb_vid.map(|vid| profile.vid_to_millivolts(vid)),
            clock_mhz: profile.clock_speed_mhz(fields.cpu_fid, fields.cpu_did),
            multiplier: profile.multiplier(fields.cpu_fid, fields.cpu_did),
            current_amps,
            power_watts: current_amps.map(|amps| power_draw_watts(amps, millivolts)),
        }
    }
}

/// One reported P-state
#[derive(Debug, Clone, PartialEq)]
pub struct PStateRow {
    /// Register slot, or `None` for the COFVID "current" row
    pub slot: Option<usize>,
    /// Image as written (or as it would be written in preview mode)
    pub image: RegisterImage,
    pub fields: PStateFields,
    pub metrics: DerivedMetrics,
}

impl PStateRow {
    pub fn from_pstate(profile: &FamilyProfile, slot: usize, image: RegisterImage) -> Self {
        let fields = PStateFields::decode(&profile.layout, image);
        Self {
            slot: Some(slot),
            image,
            fields,
            metrics: DerivedMetrics::compute(profile, &fields),
        }
    }

    pub fn from_status(profile: &FamilyProfile, image: RegisterImage) -> Self {
        let fields = PStateFields::decode_status(&profile.layout, image);
        Self {
            slot: None,
            image,
            fields,
            metrics: DerivedMetrics::compute(profile, &fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn k10_image() -> RegisterImage {
        // Enabled, IddDiv 1, IddValue 95, NbVid 36, CpuVid 12, DID 0, FID 0x0E
        RegisterImage::new(0)
            .with(amdctl_raw::arch::legacy::PSTATE_EN, 1)
            .with(amdctl_raw::arch::legacy::IDD_DIV, 1)
            .with(amdctl_raw::arch::legacy::IDD_VALUE, 95)
            .with(amdctl_raw::arch::legacy::NB_VID, 36)
            .with(amdctl_raw::arch::legacy::CPU_VID, 12)
            .with(amdctl_raw::arch::legacy::CPU_FID, 0x0E)
    }

    #[test]
    fn test_k10_row() {
        let profile = FamilyProfile::for_cpu(0x10, 0x04, Some(false)).unwrap();
        let row = PStateRow::from_pstate(&profile, 0, k10_image());

        assert_eq!(row.fields.enabled, Some(true));
        assert_eq!(row.fields.nb_vid, Some(36));
        assert_eq!(row.metrics.millivolts, 1400.0);
        assert_eq!(row.metrics.nb_millivolts, Some(1100.0));
        assert_eq!(row.metrics.clock_mhz, Some(3000.0));
        assert_eq!(row.metrics.multiplier, Some(30.0));
        assert_eq!(row.metrics.current_amps, Some(9.5));
        let watts = row.metrics.power_watts.unwrap();
        assert!((watts - 13.3).abs() < EPSILON);
    }

    #[test]
    fn test_status_row_has_no_current() {
        let profile = FamilyProfile::for_cpu(0x10, 0x04, Some(false)).unwrap();
        let row = PStateRow::from_status(&profile, k10_image());

        assert_eq!(row.slot, None);
        assert_eq!(row.fields.enabled, None);
        assert_eq!(row.metrics.clock_mhz, Some(3000.0));
        assert_eq!(row.metrics.current_amps, None);
        assert_eq!(row.metrics.power_watts, None);
    }

    #[test]
    fn test_unavailable_current() {
        let profile = FamilyProfile::for_cpu(0x11, 0x03, None).unwrap();
        let image = RegisterImage::new(0)
            .with(profile.layout.idd_value, 40)
            .with(profile.layout.idd_div, 3);
        let row = PStateRow::from_pstate(&profile, 1, image);
        assert_eq!(row.metrics.current_amps, None);
        assert_eq!(row.metrics.power_watts, None);
    }

    #[test]
    fn test_zen_summed_current() {
        let profile = FamilyProfile::for_cpu(0x19, 0x21, None).unwrap();
        let image = RegisterImage::new(0)
            .with(profile.layout.cpu_fid, 0x88)
            .with(profile.layout.cpu_did, 8)
            .with(profile.layout.cpu_vid, 24)
            .with(profile.layout.idd_value, 20)
            .with(profile.layout.idd_div, 1);
        let row = PStateRow::from_pstate(&profile, 0, image);

        assert_eq!(row.metrics.clock_mhz, Some(3400.0));
        assert_eq!(row.metrics.millivolts, 1400.0);
        assert_eq!(row.metrics.current_amps, Some(21.0));
        assert_eq!(row.fields.nb_vid, None);
    }
}
