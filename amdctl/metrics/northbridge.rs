// Northbridge P-states kept in PCI configuration space

use amdctl_raw::{FamilyProfile, NbPStateLayout, RegisterImage};

/// One decoded northbridge P-state register
#[derive(Debug, Clone, PartialEq)]
pub struct NbPStateRow {
    pub index: usize,
    pub image: RegisterImage,
    pub enabled: bool,
    pub fid: u64,
    pub did: u64,
    pub vid: u64,
    pub millivolts: f64,
    pub clock_mhz: Option<f64>,
}

impl NbPStateRow {
    pub fn decode(
        profile: &FamilyProfile,
        nb: &NbPStateLayout,
        index: usize,
        image: RegisterImage,
    ) -> Self {
        let fid = image.get(nb.fid);
        let did = image.get(nb.did);
        let vid = nb.decode_vid(image);

        Self {
            index,
            image,
            enabled: image.flag(nb.enable),
            fid,
            did,
            vid,
            millivolts: profile.vid_to_millivolts(vid),
            clock_mhz: nb.clock_speed_mhz(fid, did),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_svi2_nb_pstate() {
        let profile = FamilyProfile::for_cpu(0x16, 0x30, None).unwrap();
        let nb = profile.nb_pstates.unwrap();
        let image = nb.encode_vid(
            RegisterImage::new(0)
                .with(nb.enable, 1)
                .with(nb.fid, 0x0A)
                .with(nb.did, 1),
            0x90,
        );

        let row = NbPStateRow::decode(&profile, &nb, 2, image);
        assert!(row.enabled);
        assert_eq!(row.vid, 0x90);
        assert_eq!(row.millivolts, 1550.0 - 144.0 * 6.25);
        assert_eq!(row.clock_mhz, Some(1400.0));
    }
}
