use std::collections::HashMap;

use amdctl_raw::{BitField, ClockFormula, FamilyProfile, PStateLayout, RegisterImage};

use crate::error::{AmdctlError, Result};

/// Single index or every index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    One(usize),
}

crate::field_enum! {
    /// P-state fields a run may override
    pub enum PStateField {
        PstateEnable => "PstateEn",
        CpuVid => "CpuVid",
        CpuFid => "CpuFid",
        CpuDid => "CpuDid",
        NbVid => "NbVid",
    }
}

impl PStateField {
    /// Destination bit range in a CPU P-state register, if the layout has one
    pub fn field(&self, layout: &PStateLayout) -> Option<BitField> {
        match self {
            PStateField::PstateEnable => Some(layout.enable),
            PStateField::CpuVid => Some(layout.cpu_vid),
            PStateField::CpuFid => Some(layout.cpu_fid),
            PStateField::CpuDid => Some(layout.cpu_did),
            PStateField::NbVid => layout.nb_vid,
        }
    }
}

/// Sparse set of encoded field values to write into selected P-states
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOverrides {
    values: HashMap<PStateField, u64>,
}

impl FieldOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: PStateField, value: u64) {
        self.values.insert(field, value);
    }

    pub fn with(mut self, field: PStateField, value: u64) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: PStateField) -> Option<u64> {
        self.values.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overrides in a fixed order
    pub fn iter(&self) -> impl Iterator<Item = (PStateField, u64)> + '_ {
        PStateField::ALL
            .iter()
            .filter_map(|&field| self.get(field).map(|value| (field, value)))
    }

    /// Whether any override lands in a CPU P-state register
    ///
    /// A northbridge VID on a family with separate northbridge P-states goes
    /// to PCI configuration space instead.
    pub fn touches_cpu_pstates(&self, layout: &PStateLayout) -> bool {
        self.iter().any(|(field, _)| field.field(layout).is_some())
    }

    /// Encode every override that has a home in `layout` into `image`
    pub fn apply(&self, layout: &PStateLayout, image: RegisterImage) -> RegisterImage {
        self.iter()
            .fold(image, |image, (field, value)| match field.field(layout) {
                Some(bits) => image.with(bits, value),
                None => image,
            })
    }
}

/// Requested P-state limit register changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitOverrides {
    /// New `PstateMaxVal`: the lowest-performance P-state the core may use
    pub lowest: Option<u8>,
    /// New `CurPstateLimit`: the highest-performance P-state the core may use
    pub highest: Option<u8>,
}

impl LimitOverrides {
    pub fn is_empty(&self) -> bool {
        self.lowest.is_none() && self.highest.is_none()
    }
}

/// Overrides as the user asked for them, in physical units where applicable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideRequest {
    pub cpu_voltage_mv: Option<f64>,
    pub cpu_vid: Option<u64>,
    pub nb_voltage_mv: Option<f64>,
    pub cpu_fid: Option<u64>,
    pub cpu_did: Option<u64>,
    pub frequency_mhz: Option<u64>,
    pub enable: Option<bool>,
}

impl OverrideRequest {
    /// Turn the request into encoded field values for `profile`
    ///
    /// Millivolts must match a voltage ID exactly. Nothing here touches
    /// hardware; conflicts and unsupported requests fail up front.
    pub fn resolve(
        &self,
        profile: &FamilyProfile,
        nb_pstate: Option<usize>,
    ) -> Result<FieldOverrides> {
        let mut overrides = FieldOverrides::new();

        match (self.cpu_voltage_mv, self.cpu_vid) {
            (Some(_), Some(_)) => {
                return Err(AmdctlError::ConfigurationPrecondition(
                    "CPU voltage and CPU VID cannot both be set".to_string(),
                ))
            }
            (Some(mv), None) => {
                let vid = profile.millivolts_to_vid(mv).ok_or_else(|| {
                    AmdctlError::ConfigurationPrecondition(format!(
                        "no CPU voltage ID encodes exactly {mv} mV"
                    ))
                })?;
                overrides.set(PStateField::CpuVid, vid);
            }
            (None, Some(vid)) => overrides.set(PStateField::CpuVid, vid),
            (None, None) => {}
        }

        if let Some(mv) = self.nb_voltage_mv {
            if !profile.supports_nb_voltage() {
                return Err(AmdctlError::ConfigurationPrecondition(format!(
                    "family {} has no northbridge voltage to set",
                    profile.family
                )));
            }
            if profile.nb_pstates.is_some() && nb_pstate.is_none() {
                return Err(AmdctlError::ConfigurationPrecondition(
                    "northbridge voltage on this family needs a northbridge P-state".to_string(),
                ));
            }
            let vid = profile.millivolts_to_nb_vid(mv).ok_or_else(|| {
                AmdctlError::ConfigurationPrecondition(format!(
                    "no northbridge voltage ID encodes exactly {mv} mV"
                ))
            })?;
            overrides.set(PStateField::NbVid, vid);
        }

        if let Some(mhz) = self.frequency_mhz {
            if self.cpu_fid.is_some() || self.cpu_did.is_some() {
                return Err(AmdctlError::ConfigurationPrecondition(
                    "a target frequency cannot be combined with FID or DID".to_string(),
                ));
            }
            if !matches!(profile.clock, ClockFormula::Shift { .. }) {
                return Err(AmdctlError::ConfigurationPrecondition(format!(
                    "family {} does not support setting a target frequency",
                    profile.family
                )));
            }
            let (fid, did) = profile.fid_did_for_mhz(mhz).ok_or_else(|| {
                AmdctlError::ConfigurationPrecondition(format!(
                    "no FID/DID pair reaches {} MHz on family {}",
                    mhz, profile.family
                ))
            })?;
            tracing::info!("{} MHz -> FID 0x{:X}, DID {}", mhz, fid, did);
            overrides.set(PStateField::CpuFid, fid);
            overrides.set(PStateField::CpuDid, did);
        }
        if let Some(fid) = self.cpu_fid {
            overrides.set(PStateField::CpuFid, fid);
        }
        if let Some(did) = self.cpu_did {
            overrides.set(PStateField::CpuDid, did);
        }

        if let Some(enable) = self.enable {
            overrides.set(PStateField::PstateEnable, u64::from(enable));
        }

        Ok(overrides)
    }
}

/// Everything one run will read and change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub cores: Selection,
    pub pstates: Selection,
    pub overrides: FieldOverrides,
    pub limits: LimitOverrides,
    pub nb_pstate: Option<usize>,
    /// Encode changes for the report but write nothing
    pub preview: bool,
}

impl RunConfig {
    /// Check every precondition before any register is touched
    pub fn validate(&self, profile: &FamilyProfile, cpus: &[u32]) -> Result<()> {
        if let Selection::One(index) = self.pstates {
            if index >= profile.pstate_count {
                return Err(AmdctlError::InvalidFieldValue {
                    field: "pstate",
                    value: index as u64,
                    detail: format!(
                        "family {} has P-states 0-{}",
                        profile.family,
                        profile.pstate_count - 1
                    ),
                });
            }
        }

        if let Selection::One(core) = self.cores {
            if !cpus.iter().any(|&cpu| cpu as usize == core) {
                return Err(AmdctlError::InvalidFieldValue {
                    field: "core",
                    value: core as u64,
                    detail: format!("not an online CPU (online: {cpus:?})"),
                });
            }
        }

        for (name, limit) in [
            ("lowest-pstate", self.limits.lowest),
            ("highest-pstate", self.limits.highest),
        ] {
            if let Some(value) = limit {
                if usize::from(value) >= profile.pstate_count {
                    return Err(AmdctlError::InvalidFieldValue {
                        field: name,
                        value: u64::from(value),
                        detail: format!("must be below {}", profile.pstate_count),
                    });
                }
            }
        }

        if let Some(index) = self.nb_pstate {
            let nb = profile.nb_pstates.ok_or_else(|| {
                AmdctlError::ConfigurationPrecondition(format!(
                    "family {} has no separate northbridge P-states",
                    profile.family
                ))
            })?;
            if index >= nb.count {
                return Err(AmdctlError::InvalidFieldValue {
                    field: "nb-pstate",
                    value: index as u64,
                    detail: format!("must be below {}", nb.count),
                });
            }
        }

        for (field, value) in self.overrides.iter() {
            self.validate_override(profile, field, value)?;
        }

        Ok(())
    }

    fn validate_override(
        &self,
        profile: &FamilyProfile,
        field: PStateField,
        value: u64,
    ) -> Result<()> {
        let (fits, width) = match (field, field.field(&profile.layout), profile.nb_pstates) {
            (PStateField::NbVid, _, Some(nb)) => {
                if self.nb_pstate.is_none() {
                    return Err(AmdctlError::ConfigurationPrecondition(
                        "northbridge VID override needs a northbridge P-state".to_string(),
                    ));
                }
                (value <= nb.max_vid(), nb.max_vid())
            }
            (_, Some(bits), _) => (bits.fits(value), bits.max_value()),
            (_, None, _) => {
                return Err(AmdctlError::ConfigurationPrecondition(format!(
                    "family {} has no {} field",
                    profile.family,
                    field.name()
                )))
            }
        };

        if !fits {
            return Err(AmdctlError::InvalidFieldValue {
                field: field.name(),
                value,
                detail: format!("largest encodable value is {width}"),
            });
        }

        if field == PStateField::CpuVid && !profile.vid_within_bounds(value) {
            return Err(AmdctlError::InvalidFieldValue {
                field: field.name(),
                value,
                detail: format!("outside platform VID bounds {:?}", profile.vid_bounds),
            });
        }

        Ok(())
    }

    /// Cores to visit, in order
    pub fn core_list(&self, cpus: &[u32]) -> Vec<u32> {
        match self.cores {
            Selection::All => cpus.to_vec(),
            Selection::One(core) => vec![core as u32],
        }
    }

    /// P-state slots to visit, in order
    pub fn pstate_list(&self, profile: &FamilyProfile) -> Vec<usize> {
        match self.pstates {
            Selection::All => (0..profile.pstate_count).collect(),
            Selection::One(index) => vec![index],
        }
    }

    /// Whether the run asks to change any register
    pub fn writes_requested(&self) -> bool {
        !self.overrides.is_empty() || !self.limits.is_empty()
    }
}
