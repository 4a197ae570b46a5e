// P-state and northbridge state walker
// Visits cores one at a time; every register image is read fresh, modified in
// memory and written back before the next one is touched

use amdctl_raw::msr::{PStateLimit, PStateStatus};
use amdctl_raw::{FamilyProfile, NbPStateLayout, RegisterImage, RegisterLayout};

use crate::config::{PStateField, RunConfig};
use crate::error::{AmdctlError, Result};
use crate::metrics::{CoreReport, NbPStateRow, PStateRow, Report};
use crate::port::{RegisterPort, RegisterTarget};

/// Walks the selected cores and P-states through a [`RegisterPort`]
///
/// Any failed transfer aborts the walk; nothing is retried and nothing
/// already written is rolled back. In preview mode overrides are encoded
/// for the report but never written.
pub struct StateWalker<'a, P: RegisterPort> {
    port: &'a mut P,
    profile: &'a FamilyProfile,
    config: &'a RunConfig,
}

impl<'a, P: RegisterPort> StateWalker<'a, P> {
    pub fn new(port: &'a mut P, profile: &'a FamilyProfile, config: &'a RunConfig) -> Self {
        Self {
            port,
            profile,
            config,
        }
    }

    /// Validate the configuration, then walk every selected core followed by
    /// the northbridge P-states
    pub fn run(&mut self, cpus: &[u32]) -> Result<Report> {
        self.config.validate(self.profile, cpus)?;

        if self.config.writes_requested() {
            if self.config.preview {
                tracing::warn!("Preview mode: no register will be changed");
            } else {
                tracing::warn!("Preview mode off: P-state registers will be changed");
            }
        }

        let mut report = Report::new(
            self.profile.family,
            self.profile.model,
            self.config.preview,
        );

        for core in self.config.core_list(cpus) {
            let core_report = self.walk_core(core)?;
            report.cores.push(core_report);
        }

        if let Some(nb) = self.profile.nb_pstates {
            report.northbridge = self.walk_northbridge(&nb)?;
        }

        Ok(report)
    }

    fn walk_core(&mut self, core: u32) -> Result<CoreReport> {
        let registers = self.profile.registers;

        let limit = self.update_limit(core)?;

        let status_target = RegisterTarget::Msr {
            core,
            address: registers.status,
        };
        let status = PStateStatus::from_image(try_register!(
            self.port.read(status_target),
            status_target
        ));
        tracing::debug!("Core {}: current P-state slot {}", core, status.current);

        let mut pstates = Vec::new();
        for slot in self.config.pstate_list(self.profile) {
            if slot > usize::from(limit.max_value) {
                tracing::debug!(
                    "Core {}: stopping at slot {}, beyond PstateMaxVal {}",
                    core,
                    slot,
                    limit.max_value
                );
                break;
            }
            pstates.push(self.walk_pstate(core, slot)?);
        }
        if pstates.is_empty() {
            tracing::warn!(
                "Core {}: every selected P-state lies beyond PstateMaxVal {}",
                core,
                limit.max_value
            );
        }

        let current = match registers.cofvid {
            Some(address) => {
                let target = RegisterTarget::Msr { core, address };
                let image = try_register!(self.port.read(target), target);
                Some(PStateRow::from_status(self.profile, image))
            }
            None => None,
        };

        Ok(CoreReport {
            core,
            limit,
            current_index: status.current,
            pstates,
            current,
        })
    }

    /// Read the limit register, applying any requested change
    fn update_limit(&mut self, core: u32) -> Result<PStateLimit> {
        let target = RegisterTarget::Msr {
            core,
            address: self.profile.registers.limit,
        };
        let image = try_register!(self.port.read(target), target);
        let current = PStateLimit::from_image(image);

        let limits = self.config.limits;
        if limits.is_empty() {
            return Ok(current);
        }

        let updated = PStateLimit {
            cur_limit: limits.highest.unwrap_or(current.cur_limit),
            max_value: limits.lowest.unwrap_or(current.max_value),
        };
        updated
            .validate()
            .map_err(|detail| AmdctlError::ConfigurationPrecondition(detail.to_string()))?;
        tracing::info!(
            "Core {}: P-state limits {}-{} -> {}-{}",
            core,
            current.cur_limit,
            current.max_value,
            updated.cur_limit,
            updated.max_value
        );
        self.store(target, updated.apply(image))?;

        Ok(updated)
    }

    fn walk_pstate(&mut self, core: u32, slot: usize) -> Result<PStateRow> {
        let target = RegisterTarget::Msr {
            core,
            address: self.profile.registers.pstate(slot),
        };
        let mut image = try_register!(self.port.read(target), target);

        let overrides = &self.config.overrides;
        if overrides.touches_cpu_pstates(&self.profile.layout) {
            let updated = overrides.apply(&self.profile.layout, image);
            tracing::info!(
                "Core {} P-state {}: {} -> {}",
                core,
                self.profile.display_index(slot),
                image,
                updated
            );
            self.store(target, updated)?;
            image = updated;
        }

        Ok(PStateRow::from_pstate(self.profile, slot, image))
    }

    fn walk_northbridge(&mut self, nb: &NbPStateLayout) -> Result<Vec<NbPStateRow>> {
        let nb_vid = self.config.overrides.get(PStateField::NbVid);

        let mut rows = Vec::with_capacity(nb.count);
        for index in 0..nb.count {
            let target = RegisterTarget::Pci {
                function: nb.function,
                offset: nb.offset(index),
            };
            let mut image = try_register!(self.port.read(target), target);

            if let (Some(vid), Some(selected)) = (nb_vid, self.config.nb_pstate) {
                if selected == index {
                    let updated = nb.encode_vid(image, vid);
                    tracing::info!("NB P-state {}: {} -> {}", index, image, updated);
                    self.store(target, updated)?;
                    image = updated;
                }
            }

            rows.push(NbPStateRow::decode(self.profile, nb, index, image));
        }

        Ok(rows)
    }

    /// Write an image unless previewing
    fn store(&mut self, target: RegisterTarget, image: RegisterImage) -> Result<()> {
        if self.config.preview {
            tracing::debug!("Preview: not writing {} to {}", image, target);
            return Ok(());
        }
        try_register!(self.port.write(target, image), target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldOverrides, LimitOverrides, Selection};
    use crate::port::testing::MemoryPort;
    use amdctl_raw::arch::legacy;
    use amdctl_raw::{msr, pci};

    fn k10() -> FamilyProfile {
        FamilyProfile::for_cpu(0x10, 0x04, Some(false)).unwrap()
    }

    /// Two cores with five populated P-states each, PstateMaxVal 4
    fn k10_port() -> MemoryPort {
        let mut port = MemoryPort::new();
        for core in 0..2 {
            port.set_msr(core, msr::PSTATE_CURRENT_LIMIT, 0x40);
            port.set_msr(core, msr::PSTATE_STATUS, 1);
            for slot in 0..5 {
                let image = RegisterImage::new(0)
                    .with(legacy::PSTATE_EN, 1)
                    .with(legacy::CPU_FID, 0x0E)
                    .with(legacy::CPU_DID, slot as u64 % 3)
                    .with(legacy::CPU_VID, 12 + slot as u64 * 4)
                    .with(legacy::NB_VID, 36)
                    .with(legacy::IDD_VALUE, 95)
                    .with(legacy::IDD_DIV, 1);
                port.set_msr(core, msr::pstate_address(slot), image.raw());
            }
            port.set_msr(
                core,
                msr::COFVID_STATUS,
                RegisterImage::new(0)
                    .with(legacy::CPU_FID, 0x0E)
                    .with(legacy::CPU_VID, 16)
                    .raw(),
            );
        }
        port
    }

    #[test]
    fn test_read_only_walk() {
        let profile = k10();
        let config = RunConfig::default();
        let mut port = k10_port();

        let report = StateWalker::new(&mut port, &profile, &config)
            .run(&[0, 1])
            .unwrap();

        assert_eq!(report.cores.len(), 2);
        let core = report.core(1).unwrap();
        assert_eq!(core.pstates.len(), 5);
        assert_eq!(core.current_index, 1);
        assert_eq!(core.limit.max_value, 4);
        assert_eq!(core.pstates[0].metrics.millivolts, 1400.0);
        let current = core.current.as_ref().unwrap();
        assert_eq!(current.metrics.millivolts, 1350.0);
        assert!(port.writes.is_empty());
        assert!(report.northbridge.is_empty());
    }

    #[test]
    fn test_preview_matches_real_run_without_writes() {
        let profile = k10();
        let config = RunConfig {
            cores: Selection::One(0),
            overrides: FieldOverrides::new()
                .with(PStateField::CpuVid, 20)
                .with(PStateField::NbVid, 40),
            ..Default::default()
        };
        let preview = RunConfig {
            preview: true,
            ..config.clone()
        };

        let mut real_port = k10_port();
        let real = StateWalker::new(&mut real_port, &profile, &config)
            .run(&[0, 1])
            .unwrap();

        let mut preview_port = k10_port();
        let previewed = StateWalker::new(&mut preview_port, &profile, &preview)
            .run(&[0, 1])
            .unwrap();

        assert_eq!(real.cores, previewed.cores);
        assert_eq!(real_port.writes.len(), 5);
        assert!(preview_port.writes.is_empty());
        assert_eq!(
            preview_port.msr(0, msr::PSTATE_BASE),
            k10_port().msr(0, msr::PSTATE_BASE)
        );

        let written = real_port.msr(0, msr::PSTATE_BASE).unwrap();
        assert_eq!(written.get(legacy::CPU_VID), 20);
        assert_eq!(written.get(legacy::NB_VID), 40);
        assert_eq!(written.get(legacy::CPU_FID), 0x0E);
    }

    #[test]
    fn test_invalid_config_reads_nothing() {
        let profile = k10();
        let config = RunConfig {
            pstates: Selection::One(5),
            ..Default::default()
        };
        let mut port = k10_port();

        let err = StateWalker::new(&mut port, &profile, &config)
            .run(&[0, 1])
            .unwrap_err();
        assert!(matches!(err, AmdctlError::InvalidFieldValue { .. }));
        assert!(port.reads.is_empty());
        assert!(port.writes.is_empty());
    }

    #[test]
    fn test_stops_past_lowest_usable_pstate() {
        let profile = k10();
        let config = RunConfig {
            cores: Selection::One(0),
            ..Default::default()
        };
        let mut port = k10_port();
        port.set_msr(0, msr::PSTATE_CURRENT_LIMIT, 0x20);

        let report = StateWalker::new(&mut port, &profile, &config)
            .run(&[0, 1])
            .unwrap();

        let slots: Vec<_> = report.cores[0]
            .pstates
            .iter()
            .filter_map(|row| row.slot)
            .collect();
        assert_eq!(slots, vec![0, 1, 2]);
        assert!(!port.reads.contains(&RegisterTarget::Msr {
            core: 0,
            address: msr::pstate_address(3)
        }));
    }

    #[test]
    fn test_limit_override() {
        let profile = k10();
        let config = RunConfig {
            cores: Selection::One(1),
            limits: LimitOverrides {
                lowest: Some(3),
                highest: Some(1),
            },
            ..Default::default()
        };
        let mut port = k10_port();

        let report = StateWalker::new(&mut port, &profile, &config)
            .run(&[0, 1])
            .unwrap();

        let limit = report.cores[0].limit;
        assert_eq!((limit.cur_limit, limit.max_value), (1, 3));
        assert_eq!(report.cores[0].pstates.len(), 4);
        assert_eq!(port.msr(1, msr::PSTATE_CURRENT_LIMIT).unwrap().raw(), 0x31);
        assert_eq!(port.writes.len(), 1);
    }

    #[test]
    fn test_zen_has_no_cofvid_row() {
        let profile = FamilyProfile::for_cpu(0x17, 0x71, None).unwrap();
        let mut port = MemoryPort::new();
        port.set_msr(0, msr::PSTATE_CURRENT_LIMIT, 0x20);
        port.set_msr(0, msr::PSTATE_STATUS, 0);
        for slot in 0..3 {
            port.set_msr(0, msr::pstate_address(slot), 0x8000_0000_0000_0888);
        }

        let report = StateWalker::new(&mut port, &profile, &RunConfig::default())
            .run(&[0])
            .unwrap();

        assert_eq!(report.cores[0].pstates.len(), 3);
        assert!(report.cores[0].current.is_none());
        assert!(!port.reads.contains(&RegisterTarget::Msr {
            core: 0,
            address: msr::COFVID_STATUS
        }));
    }

    #[test]
    fn test_nb_voltage_override_writes_selected_nb_pstate() {
        let profile = FamilyProfile::for_cpu(0x15, 0x30, None).unwrap();
        let nb = profile.nb_pstates.unwrap();
        let mut port = MemoryPort::new();
        port.set_msr(0, msr::PSTATE_CURRENT_LIMIT, 0x00);
        port.set_msr(0, msr::PSTATE_STATUS, 0);
        port.set_msr(0, msr::PSTATE_BASE, 0x8000_0000_0000_1810);
        port.set_msr(0, msr::COFVID_STATUS, 0x1810);
        for index in 0..nb.count {
            port.set_pci(
                pci::EXTENDED_MISC_CONTROL,
                nb.offset(index),
                0x0000_0000_0001_4815,
            );
        }

        let config = RunConfig {
            overrides: FieldOverrides::new().with(PStateField::NbVid, 0x90),
            nb_pstate: Some(2),
            ..Default::default()
        };
        let report = StateWalker::new(&mut port, &profile, &config)
            .run(&[0])
            .unwrap();

        assert_eq!(report.northbridge.len(), 4);
        assert_eq!(report.northbridge[2].vid, 0x90);
        assert_eq!(port.writes.len(), 1);
        assert_eq!(
            port.writes[0].0,
            RegisterTarget::Pci {
                function: pci::EXTENDED_MISC_CONTROL,
                offset: 0x168
            }
        );
        // CPU P-state untouched
        assert_eq!(
            port.msr(0, msr::PSTATE_BASE).unwrap().raw(),
            0x8000_0000_0000_1810
        );
    }

    #[test]
    fn test_read_failure_aborts() {
        let profile = k10();
        let mut port = k10_port();
        port.registers.remove(&RegisterTarget::Msr {
            core: 1,
            address: msr::pstate_address(2),
        });

        let err = StateWalker::new(&mut port, &profile, &RunConfig::default())
            .run(&[0, 1])
            .unwrap_err();
        assert!(matches!(err, AmdctlError::RegisterRead { .. }));
        assert!(!port.reads.contains(&RegisterTarget::Msr {
            core: 1,
            address: msr::COFVID_STATUS
        }));
    }
}
