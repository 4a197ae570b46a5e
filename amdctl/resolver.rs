// Family profile resolution, including the hardware probes some families need

use amdctl_raw::arch::fam10h;
use amdctl_raw::{msr, pci, Bootstrap, CpuFamily, FamilyProfile};

use crate::common::CpuIdentity;
use crate::error::{AmdctlError, Result};
use crate::port::{RegisterPort, RegisterTarget};

/// Resolve the profile for the detected CPU
///
/// Unsupported families fail before any register is touched. Family 10h
/// probes D18F3 for its voltage interface; families 12h and 14h read the main
/// PLL setting and core 0's COFVID status.
pub fn resolve_profile<P: RegisterPort>(
    identity: &CpuIdentity,
    port: &mut P,
) -> Result<FamilyProfile> {
    let family = CpuFamily::from_code(identity.family)?;

    let voltage_probe = if FamilyProfile::requires_voltage_probe(family) {
        Some(probe_voltage_interface(port)?)
    } else {
        None
    };

    let mut profile = FamilyProfile::for_cpu(identity.family, identity.model, voltage_probe)?;

    if profile.requires_bootstrap() {
        let boot_core = identity.cpus.first().copied().unwrap_or(0);
        let bootstrap = Bootstrap {
            clock_control: port.read(RegisterTarget::Pci {
                function: pci::MISC_CONTROL,
                offset: pci::CLOCK_POWER_TIMING_CONTROL0,
            })?,
            cofvid: port.read(RegisterTarget::Msr {
                core: boot_core,
                address: msr::COFVID_STATUS,
            })?,
        };
        profile = profile.with_bootstrap(bootstrap);
        tracing::info!(
            "Main PLL {:.0} MHz, VID bounds {:?}",
            profile.main_pll_mhz.unwrap_or_default(),
            profile.vid_bounds
        );
    }

    tracing::info!(
        "Resolved family {} model {:X}h: {} P-states, {} voltage IDs",
        profile.family,
        profile.model,
        profile.pstate_count,
        profile.voltage.name()
    );

    Ok(profile)
}

/// Determine whether a family 10h part uses the parallel VID interface
///
/// D18F3 must identify itself as the family 10h miscellaneous control
/// function before its PviMode bit is trusted.
pub fn probe_voltage_interface<P: RegisterPort>(port: &mut P) -> Result<bool> {
    let id = port.read(RegisterTarget::Pci {
        function: pci::MISC_CONTROL,
        offset: pci::DEVICE_VENDOR_ID,
    })?;

    let signature = (id.raw() & 0xFFFF_FFFF) as u32;
    if signature != pci::FAM10H_MISC_SIGNATURE {
        return Err(AmdctlError::UnsupportedHardware(format!(
            "PCI {} reports device/vendor {:08X}, expected {:08X}; cannot determine voltage encoding",
            pci::MISC_CONTROL,
            signature,
            pci::FAM10H_MISC_SIGNATURE
        )));
    }

    let control = port.read(RegisterTarget::Pci {
        function: pci::MISC_CONTROL,
        offset: pci::POWER_CONTROL_MISC,
    })?;
    let pvi = control.flag(fam10h::PVI_MODE);
    tracing::debug!("D18F3xA0 = {}, PVI mode {}", control, pvi);

    Ok(pvi)
}
