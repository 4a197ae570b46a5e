// Register access port: where register images come from and go to

use std::collections::HashMap;
use std::fmt;

use amdctl_raw::{PciFunction, RegisterImage};

use crate::common::msr::msr_path;
use crate::common::{MsrHandle, PciHandle};
use crate::error::Result;

/// One addressable register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterTarget {
    /// An MSR on one core
    Msr { core: u32, address: u32 },
    /// A configuration register of a PCI function
    Pci { function: PciFunction, offset: u32 },
}

impl fmt::Display for RegisterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterTarget::Msr { core, address } => {
                write!(f, "{} MSR 0x{address:08X}", msr_path(*core))
            }
            RegisterTarget::Pci { function, offset } => {
                write!(f, "PCI {function} offset 0x{offset:03X}")
            }
        }
    }
}

/// Atomic 8-byte register reads and writes
///
/// Implementations never retry: a failed or short transfer is returned as an
/// error and the caller aborts.
pub trait RegisterPort {
    fn read(&mut self, target: RegisterTarget) -> Result<RegisterImage>;

    fn write(&mut self, target: RegisterTarget, image: RegisterImage) -> Result<()>;
}

/// Port backed by `/dev/cpu/N/msr` and `/proc/bus/pci`
///
/// Device handles are opened on first use and kept for the rest of the run.
#[derive(Default)]
pub struct DevicePort {
    msr: HashMap<u32, MsrHandle>,
    pci: HashMap<PciFunction, PciHandle>,
    pci_writable: HashMap<PciFunction, PciHandle>,
}

impl DevicePort {
    pub fn new() -> Self {
        Self::default()
    }

    fn msr_handle(&mut self, core: u32) -> Result<&MsrHandle> {
        if !self.msr.contains_key(&core) {
            let handle = MsrHandle::new(core)?;
            self.msr.insert(core, handle);
        }
        Ok(&self.msr[&core])
    }

    fn pci_handle(&mut self, function: PciFunction, writable: bool) -> Result<&PciHandle> {
        let handles = if writable {
            &mut self.pci_writable
        } else {
            &mut self.pci
        };
        if !handles.contains_key(&function) {
            let handle = PciHandle::new(function, writable)?;
            handles.insert(function, handle);
        }
        Ok(&handles[&function])
    }
}

impl RegisterPort for DevicePort {
    fn read(&mut self, target: RegisterTarget) -> Result<RegisterImage> {
        let raw = match target {
            RegisterTarget::Msr { core, address } => self.msr_handle(core)?.read(address)?,
            RegisterTarget::Pci { function, offset } => {
                self.pci_handle(function, false)?.read64(offset)?
            }
        };
        Ok(RegisterImage::new(raw))
    }

    fn write(&mut self, target: RegisterTarget, image: RegisterImage) -> Result<()> {
        match target {
            RegisterTarget::Msr { core, address } => {
                self.msr_handle(core)?.write(address, image.raw())
            }
            RegisterTarget::Pci { function, offset } => {
                self.pci_handle(function, true)?.write64(offset, image.raw())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryPort;
    use super::*;

    #[test]
    fn test_target_display() {
        let msr = RegisterTarget::Msr {
            core: 2,
            address: 0xC001_0064,
        };
        assert_eq!(msr.to_string(), "/dev/cpu/2/msr MSR 0xC0010064");

        let pci = RegisterTarget::Pci {
            function: amdctl_raw::pci::EXTENDED_MISC_CONTROL,
            offset: 0x160,
        };
        assert_eq!(pci.to_string(), "PCI 00:18.5 offset 0x160");
    }

    #[test]
    fn test_memory_port_records_transfers() {
        let mut port = MemoryPort::new();
        port.set_msr(0, 0xC001_0064, 0x1234);

        let target = RegisterTarget::Msr {
            core: 0,
            address: 0xC001_0064,
        };
        assert_eq!(port.read(target).unwrap().raw(), 0x1234);
        port.write(target, RegisterImage::new(0x5678)).unwrap();

        assert_eq!(port.reads, vec![target]);
        assert_eq!(port.writes.len(), 1);
        assert_eq!(port.msr(0, 0xC001_0064).unwrap().raw(), 0x5678);
        assert!(port
            .read(RegisterTarget::Msr {
                core: 1,
                address: 0xC001_0064
            })
            .is_err());
    }
}
