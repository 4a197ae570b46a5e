use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use amdctl_raw::PciFunction;

use crate::common::transfer::{read_u64_at, write_u64_at};
use crate::error::{AccessKind, AmdctlError, Result};

const PCI_ROOT: &str = "/proc/bus/pci";

pub fn pci_path(function: PciFunction) -> PathBuf {
    Path::new(PCI_ROOT).join(format!("{:02x}", function.bus)).join(format!(
        "{:02x}.{:x}",
        function.device, function.function
    ))
}

/// PCI configuration space of one bus/device/function
pub struct PciHandle {
    file: Mutex<File>,
    function: PciFunction,
    path: String,
}

impl PciHandle {
    pub fn new(function: PciFunction, writable: bool) -> Result<Self> {
        let path = pci_path(function);
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(&path)
            .map_err(|e| AmdctlError::RegisterOpen {
                resource: format!("PCI device {} ({})", function, path.display()),
                operation: if writable {
                    AccessKind::Write
                } else {
                    AccessKind::Read
                },
                source: e,
            })?;

        Ok(Self {
            file: Mutex::new(file),
            function,
            path: path.display().to_string(),
        })
    }

    pub fn read64(&self, offset: u32) -> Result<u64> {
        let file = self.file.lock();
        let value = read_u64_at(&file, u64::from(offset), &self.path)?;
        tracing::debug!(
            "PCI read: {} offset 0x{:03x} = 0x{:016x}",
            self.function,
            offset,
            value
        );
        Ok(value)
    }

    pub fn write64(&self, offset: u32, value: u64) -> Result<()> {
        let file = self.file.lock();
        write_u64_at(&file, u64::from(offset), value, &self.path)?;
        tracing::debug!(
            "PCI write: {} offset 0x{:03x} = 0x{:016x}",
            self.function,
            offset,
            value
        );
        Ok(())
    }
}
