use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;

use crate::common::transfer::{read_u64_at, write_u64_at};
use crate::error::{AccessKind, AmdctlError, Result};

pub fn msr_path(cpu: u32) -> String {
    format!("/dev/cpu/{cpu}/msr")
}

/// Per-core MSR device
///
/// The read handle is opened up front; the write handle only when the first
/// write is issued, so report-only runs never open the device for writing.
pub struct MsrHandle {
    reader: Mutex<File>,
    writer: Mutex<Option<File>>,
    cpu_id: u32,
    path: String,
}

impl MsrHandle {
    pub fn new(cpu: u32) -> Result<Self> {
        let path = msr_path(cpu);
        let file = File::open(&path).map_err(|e| AmdctlError::RegisterOpen {
            resource: format!("{path} (CPU {cpu}, is the msr kernel module loaded?)"),
            operation: AccessKind::Read,
            source: e,
        })?;

        tracing::debug!("Opened MSR handle {} for core {}", file.as_raw_fd(), cpu);

        Ok(Self {
            reader: Mutex::new(file),
            writer: Mutex::new(None),
            cpu_id: cpu,
            path,
        })
    }

    pub fn read(&self, addr: u32) -> Result<u64> {
        let file = self.reader.lock();
        let value = read_u64_at(&file, u64::from(addr), &self.path)?;
        tracing::debug!(
            "MSR read: CPU {} MSR 0x{:08x} = 0x{:016x}",
            self.cpu_id,
            addr,
            value
        );
        Ok(value)
    }

    pub fn write(&self, addr: u32, value: u64) -> Result<()> {
        let mut writer = self.writer.lock();
        if writer.is_none() {
            let file = OpenOptions::new()
                .write(true)
                .custom_flags(libc::O_SYNC)
                .open(&self.path)
                .map_err(|e| AmdctlError::RegisterOpen {
                    resource: format!("{} (CPU {})", self.path, self.cpu_id),
                    operation: AccessKind::Write,
                    source: e,
                })?;
            *writer = Some(file);
        }

        if let Some(file) = writer.as_ref() {
            write_u64_at(file, u64::from(addr), value, &self.path)?;
        }
        tracing::debug!(
            "MSR write: CPU {} MSR 0x{:08x} = 0x{:016x}",
            self.cpu_id,
            addr,
            value
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msr_path() {
        assert_eq!(msr_path(7), "/dev/cpu/7/msr");
    }

    #[test]
    fn test_open_failure_names_device() {
        let err = match MsrHandle::new(u32::MAX) {
            Ok(_) => panic!("CPU {} should not exist", u32::MAX),
            Err(e) => e,
        };
        assert!(matches!(
            err,
            AmdctlError::RegisterOpen {
                operation: AccessKind::Read,
                ..
            }
        ));
        assert!(err.to_string().contains("/dev/cpu/4294967295/msr"));
    }
}
