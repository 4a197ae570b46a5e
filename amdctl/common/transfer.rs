// Positioned 8-byte register transfers
//
// Each transfer is a single pread/pwrite at the register offset. A short
// transfer is an error; nothing is retried.

use std::fs::File;

use nix::sys::uio::{pread, pwrite};

use crate::error::{AmdctlError, Result};

pub const REGISTER_BYTES: usize = 8;

pub fn read_u64_at(file: &File, offset: u64, resource: &str) -> Result<u64> {
    let mut buffer = [0u8; REGISTER_BYTES];
    let read = pread(file, &mut buffer, offset as libc::off_t).map_err(|e| {
        AmdctlError::RegisterRead {
            resource: resource.to_string(),
            offset,
            detail: e.to_string(),
        }
    })?;

    if read != REGISTER_BYTES {
        return Err(AmdctlError::RegisterRead {
            resource: resource.to_string(),
            offset,
            detail: format!("short read ({read} of {REGISTER_BYTES} bytes)"),
        });
    }

    Ok(u64::from_le_bytes(buffer))
}

pub fn write_u64_at(file: &File, offset: u64, value: u64, resource: &str) -> Result<()> {
    let buffer = value.to_le_bytes();
    let written = pwrite(file, &buffer, offset as libc::off_t).map_err(|e| {
        AmdctlError::RegisterWrite {
            resource: resource.to_string(),
            offset,
            detail: e.to_string(),
        }
    })?;

    if written != REGISTER_BYTES {
        return Err(AmdctlError::RegisterWrite {
            resource: resource.to_string(),
            offset,
            detail: format!("short write ({written} of {REGISTER_BYTES} bytes)"),
        });
    }

    Ok(())
}
