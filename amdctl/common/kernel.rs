// msr module write gate
//
// Kernels from 5.9 on expose /sys/module/msr/parameters/allow_writes. MSR
// writes from user space need it to read "on".

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{AmdctlError, Result};

pub const ALLOW_WRITES: &str = "/sys/module/msr/parameters/allow_writes";

/// Make sure user-space MSR writes are enabled, turning them on if needed
pub fn ensure_msr_writes_allowed() -> Result<()> {
    ensure_writes_allowed_at(Path::new(ALLOW_WRITES))
}

pub fn ensure_writes_allowed_at(path: &Path) -> Result<()> {
    let current = match std::fs::read_to_string(path) {
        Ok(value) => value,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("{} not present, kernel does not gate MSR writes", path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if current.trim() == "on" {
        return Ok(());
    }

    tracing::warn!(
        "MSR writes are {:?} in {}, enabling",
        current.trim(),
        path.display()
    );
    std::fs::write(path, "on").map_err(|e| {
        AmdctlError::ConfigurationPrecondition(format!(
            "MSR writes are disabled and {} could not be set to \"on\": {e}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_gate_is_allowed() {
        let path = std::env::temp_dir().join("amdctl-no-such-allow-writes");
        assert!(ensure_writes_allowed_at(&path).is_ok());
    }

    #[test]
    fn test_gate_is_switched_on() {
        let path =
            std::env::temp_dir().join(format!("amdctl-allow-writes-{}", std::process::id()));
        std::fs::write(&path, "default\n").unwrap();
        ensure_writes_allowed_at(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "on");
        std::fs::remove_file(path).unwrap();
    }
}
