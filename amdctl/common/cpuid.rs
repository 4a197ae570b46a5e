use crate::error::{AmdctlError, Result};

pub const AMD_VENDOR: &str = "AuthenticAMD";

#[cfg(target_arch = "x86_64")]
pub fn cpuid(eax: u32, ecx: u32) -> (u32, u32, u32, u32) {
    let mut ebx: u32;
    let mut edx: u32;
    let mut eax_out = eax;
    let mut ecx_out = ecx;

    unsafe {
        std::arch::asm!(
            "mov {0:r}, rbx",
            "cpuid",
            "xchg {0:r}, rbx",
            out(reg) ebx,
            inout("eax") eax_out,
            inout("ecx") ecx_out,
            out("edx") edx,
            options(nostack, preserves_flags)
        );
    }

    (eax_out, ebx, ecx_out, edx)
}

#[cfg(not(target_arch = "x86_64"))]
pub fn cpuid(_eax: u32, _ecx: u32) -> (u32, u32, u32, u32) {
    (0, 0, 0, 0)
}

/// Vendor, family, model and online CPUs of the running machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuIdentity {
    pub vendor: String,
    pub family: u32,
    pub model: u32,
    pub stepping: u32,
    pub cpus: Vec<u32>,
}

impl CpuIdentity {
    /// Detect the CPU, failing unless it is an AMD part with a known CPU list
    pub fn detect() -> Result<Self> {
        let (_eax, ebx, ecx, edx) = cpuid(0, 0);
        let vendor = vendor_string(ebx, edx, ecx);

        let (eax, _ebx, _ecx, _edx) = cpuid(1, 0);
        let (family, model, stepping) = decode_signature(eax);

        let cpus = std::fs::read_to_string("/sys/devices/system/cpu/online")
            .map_err(|e| {
                AmdctlError::UnsupportedHardware(format!("Cannot read online CPU list: {e}"))
            })
            .and_then(|s| parse_cpu_list(&s))?;

        let identity = Self {
            vendor,
            family,
            model,
            stepping,
            cpus,
        };
        identity.check()?;

        tracing::info!(
            "CPU: {} Family {:X}h, Model {:X}h, Stepping {:X}, {} CPUs",
            identity.vendor,
            identity.family,
            identity.model,
            identity.stepping,
            identity.cpus.len()
        );

        Ok(identity)
    }

    pub fn check(&self) -> Result<()> {
        if self.vendor != AMD_VENDOR {
            return Err(AmdctlError::UnsupportedHardware(format!(
                "Processor vendor {:?} is not {AMD_VENDOR}",
                self.vendor
            )));
        }
        if self.family == 0 || self.cpus.is_empty() {
            return Err(AmdctlError::UnsupportedHardware(
                "Could not determine CPU family or core count".to_string(),
            ));
        }
        Ok(())
    }
}

/// Assemble the 12-byte vendor string from CPUID leaf 0
pub fn vendor_string(ebx: u32, edx: u32, ecx: u32) -> String {
    let mut bytes = Vec::with_capacity(12);
    for reg in [ebx, edx, ecx] {
        bytes.extend_from_slice(&reg.to_le_bytes());
    }
    String::from_utf8_lossy(&bytes)
        .trim_end_matches('\0')
        .to_string()
}

/// Decode CPUID leaf 1 EAX into display family, model and stepping
///
/// AMD adds the extended family and prepends the extended model only when
/// the base family is 0Fh.
pub fn decode_signature(eax: u32) -> (u32, u32, u32) {
    let stepping = eax & 0xF;
    let model = (eax >> 4) & 0xF;
    let family = (eax >> 8) & 0xF;
    let extended_model = (eax >> 16) & 0xF;
    let extended_family = (eax >> 20) & 0xFF;

    if family == 0xF {
        (family + extended_family, (extended_model << 4) | model, stepping)
    } else {
        (family, model, stepping)
    }
}

/// Parse CPU list like "0-3,8-11"
pub fn parse_cpu_list(s: &str) -> Result<Vec<u32>> {
    let mut cpus = Vec::new();
    for part in s.trim().split(',').filter(|p| !p.is_empty()) {
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| AmdctlError::ParseError(format!("Invalid CPU list {s:?}: {e}")))
        };
        if let Some((start, end)) = part.split_once('-') {
            cpus.extend(parse(start)?..=parse(end)?);
        } else {
            cpus.push(parse(part)?);
        }
    }
    cpus.sort_unstable();
    cpus.dedup();
    Ok(cpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::similar_names)] // CPU register names are standard
    fn test_cpuid() {
        let (eax, ebx, ecx, edx) = cpuid(0, 0);
        println!("CPUID(0,0): EAX={eax:08X} EBX={ebx:08X} ECX={ecx:08X} EDX={edx:08X}");
    }

    #[test]
    fn test_vendor_string() {
        // "Auth" "enti" "cAMD"
        let vendor = vendor_string(0x6874_7541, 0x6974_6E65, 0x444D_4163);
        assert_eq!(vendor, AMD_VENDOR);
    }

    #[test]
    fn test_decode_signature() {
        // Ryzen 5 3600: family 17h model 71h stepping 0
        assert_eq!(decode_signature(0x0087_0F10), (0x17, 0x71, 0));
        // Phenom II X4: family 10h model 04h stepping 2
        assert_eq!(decode_signature(0x0010_0F42), (0x10, 0x04, 2));
        // Ryzen 5000: family 19h model 21h stepping 0
        assert_eq!(decode_signature(0x00A2_0F10), (0x19, 0x21, 0));
    }

    #[test]
    fn test_parse_cpu_list() {
        assert_eq!(parse_cpu_list("0-3,8-9\n").unwrap(), vec![0, 1, 2, 3, 8, 9]);
        assert_eq!(parse_cpu_list("0").unwrap(), vec![0]);
        assert!(parse_cpu_list("0-x").is_err());
    }

    #[test]
    fn test_identity_check() {
        let mut identity = CpuIdentity {
            vendor: "GenuineIntel".to_string(),
            family: 6,
            model: 0x55,
            stepping: 4,
            cpus: vec![0, 1],
        };
        assert!(matches!(
            identity.check(),
            Err(AmdctlError::UnsupportedHardware(_))
        ));

        identity.vendor = AMD_VENDOR.to_string();
        identity.family = 0x15;
        assert!(identity.check().is_ok());

        identity.cpus.clear();
        assert!(identity.check().is_err());
    }
}
