//! PCI configuration space locations used by the P-state tables
//!
//! All supported parts expose their northbridge functions on bus 0,
//! device 18h.

use std::fmt;
use std::str::FromStr;

/// A PCI bus/device/function triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PciFunction {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl PciFunction {
    pub const fn new(bus: u8, device: u8, function: u8) -> Self {
        Self {
            bus,
            device,
            function,
        }
    }
}

impl fmt::Display for PciFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}.{:x}",
            self.bus, self.device, self.function
        )
    }
}

impl FromStr for PciFunction {
    type Err = String;

    /// Parse `"BB:DD.F"` with hexadecimal bus, device and function
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bus, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("missing ':' in PCI function {s:?}"))?;
        let (device, function) = rest
            .split_once('.')
            .ok_or_else(|| format!("missing '.' in PCI function {s:?}"))?;

        let parse = |part: &str, what: &str| {
            u8::from_str_radix(part.trim(), 16)
                .map_err(|e| format!("invalid PCI {what} {part:?}: {e}"))
        };

        let function = parse(function, "function")?;
        if function > 7 {
            return Err(format!("PCI function {function} out of range"));
        }

        Ok(Self {
            bus: parse(bus, "bus")?,
            device: parse(device, "device")?,
            function,
        })
    }
}

/// D18F3: miscellaneous control
pub const MISC_CONTROL: PciFunction = PciFunction::new(0x00, 0x18, 3);

/// D18F5: extended miscellaneous control (northbridge P-states)
pub const EXTENDED_MISC_CONTROL: PciFunction = PciFunction::new(0x00, 0x18, 5);

/// Device/vendor identification register
pub const DEVICE_VENDOR_ID: u32 = 0x00;

/// Family 10h D18F3 device/vendor signature (device 1203h, vendor 1022h)
pub const FAM10H_MISC_SIGNATURE: u32 = 0x1203_1022;

/// D18F3xA0 Power Control Miscellaneous; bit 8 (`PviMode`) selects PVI
pub const POWER_CONTROL_MISC: u32 = 0xA0;

/// D18F3xD4 Clock Power/Timing Control 0; bits 5:0 hold `MainPllOpFreqId`
pub const CLOCK_POWER_TIMING_CONTROL0: u32 = 0xD4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pci_function_round_trip_text() {
        let parsed: PciFunction = "00:18.3".parse().unwrap();
        assert_eq!(parsed, MISC_CONTROL);
        assert_eq!(EXTENDED_MISC_CONTROL.to_string(), "00:18.5");
    }

    #[test]
    fn test_pci_function_rejects_garbage() {
        assert!("0018.3".parse::<PciFunction>().is_err());
        assert!("00:18".parse::<PciFunction>().is_err());
        assert!("00:18.9".parse::<PciFunction>().is_err());
        assert!("zz:18.3".parse::<PciFunction>().is_err());
    }
}
