pub mod cpuid;
pub mod kernel;
pub mod msr;
pub mod pci;
pub mod transfer;

pub use cpuid::CpuIdentity;
pub use msr::MsrHandle;
pub use pci::PciHandle;
