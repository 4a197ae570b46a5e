//! # amdctl-raw
//!
//! Register definitions and P-state encodings for AMD processors, from
//! family 10h (K10) through family 19h (Zen 3/Zen 4).
//!
//! This crate is pure: it knows where each logical quantity lives inside a
//! P-state register and how to convert encoded IDs into millivolts, megahertz
//! and amperes, but it never touches hardware. Register I/O lives in the
//! `amdctl` crate.
//!
//! ## Usage
//!
//! ```
//! use amdctl_raw::{FamilyProfile, RegisterImage};
//!
//! let profile = FamilyProfile::for_cpu(0x15, 0x02, None).unwrap();
//! let mut image = RegisterImage::new(0x8000_0195_4000_1a10);
//!
//! let vid = image.get(profile.layout.cpu_vid);
//! let millivolts = profile.vid_to_millivolts(vid);
//! assert!(millivolts > 0.0);
//!
//! // Lower the voltage by one step without disturbing other fields
//! image.set(profile.layout.cpu_vid, vid + 1);
//! ```

pub mod arch;
pub mod bitfield;
pub mod convert;
pub mod family;
pub mod msr;
pub mod pci;
pub mod register;

pub use bitfield::BitField;
pub use convert::{power_draw_watts, ClockFormula, CurrentFormula, VoltageEncoding};
pub use family::{
    Bootstrap, CpuFamily, FamilyProfile, NbPStateLayout, PStateLayout, ProfileError,
    RegisterMap, VidBounds,
};
pub use pci::PciFunction;
pub use register::{RegisterImage, RegisterLayout};
