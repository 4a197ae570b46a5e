use std::fmt;
use std::io;
use thiserror::Error;

use amdctl_raw::ProfileError;

/// Direction of a register transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Read => f.write_str("reading"),
            AccessKind::Write => f.write_str("writing"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AmdctlError {
    #[error("Unsupported hardware: {0}")]
    UnsupportedHardware(String),

    #[error(transparent)]
    UnsupportedFamily(#[from] ProfileError),

    #[error("Failed to open {resource} for {operation}: {source}")]
    RegisterOpen {
        resource: String,
        operation: AccessKind,
        source: io::Error,
    },

    #[error("Failed to read {resource} at 0x{offset:X}: {detail}")]
    RegisterRead {
        resource: String,
        offset: u64,
        detail: String,
    },

    #[error("Failed to write {resource} at 0x{offset:X}: {detail}")]
    RegisterWrite {
        resource: String,
        offset: u64,
        detail: String,
    },

    #[error("Invalid value {value} for {field}: {detail}")]
    InvalidFieldValue {
        field: &'static str,
        value: u64,
        detail: String,
    },

    #[error("No voltage ID encodes exactly {millivolts} mV")]
    VoltageNotFound { millivolts: f64 },

    #[error("Configuration error: {0}")]
    ConfigurationPrecondition(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl AmdctlError {
    /// Whether the run must abort
    ///
    /// Only a failed millivolt lookup is informational.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AmdctlError::VoltageNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, AmdctlError>;
