pub mod northbridge;
pub mod pstate;

pub use northbridge::NbPStateRow;
pub use pstate::{DerivedMetrics, PStateFields, PStateRow};

use amdctl_raw::msr::PStateLimit;
use amdctl_raw::CpuFamily;

/// Everything read from one core
#[derive(Debug, Clone, PartialEq)]
pub struct CoreReport {
    pub core: u32,
    /// Limit register after any override
    pub limit: PStateLimit,
    /// Current P-state slot from the status register
    pub current_index: u8,
    pub pstates: Vec<PStateRow>,
    /// COFVID status row, on families that have one
    pub current: Option<PStateRow>,
}

/// Result of one run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub family: CpuFamily,
    pub model: u32,
    pub preview: bool,
    pub cores: Vec<CoreReport>,
    pub northbridge: Vec<NbPStateRow>,
}

impl Report {
    pub fn new(family: CpuFamily, model: u32, preview: bool) -> Self {
        Self {
            family,
            model,
            preview,
            cores: Vec::new(),
            northbridge: Vec::new(),
        }
    }

    pub fn core(&self, core: u32) -> Option<&CoreReport> {
        self.cores.iter().find(|report| report.core == core)
    }
}
