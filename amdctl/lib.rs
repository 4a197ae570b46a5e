// Macros (must be first for visibility)
#[macro_use]
pub mod macros;

pub mod common;
pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod port;
pub mod report;
pub mod resolver;

pub use config::{FieldOverrides, LimitOverrides, OverrideRequest, RunConfig, Selection};
pub use error::{AccessKind, AmdctlError, Result};
pub use metrics::{CoreReport, DerivedMetrics, NbPStateRow, PStateFields, PStateRow, Report};
pub use orchestrator::StateWalker;
pub use port::{DevicePort, RegisterPort, RegisterTarget};
pub use resolver::resolve_profile;
