//! Firmware core services
//!
//! Firmware-specific infrastructure (logging, resume persistence) plus
//! re-exports of the pure business logic from splitflap_core.

pub mod logging;
pub mod resume;

pub use resume::{ResumeStore, RESUME_BLOCK_ADDRESS};

// Re-export pure types from splitflap_core so firmware code can use crate::core::X
pub use splitflap_core::alphabet;
pub use splitflap_core::display;
pub use splitflap_core::fleet;
pub use splitflap_core::parameters;
pub use splitflap_core::traits;
pub use splitflap_core::unit;
pub use splitflap_core::{Fault, MAX_UNITS};
