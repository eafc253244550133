//! splitflap_core - Pure no_std motion and calibration logic for a split-flap display
//!
//! This crate contains the platform-agnostic algorithms that turn a line of
//! text into drift-corrected stepper motion. Everything here can be tested on
//! host without feature flags or an async runtime.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies
//! - **Trait abstractions**: Stepper, hall sensor and clock injected via traits
//!
//! # Modules
//!
//! - [`alphabet`]: Drum letter order and letter/position conversion
//! - [`traits`]: Platform-agnostic trait abstractions (TimeSource, Stepper, HallSensor)
//! - [`unit`]: Per-drum calibration and motion state machine
//! - [`fleet`]: Multi-unit calibration scheduling and stall watchdog
//! - [`display`]: Text-to-letter dispatch and busy/idle supervision
//! - [`resume`]: Restart-surviving state blob and restart policy
//! - [`parameters`]: Runtime configuration store and typed parameter groups
//! - [`fault`]: Faults that escalate to a system restart

#![no_std]

pub mod alphabet;
pub mod display;
pub mod fault;
pub mod fleet;
pub mod parameters;
pub mod resume;
pub mod traits;
pub mod unit;

/// Largest display the firmware is built for.
///
/// Bounds every fixed-capacity buffer that holds one frame of text.
pub const MAX_UNITS: usize = 16;

pub use fault::Fault;
