#![cfg_attr(not(test), no_std)]

//! splitflap_firmware - Firmware shell for the split-flap display
//!
//! This crate wires the pure motion logic of `splitflap_core` to storage,
//! sensors and the Embassy runtime.
//!
//! # Design Principles
//!
//! - **Cooperative loop**: One control loop owns every unit; interrupts only raise a latch
//! - **Platform implementations**: TimeSource, flash and expander bindings behind traits
//! - **Host testable**: Everything outside `platform::rp2350` builds and tests on the host

// Platform abstraction layer
pub mod platform;

// Logging macros and resume persistence, plus re-exports from splitflap_core
pub mod core;

// Control loop
pub mod system;

// Note: Logging macros (log_info!, log_warn!, log_error!, log_debug!, log_trace!)
// are exported at crate root via #[macro_export] in core::logging
