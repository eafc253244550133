//! Core traits for platform-agnostic display control.
//!
//! This module provides trait abstractions that decouple the motion core
//! from the stepper driver, the sensor port expander and the system clock.
//!
//! # Design
//!
//! - Trait definitions are pure and have no feature gates
//! - Mock implementations are always available for host testing; `MockTime`
//!   needs 64-bit atomics and is left out on targets without them
//! - Platform implementations (Embassy, simulator) live in other crates

pub mod hall;
pub mod stepper;
pub mod time;

pub use hall::{EdgeLatch, HallLevel, HallSensor, MockHall};
pub use stepper::{MockStepper, Stepper, StepperCommand};
#[cfg(target_has_atomic = "64")]
pub use time::MockTime;
pub use time::TimeSource;
