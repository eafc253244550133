//! splitflap_sitl - Software-in-the-loop bench for the split-flap firmware
//!
//! A [`SimBench`] models a row of drums: each drum turns one step per step
//! interval while its stepper has work, and its hall sensor reads detected
//! while the magnetic marker passes. The firmware's [`SplitFlapSystem`]
//! runs unchanged against the bench's stepper, sensor and clock handles.
//!
//! [`SplitFlapSystem`]: splitflap_firmware::system::SplitFlapSystem

pub mod bench;
pub mod drum;
pub mod error;
pub mod runner;

pub use bench::{SimBench, SimClock, SimHall, SimStepper};
pub use drum::DrumConfig;
pub use error::SimulatorError;
pub use runner::{default_params, surviving_flash, SimSystem, LOOP_PERIOD_MS};
