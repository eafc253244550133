//! Platform traits
//!
//! Interfaces the firmware needs from the board. Each trait has a mock in
//! [`crate::platform::mock`].

pub mod flash;
pub mod ports;

pub use flash::FlashInterface;
pub use ports::SensorPorts;
