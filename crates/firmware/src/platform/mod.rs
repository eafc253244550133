//! Platform abstraction layer
//!
//! Hardware access is isolated here. Host-testable pieces (flash and expander
//! traits, the atomic stepper channel, mocks) are always compiled; the RP2350
//! bindings are gated behind the `pico2_w` feature.

pub mod error;
pub mod expander;
pub mod mock;
pub mod stepper;
pub mod traits;

#[cfg(feature = "pico2_w")]
pub mod time;

#[cfg(feature = "pico2_w")]
pub mod rp2350;

// Re-export commonly used types
pub use error::{FlashError, I2cError, PlatformError, Result};
pub use expander::{ExpanderHall, Port, SensorBit, REFERENCE_SENSOR_MAP};
pub use stepper::{ChannelStepper, StepperChannel};
pub use traits::{FlashInterface, SensorPorts};

#[cfg(feature = "pico2_w")]
pub use time::EmbassyTime;
