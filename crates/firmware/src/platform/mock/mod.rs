//! Mock platform implementations for host tests and simulation
//!
//! Always compiled so the simulator crate can use them without features.

pub mod flash;
pub mod ports;

pub use flash::{MockFlash, MOCK_FLASH_BASE, MOCK_FLASH_BLOCK_SIZE, MOCK_FLASH_SIZE};
pub use ports::MockPorts;
