//! RP2350 bindings (Pico 2 W)
//!
//! Flash, the sensor expander and the Embassy tasks. Only built with the
//! `pico2_w` feature.

pub mod expander;
pub mod flash;
pub mod tasks;

pub use expander::{enable_stepper_drivers, Mcp23017Ports};
pub use flash::Rp2350Flash;

/// Units in this build, fixed at compile time by `SPLITFLAP_UNITS`
pub const UNITS: usize = parse_units(env!("SPLITFLAP_UNITS"));

// build.rs only ever emits a validated decimal number.
const fn parse_units(digits: &str) -> usize {
    let bytes = digits.as_bytes();
    let mut value = 0;
    let mut i = 0;
    while i < bytes.len() {
        value = value * 10 + (bytes[i] - b'0') as usize;
        i += 1;
    }
    value
}
