//! Motion and supervision parameters
//!
//! # Parameters
//!
//! - `FLAP_CAL_TMO` - Marker search timeout (ms)
//! - `FLAP_GLITCH_MS` - Minimum spacing of genuine sensor transitions (ms)
//! - `FLAP_STALL_MS` - Continuous motion before a stall restart (ms)
//! - `FLAP_REBOOT_MAX` - Redisplays of a recovered frame before halting
//! - `FLAP_HK_MS` - Housekeeping cadence for request intake (ms)
//! - `FLAP_UNITS` - Number of units in this build (read-only)

use super::error::ParameterError;
use super::storage::{ParamFlags, ParamValue, ParameterStore};
use crate::fleet::DEFAULT_STALL_TIMEOUT_MS;
use crate::resume::DEFAULT_MAX_REBOOTS;
use crate::unit::{DEFAULT_CALIBRATION_TIMEOUT_MS, DEFAULT_GLITCH_WINDOW_MS};

/// Default housekeeping cadence (ms)
pub const DEFAULT_HOUSEKEEPING_MS: u32 = 500;

/// Motion parameters loaded from parameter store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionParams {
    /// Marker search timeout (ms)
    pub calibration_timeout_ms: u32,
    /// Glitch rejection window (ms)
    pub glitch_window_ms: u32,
    /// Stall timeout (ms)
    pub stall_timeout_ms: u32,
    /// Redisplays allowed before halting
    pub max_reboots: u8,
    /// Housekeeping cadence (ms)
    pub housekeeping_ms: u32,
    /// Units in this build
    pub units: u8,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            calibration_timeout_ms: DEFAULT_CALIBRATION_TIMEOUT_MS,
            glitch_window_ms: DEFAULT_GLITCH_WINDOW_MS,
            stall_timeout_ms: DEFAULT_STALL_TIMEOUT_MS,
            max_reboots: DEFAULT_MAX_REBOOTS,
            housekeeping_ms: DEFAULT_HOUSEKEEPING_MS,
            units: 0,
        }
    }
}

impl MotionParams {
    /// Register motion parameters with default values
    ///
    /// `units` is recorded read-only; it is fixed by the build.
    pub fn register_defaults(store: &mut ParameterStore, units: u8) -> Result<(), ParameterError> {
        let defaults = Self::default();
        store.register(
            "FLAP_CAL_TMO",
            ParamValue::Int(defaults.calibration_timeout_ms as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "FLAP_GLITCH_MS",
            ParamValue::Int(defaults.glitch_window_ms as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "FLAP_STALL_MS",
            ParamValue::Int(defaults.stall_timeout_ms as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "FLAP_REBOOT_MAX",
            ParamValue::Int(i32::from(defaults.max_reboots)),
            ParamFlags::empty(),
        )?;
        store.register(
            "FLAP_HK_MS",
            ParamValue::Int(defaults.housekeeping_ms as i32),
            ParamFlags::empty(),
        )?;
        store.register(
            "FLAP_UNITS",
            ParamValue::Int(i32::from(units)),
            ParamFlags::READ_ONLY,
        )?;
        Ok(())
    }

    /// Load motion parameters from parameter store
    ///
    /// Missing or negative values fall back to defaults.
    pub fn from_store(store: &ParameterStore) -> Self {
        let defaults = Self::default();
        Self {
            calibration_timeout_ms: read_u32(store, "FLAP_CAL_TMO", defaults.calibration_timeout_ms),
            glitch_window_ms: read_u32(store, "FLAP_GLITCH_MS", defaults.glitch_window_ms),
            stall_timeout_ms: read_u32(store, "FLAP_STALL_MS", defaults.stall_timeout_ms),
            max_reboots: read_u32(store, "FLAP_REBOOT_MAX", u32::from(defaults.max_reboots))
                .min(u32::from(u8::MAX)) as u8,
            housekeeping_ms: read_u32(store, "FLAP_HK_MS", defaults.housekeeping_ms).max(1),
            units: read_u32(store, "FLAP_UNITS", 0).min(u32::from(u8::MAX)) as u8,
        }
    }
}

fn read_u32(store: &ParameterStore, name: &str, default: u32) -> u32 {
    match store.get(name).map(ParamValue::as_int) {
        Some(v) if v >= 0 => v as u32,
        _ => default,
    }
}
