//! Runtime configuration
//!
//! A flat name/value [`ParameterStore`] holds every tunable. Typed parameter
//! groups register their defaults into the store and read a snapshot back
//! out of it:
//!
//! - [`MotionParams`]: timeouts and loop cadence shared by all units
//! - [`UnitParams`]: per-drum calibration offset and steps per flap

pub mod error;
pub mod motion;
pub mod storage;
pub mod units;

pub use error::ParameterError;
pub use motion::MotionParams;
pub use storage::{ParamFlags, ParamName, ParamValue, ParameterStore, MAX_PARAMS, PARAM_NAME_LEN};
pub use units::{UnitParams, REFERENCE_UNITS};
