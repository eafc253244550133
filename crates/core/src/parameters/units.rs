//! Per-unit drum parameters
//!
//! Each drum has its own marker-to-blank offset and its own steps per flap
//! (gear trains differ slightly between motors). Parameters are named
//! `Unn_CAL_OFS` and `Unn_SPF` with `nn` the zero-padded unit number.

use core::fmt::Write;

use super::error::ParameterError;
use super::motion::MotionParams;
use super::storage::{ParamFlags, ParamName, ParamValue, ParameterStore};
use crate::unit::UnitConfig;

/// Per-unit parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitParams {
    /// Steps from the marker edge to the blank flap
    pub calibration_offset: u16,
    /// Motor steps per flap
    pub steps_per_flap: f32,
}

/// Measured values for the reference twelve-unit build, left to right.
pub const REFERENCE_UNITS: [UnitParams; 12] = [
    UnitParams::new(87, 2038.0 / 45.0),
    UnitParams::new(62, 2038.0 / 45.0),
    UnitParams::new(77, 2038.0 / 45.0),
    UnitParams::new(65, 2050.0 / 45.0),
    UnitParams::new(89, 2049.0 / 45.0),
    UnitParams::new(104, 2049.0 / 45.0),
    UnitParams::new(107, 2049.0 / 45.0),
    UnitParams::new(82, 2038.0 / 45.0),
    UnitParams::new(95, 2051.0 / 45.0),
    UnitParams::new(97, 2051.2 / 45.0),
    UnitParams::new(90, 2049.0 / 45.0),
    UnitParams::new(55, 2038.0 / 45.0),
];

impl UnitParams {
    /// Construct from raw values
    pub const fn new(calibration_offset: u16, steps_per_flap: f32) -> Self {
        Self {
            calibration_offset,
            steps_per_flap,
        }
    }

    /// Reference value for `unit`, or a stock drum beyond the reference table.
    pub fn reference(unit: u8) -> Self {
        REFERENCE_UNITS
            .get(usize::from(unit))
            .copied()
            .unwrap_or_else(|| {
                let stock = UnitConfig::default();
                Self::new(stock.calibration_offset, stock.steps_per_flap)
            })
    }

    /// Register `Unn_CAL_OFS` and `Unn_SPF` for units `0..units`
    pub fn register_defaults(store: &mut ParameterStore, units: u8) -> Result<(), ParameterError> {
        for unit in 0..units {
            let reference = Self::reference(unit);
            store.register(
                &param_name(unit, "CAL_OFS")?,
                ParamValue::Int(i32::from(reference.calibration_offset)),
                ParamFlags::empty(),
            )?;
            store.register(
                &param_name(unit, "SPF")?,
                ParamValue::Float(reference.steps_per_flap),
                ParamFlags::empty(),
            )?;
        }
        Ok(())
    }

    /// Load parameters for `unit`
    ///
    /// Missing or out-of-range values fall back to the reference table.
    pub fn from_store(store: &ParameterStore, unit: u8) -> Self {
        let reference = Self::reference(unit);

        let calibration_offset = param_name(unit, "CAL_OFS")
            .ok()
            .and_then(|name| store.get(&name).map(ParamValue::as_int))
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(reference.calibration_offset);

        let steps_per_flap = param_name(unit, "SPF")
            .ok()
            .and_then(|name| store.get(&name).map(ParamValue::as_float))
            .filter(|v| v.is_finite() && *v >= 1.0)
            .unwrap_or(reference.steps_per_flap);

        Self {
            calibration_offset,
            steps_per_flap,
        }
    }

    /// Full unit configuration combining drum and motion parameters
    pub fn unit_config(&self, motion: &MotionParams) -> UnitConfig {
        UnitConfig {
            steps_per_flap: self.steps_per_flap,
            calibration_offset: self.calibration_offset,
            calibration_timeout_ms: motion.calibration_timeout_ms,
            glitch_window_ms: motion.glitch_window_ms,
        }
    }
}

fn param_name(unit: u8, suffix: &str) -> Result<ParamName, ParameterError> {
    let mut name = ParamName::new();
    write!(name, "U{:02}_{}", unit, suffix).map_err(|_| ParameterError::InvalidConfig)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_names() {
        assert_eq!(param_name(3, "SPF").unwrap().as_str(), "U03_SPF");
        assert_eq!(param_name(11, "CAL_OFS").unwrap().as_str(), "U11_CAL_OFS");
    }

    #[test]
    fn test_register_defaults_uses_reference_table() {
        let mut store = ParameterStore::new();
        UnitParams::register_defaults(&mut store, 12).unwrap();

        assert_eq!(store.len(), 24);
        assert_eq!(store.get("U05_CAL_OFS"), Some(&ParamValue::Int(104)));
        assert_eq!(
            store.get("U09_SPF"),
            Some(&ParamValue::Float(2051.2 / 45.0))
        );
    }

    #[test]
    fn test_from_store_custom_values() {
        let mut store = ParameterStore::new();
        UnitParams::register_defaults(&mut store, 2).unwrap();
        store.set("U01_CAL_OFS", ParamValue::Int(70)).unwrap();
        store.set("U01_SPF", ParamValue::Float(45.0)).unwrap();

        let params = UnitParams::from_store(&store, 1);
        assert_eq!(params.calibration_offset, 70);
        assert!((params.steps_per_flap - 45.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let mut store = ParameterStore::new();
        UnitParams::register_defaults(&mut store, 1).unwrap();
        store.set("U00_CAL_OFS", ParamValue::Int(-3)).unwrap();
        store.set("U00_SPF", ParamValue::Float(0.0)).unwrap();

        assert_eq!(UnitParams::from_store(&store, 0), REFERENCE_UNITS[0]);
    }

    #[test]
    fn test_units_beyond_table_use_stock_drum() {
        let stock = UnitParams::reference(14);
        assert_eq!(stock.calibration_offset, 87);
        assert!((stock.steps_per_flap - 2038.0 / 45.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unit_config_merges_motion() {
        let motion = MotionParams {
            calibration_timeout_ms: 9_000,
            ..MotionParams::default()
        };
        let config = REFERENCE_UNITS[3].unit_config(&motion);
        assert_eq!(config.calibration_offset, 65);
        assert_eq!(config.calibration_timeout_ms, 9_000);
        assert_eq!(config.glitch_window_ms, 100);
    }
}
