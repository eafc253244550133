//! Drum model
//!
//! A drum is a shaft position in motor steps, a magnetic marker covering a
//! fixed arc of the shaft, and the stepper command currently being executed.

use splitflap_core::alphabet::{self, FLAP_COUNT};
use splitflap_core::parameters::UnitParams;
use splitflap_core::traits::HallLevel;

use crate::error::SimulatorError;

/// Physical description of one drum.
#[derive(Debug, Clone)]
pub struct DrumConfig {
    /// Motor steps per full drum revolution.
    pub steps_per_rev: u32,
    /// Shaft step at which the marker reaches the sensor.
    pub marker_start: u32,
    /// Shaft steps during which the sensor reads detected.
    pub marker_width: u32,
    /// Time between steps in microseconds.
    pub step_interval_us: u64,
    /// Steps from the marker edge to the blank flap.
    pub calibration_offset: u16,
}

impl Default for DrumConfig {
    fn default() -> Self {
        Self {
            steps_per_rev: 2038,
            marker_start: 500,
            marker_width: 80,
            step_interval_us: 2_000,
            calibration_offset: 87,
        }
    }
}

impl DrumConfig {
    /// Drum matching the reference parameters of `unit`.
    pub fn for_unit(unit: u8) -> Self {
        let params = UnitParams::reference(unit);
        Self {
            steps_per_rev: (params.steps_per_flap * f32::from(FLAP_COUNT)).round() as u32,
            calibration_offset: params.calibration_offset,
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SimulatorError> {
        if self.steps_per_rev == 0 || self.step_interval_us == 0 {
            return Err(SimulatorError::InvalidConfig(
                "steps_per_rev and step_interval_us must be non-zero".into(),
            ));
        }
        if self.marker_width == 0 || self.marker_width >= self.steps_per_rev {
            return Err(SimulatorError::InvalidConfig(format!(
                "marker width {} outside 1..{}",
                self.marker_width, self.steps_per_rev
            )));
        }
        Ok(())
    }
}

/// Simulated drum state.
#[derive(Debug, Clone)]
pub(crate) struct Drum {
    pub config: DrumConfig,
    /// Shaft position, `0..steps_per_rev`.
    pub shaft: u32,
    /// Steps left in the current relative move.
    pub remaining: u32,
    /// Continuous forward rotation requested.
    pub continuous: bool,
    /// Motor runs but the drum does not turn.
    pub jammed: bool,
    /// Driver reports busy forever.
    pub hung: bool,
    /// Sensor output inverted until this time.
    pub glitch_until_us: Option<u64>,
    /// Shaft steps actually turned.
    pub steps_turned: u64,
}

impl Drum {
    pub fn new(config: DrumConfig) -> Self {
        Self {
            config,
            shaft: 0,
            remaining: 0,
            continuous: false,
            jammed: false,
            hung: false,
            glitch_until_us: None,
            steps_turned: 0,
        }
    }

    /// Whether the stepper driver reports activity.
    pub fn is_running(&self) -> bool {
        self.hung || self.continuous || self.remaining > 0
    }

    /// Whether the driver has a step to emit.
    pub fn has_work(&self) -> bool {
        self.continuous || self.remaining > 0
    }

    /// Emit one step.
    pub fn step(&mut self) {
        if !self.continuous {
            self.remaining = self.remaining.saturating_sub(1);
        }
        if !self.jammed {
            self.shaft = (self.shaft + 1) % self.config.steps_per_rev;
            self.steps_turned += 1;
        }
    }

    pub fn stop(&mut self) {
        self.remaining = 0;
        self.continuous = false;
    }

    /// True sensor level from the marker geometry.
    pub fn marker_level(&self) -> HallLevel {
        let into_marker = (self.shaft + self.config.steps_per_rev - self.config.marker_start)
            % self.config.steps_per_rev;
        if into_marker < self.config.marker_width {
            HallLevel::Detected
        } else {
            HallLevel::Clear
        }
    }

    /// Level seen by the firmware, including an injected glitch.
    pub fn reported_level(&self) -> HallLevel {
        match (self.glitch_until_us, self.marker_level()) {
            (None, level) => level,
            (Some(_), HallLevel::Detected) => HallLevel::Clear,
            (Some(_), HallLevel::Clear) => HallLevel::Detected,
        }
    }

    /// Flap currently facing the viewer.
    pub fn flap(&self) -> u8 {
        let rev = u64::from(self.config.steps_per_rev);
        let blank = (u64::from(self.config.marker_start) + u64::from(self.config.calibration_offset)) % rev;
        let from_blank = (u64::from(self.shaft) + rev - blank) % rev;
        let flaps = u64::from(FLAP_COUNT);
        ((from_blank * flaps + rev / 2) / rev % flaps) as u8
    }

    pub fn letter(&self) -> char {
        alphabet::letter_at(self.flap()).unwrap_or(alphabet::BLANK)
    }
}
