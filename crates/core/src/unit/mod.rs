//! Per-drum calibration and motion state machine
//!
//! A unit believes it knows which flap is showing, but the belief is only as
//! good as open-loop stepping allows. The drum turns forward only. Whenever a
//! requested letter lies behind the believed position the unit re-anchors on
//! its home marker first and only then turns to the letter.
//!
//! # States
//!
//! ```text
//!                 move behind position / glitch
//!   Idle/Running ─────────────────────────────▶ AwaitingCalibration
//!        ▲                                              │ calibrate_start
//!        │ marker found                                 ▼
//!   Calibrating ◀──────── sensor clear ──────── PreInitialising
//!        │                                  (started on the marker)
//!        │ timeout
//!        ▼
//!   CalibrationFailed
//! ```
//!
//! Calibration is polled: [`Unit::calibrate`] is called once per scheduler
//! tick and never blocks.

pub mod hall;
pub mod steps;

pub use hall::{HallFilter, HallUpdate, DEFAULT_GLITCH_WINDOW_MS};
pub use steps::StepAccumulator;

use crate::alphabet::{self, BLANK};
use crate::traits::{HallLevel, Stepper};

/// Default time a unit may search for its marker before giving up (ms).
pub const DEFAULT_CALIBRATION_TIMEOUT_MS: u32 = 12_000;

/// Static per-unit configuration, injected at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConfig {
    /// Motor steps per flap (not an integer on real drums)
    pub steps_per_flap: f32,
    /// Steps from the marker edge to the blank flap
    pub calibration_offset: u16,
    /// Marker search timeout (ms)
    pub calibration_timeout_ms: u32,
    /// Minimum spacing of genuine sensor transitions (ms)
    pub glitch_window_ms: u32,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            steps_per_flap: 2038.0 / 45.0,
            calibration_offset: 87,
            calibration_timeout_ms: DEFAULT_CALIBRATION_TIMEOUT_MS,
            glitch_window_ms: DEFAULT_GLITCH_WINDOW_MS,
        }
    }
}

/// Externally visible unit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Calibrated and stationary
    Idle,
    /// Calibrated and turning towards a letter
    Running,
    /// Needs a marker search that has not started yet
    AwaitingCalibration,
    /// Started on the marker; turning until the sensor clears
    PreInitialising,
    /// Turning until the marker is detected
    Calibrating,
    /// Marker search timed out
    CalibrationFailed,
}

/// Result of [`Unit::move_to_letter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Forward move issued
    Moved {
        /// Flaps to advance
        flaps: u8,
        /// Motor steps commanded
        steps: i32,
    },
    /// Target lies behind the believed position; recalibration requested
    Deferred {
        /// Forward distance that a direct move would have needed
        forward_flaps: u8,
    },
    /// Calibration incomplete; letter stored for resumption
    Pending,
}

/// Result of one [`Unit::calibrate`] poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    /// Still searching
    InProgress,
    /// Anchored (or nothing to do)
    Complete,
    /// Gave up; position reset to 0 and unit marked complete
    Failed {
        /// Time spent searching (ms)
        elapsed_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingCalibration,
    PreInitialising { started_ms: u64 },
    Seeking { started_ms: u64 },
    Calibrated,
    Failed,
}

/// One split-flap drum.
pub struct Unit<S: Stepper> {
    id: u8,
    stepper: S,
    config: UnitConfig,
    phase: Phase,
    position: u8,
    destination: char,
    pending: Option<char>,
    steps: StepAccumulator,
    hall: HallFilter,
}

impl<S: Stepper> Unit<S> {
    /// Create an uncalibrated unit. It will search for its marker on the first fleet tick.
    pub fn new(id: u8, stepper: S, config: UnitConfig) -> Self {
        Self {
            id,
            stepper,
            config,
            phase: Phase::AwaitingCalibration,
            position: 0,
            destination: BLANK,
            pending: None,
            steps: StepAccumulator::new(),
            hall: HallFilter::new(config.glitch_window_ms),
        }
    }

    /// Unit number (left to right, from 0).
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Static configuration.
    pub fn config(&self) -> &UnitConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> UnitState {
        match self.phase {
            Phase::AwaitingCalibration => UnitState::AwaitingCalibration,
            Phase::PreInitialising { .. } => UnitState::PreInitialising,
            Phase::Seeking { .. } => UnitState::Calibrating,
            Phase::Failed => UnitState::CalibrationFailed,
            Phase::Calibrated if self.stepper.is_running() => UnitState::Running,
            Phase::Calibrated => UnitState::Idle,
        }
    }

    /// Believed flap position. Only meaningful once calibrated.
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Letter most recently requested.
    pub fn destination(&self) -> char {
        self.destination
    }

    /// Letter to move to once calibration completes.
    pub fn pending_letter(&self) -> Option<char> {
        self.pending
    }

    /// Whether position is trusted (or the last attempt gave up).
    pub fn is_calibration_complete(&self) -> bool {
        matches!(self.phase, Phase::Calibrated | Phase::Failed)
    }

    /// Whether a marker search is in progress.
    pub fn is_calibration_started(&self) -> bool {
        matches!(
            self.phase,
            Phase::PreInitialising { .. } | Phase::Seeking { .. }
        )
    }

    /// Filtered hall level.
    pub fn hall_level(&self) -> HallLevel {
        self.hall.level()
    }

    /// Whether the drum is turning.
    pub fn is_running(&self) -> bool {
        self.stepper.is_running()
    }

    /// Borrow the stepper driver.
    pub fn stepper(&self) -> &S {
        &self.stepper
    }

    /// Mutably borrow the stepper driver.
    pub fn stepper_mut(&mut self) -> &mut S {
        &mut self.stepper
    }

    /// Turn forward to `letter`, or defer it behind a recalibration.
    ///
    /// Never commands backward motion.
    pub fn move_to_letter(&mut self, letter: char) -> MoveOutcome {
        self.destination = letter;

        if !self.is_calibration_complete() {
            self.pending = resumable(letter);
            return MoveOutcome::Pending;
        }

        let target = alphabet::letter_index(letter);
        let forward = alphabet::forward_flaps(self.position, target);

        if target < self.position {
            self.pending = resumable(letter);
            self.phase = Phase::AwaitingCalibration;
            return MoveOutcome::Deferred {
                forward_flaps: forward,
            };
        }

        self.position = target;
        self.pending = None;
        let steps = self.move_by_flaps(u16::from(forward));
        MoveOutcome::Moved {
            flaps: forward,
            steps,
        }
    }

    /// Jog forward by `flaps` without touching the believed position.
    ///
    /// Returns the number of steps commanded.
    pub fn move_by_flaps(&mut self, flaps: u16) -> i32 {
        let steps = self
            .steps
            .steps_for_flaps(flaps, self.config.steps_per_flap);
        if steps > 0 {
            self.stepper.move_by(steps);
        }
        steps
    }

    /// Begin a marker search.
    ///
    /// If the drum starts on the marker it must first turn off it, otherwise
    /// the edge it stops on is not the leading edge.
    pub fn calibrate_start(&mut self, now_ms: u64) {
        self.phase = if self.hall.level().is_detected() {
            Phase::PreInitialising { started_ms: now_ms }
        } else {
            Phase::Seeking { started_ms: now_ms }
        };
        self.stepper.run_forward();
    }

    /// Advance the marker search by one poll.
    pub fn calibrate(&mut self, now_ms: u64) -> CalibrationStatus {
        let started_ms = match self.phase {
            Phase::Calibrated | Phase::Failed => return CalibrationStatus::Complete,
            Phase::AwaitingCalibration => return CalibrationStatus::InProgress,
            Phase::PreInitialising { started_ms } | Phase::Seeking { started_ms } => started_ms,
        };

        let elapsed_ms = now_ms.saturating_sub(started_ms);
        if elapsed_ms > u64::from(self.config.calibration_timeout_ms) {
            self.stepper.force_stop();
            self.position = 0;
            self.phase = Phase::Failed;
            return CalibrationStatus::Failed { elapsed_ms };
        }

        match (self.phase, self.hall.level()) {
            (Phase::PreInitialising { started_ms }, HallLevel::Clear) => {
                // Off the marker; the next detection is a genuine leading edge.
                self.phase = Phase::Seeking { started_ms };
                CalibrationStatus::InProgress
            }
            (Phase::Seeking { .. }, HallLevel::Detected) => {
                self.anchor();
                CalibrationStatus::Complete
            }
            _ => CalibrationStatus::InProgress,
        }
    }

    /// Issue the deferred move if calibration has completed.
    pub fn resume_pending(&mut self) -> Option<MoveOutcome> {
        if !self.is_calibration_complete() {
            return None;
        }
        let letter = self.pending.take()?;
        Some(self.move_to_letter(letter))
    }

    /// Set the boot sensor level without glitch checking.
    pub fn seed_hall(&mut self, level: HallLevel) {
        self.hall.seed(level);
    }

    /// Feed a raw sensor sample taken at `now_ms`.
    pub fn update_hall(&mut self, raw: HallLevel, now_ms: u64) -> HallUpdate {
        self.hall.update(raw, now_ms)
    }

    /// Recover from an untrusted sensor reading.
    ///
    /// Turns one extra flap and queues a fresh marker search, after which the
    /// current destination is resumed.
    pub fn force_recalibration(&mut self) {
        self.move_by_flaps(1);
        self.phase = Phase::AwaitingCalibration;
        self.pending = resumable(self.destination);
    }

    fn anchor(&mut self) {
        self.stepper.force_stop_and_zero();
        self.stepper
            .move_by(i32::from(self.config.calibration_offset));
        self.position = 0;
        self.steps.reset();
        self.phase = Phase::Calibrated;
    }
}

/// A blank destination needs no resumption: calibration already lands on blank.
fn resumable(letter: char) -> Option<char> {
    if alphabet::letter_index(letter) == 0 {
        None
    } else {
        Some(letter)
    }
}
