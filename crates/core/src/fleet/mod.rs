//! Fleet coordination
//!
//! The fleet owns every unit for the lifetime of the display and advances
//! them once per scheduler tick in two passes:
//!
//! 1. **Calibration**: start or poll the marker search of every unit that is
//!    not anchored. A timeout escalates as [`Fault::CalibrationTimeout`].
//! 2. **Resumption**: issue the deferred letter of every unit whose
//!    calibration has completed.
//!
//! Running the passes in this order guarantees that a unit never starts a
//! position-trusting move on a stale position.
//!
//! Sensor samples are fed separately through [`Fleet::service_sensors`], only
//! after the interrupt side has raised an [`EdgeLatch`](crate::traits::EdgeLatch).

mod watchdog;

pub use watchdog::{StallWatchdog, DEFAULT_STALL_TIMEOUT_MS};

use heapless::Vec;

use crate::fault::Fault;
use crate::traits::{HallSensor, Stepper};
use crate::unit::{CalibrationStatus, HallUpdate, Unit};
use crate::MAX_UNITS;

/// A rejected sensor transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glitch {
    /// Unit whose sensor glitched
    pub unit: u8,
    /// Timestamp of the last accepted transition (ms)
    pub since_ms: u64,
    /// Timestamp of the rejected sample (ms)
    pub at_ms: u64,
}

/// Outcome of one sensor service pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorReport {
    /// Number of accepted transitions
    pub accepted: usize,
    /// Units forced back into recalibration
    pub glitches: Vec<Glitch, MAX_UNITS>,
}

/// Outcome of one fleet tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Units still searching for their marker after this tick
    pub calibrating: usize,
    /// Deferred letters issued this tick
    pub resumed: usize,
}

/// Fixed set of `N` units.
pub struct Fleet<S: Stepper, const N: usize> {
    units: [Unit<S>; N],
}

impl<S: Stepper, const N: usize> Fleet<S, N> {
    /// Take ownership of `units`. Unit `i` must carry id `i`.
    pub fn new(units: [Unit<S>; N]) -> Self {
        const { assert!(N <= MAX_UNITS, "fleet larger than MAX_UNITS") };
        Self { units }
    }

    /// Build the fleet by calling `make` with each unit id in order.
    pub fn from_fn(mut make: impl FnMut(u8) -> Unit<S>) -> Self {
        Self::new(core::array::from_fn(|i| make(i as u8)))
    }

    /// Number of units.
    pub const fn len(&self) -> usize {
        N
    }

    /// Whether the fleet has no units.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// All units, left to right.
    pub fn units(&self) -> &[Unit<S>; N] {
        &self.units
    }

    /// All units, mutably.
    pub fn units_mut(&mut self) -> &mut [Unit<S>; N] {
        &mut self.units
    }

    /// Unit `id`, if present.
    pub fn unit(&self, id: u8) -> Option<&Unit<S>> {
        self.units.get(id as usize)
    }

    /// Mutable unit `id`, if present.
    pub fn unit_mut(&mut self, id: u8) -> Option<&mut Unit<S>> {
        self.units.get_mut(id as usize)
    }

    /// Whether any drum is turning.
    pub fn is_moving(&self) -> bool {
        self.units.iter().any(|unit| unit.is_running())
    }

    /// Whether every unit has finished calibrating.
    pub fn is_calibrated(&self) -> bool {
        self.units.iter().all(|unit| unit.is_calibration_complete())
    }

    /// Seed every glitch filter with the boot-time sensor level.
    pub fn prime_sensors<H: HallSensor>(&mut self, hall: &mut H) {
        hall.refresh();
        for unit in self.units.iter_mut() {
            let level = hall.read(unit.id());
            unit.seed_hall(level);
        }
    }

    /// Sample every sensor once and feed the filters.
    ///
    /// Call only after an edge notification. A unit whose sample is rejected
    /// as a glitch no longer trusts its position and is sent back into
    /// recalibration.
    pub fn service_sensors<H: HallSensor>(&mut self, hall: &mut H, now_ms: u64) -> SensorReport {
        let mut report = SensorReport::default();
        hall.refresh();
        for unit in self.units.iter_mut() {
            let raw = hall.read(unit.id());
            match unit.update_hall(raw, now_ms) {
                HallUpdate::Unchanged => {}
                HallUpdate::Accepted(_) => report.accepted += 1,
                HallUpdate::Glitch { since_ms } => {
                    unit.force_recalibration();
                    let _ = report.glitches.push(Glitch {
                        unit: unit.id(),
                        since_ms,
                        at_ms: now_ms,
                    });
                }
            }
        }
        report
    }

    /// First pass: start or poll every pending marker search.
    ///
    /// Returns the number of units still searching.
    pub fn service_calibration(&mut self, now_ms: u64) -> Result<usize, Fault> {
        let mut searching = 0;
        for unit in self.units.iter_mut() {
            if unit.is_calibration_complete() {
                continue;
            }
            if !unit.is_calibration_started() {
                unit.calibrate_start(now_ms);
                searching += 1;
                continue;
            }
            match unit.calibrate(now_ms) {
                CalibrationStatus::InProgress => searching += 1,
                CalibrationStatus::Complete => {}
                CalibrationStatus::Failed { elapsed_ms } => {
                    return Err(Fault::CalibrationTimeout {
                        unit: unit.id(),
                        elapsed_ms,
                    });
                }
            }
        }
        Ok(searching)
    }

    /// Second pass: issue deferred letters on calibrated units.
    ///
    /// Returns the number of letters issued.
    pub fn resume_pending(&mut self) -> usize {
        self.units
            .iter_mut()
            .filter_map(|unit| unit.resume_pending())
            .count()
    }

    /// Run both passes in order.
    pub fn tick(&mut self, now_ms: u64) -> Result<TickReport, Fault> {
        let calibrating = self.service_calibration(now_ms)?;
        let resumed = self.resume_pending();
        Ok(TickReport {
            calibrating,
            resumed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{HallLevel, MockHall, MockStepper, StepperCommand};
    use crate::unit::{MoveOutcome, UnitConfig, UnitState};

    fn fleet<const N: usize>() -> Fleet<MockStepper, N> {
        Fleet::from_fn(|id| Unit::new(id, MockStepper::new(), UnitConfig::default()))
    }

    /// Start every search at t=0 and report every marker at t=1000.
    fn calibrate_all<const N: usize>(fleet: &mut Fleet<MockStepper, N>, hall: &mut MockHall) {
        fleet.tick(0).unwrap();
        for id in 0..N as u8 {
            hall.set(id, HallLevel::Detected);
        }
        fleet.service_sensors(hall, 1_000);
        assert_eq!(fleet.tick(1_000).unwrap().calibrating, 0);
        for unit in fleet.units.iter_mut() {
            unit.stepper_mut().finish();
            unit.stepper_mut().clear_commands();
        }
    }

    #[test]
    fn test_units_carry_their_index() {
        let fleet = fleet::<4>();
        for (i, unit) in fleet.units().iter().enumerate() {
            assert_eq!(unit.id() as usize, i);
        }
        assert_eq!(fleet.len(), 4);
        assert!(fleet.unit(4).is_none());
    }

    #[test]
    fn test_first_tick_starts_every_search() {
        let mut fleet = fleet::<3>();
        let report = fleet.tick(0).unwrap();

        assert_eq!(report.calibrating, 3);
        assert!(fleet.is_moving());
        for unit in fleet.units() {
            assert_eq!(unit.state(), UnitState::Calibrating);
            assert_eq!(unit.stepper().commands(), &[StepperCommand::RunForward]);
        }
    }

    #[test]
    fn test_marker_completes_one_unit() {
        let mut fleet = fleet::<3>();
        let mut hall = MockHall::new();
        fleet.tick(0).unwrap();

        hall.set(1, HallLevel::Detected);
        let report = fleet.service_sensors(&mut hall, 3_000);
        assert_eq!(report.accepted, 1);
        assert!(report.glitches.is_empty());

        assert_eq!(fleet.tick(3_000).unwrap().calibrating, 2);
        assert!(fleet.unit(1).unwrap().is_calibration_complete());
        assert!(!fleet.is_calibrated());
    }

    #[test]
    fn test_calibration_timeout_escalates() {
        let mut fleet = fleet::<2>();
        fleet.tick(0).unwrap();
        assert!(fleet.tick(12_000).is_ok());

        assert_eq!(
            fleet.tick(12_001),
            Err(Fault::CalibrationTimeout {
                unit: 0,
                elapsed_ms: 12_001
            })
        );
    }

    #[test]
    fn test_pending_resumes_in_same_tick_as_calibration() {
        let mut fleet = fleet::<2>();
        let mut hall = MockHall::new();

        assert_eq!(fleet.unit_mut(0).unwrap().move_to_letter('D'), MoveOutcome::Pending);
        fleet.tick(0).unwrap();

        hall.set(0, HallLevel::Detected);
        fleet.service_sensors(&mut hall, 2_000);
        let report = fleet.tick(2_000).unwrap();

        assert_eq!(report.resumed, 1);
        let unit = fleet.unit(0).unwrap();
        assert_eq!(unit.position(), 4);
        assert_eq!(unit.pending_letter(), None);
        assert_eq!(
            unit.stepper().commands(),
            &[
                StepperCommand::RunForward,
                StepperCommand::ForceStopAndZero,
                StepperCommand::Move(87),
                StepperCommand::Move(181),
            ]
        );
    }

    #[test]
    fn test_backward_letter_recalibrates_then_resumes() {
        let mut fleet = fleet::<1>();
        let mut hall = MockHall::new();
        calibrate_all(&mut fleet, &mut hall);

        fleet.unit_mut(0).unwrap().move_to_letter('Y');
        fleet.unit_mut(0).unwrap().move_to_letter('B');
        assert_eq!(fleet.tick(1_500).unwrap().calibrating, 1);

        hall.set(0, HallLevel::Clear);
        fleet.service_sensors(&mut hall, 1_600);
        assert_eq!(fleet.tick(1_600).unwrap().calibrating, 1);
        assert_eq!(fleet.unit(0).unwrap().state(), UnitState::Calibrating);
        hall.set(0, HallLevel::Detected);
        fleet.service_sensors(&mut hall, 4_000);

        let report = fleet.tick(4_000).unwrap();
        assert_eq!(report.resumed, 1);
        assert_eq!(fleet.unit(0).unwrap().position(), 2);
    }

    #[test]
    fn test_glitch_forces_recalibration() {
        let mut fleet = fleet::<2>();
        let mut hall = MockHall::new();
        calibrate_all(&mut fleet, &mut hall);
        fleet.unit_mut(1).unwrap().move_to_letter('K');

        hall.set(1, HallLevel::Clear);
        assert_eq!(fleet.service_sensors(&mut hall, 1_040).glitches.len(), 1);

        let unit = fleet.unit(1).unwrap();
        assert_eq!(unit.state(), UnitState::AwaitingCalibration);
        assert_eq!(unit.pending_letter(), Some('K'));
        assert_eq!(unit.hall_level(), HallLevel::Detected);
        assert!(fleet.unit(0).unwrap().is_calibration_complete());
    }

    #[test]
    fn test_full_size_fleet_reports_every_glitch() {
        let mut fleet = fleet::<MAX_UNITS>();
        let mut hall = MockHall::new();
        calibrate_all(&mut fleet, &mut hall);

        for id in 0..MAX_UNITS as u8 {
            hall.set(id, HallLevel::Clear);
        }
        let report = fleet.service_sensors(&mut hall, 1_040);
        assert_eq!(report.glitches.len(), MAX_UNITS);
        assert!(fleet.units().iter().all(|unit| !unit.is_calibration_complete()));
    }

    #[test]
    fn test_prime_sensors_reads_every_unit() {
        let mut fleet = fleet::<5>();
        let mut hall = MockHall::new();
        hall.set(2, HallLevel::Detected);

        fleet.prime_sensors(&mut hall);

        assert_eq!(hall.reads(), 5);
        assert_eq!(fleet.unit(2).unwrap().hall_level(), HallLevel::Detected);
        fleet.tick(0).unwrap();
        assert_eq!(fleet.unit(2).unwrap().state(), UnitState::PreInitialising);
        assert_eq!(fleet.unit(3).unwrap().state(), UnitState::Calibrating);
    }
}
