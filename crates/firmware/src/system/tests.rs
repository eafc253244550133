use super::*;
use crate::core::RESUME_BLOCK_ADDRESS;
use crate::platform::mock::MockFlash;
use splitflap_core::alphabet::letter_index;
use splitflap_core::parameters::ParamValue;
use splitflap_core::traits::{HallLevel, MockHall, MockStepper, MockTime};
use splitflap_core::unit::{UnitConfig, UnitState};

type TestSystem = SplitFlapSystem<MockStepper, MockHall, MockFlash, MockTime, 4>;

fn system_with(flash: MockFlash) -> TestSystem {
    let fleet = Fleet::from_fn(|id| Unit::new(id, MockStepper::new(), UnitConfig::default()));
    let store = ResumeStore::new(flash, RESUME_BLOCK_ADDRESS).unwrap();
    let mut system = SplitFlapSystem::new(
        fleet,
        MockHall::new(),
        store,
        MockTime::new(),
        MotionParams::default(),
    );
    system.boot();
    system
}

fn flash_holding(text: &str, reboot_count: u8) -> MockFlash {
    let mut flash = MockFlash::new();
    let record = ResumeRecord::new(text, reboot_count).unwrap();
    flash.write(RESUME_BLOCK_ADDRESS, &record.to_bytes()).unwrap();
    flash
}

/// Start every marker search at t=0 and report all markers at t=1000.
fn calibrate(system: &mut TestSystem, edges: &EdgeLatch) {
    assert_eq!(system.tick(edges), LoopAction::Continue);
    system.time().advance_ms(1_000);
    for id in 0..4 {
        system.hall_mut().set(id, HallLevel::Detected);
    }
    edges.raise();
    assert_eq!(system.tick(edges), LoopAction::Continue);
    assert!(system.display().fleet().is_calibrated());
}

fn settle(system: &mut TestSystem) {
    for unit in system.display_mut().fleet_mut().units_mut().iter_mut() {
        unit.stepper_mut().finish();
    }
}

/// Jump to the next housekeeping slot and run one tick.
fn housekeeping(system: &mut TestSystem, edges: &EdgeLatch) -> LoopAction {
    system.time().advance_ms(500);
    system.tick(edges)
}

#[test]
fn test_request_before_calibration_resumes_after_marker() {
    let edges = EdgeLatch::new();
    let mut system = system_with(MockFlash::new());

    let outcome = system.submit("HI");
    assert_eq!(
        outcome,
        SubmitOutcome::Applied(DispatchReport {
            moved: 0,
            deferred: 0,
            pending: 4,
        })
    );
    assert_eq!(system.display().frame(), " HI ");

    calibrate(&mut system, &edges);

    let fleet = system.display().fleet();
    assert_eq!(fleet.unit(0).unwrap().position(), 0);
    assert_eq!(fleet.unit(1).unwrap().position(), letter_index('H'));
    assert_eq!(fleet.unit(2).unwrap().position(), letter_index('I'));
    assert_eq!(fleet.unit(1).unwrap().pending_letter(), None);
}

#[test]
fn test_calibration_timeout_persists_frame() {
    let edges = EdgeLatch::new();
    let mut system = system_with(MockFlash::new());
    system.submit("HELLO");

    assert_eq!(system.tick(&edges), LoopAction::Continue);
    system.time().advance_ms(12_000);
    assert_eq!(system.tick(&edges), LoopAction::Continue);
    system.time().advance_ms(1);
    assert_eq!(system.tick(&edges), LoopAction::Restart);

    let record = system.store_mut().load().unwrap().unwrap();
    assert_eq!(record.text(), "HELL");
    assert_eq!(record.reboot_count(), 0);
}

#[test]
fn test_boot_consumes_resume_block() {
    let mut system = system_with(flash_holding("AB  ", 2));

    assert_eq!(system.recovered().map(ResumeRecord::text), Some("AB  "));
    assert_eq!(system.reboot_count(), 2);
    assert_eq!(system.store().flash().erase_count(RESUME_BLOCK_ADDRESS), 1);
    assert!(system.store_mut().load().unwrap().is_none());
}

#[test]
fn test_boot_discards_corrupt_block() {
    let mut flash = flash_holding("AB  ", 2);
    flash.inject_corruption(RESUME_BLOCK_ADDRESS + 8, 1);
    let mut system = system_with(flash);

    assert!(system.recovered().is_none());
    assert_eq!(system.reboot_count(), 0);
    assert_eq!(system.store().flash().erase_count(RESUME_BLOCK_ADDRESS), 1);
}

#[test]
fn test_recovered_frame_is_redisplayed_once_idle() {
    let edges = EdgeLatch::new();
    let mut system = system_with(flash_holding("AB  ", 2));
    calibrate(&mut system, &edges);

    // Still finishing the offset move: nothing happens yet.
    assert_eq!(housekeeping(&mut system, &edges), LoopAction::Continue);
    assert!(system.recovered().is_some());

    settle(&mut system);
    assert_eq!(housekeeping(&mut system, &edges), LoopAction::Continue);

    assert!(system.recovered().is_none());
    assert_eq!(system.reboot_count(), 3);
    assert_eq!(system.display().frame(), "AB  ");
    let fleet = system.display().fleet();
    assert_eq!(fleet.unit(0).unwrap().position(), letter_index('A'));
    assert_eq!(fleet.unit(1).unwrap().position(), letter_index('B'));
}

#[test]
fn test_restart_limit_halts() {
    let edges = EdgeLatch::new();
    let mut system = system_with(flash_holding("AB  ", 4));
    calibrate(&mut system, &edges);
    settle(&mut system);

    assert_eq!(housekeeping(&mut system, &edges), LoopAction::Halt);
    assert!(system.is_halted());
    assert_eq!(system.tick(&edges), LoopAction::Halt);
    assert_eq!(system.submit("NEW"), SubmitOutcome::Rejected);
    assert!(system.display().frame().is_empty());
}

#[test]
fn test_redisplayed_frame_keeps_counting_across_restarts() {
    let edges = EdgeLatch::new();
    let mut system = system_with(flash_holding("AB  ", 1));
    calibrate(&mut system, &edges);
    settle(&mut system);
    housekeeping(&mut system, &edges);
    assert_eq!(system.reboot_count(), 2);

    for unit in system.display_mut().fleet_mut().units_mut().iter_mut() {
        unit.stepper_mut().set_running(true);
    }
    system.time().advance_ms(20_001);
    assert_eq!(system.tick(&edges), LoopAction::Restart);

    let record = system.store_mut().load().unwrap().unwrap();
    assert_eq!(record.text(), "AB  ");
    assert_eq!(record.reboot_count(), 2);
}

/// Run the marker search with every sensor clear until it times out.
fn time_out_calibration(system: &mut TestSystem, edges: &EdgeLatch) -> LoopAction {
    assert_eq!(system.tick(edges), LoopAction::Continue);
    system.time().advance_ms(12_001);
    system.tick(edges)
}

#[test]
fn test_fault_before_redisplay_counts_against_recovered_frame() {
    let edges = EdgeLatch::new();
    let mut system = system_with(flash_holding("AB  ", 1));

    assert_eq!(time_out_calibration(&mut system, &edges), LoopAction::Restart);
    assert!(system.recovered().is_none());

    let record = system.store_mut().load().unwrap().unwrap();
    assert_eq!(record.text(), "AB  ");
    assert_eq!(record.reboot_count(), 2);
}

#[test]
fn test_fault_before_redisplay_halts_past_limit() {
    let edges = EdgeLatch::new();
    let mut system = system_with(flash_holding("AB  ", 4));

    assert_eq!(time_out_calibration(&mut system, &edges), LoopAction::Halt);
    assert!(system.is_halted());
    assert!(system.store_mut().load().unwrap().is_none());
    assert_eq!(system.tick(&edges), LoopAction::Halt);
}

#[test]
fn test_request_queued_behind_recovered_frame() {
    let edges = EdgeLatch::new();
    let mut system = system_with(flash_holding("OLD ", 1));

    assert_eq!(system.submit("NEW"), SubmitOutcome::Queued);
    calibrate(&mut system, &edges);
    settle(&mut system);

    housekeeping(&mut system, &edges);
    assert_eq!(system.display().frame(), "OLD ");
    assert_eq!(system.reboot_count(), 2);

    settle(&mut system);
    housekeeping(&mut system, &edges);
    assert_eq!(system.display().frame(), "NEW ");
    assert_eq!(system.reboot_count(), 0);
}

#[test]
fn test_stall_persists_frame_and_restarts() {
    let edges = EdgeLatch::new();
    let mut system = system_with(MockFlash::new());
    calibrate(&mut system, &edges);
    settle(&mut system);
    system.time().advance_ms(500);
    assert_eq!(system.tick(&edges), LoopAction::Continue);

    system.submit("HI");
    system.time().advance_ms(20_000);
    assert_eq!(system.tick(&edges), LoopAction::Continue);
    system.time().advance_ms(1);
    assert_eq!(system.tick(&edges), LoopAction::Restart);

    let record = system.store_mut().load().unwrap().unwrap();
    assert_eq!(record.text(), " HI ");
}

#[test]
fn test_glitch_sends_unit_back_to_calibration() {
    let edges = EdgeLatch::new();
    let mut system = system_with(MockFlash::new());
    calibrate(&mut system, &edges);

    system.time().advance_ms(40);
    system.hall_mut().set(2, HallLevel::Clear);
    edges.raise();
    assert_eq!(system.tick(&edges), LoopAction::Continue);

    let fleet = system.display().fleet();
    assert_eq!(fleet.unit(2).unwrap().state(), UnitState::PreInitialising);
    assert!(fleet.unit(0).unwrap().is_calibration_complete());
    assert!(!edges.is_raised());
}

#[test]
fn test_sensors_untouched_without_edge() {
    let edges = EdgeLatch::new();
    let mut system = system_with(MockFlash::new());
    let reads = system.hall_mut().reads();

    system.tick(&edges);
    system.time().advance_ms(1_000);
    system.tick(&edges);

    assert_eq!(system.hall_mut().reads(), reads);
}

#[test]
fn test_from_params_builds_configured_units() {
    let mut params = ParameterStore::new();
    MotionParams::register_defaults(&mut params, 4).unwrap();
    UnitParams::register_defaults(&mut params, 4).unwrap();
    params.set("FLAP_STALL_MS", ParamValue::Int(5_000)).unwrap();
    params.set("U02_CAL_OFS", ParamValue::Int(120)).unwrap();

    let store = ResumeStore::new(MockFlash::new(), RESUME_BLOCK_ADDRESS).unwrap();
    let system: TestSystem = SplitFlapSystem::from_params(
        &params,
        ::core::array::from_fn(|_| MockStepper::new()),
        MockHall::new(),
        store,
        MockTime::new(),
    );

    let fleet = system.display().fleet();
    for (i, unit) in fleet.units().iter().enumerate() {
        assert_eq!(unit.id() as usize, i);
    }
    assert_eq!(fleet.unit(2).unwrap().config().calibration_offset, 120);
    assert_eq!(
        fleet.unit(1).unwrap().config().calibration_offset,
        UnitParams::reference(1).calibration_offset
    );
    assert_eq!(system.display().watchdog().timeout_ms(), 5_000);
    assert_eq!(system.params().units, 4);
}

#[test]
fn test_describe_renders_fault_for_log_lines() {
    let fault = Fault::CalibrationTimeout {
        unit: 3,
        elapsed_ms: 12_001,
    };
    assert_eq!(
        describe(&fault).as_str(),
        "unit 3 calibration timed out after 12001 ms"
    );

    assert_eq!(
        describe(&Fault::Stalled { moving_ms: 20_001 }).as_str(),
        "display moving for 20001 ms without settling"
    );
}
