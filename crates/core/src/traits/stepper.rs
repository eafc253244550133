//! Stepper motion primitive
//!
//! The motion core never drives step pulses itself. It hands relative moves
//! to a non-blocking driver and polls whether the shaft is still turning.
//!
//! # Design
//!
//! Every call must return immediately. The control loop services all units
//! every tick, so a driver that blocks until a move finishes would stall
//! calibration on every other drum.

use heapless::Vec;

/// Non-blocking stepper driver for one drum.
///
/// Positions are in motor steps. Only forward rotation is ever commanded by
/// the core, but the move primitive takes a signed count to match common
/// driver APIs.
pub trait Stepper {
    /// Queue a relative move of `steps` from the current target.
    fn move_by(&mut self, steps: i32);

    /// Rotate forward continuously until stopped.
    fn run_forward(&mut self);

    /// Whether the shaft is still turning.
    fn is_running(&self) -> bool;

    /// Stop immediately, discarding any queued motion.
    fn force_stop(&mut self);

    /// Stop immediately and declare the current shaft position as step 0.
    fn force_stop_and_zero(&mut self);
}

/// Command recorded by [`MockStepper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperCommand {
    /// Relative move
    Move(i32),
    /// Continuous forward rotation
    RunForward,
    /// Immediate stop
    ForceStop,
    /// Immediate stop with position reset
    ForceStopAndZero,
}

/// Maximum number of commands a [`MockStepper`] remembers.
pub const MOCK_HISTORY: usize = 64;

/// Mock stepper for host tests.
///
/// Records every command and tracks a running flag that tests clear with
/// [`finish`](MockStepper::finish) to model a completed move.
#[derive(Debug, Clone, Default)]
pub struct MockStepper {
    commands: Vec<StepperCommand, MOCK_HISTORY>,
    running: bool,
    position: i64,
}

impl MockStepper {
    /// Create an idle mock stepper at position 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far, oldest first.
    pub fn commands(&self) -> &[StepperCommand] {
        &self.commands
    }

    /// Most recent command, if any.
    pub fn last_command(&self) -> Option<StepperCommand> {
        self.commands.last().copied()
    }

    /// Sum of all relative moves since the last zeroing.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Forget recorded commands (position is kept).
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Model the end of the current move.
    pub fn finish(&mut self) {
        self.running = false;
    }

    /// Force the running flag, e.g. to model a jammed drum.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    fn record(&mut self, command: StepperCommand) {
        // History is diagnostic only; drop once full.
        let _ = self.commands.push(command);
    }
}

impl Stepper for MockStepper {
    fn move_by(&mut self, steps: i32) {
        self.record(StepperCommand::Move(steps));
        self.position += i64::from(steps);
        if steps != 0 {
            self.running = true;
        }
    }

    fn run_forward(&mut self) {
        self.record(StepperCommand::RunForward);
        self.running = true;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn force_stop(&mut self) {
        self.record(StepperCommand::ForceStop);
        self.running = false;
    }

    fn force_stop_and_zero(&mut self) {
        self.record(StepperCommand::ForceStopAndZero);
        self.running = false;
        self.position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_stepper_records_moves() {
        let mut stepper = MockStepper::new();
        stepper.move_by(45);
        stepper.move_by(3);

        assert!(stepper.is_running());
        assert_eq!(stepper.position(), 48);
        assert_eq!(
            stepper.commands(),
            &[StepperCommand::Move(45), StepperCommand::Move(3)]
        );
    }

    #[test]
    fn test_mock_stepper_zero_move_does_not_start() {
        let mut stepper = MockStepper::new();
        stepper.move_by(0);
        assert!(!stepper.is_running());
    }

    #[test]
    fn test_mock_stepper_stop_and_zero() {
        let mut stepper = MockStepper::new();
        stepper.run_forward();
        stepper.move_by(100);
        stepper.force_stop_and_zero();

        assert!(!stepper.is_running());
        assert_eq!(stepper.position(), 0);
        assert_eq!(
            stepper.last_command(),
            Some(StepperCommand::ForceStopAndZero)
        );
    }
}
