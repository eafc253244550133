//! Firmware runs on the bench
//!
//! Builds the real [`SplitFlapSystem`] over bench handles and drives its
//! control loop in 1 ms steps, the same period the board runs it at.

use splitflap_core::parameters::{MotionParams, ParameterStore, UnitParams};
use splitflap_firmware::core::{ResumeStore, RESUME_BLOCK_ADDRESS};
use splitflap_firmware::platform::mock::MockFlash;
use splitflap_firmware::system::{LoopAction, SplitFlapSystem};

use crate::bench::{SimBench, SimClock, SimHall, SimStepper};
use crate::error::SimulatorError;

/// Control loop period (ms)
pub const LOOP_PERIOD_MS: u64 = 1;

/// Firmware control loop wired to a bench
pub type SimSystem<const N: usize> = SplitFlapSystem<SimStepper, SimHall, MockFlash, SimClock, N>;

/// Default parameters for `units` drums.
pub fn default_params(units: u8) -> Result<ParameterStore, SimulatorError> {
    let mut params = ParameterStore::new();
    MotionParams::register_defaults(&mut params, units)
        .and_then(|()| UnitParams::register_defaults(&mut params, units))
        .map_err(|e| SimulatorError::Setup(e.to_string()))?;
    Ok(params)
}

impl SimBench {
    /// Boot a control loop with default parameters over `flash`.
    pub fn boot<const N: usize>(&self, flash: MockFlash) -> Result<SimSystem<N>, SimulatorError> {
        let units = u8::try_from(N).map_err(|_| SimulatorError::UnitCountMismatch {
            bench: self.units(),
            system: N,
        })?;
        self.boot_with(&default_params(units)?, flash)
    }

    /// Boot a control loop with `params` over `flash`.
    pub fn boot_with<const N: usize>(
        &self,
        params: &ParameterStore,
        flash: MockFlash,
    ) -> Result<SimSystem<N>, SimulatorError> {
        let store = ResumeStore::new(flash, RESUME_BLOCK_ADDRESS)
            .map_err(|e| SimulatorError::Setup(e.to_string()))?;
        let mut system =
            SplitFlapSystem::from_params(params, self.steppers()?, self.hall(), store, self.clock());
        system.boot();
        Ok(system)
    }

    /// Run the control loop for `duration_ms`.
    ///
    /// Stops early and returns the action when the loop asks for a restart
    /// or halts.
    pub fn run<const N: usize>(&mut self, system: &mut SimSystem<N>, duration_ms: u64) -> LoopAction {
        for _ in 0..duration_ms / LOOP_PERIOD_MS {
            self.advance_ms(LOOP_PERIOD_MS);
            let action = system.tick(self.edges());
            if action != LoopAction::Continue {
                return action;
            }
        }
        LoopAction::Continue
    }

    /// Run until `done` holds, returning the elapsed milliseconds.
    pub fn run_until<const N: usize>(
        &mut self,
        system: &mut SimSystem<N>,
        timeout_ms: u64,
        mut done: impl FnMut(&SimSystem<N>, &SimBench) -> bool,
    ) -> Result<u64, SimulatorError> {
        let mut elapsed_ms = 0;
        while !done(system, self) {
            if elapsed_ms >= timeout_ms {
                return Err(SimulatorError::Timeout("bench condition"));
            }
            match self.run(system, LOOP_PERIOD_MS) {
                LoopAction::Continue => elapsed_ms += LOOP_PERIOD_MS,
                action => return Err(SimulatorError::LoopStopped(action)),
            }
        }
        Ok(elapsed_ms)
    }

    /// Run until every drum has stopped and the display shows `text`.
    pub fn run_until_showing<const N: usize>(
        &mut self,
        system: &mut SimSystem<N>,
        text: &str,
        timeout_ms: u64,
    ) -> Result<u64, SimulatorError> {
        self.run_until(system, timeout_ms, |system, bench| {
            system.display().is_idle() && bench.displayed_text() == text
        })
    }

    /// Run until the loop stops with a restart or halt.
    pub fn run_until_stopped<const N: usize>(
        &mut self,
        system: &mut SimSystem<N>,
        timeout_ms: u64,
    ) -> Result<LoopAction, SimulatorError> {
        match self.run(system, timeout_ms) {
            LoopAction::Continue => Err(SimulatorError::Timeout("loop to stop")),
            action => Ok(action),
        }
    }
}

/// Resume flash left behind by a stopped system, as the next boot sees it.
pub fn surviving_flash<const N: usize>(system: &SimSystem<N>) -> MockFlash {
    system.store().flash().clone()
}
