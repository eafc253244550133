//! Split-flap control loop
//!
//! [`SplitFlapSystem`] owns the display, the sensor source, the resume store
//! and the clock. One call to [`SplitFlapSystem::tick`] is one pass of the
//! cooperative loop:
//!
//! 1. If the sensor interrupt raised the edge latch, sample every sensor.
//! 2. Poll the display: calibration pass, pending-letter pass, stall watchdog.
//!    A calibration timeout or a stall persists the in-flight frame and asks
//!    for a restart.
//! 3. Every housekeeping period, once the display is idle, redisplay a frame
//!    recovered from before a restart (subject to the restart policy), then
//!    apply the newest queued request.
//!
//! Fatal outcomes are returned as [`LoopAction`] values; the platform runner
//! decides how to reset or park the board.

use core::fmt::{self, Write};

use heapless::String;
use splitflap_core::display::{pad_to_full_width, DispatchReport, DisplayOrchestrator, Frame};
use splitflap_core::fleet::Fleet;
use splitflap_core::parameters::{MotionParams, ParameterStore, UnitParams};
use splitflap_core::resume::{RestartDecision, RestartPolicy, ResumeRecord};
use splitflap_core::traits::{EdgeLatch, HallSensor, Stepper, TimeSource};
use splitflap_core::unit::Unit;
use splitflap_core::Fault;

use crate::core::ResumeStore;
use crate::platform::FlashInterface;

/// What the runner must do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Keep looping
    Continue,
    /// Frame persisted; reset the board
    Restart,
    /// Restart limit exceeded; stop the drums and stay down
    Halt,
}

/// Result of [`SplitFlapSystem::submit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Dispatched to the units
    Applied(DispatchReport),
    /// Held until a recovered frame has been redisplayed
    Queued,
    /// System is halted; request dropped
    Rejected,
}

/// Split-flap display system
pub struct SplitFlapSystem<S, H, F, T, const N: usize>
where
    S: Stepper,
    H: HallSensor,
    F: FlashInterface,
    T: TimeSource,
{
    display: DisplayOrchestrator<S, N>,
    hall: H,
    store: ResumeStore<F>,
    time: T,
    params: MotionParams,
    policy: RestartPolicy,
    recovered: Option<ResumeRecord>,
    reboot_count: u8,
    queued: Option<Frame>,
    last_housekeeping_ms: u64,
    halted: bool,
}

impl<S, H, F, T, const N: usize> SplitFlapSystem<S, H, F, T, N>
where
    S: Stepper,
    H: HallSensor,
    F: FlashInterface,
    T: TimeSource,
{
    /// Assemble a system from a prepared fleet.
    pub fn new(fleet: Fleet<S, N>, hall: H, store: ResumeStore<F>, time: T, params: MotionParams) -> Self {
        Self {
            display: DisplayOrchestrator::new(fleet, params.stall_timeout_ms),
            hall,
            store,
            time,
            params,
            policy: RestartPolicy::new(params.max_reboots),
            recovered: None,
            reboot_count: 0,
            queued: None,
            last_housekeeping_ms: 0,
            halted: false,
        }
    }

    /// Build units from the parameter store; stepper `i` drives unit `i`.
    pub fn from_params(
        params: &ParameterStore,
        steppers: [S; N],
        hall: H,
        store: ResumeStore<F>,
        time: T,
    ) -> Self {
        let motion = MotionParams::from_store(params);
        let mut id = 0u8;
        let units = steppers.map(|stepper| {
            let config = UnitParams::from_store(params, id).unit_config(&motion);
            let unit = Unit::new(id, stepper, config);
            id += 1;
            unit
        });
        Self::new(Fleet::new(units), hall, store, time, motion)
    }

    /// Recover persisted state and seed the sensor filters.
    ///
    /// Call once before the first tick.
    pub fn boot(&mut self) {
        let stale = match self.store.load() {
            Ok(Some(record)) => {
                crate::log_info!(
                    "Recovered frame [{}], reboots: {}",
                    record.text(),
                    record.reboot_count()
                );
                self.reboot_count = record.reboot_count();
                if !record.text().is_empty() {
                    self.recovered = Some(record);
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                crate::log_warn!("Discarding resume block: {}", describe(&e).as_str());
                true
            }
        };

        if stale {
            if let Err(e) = self.store.clear() {
                crate::log_warn!("Failed to clear resume block: {}", describe(&e).as_str());
            }
        }

        self.display.fleet_mut().prime_sensors(&mut self.hall);
        self.last_housekeeping_ms = self.time.now_ms();
        crate::log_info!("Split-flap display ready, {} units", N);
    }

    /// Accept an external display request.
    ///
    /// The text is padded with the centering rule. It is dispatched at once,
    /// unless a recovered frame still waits for redisplay, in which case it
    /// replaces any previously queued request.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if self.halted {
            crate::log_warn!("Halted, dropping request");
            return SubmitOutcome::Rejected;
        }

        let frame = pad_to_full_width(text, N);
        if self.recovered.is_some() {
            crate::log_info!("Queued [{}] behind recovered frame", frame.as_str());
            self.queued = Some(frame);
            return SubmitOutcome::Queued;
        }
        SubmitOutcome::Applied(self.apply(&frame))
    }

    /// One pass of the control loop.
    pub fn tick(&mut self, edges: &EdgeLatch) -> LoopAction {
        if self.halted {
            return LoopAction::Halt;
        }
        let now_ms = self.time.now_ms();

        if edges.take() {
            let report = self
                .display
                .fleet_mut()
                .service_sensors(&mut self.hall, now_ms);
            for glitch in report.glitches.iter() {
                crate::log_warn!(
                    "Unit {} sensor glitch {} ms after last edge, recalibrating",
                    glitch.unit,
                    glitch.at_ms.saturating_sub(glitch.since_ms)
                );
            }
        }

        match self.display.poll(now_ms) {
            Ok(report) => {
                if report.resumed > 0 {
                    crate::log_debug!("Resumed {} deferred letters", report.resumed);
                }
            }
            Err(fault) => return self.restart(fault),
        }

        if now_ms.saturating_sub(self.last_housekeeping_ms) >= u64::from(self.params.housekeeping_ms) {
            self.last_housekeeping_ms = now_ms;
            return self.housekeeping();
        }
        LoopAction::Continue
    }

    fn housekeeping(&mut self) -> LoopAction {
        if !self.display.is_idle() {
            return LoopAction::Continue;
        }

        if let Some(record) = self.recovered.take() {
            match self.policy.decide(self.reboot_count) {
                RestartDecision::Halt { reboot_count } => {
                    return self.halt(&record, reboot_count);
                }
                RestartDecision::Redisplay { reboot_count } => {
                    crate::log_info!(
                        "Redisplaying [{}], reboots: {}",
                        record.text(),
                        reboot_count
                    );
                    self.reboot_count = reboot_count;
                    self.display.show(record.text());
                    return LoopAction::Continue;
                }
            }
        }

        if let Some(frame) = self.queued.take() {
            self.apply(&frame);
        }
        LoopAction::Continue
    }

    fn apply(&mut self, frame: &str) -> DispatchReport {
        self.reboot_count = 0;
        let report = self.display.show(frame);
        crate::log_info!(
            "Display [{}]: {} moving, {} recalibrating, {} pending",
            self.display.frame(),
            report.moved,
            report.deferred,
            report.pending
        );
        report
    }

    fn restart(&mut self, fault: Fault) -> LoopAction {
        crate::log_error!("{}, restarting", describe(&fault).as_str());

        // A fault before the recovered frame went up still counts against it.
        let pending = match self.recovered.take() {
            Some(record) => match self.policy.decide(self.reboot_count) {
                RestartDecision::Halt { reboot_count } => return self.halt(&record, reboot_count),
                RestartDecision::Redisplay { reboot_count } => {
                    self.reboot_count = reboot_count;
                    ResumeRecord::new(record.text(), reboot_count).map(Some)
                }
            },
            None if self.display.frame().is_empty() => Ok(None),
            None => ResumeRecord::new(self.display.frame(), self.reboot_count).map(Some),
        };

        match pending {
            Ok(Some(record)) => {
                if let Err(e) = self.store.save(&record) {
                    crate::log_error!("Failed to persist frame: {}", describe(&e).as_str());
                }
            }
            Ok(None) => {}
            Err(e) => {
                crate::log_error!("Frame not persistable: {}", describe(&e).as_str());
            }
        }
        LoopAction::Restart
    }

    fn halt(&mut self, record: &ResumeRecord, reboot_count: u8) -> LoopAction {
        crate::log_error!(
            "Halting: {} restarts while showing [{}]",
            reboot_count,
            record.text()
        );
        self.halted = true;
        self.queued = None;
        LoopAction::Halt
    }

    /// Display orchestrator
    pub fn display(&self) -> &DisplayOrchestrator<S, N> {
        &self.display
    }

    /// Display orchestrator, mutably
    pub fn display_mut(&mut self) -> &mut DisplayOrchestrator<S, N> {
        &mut self.display
    }

    /// Sensor source, mutably
    pub fn hall_mut(&mut self) -> &mut H {
        &mut self.hall
    }

    /// Resume store
    pub fn store(&self) -> &ResumeStore<F> {
        &self.store
    }

    /// Resume store, mutably
    pub fn store_mut(&mut self) -> &mut ResumeStore<F> {
        &mut self.store
    }

    /// Clock
    pub fn time(&self) -> &T {
        &self.time
    }

    /// Active motion parameters
    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    /// Redisplays of the current frame since the last external request
    pub fn reboot_count(&self) -> u8 {
        self.reboot_count
    }

    /// Frame recovered at boot and not yet redisplayed
    pub fn recovered(&self) -> Option<&ResumeRecord> {
        self.recovered.as_ref()
    }

    /// Whether the restart limit stopped the system
    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

/// Render a `Display` value for the logging macros.
fn describe<D: fmt::Display>(value: &D) -> String<96> {
    let mut out = String::new();
    // On overflow the line keeps whatever was written before it.
    let _ = write!(out, "{}", value);
    out
}

#[cfg(test)]
mod tests;
