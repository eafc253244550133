//! Display orchestration
//!
//! Turns a line of text into one target letter per unit and supervises the
//! display as a whole: the fleet tick, the stall watchdog and the busy/idle
//! query.
//!
//! Two entry points exist. [`DisplayOrchestrator::show`] dispatches text as
//! given (left aligned, blank filled). [`DisplayOrchestrator::request`] is for
//! external requests and applies the centering rule of [`pad_to_full_width`]
//! first.

use heapless::String;

use crate::alphabet::{self, BLANK};
use crate::fault::Fault;
use crate::fleet::{Fleet, StallWatchdog, TickReport};
use crate::traits::Stepper;
use crate::unit::MoveOutcome;
use crate::MAX_UNITS;

/// One display line, already normalized onto the drum alphabet.
pub type Frame = String<MAX_UNITS>;

/// Center-biased padding for short requests.
///
/// Prepends one space when `text` is at least two characters shorter than
/// `width`, then fills with spaces and truncates to exactly `width`
/// characters (capped at [`MAX_UNITS`]).
pub fn pad_to_full_width(text: &str, width: usize) -> Frame {
    let width = width.min(MAX_UNITS);
    let len = text.chars().count();

    let lead = if len <= width.saturating_sub(2) {
        Some(BLANK)
    } else {
        None
    };

    let mut out = Frame::new();
    for c in lead
        .into_iter()
        .chain(text.chars())
        .chain(core::iter::repeat(BLANK))
        .take(width)
    {
        // Non-ASCII input is folded to blank later; keep the byte budget fixed.
        let c = if c.is_ascii() { c } else { BLANK };
        let _ = out.push(c);
    }
    out
}

/// How the units took one dispatched frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Units that started turning (or were already on their letter)
    pub moved: usize,
    /// Units that must recalibrate first
    pub deferred: usize,
    /// Units still calibrating; letter stored
    pub pending: usize,
}

/// Display of `N` units.
pub struct DisplayOrchestrator<S: Stepper, const N: usize> {
    fleet: Fleet<S, N>,
    frame: Frame,
    watchdog: StallWatchdog,
}

impl<S: Stepper, const N: usize> DisplayOrchestrator<S, N> {
    /// Wrap `fleet`, reporting a stall after `stall_timeout_ms` of continuous motion.
    pub fn new(fleet: Fleet<S, N>, stall_timeout_ms: u32) -> Self {
        Self {
            fleet,
            frame: Frame::new(),
            watchdog: StallWatchdog::new(stall_timeout_ms),
        }
    }

    /// Apply the centering rule and display `text`.
    pub fn request(&mut self, text: &str) -> DispatchReport {
        let padded = pad_to_full_width(text, N);
        self.show(&padded)
    }

    /// Display `text` left aligned.
    ///
    /// Letters are upper cased, characters not on the drum become blank, the
    /// text is cut to the unit count and the remaining units are blanked.
    pub fn show(&mut self, text: &str) -> DispatchReport {
        let mut letters = text.chars().map(alphabet::normalize);
        let mut report = DispatchReport::default();

        self.frame.clear();
        for unit in self.fleet.units_mut().iter_mut() {
            let letter = letters.next().unwrap_or(BLANK);
            let _ = self.frame.push(letter);
            match unit.move_to_letter(letter) {
                MoveOutcome::Moved { .. } => report.moved += 1,
                MoveOutcome::Deferred { .. } => report.deferred += 1,
                MoveOutcome::Pending => report.pending += 1,
            }
        }
        report
    }

    /// Advance calibration and pending moves, then check for a stall.
    pub fn poll(&mut self, now_ms: u64) -> Result<TickReport, Fault> {
        let report = self.fleet.tick(now_ms)?;
        match self.watchdog.check(self.fleet.is_moving(), now_ms) {
            Some(fault) => Err(fault),
            None => Ok(report),
        }
    }

    /// Whether every drum has stopped.
    pub fn is_idle(&self) -> bool {
        !self.fleet.is_moving()
    }

    /// Frame most recently dispatched.
    pub fn frame(&self) -> &str {
        &self.frame
    }

    /// Stall watchdog state.
    pub fn watchdog(&self) -> &StallWatchdog {
        &self.watchdog
    }

    /// Underlying fleet.
    pub fn fleet(&self) -> &Fleet<S, N> {
        &self.fleet
    }

    /// Underlying fleet, mutably (sensor servicing).
    pub fn fleet_mut(&mut self) -> &mut Fleet<S, N> {
        &mut self.fleet
    }
}
