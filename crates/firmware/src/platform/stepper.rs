//! Lock-free stepper command channel
//!
//! Units live inside the control loop, while step pulses are produced by a
//! separate timer-driven task that owns the pins. A [`StepperChannel`] sits
//! between them: the unit side ([`ChannelStepper`]) queues work through
//! atomics and the pulse side calls [`StepperChannel::take_step`] once per
//! pulse period. Neither side ever blocks.
//!
//! The drive has no direction line, so negative moves are dropped.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use splitflap_core::traits::Stepper;

/// Shared state of one drum's stepper
#[derive(Debug, Default)]
pub struct StepperChannel {
    remaining: AtomicU32,
    continuous: AtomicBool,
    position: AtomicI32,
}

impl StepperChannel {
    /// Create an idle channel. Usable in `static` context.
    pub const fn new() -> Self {
        Self {
            remaining: AtomicU32::new(0),
            continuous: AtomicBool::new(false),
            position: AtomicI32::new(0),
        }
    }

    /// Unit-side handle
    pub fn handle(&self) -> ChannelStepper<'_> {
        ChannelStepper { channel: self }
    }

    /// Claim one step for the pulse generator.
    ///
    /// Returns `true` when a pulse should be emitted now.
    pub fn take_step(&self) -> bool {
        let step = self.continuous.load(Ordering::Acquire)
            || self
                .remaining
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .is_ok();
        if step {
            self.position.fetch_add(1, Ordering::Relaxed);
        }
        step
    }

    /// Whether steps are queued or continuous rotation is active
    pub fn is_running(&self) -> bool {
        self.continuous.load(Ordering::Acquire) || self.remaining.load(Ordering::Acquire) > 0
    }

    /// Steps emitted since the last zeroing
    pub fn position(&self) -> i32 {
        self.position.load(Ordering::Relaxed)
    }

    fn stop(&self) {
        self.continuous.store(false, Ordering::Release);
        self.remaining.store(0, Ordering::Release);
    }
}

/// [`Stepper`] implementation over a [`StepperChannel`]
#[derive(Debug, Clone, Copy)]
pub struct ChannelStepper<'a> {
    channel: &'a StepperChannel,
}

impl Stepper for ChannelStepper<'_> {
    fn move_by(&mut self, steps: i32) {
        if let Ok(steps) = u32::try_from(steps) {
            self.channel.remaining.fetch_add(steps, Ordering::AcqRel);
        }
    }

    fn run_forward(&mut self) {
        self.channel.continuous.store(true, Ordering::Release);
    }

    fn is_running(&self) -> bool {
        self.channel.is_running()
    }

    fn force_stop(&mut self) {
        self.channel.stop();
    }

    fn force_stop_and_zero(&mut self) {
        self.channel.stop();
        self.channel.position.store(0, Ordering::Relaxed);
    }
}
