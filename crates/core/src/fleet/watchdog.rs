//! Stall watchdog
//!
//! A drum that keeps turning far longer than any legitimate move means the
//! driver or the belief about it is broken. The watchdog measures time since
//! the fleet was last observed fully idle and reports a stall once per
//! continuous motion window.

use crate::fault::Fault;

/// Default continuous motion allowed before a stall is reported (ms).
pub const DEFAULT_STALL_TIMEOUT_MS: u32 = 20_000;

/// Continuous-motion watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallWatchdog {
    timeout_ms: u32,
    idle_at_ms: Option<u64>,
    tripped: bool,
}

impl StallWatchdog {
    /// Create a watchdog with the given timeout.
    pub const fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms,
            idle_at_ms: None,
            tripped: false,
        }
    }

    /// Feed one observation.
    ///
    /// Returns a fault the first time motion has lasted longer than the
    /// timeout. Later observations in the same window return `None` until the
    /// fleet is seen idle again.
    pub fn check(&mut self, moving: bool, now_ms: u64) -> Option<Fault> {
        if !moving {
            self.idle_at_ms = Some(now_ms);
            self.tripped = false;
            return None;
        }

        let idle_at_ms = *self.idle_at_ms.get_or_insert(now_ms);
        let moving_ms = now_ms.saturating_sub(idle_at_ms);
        if self.tripped || moving_ms <= u64::from(self.timeout_ms) {
            return None;
        }

        self.tripped = true;
        Some(Fault::Stalled { moving_ms })
    }

    /// Motion time in the current window (0 when idle or never observed).
    pub fn moving_ms(&self, now_ms: u64) -> u64 {
        self.idle_at_ms
            .map_or(0, |idle_at_ms| now_ms.saturating_sub(idle_at_ms))
    }

    /// Whether a stall has been reported in the current window.
    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// Configured timeout (ms).
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

impl Default for StallWatchdog {
    fn default() -> Self {
        Self::new(DEFAULT_STALL_TIMEOUT_MS)
    }
}
