//! Time abstraction for calibration timeouts and sensor debouncing.
//!
//! All timing in the motion core is in whole milliseconds: the shortest
//! interval it cares about is the 100 ms glitch window.

#[cfg(target_has_atomic = "64")]
use core::sync::atomic::{AtomicU64, Ordering};

/// Platform-agnostic millisecond clock.
///
/// Implementations:
/// - `EmbassyTime` (firmware crate, `pico2_w`) on target
/// - `SimClock` (sitl crate) for simulated runs
/// - [`MockTime`] for host tests with manual advancement
///
/// # Example
///
/// ```
/// use splitflap_core::traits::{MockTime, TimeSource};
///
/// let time = MockTime::new();
/// let started = time.now_ms();
/// time.advance_ms(250);
/// assert_eq!(time.elapsed_ms_since(started), 250);
/// ```
pub trait TimeSource: Clone + Send + Sync {
    /// Milliseconds since system start.
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `reference_ms`.
    ///
    /// Saturates to 0 when the reference lies in the future.
    fn elapsed_ms_since(&self, reference_ms: u64) -> u64 {
        self.now_ms().saturating_sub(reference_ms)
    }
}

/// Mock clock for testing with controllable time advancement.
///
/// Clones start from the same instant but advance independently.
#[cfg(target_has_atomic = "64")]
#[derive(Debug, Default)]
pub struct MockTime {
    current_ms: AtomicU64,
}

#[cfg(target_has_atomic = "64")]
impl MockTime {
    /// Creates a new `MockTime` starting at time 0.
    pub fn new() -> Self {
        Self::with_initial(0)
    }

    /// Creates a new `MockTime` starting at `ms`.
    pub fn with_initial(ms: u64) -> Self {
        Self {
            current_ms: AtomicU64::new(ms),
        }
    }

    /// Sets the current time to an absolute value.
    pub fn set_ms(&self, ms: u64) {
        self.current_ms.store(ms, Ordering::Relaxed);
    }

    /// Advances the current time by `ms`.
    pub fn advance_ms(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

#[cfg(target_has_atomic = "64")]
impl Clone for MockTime {
    fn clone(&self) -> Self {
        Self::with_initial(self.now_ms())
    }
}

#[cfg(target_has_atomic = "64")]
impl TimeSource for MockTime {
    fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::Relaxed)
    }
}
