//! Embassy-backed clock
//!
//! Millisecond time for the control loop, read from the Embassy time driver.

use splitflap_core::traits::TimeSource;

/// [`TimeSource`] reading `embassy_time::Instant`
///
/// # Example
///
/// ```ignore
/// use splitflap_firmware::platform::EmbassyTime;
/// use splitflap_core::traits::TimeSource;
///
/// let uptime = EmbassyTime.now_ms();
/// ```
#[derive(Clone, Copy, Default)]
pub struct EmbassyTime;

impl TimeSource for EmbassyTime {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}
