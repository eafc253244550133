//! Step pulse generator
//!
//! Every tick each drum with queued work gets one pulse on its STEP pin.
//! The tick period sets the rotation speed.

use embassy_rp::gpio::Output;
use embassy_time::{Duration, Ticker, Timer};

use super::STEPPERS;

/// STEP pins wired on the controller board
pub const STEP_PINS: usize = 12;

/// Time between steps (us)
pub const STEP_INTERVAL_US: u64 = 2_000;

/// STEP high time (us)
const STEP_PULSE_US: u64 = 5;

/// Drive the STEP pins from [`STEPPERS`].
///
/// Pins beyond the unit count are held low.
#[embassy_executor::task]
pub async fn step_pulse_task(mut pins: [Output<'static>; STEP_PINS]) {
    crate::log_info!("Step pulse task started, {} us/step", STEP_INTERVAL_US);
    let mut ticker = Ticker::every(Duration::from_micros(STEP_INTERVAL_US));

    loop {
        let mut pulsed = false;
        for (channel, pin) in STEPPERS.iter().zip(pins.iter_mut()) {
            if channel.take_step() {
                pin.set_high();
                pulsed = true;
            }
        }

        if pulsed {
            Timer::after(Duration::from_micros(STEP_PULSE_US)).await;
            for pin in pins.iter_mut() {
                pin.set_low();
            }
        }

        ticker.next().await;
    }
}
