//! Control loop task
//!
//! Runs [`SplitFlapSystem::tick`] every millisecond and feeds it the external
//! requests queued in [`DISPLAY_REQUESTS`]. A `Restart` resets the chip once
//! the frame is in flash; a `Halt` stops every drum and parks the task.

use embassy_rp::peripherals::I2C0;
use embassy_time::{Duration, Ticker, Timer};
use splitflap_core::traits::Stepper;

use super::{DISPLAY_REQUESTS, EDGE_LATCH, UNITS};
use crate::platform::rp2350::{Mcp23017Ports, Rp2350Flash};
use crate::platform::{ChannelStepper, EmbassyTime, ExpanderHall};
use crate::system::{LoopAction, SplitFlapSystem};

/// Control loop period (ms)
const CONTROL_PERIOD_MS: u64 = 1;

/// Time for the log transport to drain before a reset (ms)
const RESET_GRACE_MS: u64 = 100;

/// The system as wired on the controller board
pub type BoardSystem = SplitFlapSystem<
    ChannelStepper<'static>,
    ExpanderHall<Mcp23017Ports<'static, I2C0>, UNITS>,
    Rp2350Flash<'static>,
    EmbassyTime,
    UNITS,
>;

/// Control loop task
///
/// Boots `system` and then ticks it until a restart or halt.
#[embassy_executor::task]
pub async fn control_task(mut system: BoardSystem) {
    system.boot();
    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_PERIOD_MS));

    loop {
        while let Ok(frame) = DISPLAY_REQUESTS.try_receive() {
            system.submit(&frame);
        }

        match system.tick(&EDGE_LATCH) {
            LoopAction::Continue => {}
            LoopAction::Restart => {
                stop_all(&mut system);
                Timer::after(Duration::from_millis(RESET_GRACE_MS)).await;
                cortex_m::peripheral::SCB::sys_reset();
            }
            LoopAction::Halt => {
                stop_all(&mut system);
                crate::log_error!("Display halted, power cycle to recover");
                loop {
                    Timer::after(Duration::from_secs(3600)).await;
                }
            }
        }

        ticker.next().await;
    }
}

fn stop_all(system: &mut BoardSystem) {
    for unit in system.display_mut().fleet_mut().units_mut().iter_mut() {
        unit.stepper_mut().force_stop();
    }
}
