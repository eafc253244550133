//! Embassy tasks for the RP2350
//!
//! ## Available Tasks
//!
//! - `sensor_edge_task` - raises the edge latch on every expander interrupt
//! - `step_pulse_task` - emits step pulses for every queued stepper channel
//! - `control_task` - runs the split-flap control loop every millisecond
//!
//! Tasks share state only through the statics below.

pub mod control;
pub mod pulse;
pub mod sensor;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use splitflap_core::display::Frame;
use splitflap_core::traits::EdgeLatch;

use super::UNITS;
use crate::platform::StepperChannel;

pub use control::{control_task, BoardSystem};
pub use pulse::{step_pulse_task, STEP_PINS};
pub use sensor::sensor_edge_task;

/// Raised by the sensor interrupt, taken by the control loop
pub static EDGE_LATCH: EdgeLatch = EdgeLatch::new();

/// One command channel per drum
pub static STEPPERS: [StepperChannel; UNITS] = [const { StepperChannel::new() }; UNITS];

/// External display requests
pub static DISPLAY_REQUESTS: Channel<CriticalSectionRawMutex, Frame, 4> = Channel::new();

/// Queue `text` for display, truncated to the frame size.
///
/// Returns `false` when the queue is full.
pub fn request_display(text: &str) -> bool {
    let mut frame = Frame::new();
    for c in text.chars() {
        if frame.push(c).is_err() {
            break;
        }
    }
    DISPLAY_REQUESTS.try_send(frame).is_ok()
}
