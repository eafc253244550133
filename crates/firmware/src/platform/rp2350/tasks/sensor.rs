//! Sensor interrupt task

use embassy_rp::gpio::Input;

use super::EDGE_LATCH;

/// Raise [`EDGE_LATCH`] on each falling edge of the expander interrupt line.
///
/// The line stays low until the control loop reads the ports, so a burst of
/// sensor changes yields one edge and one refresh.
#[embassy_executor::task]
pub async fn sensor_edge_task(mut line: Input<'static>) {
    crate::log_info!("Sensor edge task started");
    loop {
        line.wait_for_falling_edge().await;
        EDGE_LATCH.raise();
    }
}
