//! Split-flap display firmware for the Pico 2 W
//!
//! # Wiring
//!
//! - GPIO 2-13: STEP inputs of the drum drivers, units left to right
//! - GPIO 20/21: I2C0 SDA/SCL to both MCP23017 expanders
//! - GPIO 22: sensor expander interrupt (open drain, active low)
//!
//! # Usage
//!
//! ```bash
//! SPLITFLAP_UNITS=12 cargo build --release -p splitflap_firmware \
//!     --features pico2_w --target thumbv8m.main-none-eabihf
//! probe-rs run --chip RP2350 target/thumbv8m.main-none-eabihf/release/splitflap
//! ```

#![no_std]
#![no_main]

use embassy_executor::{SpawnError, SpawnToken, Spawner};
use embassy_rp::block::ImageDef;
use embassy_rp::flash::Flash;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use splitflap_core::parameters::{MotionParams, ParameterStore, UnitParams};
use splitflap_firmware::core::{ResumeStore, RESUME_BLOCK_ADDRESS};
use splitflap_firmware::platform::rp2350::expander::{
    ENABLE_EXPANDER_ADDRESS, SENSOR_EXPANDER_ADDRESS,
};
use splitflap_firmware::platform::rp2350::tasks::{
    control_task, sensor_edge_task, step_pulse_task, STEPPERS,
};
use splitflap_firmware::platform::rp2350::{
    enable_stepper_drivers, Mcp23017Ports, Rp2350Flash, UNITS,
};
use splitflap_firmware::platform::{EmbassyTime, ExpanderHall, REFERENCE_SENSOR_MAP};
use splitflap_firmware::system::SplitFlapSystem;
use splitflap_firmware::{log_error, log_info};
use {defmt_rtt as _, panic_probe as _};

#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Expander bus clock
const I2C_FREQUENCY_HZ: u32 = 400_000;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    log_info!("Split-flap display");
    log_info!("  Units: {}", UNITS);

    let mut params = ParameterStore::new();
    let registered = MotionParams::register_defaults(&mut params, UNITS as u8)
        .and_then(|()| UnitParams::register_defaults(&mut params, UNITS as u8));
    if registered.is_err() {
        log_error!("Parameter registration failed, using reference values");
    }

    let mut config = i2c::Config::default();
    config.frequency = I2C_FREQUENCY_HZ;
    let mut bus = I2c::new_blocking(p.I2C0, p.PIN_21, p.PIN_20, config);

    if enable_stepper_drivers(&mut bus, ENABLE_EXPANDER_ADDRESS).is_err() {
        log_error!("Stepper enable expander not responding");
    }
    let mut ports = Mcp23017Ports::new(bus, SENSOR_EXPANDER_ADDRESS);
    if ports.configure().is_err() {
        log_error!("Sensor expander not responding");
    }
    // build.rs caps UNITS at the board's sensor count.
    let hall = ExpanderHall::new(ports, core::array::from_fn(|i| REFERENCE_SENSOR_MAP[i]));

    let flash = Rp2350Flash::new(Flash::new_blocking(p.FLASH));
    let Ok(store) = ResumeStore::new(flash, RESUME_BLOCK_ADDRESS) else {
        log_error!("Resume block misaligned");
        return;
    };

    let steppers = core::array::from_fn(|i| STEPPERS[i].handle());
    let system = SplitFlapSystem::from_params(&params, steppers, hall, store, EmbassyTime);

    let step_pins = [
        Output::new(p.PIN_2, Level::Low),
        Output::new(p.PIN_3, Level::Low),
        Output::new(p.PIN_4, Level::Low),
        Output::new(p.PIN_5, Level::Low),
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_7, Level::Low),
        Output::new(p.PIN_8, Level::Low),
        Output::new(p.PIN_9, Level::Low),
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_12, Level::Low),
        Output::new(p.PIN_13, Level::Low),
    ];
    let interrupt_line = Input::new(p.PIN_22, Pull::Up);

    spawn(&spawner, step_pulse_task(step_pins), "step pulse");
    spawn(&spawner, sensor_edge_task(interrupt_line), "sensor edge");
    spawn(&spawner, control_task(system), "control");
}

fn spawn<S>(spawner: &Spawner, token: Result<SpawnToken<S>, SpawnError>, name: &str) {
    match token {
        Ok(token) => spawner.spawn(token),
        Err(_) => log_error!("Failed to spawn {} task", name),
    }
}
