//! Steplock - Stepper Lock Firmware
//!
//! Drives a bolt with a step/dir stepper driver and proves each move with
//! a polled single-channel encoder, on RP2040-based boards.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::{Delay, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use steplock_core::config::LockConfig;
use steplock_core::lock::MotorizedLock;
use steplock_drivers::{EncoderSampler, StepDirStepper, TickCounter};

mod config;
mod tasks;

/// Encoder tick count, written by the encoder task and read by the lock
static TICKS: TickCounter = TickCounter::new();

static CONFIG: StaticCell<LockConfig> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Steplock firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config: &'static LockConfig = CONFIG.init(config::load());

    // Encoder disc sensor: GPIO21, external pull on the sensor board
    let encoder_pin = Input::new(p.PIN_21, Pull::None);
    let sampler = unwrap!(EncoderSampler::new(
        encoder_pin,
        Delay,
        &TICKS,
        &config.encoder
    ));
    let encoder = sampler.encoder();

    // Step/dir driver: GPIO18 DIR, GPIO19 STEP, GPIO20 EN
    // Start disabled so the motor is unpowered until the first move
    let enable_idle = if config.stepper.enable_inverted {
        Level::High
    } else {
        Level::Low
    };
    let dir = Output::new(p.PIN_18, Level::Low);
    let step = Output::new(p.PIN_19, Level::Low);
    let enable = Output::new(p.PIN_20, enable_idle);
    let stepper = unwrap!(StepDirStepper::new(
        dir,
        step,
        enable,
        Delay,
        &config.stepper
    ));
    info!(
        "Stepper initialized ({} ns per step)",
        stepper.step_delay_ns()
    );

    let lock = unwrap!(MotorizedLock::new(stepper, encoder, config));

    // The sampler must be running before the lock moves
    spawner.spawn(tasks::encoder_task(sampler)).unwrap();
    spawner
        .spawn(tasks::lock_task(lock, config.sequence))
        .unwrap();

    info!("All tasks spawned");

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
