//! Configuration loading
//!
//! The calibration is compiled in from `lock.toml` (validated by the build
//! script) and parsed at boot by the no_std parser in `steplock-core`.

use defmt::*;

use steplock_core::config::{parse_config, LockConfig};

/// Embedded calibration (compiled into firmware)
/// Edit lock.toml and rebuild to recalibrate
const EMBEDDED_CONFIG: &str = include_str!("../../lock.toml");

/// Parse and validate the embedded calibration
///
/// A lock that cannot be calibrated must never move, so any error here
/// halts the firmware.
pub fn load() -> LockConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Calibration loaded: {} steps in {} ms, open {}",
                config.stepper.full_travel_steps,
                config.stepper.full_travel_time_ms,
                config.stepper.open_direction
            );
            info!(
                "Encoder: sampled every {} us, {} ticks required",
                config.encoder.sample_interval_us, config.encoder.min_ticks
            );
            config
        }
        Err(e) => {
            error!("Invalid lock.toml: {:?}", e);
            defmt::panic!("refusing to run with an invalid calibration");
        }
    }
}
