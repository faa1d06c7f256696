//! Configuration type definitions
//!
//! These types hold the hardware-specific calibration of one lock: how far
//! the bolt travels, how fast, and how many encoder ticks prove that it
//! actually moved. Values come from `lock.toml` (see [`super::parse`]).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::Direction;

/// Nanoseconds per millisecond
const NS_PER_MS: u64 = 1_000_000;

/// Configuration errors
///
/// All of these indicate a mis-calibrated or miswired system and are
/// rejected before any hardware is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Full-travel step count is zero
    ZeroTravelSteps,
    /// Full-travel time is zero
    ZeroTravelTime,
    /// Per-step delay rounds down to 0 ns
    StepDelayTooShort,
    /// Per-step delay does not fit the delay provider (u32 ns)
    StepDelayTooLong,
    /// Encoder sample interval is zero
    ZeroSampleInterval,
    /// Verification threshold is zero (every move would pass)
    ZeroMinTicks,
    /// Attempt count is zero (the lock would never move)
    ZeroAttempts,
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not recognised in its section
    UnknownKey,
    /// Value has the wrong type or is out of range
    InvalidValue,
}

/// Stepper travel calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepperConfig {
    /// Half-step toggles from one end-stop to the other
    pub full_travel_steps: u32,
    /// Time for a full traverse in milliseconds
    pub full_travel_time_ms: u32,
    /// Direction that opens the lock (close is the opposite)
    pub open_direction: Direction,
    /// Enable pin is active-low (A4988/DRV8825/TMC2209 EN)
    pub enable_inverted: bool,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            // 3 turns at 1600 half-steps per turn
            full_travel_steps: 3 * 1600,
            full_travel_time_ms: 6000,
            open_direction: Direction::Clockwise,
            enable_inverted: true,
        }
    }
}

impl StepperConfig {
    /// Delay between step toggles in nanoseconds
    ///
    /// Derived from the full-travel time divided by the full-travel step
    /// count.
    pub fn step_delay_ns(&self) -> Result<u32, ConfigError> {
        if self.full_travel_steps == 0 {
            return Err(ConfigError::ZeroTravelSteps);
        }
        if self.full_travel_time_ms == 0 {
            return Err(ConfigError::ZeroTravelTime);
        }

        let delay = self.full_travel_time_ms as u64 * NS_PER_MS / self.full_travel_steps as u64;
        match u32::try_from(delay) {
            Ok(0) => Err(ConfigError::StepDelayTooShort),
            Ok(ns) => Ok(ns),
            Err(_) => Err(ConfigError::StepDelayTooLong),
        }
    }

    /// Direction that closes the lock
    pub fn close_direction(&self) -> Direction {
        self.open_direction.opposite()
    }
}

/// Encoder sampling and verification calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EncoderConfig {
    /// Poll interval of the sampling task in microseconds
    ///
    /// Bounds the fastest detectable level change.
    pub sample_interval_us: u32,
    /// Minimum ticks after a full traverse to accept the move
    pub min_ticks: u32,
}

impl EncoderConfig {
    /// Check that the encoder can sample and that a stalled move can fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval_us == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        if self.min_ticks == 0 {
            return Err(ConfigError::ZeroMinTicks);
        }
        Ok(())
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            sample_interval_us: 1000,
            min_ticks: 50,
        }
    }
}

/// Open/close sequence run by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequenceConfig {
    /// Wait after boot before the first open
    pub startup_delay_ms: u32,
    /// Time the lock stays open before closing
    pub hold_open_ms: u32,
    /// Attempts per action before giving up (1 = no retry)
    pub max_attempts: u8,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: 1000,
            hold_open_ms: 5000,
            max_attempts: 1,
        }
    }
}

/// Complete lock configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LockConfig {
    /// Stepper travel calibration
    pub stepper: StepperConfig,
    /// Encoder calibration
    pub encoder: EncoderConfig,
    /// Firmware demo sequence
    pub sequence: SequenceConfig,
}

impl LockConfig {
    /// Check the calibration for values that cannot describe a working lock
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stepper.step_delay_ns()?;
        self.encoder.validate()?;

        if self.sequence.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }

        Ok(())
    }
}
