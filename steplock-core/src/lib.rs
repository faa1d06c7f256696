//! Board-agnostic core logic for the stepper lock firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (stepper, encoder tick source)
//! - Lock phase state machine (idle, moving, verified)
//! - Motorized lock open/close sequence and verification policy
//! - Calibration types, validation and the `lock.toml` parser

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod lock;
pub mod state;
pub mod traits;
