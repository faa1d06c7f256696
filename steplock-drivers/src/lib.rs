//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in steplock-core on top of `embedded-hal` digital pins and
//! `embedded-hal-async` delays:
//!
//! - Polled single-channel encoder (background sampler + shared counter)
//! - STEP/DIR stepper driver with optional enable line (A4988, DRV8825,
//!   TMC2209 in standalone mode)
//! - Simulated pins and a virtual clock for host-side testing (`sim`)

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod encoder;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod stepper;

pub use encoder::{Encoder, EncoderSampler, TickCounter};
pub use stepper::{NoEnablePin, StepDirStepper};
