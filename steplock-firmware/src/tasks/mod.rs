//! Embassy async tasks
//!
//! The encoder task owns the encoder input; the lock task owns the stepper.
//! They share only the tick counter.

pub mod encoder;
pub mod lock;

pub use encoder::encoder_task;
pub use lock::lock_task;
