//! Hardware abstraction traits
//!
//! These traits define the interface between the lock logic and
//! hardware-specific implementations.

pub mod encoder;
pub mod stepper;

pub use encoder::{EncoderError, TickSource};
pub use stepper::{Direction, StepperDriver, StepperError};
