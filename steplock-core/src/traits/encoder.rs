//! Encoder tick source trait
//!
//! The lock only needs two things from an encoder: clearing the count
//! before a move and reading it afterwards. How the ticks are produced
//! (polled GPIO, interrupt, PIO) is up to the implementation.

/// Errors that can occur while sampling an encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderError {
    /// Encoder input could not be read
    InputPin,
    /// Invalid configuration
    InvalidConfig,
}

/// Shared, read/reset view of an encoder tick count
///
/// Implementations must make a `reset()` visible to every `read()` that
/// happens after it, even when the counting side runs in another task or
/// thread.
pub trait TickSource {
    /// Set the tick count back to zero
    fn reset(&self);

    /// Current tick count since the last reset
    fn read(&self) -> u32;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn reset(&self) {
        (**self).reset()
    }

    fn read(&self) -> u32 {
        (**self).read()
    }
}
