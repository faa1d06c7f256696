//! Stepper motor driver trait
//!
//! This trait abstracts over the way half-steps are produced (GPIO
//! STEP/DIR toggling, PIO state machine, simulated pins in tests).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Motor rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Clockwise rotation (DIR pin high)
    #[default]
    Clockwise,
    /// Counter-clockwise rotation (DIR pin low)
    CounterClockwise,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// Logic level driven onto the DIR pin
    pub fn pin_level(self) -> bool {
        self == Direction::Clockwise
    }
}

/// Errors that can occur with stepper operations
///
/// The pin variants name the output that could not be driven. The motion
/// is abandoned at that point; no retry is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepperError {
    /// Direction output failed
    DirectionPin,
    /// Step pulse output failed
    StepPin,
    /// Enable output failed
    EnablePin,
    /// Invalid configuration
    InvalidConfig,
}

/// Trait for stepper motor drivers
///
/// `move_steps` suspends the calling task for the whole motion
/// (`steps × step delay`) but must yield at every step so that other
/// cooperatively scheduled tasks, the encoder sampler in particular, keep
/// running.
#[allow(async_fn_in_trait)]
pub trait StepperDriver {
    /// Advance the motor by `steps` half-step toggles in `direction`
    ///
    /// The driver is enabled for the duration of the move and disabled
    /// (locked/idle) again before returning. `steps == 0` only performs
    /// the enable/disable transitions.
    async fn move_steps(&mut self, direction: Direction, steps: u32) -> Result<(), StepperError>;

    /// Check if the driver is currently enabled
    fn is_enabled(&self) -> bool;
}

impl<T: StepperDriver> StepperDriver for &mut T {
    async fn move_steps(&mut self, direction: Direction, steps: u32) -> Result<(), StepperError> {
        (**self).move_steps(direction, steps).await
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite() {
        assert_eq!(Direction::Clockwise.opposite(), Direction::CounterClockwise);
        assert_eq!(Direction::CounterClockwise.opposite(), Direction::Clockwise);
    }

    #[test]
    fn test_pin_level() {
        assert!(Direction::Clockwise.pin_level());
        assert!(!Direction::CounterClockwise.pin_level());
    }
}
