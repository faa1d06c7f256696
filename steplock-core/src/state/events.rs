//! Events that trigger lock phase transitions

use crate::config::StepperConfig;
use crate::traits::Direction;

/// What a lock operation is trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockAction {
    /// Drive the bolt to the open end-stop
    Open,
    /// Drive the bolt to the closed end-stop
    Close,
}

impl LockAction {
    /// Motor direction for this action under the given calibration
    pub fn direction(self, config: &StepperConfig) -> Direction {
        match self {
            LockAction::Open => config.open_direction,
            LockAction::Close => config.close_direction(),
        }
    }
}

/// Events that can trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockEvent {
    /// Encoder was reset and the stepper is about to move
    Start(LockAction),
    /// The stepper finished the full traverse
    MotionComplete {
        /// Encoder ticks observed during the move
        ticks: u32,
        /// Verification threshold
        required: u32,
    },
    /// The caller has taken the outcome
    Finish,
}
