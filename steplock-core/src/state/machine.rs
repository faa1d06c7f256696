//! Lock phase state machine
//!
//! Every open/close call walks `Idle → Moving → Verified → Idle`. The
//! machine is explicit, finite and deterministic; it does not remember
//! the outcome of earlier calls.

use super::events::{LockAction, LockEvent};

/// Result of verifying a completed move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Enough encoder ticks were seen
    Success,
    /// Too few ticks: jammed, stalled or disconnected
    Failure,
}

impl Outcome {
    /// Judge a tick count against the verification threshold
    pub fn judge(ticks: u32, required: u32) -> Self {
        if ticks < required {
            Outcome::Failure
        } else {
            Outcome::Success
        }
    }
}

/// Lock phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockPhase {
    /// No operation in progress
    #[default]
    Idle,
    /// Stepper traversing towards an end-stop
    Moving(LockAction),
    /// Move completed and judged
    Verified(Outcome),
}

impl LockPhase {
    /// Verdict of the move, once it has been judged
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            LockPhase::Verified(outcome) => Some(*outcome),
            _ => None,
        }
    }

    /// Process an event and return the next phase
    ///
    /// Events that do not apply to the current phase leave it unchanged.
    pub fn transition(self, event: LockEvent) -> Self {
        use LockEvent::*;
        use LockPhase::*;

        match (self, event) {
            (Idle, Start(action)) => Moving(action),
            (Moving(_), MotionComplete { ticks, required }) => {
                Verified(Outcome::judge(ticks, required))
            }
            (Verified(_), Finish) => Idle,

            // Default: stay in current phase
            _ => self,
        }
    }
}
