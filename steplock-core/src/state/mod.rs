//! Lock phase state machine
//!
//! Defines the phases a single open/close call goes through and the
//! success/failure judgement made at the end of a move.

pub mod events;
pub mod machine;

pub use events::{LockAction, LockEvent};
pub use machine::{LockPhase, Outcome};
