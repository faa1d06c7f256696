//! Motorized lock
//!
//! Composes one stepper and one encoder tick source. An open or close:
//!
//! 1. resets the encoder so no ticks leak in from an earlier move,
//! 2. drives the stepper through the full traverse (suspending the caller,
//!    while the encoder sampler keeps running in its own task),
//! 3. reads the tick count and judges it against the threshold.
//!
//! A failed verification is an outcome, not an error: the motor has
//! already finished its move, only the proof of travel is missing. Retry
//! policy is left to the caller.

mod retry;

pub use retry::actuate_with_retry;

use crate::config::{ConfigError, LockConfig, StepperConfig};
use crate::state::{LockAction, LockEvent, LockPhase, Outcome};
use crate::traits::{StepperDriver, StepperError, TickSource};

/// Errors that abort a lock operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockError {
    /// Stepper hardware fault during the move
    Stepper(StepperError),
    /// Phase machine did not reach a verdict
    InvalidTransition,
}

impl From<StepperError> for LockError {
    fn from(e: StepperError) -> Self {
        LockError::Stepper(e)
    }
}

/// Verdict on one completed open/close move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Verification {
    /// Action that was performed
    pub action: LockAction,
    /// Encoder ticks observed during the move
    pub ticks: u32,
    /// Threshold the ticks were judged against
    pub required: u32,
    /// Success or failure
    pub outcome: Outcome,
}

impl Verification {
    /// Check if the mechanism moved far enough
    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Stepper-driven lock with encoder verification
pub struct MotorizedLock<S, E> {
    stepper: S,
    encoder: E,
    calibration: StepperConfig,
    min_ticks: u32,
}

impl<S: StepperDriver, E: TickSource> MotorizedLock<S, E> {
    /// Create a new lock from its collaborators and calibration
    ///
    /// Rejects stepper or encoder calibration that cannot describe a
    /// working lock. The firmware sequence settings are not checked here.
    pub fn new(stepper: S, encoder: E, config: &LockConfig) -> Result<Self, ConfigError> {
        config.stepper.step_delay_ns()?;
        config.encoder.validate()?;

        Ok(Self {
            stepper,
            encoder,
            calibration: config.stepper,
            min_ticks: config.encoder.min_ticks,
        })
    }

    /// Drive the bolt to the open end-stop and verify the travel
    pub async fn open(&mut self) -> Result<Verification, LockError> {
        self.actuate(LockAction::Open).await
    }

    /// Drive the bolt to the closed end-stop and verify the travel
    pub async fn close(&mut self) -> Result<Verification, LockError> {
        self.actuate(LockAction::Close).await
    }

    /// Perform one full traverse for `action` and judge it
    ///
    /// Hardware faults propagate as [`LockError`]; too few ticks come back
    /// as an `Ok` verification that did not succeed.
    pub async fn actuate(&mut self, action: LockAction) -> Result<Verification, LockError> {
        self.encoder.reset();
        let moving = LockPhase::Idle.transition(LockEvent::Start(action));

        let direction = action.direction(&self.calibration);
        self.stepper
            .move_steps(direction, self.calibration.full_travel_steps)
            .await?;

        let ticks = self.encoder.read();
        let verified = moving.transition(LockEvent::MotionComplete {
            ticks,
            required: self.min_ticks,
        });
        let outcome = verified.outcome().ok_or(LockError::InvalidTransition)?;

        // Nothing is remembered once the verdict is handed out
        if verified.transition(LockEvent::Finish) != LockPhase::Idle {
            return Err(LockError::InvalidTransition);
        }

        Ok(Verification {
            action,
            ticks,
            required: self.min_ticks,
            outcome,
        })
    }

    /// Get the stepper driver
    pub fn stepper(&self) -> &S {
        &self.stepper
    }

    /// Get the encoder tick source
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Take the collaborators back
    pub fn release(self) -> (S, E) {
        (self.stepper, self.encoder)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;
    use std::vec::Vec;

    use embassy_futures::block_on;

    use super::*;
    use crate::traits::Direction;

    /// Tick counter shared between the fake stepper and the lock
    struct FakeTicks {
        count: Cell<u32>,
        resets: Cell<u32>,
    }

    impl FakeTicks {
        fn with_residual(count: u32) -> Self {
            Self {
                count: Cell::new(count),
                resets: Cell::new(0),
            }
        }
    }

    impl TickSource for FakeTicks {
        fn reset(&self) {
            self.count.set(0);
            self.resets.set(self.resets.get() + 1);
        }

        fn read(&self) -> u32 {
            self.count.get()
        }
    }

    /// Stepper that produces a scripted number of ticks per move
    struct FakeStepper<'a> {
        ticks: &'a FakeTicks,
        ticks_per_move: Vec<u32>,
        moves: Vec<(Direction, u32)>,
        fail: Option<StepperError>,
    }

    impl<'a> FakeStepper<'a> {
        fn new(ticks: &'a FakeTicks, ticks_per_move: &[u32]) -> Self {
            Self {
                ticks,
                ticks_per_move: ticks_per_move.to_vec(),
                moves: Vec::new(),
                fail: None,
            }
        }
    }

    impl StepperDriver for FakeStepper<'_> {
        async fn move_steps(&mut self, direction: Direction, steps: u32) -> Result<(), StepperError> {
            if let Some(e) = self.fail {
                return Err(e);
            }
            let produced = self.ticks_per_move.get(self.moves.len()).copied().unwrap_or(0);
            self.ticks.count.set(self.ticks.count.get() + produced);
            self.moves.push((direction, steps));
            Ok(())
        }

        fn is_enabled(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_open_success_above_threshold() {
        let ticks = FakeTicks::with_residual(0);
        let mut lock =
            MotorizedLock::new(FakeStepper::new(&ticks, &[60]), &ticks, &LockConfig::default())
                .unwrap();

        let result = block_on(lock.open()).unwrap();

        assert!(result.succeeded());
        assert_eq!(result.action, LockAction::Open);
        assert_eq!(result.ticks, 60);
        assert_eq!(result.required, 50);
        assert_eq!(lock.stepper().moves, [(Direction::Clockwise, 4800)]);
    }

    #[test]
    fn test_open_failure_below_threshold() {
        let ticks = FakeTicks::with_residual(0);
        let mut lock =
            MotorizedLock::new(FakeStepper::new(&ticks, &[10]), &ticks, &LockConfig::default())
                .unwrap();

        let result = block_on(lock.open()).unwrap();

        assert!(!result.succeeded());
        assert_eq!(result.outcome, Outcome::Failure);
        assert_eq!(result.ticks, 10);
    }

    #[test]
    fn test_residual_ticks_cleared_before_move() {
        let ticks = FakeTicks::with_residual(1000);
        let mut lock =
            MotorizedLock::new(FakeStepper::new(&ticks, &[10]), &ticks, &LockConfig::default())
                .unwrap();

        let result = block_on(lock.close()).unwrap();

        assert_eq!(ticks.resets.get(), 1);
        assert_eq!(result.ticks, 10);
        assert!(!result.succeeded());
    }

    #[test]
    fn test_open_then_close_reset_independently() {
        let ticks = FakeTicks::with_residual(0);
        let mut lock = MotorizedLock::new(
            FakeStepper::new(&ticks, &[500, 10]),
            &ticks,
            &LockConfig::default(),
        )
        .unwrap();

        let opened = block_on(lock.open()).unwrap();
        let closed = block_on(lock.close()).unwrap();

        assert!(opened.succeeded());
        assert_eq!(closed.ticks, 10);
        assert!(!closed.succeeded());
        assert_eq!(
            lock.stepper().moves,
            [(Direction::Clockwise, 4800), (Direction::CounterClockwise, 4800)]
        );
    }

    #[test]
    fn test_failed_verification_does_not_block_next_call() {
        let ticks = FakeTicks::with_residual(0);
        let mut lock =
            MotorizedLock::new(FakeStepper::new(&ticks, &[0, 75]), &ticks, &LockConfig::default())
                .unwrap();

        assert!(!block_on(lock.open()).unwrap().succeeded());
        assert!(block_on(lock.open()).unwrap().succeeded());
    }

    #[test]
    fn test_stepper_fault_propagates() {
        let ticks = FakeTicks::with_residual(0);
        let mut stepper = FakeStepper::new(&ticks, &[60]);
        stepper.fail = Some(StepperError::EnablePin);
        let mut lock = MotorizedLock::new(stepper, &ticks, &LockConfig::default()).unwrap();

        assert_eq!(
            block_on(lock.open()),
            Err(LockError::Stepper(StepperError::EnablePin))
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let ticks = FakeTicks::with_residual(0);
        let mut config = LockConfig::default();
        config.stepper.full_travel_steps = 0;

        let result = MotorizedLock::new(FakeStepper::new(&ticks, &[]), &ticks, &config);
        assert!(matches!(result, Err(ConfigError::ZeroTravelSteps)));
    }

    #[test]
    fn test_sequence_settings_not_checked() {
        let ticks = FakeTicks::with_residual(0);
        let mut config = LockConfig::default();
        config.sequence.max_attempts = 0;

        assert!(MotorizedLock::new(FakeStepper::new(&ticks, &[]), &ticks, &config).is_ok());

        config.encoder.min_ticks = 0;
        let result = MotorizedLock::new(FakeStepper::new(&ticks, &[]), &ticks, &config);
        assert!(matches!(result, Err(ConfigError::ZeroMinTicks)));
    }

    #[test]
    fn test_encoder_handle_reads_last_move() {
        let ticks = FakeTicks::with_residual(7);
        let mut lock =
            MotorizedLock::new(FakeStepper::new(&ticks, &[60]), &ticks, &LockConfig::default())
                .unwrap();

        block_on(lock.open()).unwrap();

        assert_eq!(lock.encoder().read(), 60);
    }

    #[test]
    fn test_borrowed_stepper() {
        let ticks = FakeTicks::with_residual(0);
        let mut stepper = FakeStepper::new(&ticks, &[60, 60]);

        {
            let mut lock = MotorizedLock::new(&mut stepper, &ticks, &LockConfig::default()).unwrap();
            assert!(block_on(lock.open()).unwrap().succeeded());
            assert!(block_on(lock.close()).unwrap().succeeded());
        }

        assert_eq!(stepper.moves.len(), 2);
    }

    #[test]
    fn test_custom_threshold_and_direction() {
        let ticks = FakeTicks::with_residual(0);
        let mut config = LockConfig::default();
        config.encoder.min_ticks = 100;
        config.stepper.full_travel_steps = 1600;
        config.stepper.open_direction = Direction::CounterClockwise;

        let mut lock = MotorizedLock::new(FakeStepper::new(&ticks, &[99]), &ticks, &config).unwrap();
        let result = block_on(lock.open()).unwrap();

        assert!(!result.succeeded());
        assert_eq!(result.required, 100);
        let (stepper, _) = lock.release();
        assert_eq!(stepper.moves, [(Direction::CounterClockwise, 1600)]);
    }
}
