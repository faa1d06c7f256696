//! Lock sequence task
//!
//! Waits for the board to settle, opens the lock, holds it open and
//! closes it again. Each action is retried up to `max_attempts` times when
//! the encoder does not confirm the move.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{Delay, Duration, Timer};

use steplock_core::config::SequenceConfig;
use steplock_core::lock::{actuate_with_retry, MotorizedLock};
use steplock_core::state::LockAction;
use steplock_drivers::{Encoder, StepDirStepper};

/// Stepper type for the on-board step/dir driver
pub type Stepper = StepDirStepper<Output<'static>, Output<'static>, Output<'static>, Delay>;

/// Lock type wired by `main`
pub type Lock = MotorizedLock<Stepper, Encoder<'static>>;

/// Lock task - runs the open/hold/close sequence once
#[embassy_executor::task]
pub async fn lock_task(mut lock: Lock, sequence: SequenceConfig) {
    info!("Lock task started");

    Timer::after(Duration::from_millis(sequence.startup_delay_ms as u64)).await;

    run_action(&mut lock, LockAction::Open, sequence.max_attempts).await;

    Timer::after(Duration::from_millis(sequence.hold_open_ms as u64)).await;

    run_action(&mut lock, LockAction::Close, sequence.max_attempts).await;

    info!("Lock sequence complete");
}

/// Run `action` with retries, logging every attempt
///
/// Hardware faults halt the firmware: the bolt position is unknown after
/// a failed pin write.
async fn run_action(lock: &mut Lock, action: LockAction, max_attempts: u8) {
    let result = actuate_with_retry(lock, action, max_attempts, |attempt, v| {
        if v.succeeded() {
            info!(
                "{} attempt {}/{} verified: {} ticks (need {})",
                action, attempt, max_attempts, v.ticks, v.required
            );
        } else {
            warn!(
                "{} attempt {}/{} not verified: {} ticks (need {})",
                action, attempt, max_attempts, v.ticks, v.required
            );
        }
    })
    .await;

    match result {
        Ok(v) if v.succeeded() => {}
        Ok(_) => match action {
            LockAction::Open => warn!("Lock did not open fully"),
            LockAction::Close => warn!("Lock did not close fully"),
        },
        Err(e) => {
            error!("{} failed: {:?}", action, e);
            defmt::panic!("stepper fault");
        }
    }
}
