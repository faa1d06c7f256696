//! Caller-side retry of lock actions
//!
//! [`MotorizedLock`] never retries on its own. Callers that want another
//! try after a failed verification (the firmware sequence) go through
//! [`actuate_with_retry`].

use super::{LockError, MotorizedLock, Verification};
use crate::state::LockAction;
use crate::traits::{StepperDriver, TickSource};

/// Repeat `action` until it verifies or `max_attempts` moves were made
///
/// `on_attempt` sees every verdict together with its 1-based attempt
/// number. At least one attempt is always made. Returns the last
/// verification; hardware faults abort immediately.
pub async fn actuate_with_retry<S, E, F>(
    lock: &mut MotorizedLock<S, E>,
    action: LockAction,
    max_attempts: u8,
    mut on_attempt: F,
) -> Result<Verification, LockError>
where
    S: StepperDriver,
    E: TickSource,
    F: FnMut(u8, &Verification),
{
    let mut attempt = 1;
    loop {
        let verification = lock.actuate(action).await?;
        on_attempt(attempt, &verification);

        if verification.succeeded() || attempt >= max_attempts {
            return Ok(verification);
        }
        attempt += 1;
    }
}
