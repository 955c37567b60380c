//! Bounded retry for transient commit failures

use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::config::RetryPolicy;
use crate::types::LedgerError;

/// Run `op` up to `policy.max_attempts` times, retrying transient errors
///
/// Only errors classified transient by [`LedgerError::is_transient`] are
/// retried; anything else is returned on the first occurrence. The backoff
/// doubles per attempt, capped at `policy.max_backoff_ms`.
///
/// # Errors
///
/// Returns `RetryExhausted` carrying the transaction id and attempt count
/// when every attempt failed transiently, or the first non-transient error.
pub fn with_retry<T, F>(
    policy: &RetryPolicy,
    transaction_id: &str,
    mut op: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Result<T, LedgerError>,
{
    let mut backoff_ms = policy.base_backoff_ms;
    for attempt in 1..=policy.max_attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                debug!(
                    transaction_id,
                    attempt,
                    error = %err,
                    "transient commit failure, retrying"
                );
                if attempt < policy.max_attempts && backoff_ms > 0 {
                    thread::sleep(Duration::from_millis(backoff_ms));
                    backoff_ms = (backoff_ms * 2).min(policy.max_backoff_ms);
                }
            }
            Err(err) => return Err(err),
        }
    }
    Err(LedgerError::retry_exhausted(
        transaction_id,
        policy.max_attempts,
    ))
}
