//! Generic retry executor with exponential backoff and jitter.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Ceiling of the random jitter added to every backoff sleep, in milliseconds.
const MAX_JITTER_MS: u64 = 1000;

/// Run a fallible async operation with retries.
///
/// The operation is attempted up to `max_retries + 1` times (initial attempt
/// plus retries). After a failed non-final attempt the executor sleeps
/// `base_delay * 2^attempt` plus a random jitter in `0..1000ms` to avoid
/// synchronized retry storms across concurrent callers. On exhaustion the
/// last encountered error is returned unchanged.
///
/// The executor is capability-agnostic: it is generic over the error type and
/// never inspects it. Callers decide retryability by not wrapping operations
/// whose failures are permanent.
pub async fn with_retry<T, E, F, Fut>(
    mut operation: F,
    max_retries: u32,
    base_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries => {
                let backoff = base_delay.saturating_mul(2u32.saturating_pow(attempt));
                let jitter = Duration::from_millis(rand::rng().random_range(0..MAX_JITTER_MS));
                tracing::debug!(
                    attempt = attempt + 1,
                    max_attempts = max_retries + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "attempt failed, backing off before retry"
                );
                tokio::time::sleep(backoff + jitter).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
