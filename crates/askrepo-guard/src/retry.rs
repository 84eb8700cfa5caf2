use std::future::Future;
use std::time::Duration;

/// Retry `f` up to `max_retries` additional times with exponential backoff.
///
/// `is_retryable` decides eligibility per error; authentication and
/// malformed-input failures must return `false` there so they surface
/// immediately. The first attempt always runs.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted or a non-retryable
/// error occurs.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    max_retries: u32,
    base_delay: Duration,
    is_retryable: R,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut attempt: u32 = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries && is_retryable(&e) => {
                let delay = base_delay * 2u32.saturating_pow(attempt);
                tracing::debug!(
                    attempt = attempt + 1,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
