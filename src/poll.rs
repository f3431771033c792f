//! Bounded polling against a UI that settles at its own pace.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;

/// Interval between condition re-checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Repeatedly evaluate `check` until it yields a value or `max_wait`
/// elapses.
///
/// The condition is evaluated at least once even with a zero wait, and
/// errors from the check abort the poll immediately. Returns `Ok(None)`
/// on expiry; this is the only unbounded-wait guard in the crate, so
/// every UI wait must go through here.
pub async fn poll_until<T, F, Fut>(max_wait: Duration, interval: Duration, mut check: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + max_wait;

    loop {
        if let Some(value) = check().await? {
            return Ok(Some(value));
        }

        if Instant::now() >= deadline {
            return Ok(None);
        }

        tokio::time::sleep(interval.min(deadline - Instant::now())).await;
    }
}
