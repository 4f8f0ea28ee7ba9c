//! Small helpers shared by the surfaces: async retry with exponential
//! backoff and human-readable byte formatting.

use std::future::Future;
use std::time::Duration;

/// Retry an async operation with exponential backoff.
///
/// Runs `op` up to `attempts` times, sleeping `base_delay` after the first
/// failure and doubling the delay after each subsequent one. Returns the
/// first success, or the last error once attempts are exhausted.
pub async fn retry<T, E, F, Fut>(attempts: u32, base_delay: Duration, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_if(attempts, base_delay, op, |_| true).await
}

/// [`retry`] with a retryability predicate.
///
/// An error for which `should_retry` returns false is returned immediately
/// without sleeping; deterministic failures (a missing post, a malformed
/// ID) should not pay the backoff schedule meant for transient ones.
pub async fn retry_if<T, E, F, Fut>(
    attempts: u32,
    base_delay: Duration,
    mut op: F,
    should_retry: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = base_delay;
    let mut remaining = attempts.max(1);
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                remaining -= 1;
                if remaining == 0 || !should_retry(&e) {
                    return Err(e);
                }
                log::debug!("retrying after failure, {remaining} attempts left");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary units, one decimal above bytes
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", BYTE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_format_bytes_boundaries() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1_048_576), "1.0 MB");
    }

    #[test]
    fn test_format_bytes_fractional() {
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry(5, Duration::from_millis(100), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("not yet")
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_if_short_circuits_non_retryable() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let result: Result<(), &str> = retry_if(
            5,
            Duration::from_millis(250),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("fatal") }
            },
            |e| *e != "fatal",
        )
        .await;
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // No backoff sleeps were taken.
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = retry(3, Duration::from_millis(10), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("always") }
        })
        .await;
        assert_eq!(result, Err("always"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
