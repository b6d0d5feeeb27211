//! Jittered backoff for poll operations and bounded transport retries
//! (spec §4.1 failure model).

use rand::Rng;
use std::time::Duration;
use vultisig_core::{CancelToken, Clock, Result, Sleeper, VultisigError};

/// Backoff schedule for poll operations (`awaitSessionStart`,
/// `fetchSetupMessage`, `awaitComplete`, and the party-session quorum poll).
#[derive(Debug, Clone, Copy)]
pub struct PollBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            max: Duration::from_secs(3),
        }
    }
}

impl PollBackoff {
    /// Jittered delay for poll attempt `attempt` (0-indexed), full-jitter
    /// between zero and the exponential cap.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let capped = exp.min(self.max);
        let jitter_ms = rand::thread_rng().gen_range(0..=capped.as_millis().max(1) as u64);
        Duration::from_millis(jitter_ms)
    }
}

/// Poll `attempt` until it returns `Ok(Some(value))`, the deadline elapses,
/// or the cancellation token fires. `attempt` returning `Ok(None)` means
/// "not ready yet" (the 404-on-poll case); `Err` is surfaced only when it is
/// not retryable (spec: 4xx other than 404-on-poll is fatal).
pub async fn poll_until<T, F, Fut>(
    mut attempt: F,
    deadline: Duration,
    clock: &dyn Clock,
    sleeper: &dyn Sleeper,
    cancel: &CancelToken,
    backoff: PollBackoff,
    what: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<Option<T>>>,
{
    let start = clock.now_millis();
    let mut iteration: u32 = 0;
    loop {
        cancel.check()?;

        match attempt().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(err) if err.is_retryable() => {}
            Err(err) => return Err(err),
        }

        if clock.now_millis().saturating_sub(start) >= deadline.as_millis() as u64 {
            return Err(VultisigError::timeout(format!("timed out waiting for {what}")));
        }

        tokio::select! {
            _ = sleeper.sleep(backoff.delay_for(iteration)) => {}
            _ = cancel.cancelled() => return Err(VultisigError::Cancelled),
        }
        iteration = iteration.saturating_add(1);
    }
}

/// Bounded retry for a single non-polling request: retried only while the
/// failure is a `Transport` error, up to `max_attempts` total tries.
pub async fn retry_transport<T, F, Fut>(mut attempt: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_err = None;
    for try_index in 0..max_attempts.max(1) {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && try_index + 1 < max_attempts => {
                last_err = Some(err);
                let backoff_ms = 100u64 * 2u64.pow(try_index);
                tokio::time::sleep(Duration::from_millis(backoff_ms.min(2_000))).await;
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| VultisigError::transport("retry budget exhausted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use vultisig_core::{SystemClock, TokioSleeper};

    #[tokio::test]
    async fn poll_until_returns_on_first_success() {
        let result = poll_until(
            || async { Ok(Some(42)) },
            Duration::from_secs(1),
            &SystemClock,
            &TokioSleeper,
            &CancelToken::new(),
            PollBackoff {
                base: Duration::from_millis(1),
                max: Duration::from_millis(5),
            },
            "test",
        )
        .await
        .unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn poll_until_times_out() {
        let result: Result<i32> = poll_until(
            || async { Ok(None) },
            Duration::from_millis(30),
            &SystemClock,
            &TokioSleeper,
            &CancelToken::new(),
            PollBackoff {
                base: Duration::from_millis(5),
                max: Duration::from_millis(10),
            },
            "never",
        )
        .await;
        assert_matches::assert_matches!(result, Err(VultisigError::Timeout { .. }));
    }

    #[tokio::test]
    async fn poll_until_respects_cancellation() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result: Result<i32> = poll_until(
            || async { Ok(None) },
            Duration::from_secs(10),
            &SystemClock,
            &TokioSleeper,
            &cancel,
            PollBackoff::default(),
            "cancelled-case",
        )
        .await;
        assert_matches::assert_matches!(result, Err(VultisigError::Cancelled));
    }

    #[tokio::test]
    async fn retry_transport_retries_then_succeeds() {
        let attempts = AtomicU32::new(0);
        let result = retry_transport(
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(VultisigError::transport("flaky"))
                    } else {
                        Ok("ok")
                    }
                }
            },
            3,
        )
        .await
        .unwrap();
        assert_eq!(result, "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_transport_never_retries_non_transport_errors() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = retry_transport(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(VultisigError::protocol("fatal")) }
            },
            3,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
