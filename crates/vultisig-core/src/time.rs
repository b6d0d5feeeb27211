//! External time collaborators (spec §1, §5): a clock and a sleeper.
//!
//! Narrow traits, grounded on the style of `aura-core::effects::time`, so
//! that the relay client and MPC driver's poll loops are deterministic and
//! testable without real wall-clock delays.

use async_trait::async_trait;
use std::time::Duration;

/// Wall-clock time source, in Unix epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Real wall-clock implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Suspension-point delay, abstracted so tests can run poll loops without
/// waiting on real timers.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by tokio's timer wheel.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let first = clock.now_millis();
        assert!(first > 0);
    }

    #[tokio::test]
    async fn tokio_sleeper_respects_duration() {
        let start = std::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
