use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::trace;

/// Spaces external calls a fixed interval apart. Owned by the orchestrator so
/// the API clients stay free of pacing concerns.
#[derive(Debug)]
pub struct FixedIntervalGate {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl FixedIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Waits until at least `interval` has passed since the previous call,
    /// then records this one.
    pub async fn pace(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                trace!("Gate pausing {:?}", wait);
                sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_call_is_immediate() {
        let gate = FixedIntervalGate::new(Duration::from_secs(60));
        let start = Instant::now();
        gate.pace().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn subsequent_calls_are_spaced() {
        let gate = FixedIntervalGate::new(Duration::from_millis(50));
        let start = Instant::now();
        gate.pace().await;
        gate.pace().await;
        gate.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
