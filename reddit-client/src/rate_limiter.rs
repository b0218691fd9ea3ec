use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    /// Reddit allows 100 requests per minute for OAuth2 clients.
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100,
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket: capacity bounds bursts, refill rate bounds the sustained
/// request rate.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = config.burst_allowance as f64;
        let refill_rate = config.max_requests as f64 / config.time_window.as_secs_f64();

        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_rate,
        }
    }

    /// Blocks until a request token is available, then consumes it.
    pub async fn until_ready(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill);
                state.tokens =
                    (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - state.tokens) / self.refill_rate)
            };
            debug!("Rate limit reached, waiting {:?}", wait);
            sleep(wait).await;
        }
    }

    pub async fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        state.tokens =
            (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = now;
        state.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_allowance_is_consumed() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 10,
            time_window: Duration::from_secs(10),
            burst_allowance: 5,
        });

        for _ in 0..5 {
            limiter.until_ready().await;
        }
        assert!(limiter.available_tokens().await < 1.0);
    }

    #[tokio::test]
    async fn bucket_refills_over_time() {
        // 10 tokens per second, so a drained bucket recovers quickly.
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 10,
            time_window: Duration::from_secs(1),
            burst_allowance: 2,
        });

        limiter.until_ready().await;
        limiter.until_ready().await;
        assert!(limiter.available_tokens().await < 1.0);

        sleep(Duration::from_millis(250)).await;
        assert!(limiter.available_tokens().await >= 1.0);
    }

    #[tokio::test]
    async fn until_ready_waits_instead_of_failing() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 20,
            time_window: Duration::from_secs(1),
            burst_allowance: 1,
        });

        let start = Instant::now();
        limiter.until_ready().await;
        limiter.until_ready().await;
        // The second acquisition had to wait for a refill.
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
