use monitor_core::CoreError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100, // Reddit allows 100 requests per minute for OAuth2
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

#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64, // tokens per second
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
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

    /// Takes `tokens_needed` tokens, or returns how long until enough have refilled.
    pub async fn acquire(&self, tokens_needed: f64) -> Result<(), Duration> {
        let mut state = self.state.lock().await;
        self.refill(&mut state);

        if state.tokens >= tokens_needed {
            state.tokens -= tokens_needed;
            Ok(())
        } else {
            let missing = tokens_needed - state.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_rate))
        }
    }

    pub async fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = now;
    }
}

/// Paces outgoing requests: a token bucket for the per-minute quota, and a
/// semaphore capping requests in flight at the burst size.
#[derive(Debug)]
pub struct RateLimiter {
    token_bucket: TokenBucket,
    semaphore: Arc<Semaphore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            token_bucket: TokenBucket::new(&config),
            semaphore: Arc::new(Semaphore::new(config.burst_allowance as usize)),
            config,
        }
    }

    pub async fn acquire_permit(&self) -> Result<RateLimitPermit, CoreError> {
        let start_time = Instant::now();
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CoreError::Internal {
                message: format!("rate limiter closed: {}", e),
            })?;

        loop {
            match self.token_bucket.acquire(1.0).await {
                Ok(()) => break,
                Err(wait_time) => {
                    tracing::debug!("Rate limit reached, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
            }
        }

        Ok(RateLimitPermit {
            _permit: permit,
            queue_wait_time: start_time.elapsed(),
        })
    }

    pub async fn status(&self) -> RateLimitStatus {
        RateLimitStatus {
            available_tokens: self.token_bucket.available_tokens().await as u32,
            max_tokens: self.config.burst_allowance,
            available_permits: self.semaphore.available_permits(),
            requests_per_minute: self.config.max_requests,
        }
    }
}

#[derive(Debug)]
pub struct RateLimitPermit {
    _permit: OwnedSemaphorePermit,
    pub queue_wait_time: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub available_tokens: u32,
    pub max_tokens: u32,
    pub available_permits: usize,
    pub requests_per_minute: u32,
}
