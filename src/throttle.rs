//! Per-provider rate limiting and retry for external service calls.
//!
//! Every call to an external provider (LLM, search, TTS) goes through
//! [`RateLimiter::call`], which enforces a rolling requests-per-minute
//! ceiling per provider and retries failures with exponential backoff.

use crate::config::RateLimitSettings;
use crate::error::{PratError, Result};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Rolling window length for production limiters.
const WINDOW: Duration = Duration::from_secs(60);

/// Cap on the backoff exponent so the delay cannot overflow.
const MAX_BACKOFF_SHIFT: usize = 16;

/// Call timestamps issued within the current window for one provider.
#[derive(Default)]
struct ProviderWindow {
    issued: VecDeque<Instant>,
}

/// Rate limiter with per-provider rolling windows and retry policies.
///
/// All window state lives in this object; it is shared across the pipeline
/// behind an `Arc` and access is serialized with an async mutex.
pub struct RateLimiter {
    limits: RateLimitSettings,
    window: Duration,
    windows: Mutex<HashMap<String, ProviderWindow>>,
}

impl RateLimiter {
    /// Create a limiter with the standard one-minute window.
    pub fn new(limits: RateLimitSettings) -> Self {
        Self::with_window(limits, WINDOW)
    }

    /// Create a limiter with a custom window length.
    ///
    /// Production code uses [`RateLimiter::new`]; the shorter windows are for
    /// tests, which cannot wait out a real minute.
    pub fn with_window(limits: RateLimitSettings, window: Duration) -> Self {
        Self {
            limits,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Execute one provider call under the rate limit, retrying failures.
    ///
    /// The operation runs at most `max_retries + 1` times. Each attempt
    /// (including retries) takes a slot in the provider's rolling window,
    /// suspending until the window has room. Retries back off exponentially
    /// from the provider's base delay. Once retries are exhausted the last
    /// error surfaces as [`PratError::ProviderCall`].
    pub async fn call<T, F, Fut>(&self, provider: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let limit = self.limits.limit_for(provider).clone();
        let attempts = limit.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = backoff_delay(limit.base_delay_ms, attempt - 1);
                warn!(
                    provider,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Call failed, retrying: {}",
                    last_error
                );
                tokio::time::sleep(delay).await;
            }

            self.acquire(provider, limit.requests_per_minute).await;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => last_error = e.to_string(),
            }
        }

        Err(PratError::ProviderCall {
            provider: provider.to_string(),
            attempts,
            message: last_error,
        })
    }

    /// Block until the provider's window has room, then take a slot.
    async fn acquire(&self, provider: &str, requests_per_minute: usize) {
        let ceiling = requests_per_minute.max(1);

        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                let window = windows.entry(provider.to_string()).or_default();
                let now = Instant::now();

                // Drop timestamps that have aged out of the rolling window.
                while let Some(front) = window.issued.front() {
                    if now.duration_since(*front) >= self.window {
                        window.issued.pop_front();
                    } else {
                        break;
                    }
                }

                if window.issued.len() < ceiling {
                    window.issued.push_back(now);
                    None
                } else {
                    let oldest = window.issued.front().copied().unwrap_or(now);
                    let remaining = self.window.saturating_sub(now.duration_since(oldest));
                    Some(remaining.max(Duration::from_millis(1)))
                }
            };

            match wait {
                None => return,
                Some(delay) => {
                    debug!(
                        provider,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limit reached, waiting for window"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Delay before the zero-based `retry`th retry: base × 2^retry.
fn backoff_delay(base_ms: u64, retry: usize) -> Duration {
    let factor = 1u64 << retry.min(MAX_BACKOFF_SHIFT);
    Duration::from_millis(base_ms.saturating_mul(factor))
}
