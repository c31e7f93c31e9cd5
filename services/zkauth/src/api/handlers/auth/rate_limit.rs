//! Rate limiting primitives for auth flows.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

pub trait RateLimiter: Send + Sync {
    /// Decide whether a request attributed to `ip` may proceed.
    fn check(&self, ip: Option<&str>) -> RateLimitDecision;

    /// Drop bookkeeping for clients that fell out of the window.
    fn prune(&self) {}
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check(&self, _ip: Option<&str>) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

/// Per-IP sliding window: at most `max_requests` within `window`.
pub struct SlidingWindowRateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowRateLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests as usize,
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    fn check(&self, ip: Option<&str>) -> RateLimitDecision {
        // Requests without an attributable IP cannot be limited fairly.
        let Some(ip) = ip else {
            return RateLimitDecision::Allowed;
        };

        let now = Instant::now();
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let timestamps = requests.entry(ip.to_string()).or_default();
        timestamps.retain(|instant| now.duration_since(*instant) < self.window);

        if timestamps.len() >= self.max_requests {
            return RateLimitDecision::Limited;
        }

        timestamps.push(now);
        RateLimitDecision::Allowed
    }

    fn prune(&self) {
        let now = Instant::now();
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        requests.retain(|_, timestamps| {
            timestamps.retain(|instant| now.duration_since(*instant) < self.window);
            !timestamps.is_empty()
        });
    }
}
