//! Sliding-window outbound rate limiter.
//!
//! The limiter never waits: a request that would exceed the window is refused immediately and
//! surfaces as a failed `OperationResult`. No call can block past the HTTP timeout this way.

use crate::config::RateLimitConfig;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    recent: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Returns `None` when the config disables limiting.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }
        let max_requests = config.requests as usize;
        Some(Self {
            max_requests,
            window: config.per,
            recent: Mutex::new(VecDeque::with_capacity(max_requests)),
        })
    }

    /// Claim a slot for a request starting now.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        let mut recent = self.recent.lock();
        while let Some(&oldest) = recent.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                recent.pop_front();
            } else {
                break;
            }
        }
        if recent.len() >= self.max_requests {
            return false;
        }
        recent.push_back(now);
        true
    }

    #[must_use]
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}
