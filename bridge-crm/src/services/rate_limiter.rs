//! Per-client request limiting for `POST /sync`
//!
//! Fixed window: the first request from a key opens a window; up to
//! `max_requests` are allowed inside it; the next request after the window
//! ends opens a fresh one. State is process-local.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::RateLimitConfig;

pub trait RateLimiter: Send + Sync {
    /// Count one request for `key`; false when the key is over its limit
    fn check_and_consume(&self, key: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// [`RateLimiter::check_and_consume`] against an explicit clock
    pub fn check_and_consume_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Drop expired entries so the map stays bounded by active clients
        if windows.len() > 1024 {
            windows.retain(|_, w| w.reset_at > now);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + self.window,
        });
        if now >= entry.reset_at {
            *entry = Window {
                count: 0,
                reset_at: now + self.window,
            };
        }

        if entry.count >= self.max_requests {
            debug!(key, "Rate limit exceeded");
            return false;
        }
        entry.count += 1;
        true
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.windows
            .lock()
            .map(|w| w.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check_and_consume(&self, key: &str) -> bool {
        self.check_and_consume_at(key, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(RateLimitConfig::default())
    }

    #[test]
    fn test_eleventh_request_in_window_is_refused() {
        let limiter = limiter();
        let t0 = Instant::now();
        for i in 0..10 {
            assert!(limiter.check_and_consume_at("10.0.0.1", t0 + Duration::from_secs(i)));
        }
        assert!(!limiter.check_and_consume_at("10.0.0.1", t0 + Duration::from_secs(30)));
    }

    #[test]
    fn test_window_reset_allows_again() {
        let limiter = limiter();
        let t0 = Instant::now();
        for _ in 0..11 {
            limiter.check_and_consume_at("10.0.0.1", t0);
        }
        assert!(!limiter.check_and_consume_at("10.0.0.1", t0 + Duration::from_secs(59)));
        assert!(limiter.check_and_consume_at("10.0.0.1", t0 + Duration::from_secs(60)));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter();
        let t0 = Instant::now();
        for _ in 0..10 {
            limiter.check_and_consume_at("a", t0);
        }
        assert!(!limiter.check_and_consume_at("a", t0));
        assert!(limiter.check_and_consume_at("b", t0));
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_configured_limit() {
        let limiter = FixedWindowRateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(5),
        });
        let t0 = Instant::now();
        assert!(limiter.check_and_consume_at("k", t0));
        assert!(limiter.check_and_consume_at("k", t0));
        assert!(!limiter.check_and_consume_at("k", t0));
        assert!(limiter.check_and_consume_at("k", t0 + Duration::from_secs(5)));
    }
}
