use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

pub const RATE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Rate limit exceeded: at most {limit} operations per {window_secs} seconds")]
pub struct RateLimitExceeded {
    pub limit: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    pub count: u32,
    pub reset_at: Instant,
}

/// Fixed-window operation counter keyed by session id.
///
/// A window opens on the first operation and is replaced wholesale once its
/// expiry has passed. Rejected operations are not counted.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: HashMap<String, RateWindow>,
}

impl RateLimiter {
    pub fn new(limit: u32) -> Self {
        Self::with_window(limit, RATE_WINDOW)
    }

    pub fn with_window(limit: u32, window: Duration) -> Self {
        Self { limit, window, windows: HashMap::new() }
    }

    pub fn check(&mut self, session_id: &str) -> Result<(), RateLimitExceeded> {
        self.check_at(session_id, Instant::now())
    }

    pub fn check_at(&mut self, session_id: &str, now: Instant) -> Result<(), RateLimitExceeded> {
        if let Some(window) = self.windows.get_mut(session_id) {
            if now < window.reset_at {
                if window.count >= self.limit {
                    return Err(self.exceeded());
                }
                window.count += 1;
                return Ok(());
            }
        }

        if self.limit == 0 {
            return Err(self.exceeded());
        }
        self.windows.insert(
            session_id.to_string(),
            RateWindow { count: 1, reset_at: now + self.window },
        );
        Ok(())
    }

    /// Drop the window of a departed session.
    pub fn forget(&mut self, session_id: &str) {
        self.windows.remove(session_id);
    }

    fn exceeded(&self) -> RateLimitExceeded {
        RateLimitExceeded { limit: self.limit, window_secs: self.window.as_secs() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_exactly_limit_operations_per_window() {
        let mut limiter = RateLimiter::new(30);
        let start = Instant::now();
        for i in 0..30 {
            assert!(limiter.check_at("a", start + Duration::from_millis(i * 10)).is_ok(), "op {i}");
        }
        let err = limiter.check_at("a", start + Duration::from_secs(1)).unwrap_err();
        assert_eq!(err, RateLimitExceeded { limit: 30, window_secs: 60 });
        assert_eq!(limiter.windows.get("a").map(|w| w.count), Some(30));
    }

    #[test]
    fn sessions_are_limited_independently() {
        let mut limiter = RateLimiter::new(30);
        let now = Instant::now();
        for _ in 0..30 {
            limiter.check_at("a", now).unwrap();
        }
        assert!(limiter.check_at("a", now).is_err());
        for _ in 0..30 {
            assert!(limiter.check_at("b", now).is_ok());
        }
    }

    #[test]
    fn window_resets_after_expiry() {
        let mut limiter = RateLimiter::new(3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.check_at("a", start).unwrap();
        }
        assert!(limiter.check_at("a", start + Duration::from_secs(59)).is_err());

        let later = start + RATE_WINDOW;
        for _ in 0..3 {
            assert!(limiter.check_at("a", later).is_ok());
        }
        assert!(limiter.check_at("a", later).is_err());
    }

    #[test]
    fn forget_releases_the_window() {
        let mut limiter = RateLimiter::new(1);
        let now = Instant::now();
        limiter.check_at("a", now).unwrap();
        assert!(limiter.check_at("a", now).is_err());
        limiter.forget("a");
        assert!(limiter.windows.get("a").is_none());
        assert!(limiter.check_at("a", now).is_ok());
    }

    #[test]
    fn zero_limit_rejects_everything() {
        let mut limiter = RateLimiter::new(0);
        assert!(limiter.check("a").is_err());
    }
}
