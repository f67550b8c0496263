//! Keyed fixed-window rate limiting.
//!
//! Counters are keyed by `(action, subject)` and reset once their window has
//! elapsed on the injected clock.

use agora_reputation::Clock;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Forced tier recalculations allowed per user per window.
pub const RECALC_MAX_PER_WINDOW: u32 = 10;

/// Length of the forced-recalculation window.
pub const RECALC_WINDOW_SECS: i64 = 60;

/// How often elapsed windows are swept.
pub const LIMITER_CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: DateTime<Utc>,
    hits: u32,
}

/// Fixed-window counter per `(action, subject)`.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    window: Duration,
    max_hits: u32,
    windows: DashMap<(String, String), Window>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>, window: Duration, max_hits: u32) -> Self {
        Self {
            clock,
            window,
            max_hits,
            windows: DashMap::new(),
        }
    }

    /// Record a hit and report whether it is within the limit.
    pub fn check(&self, action: &str, subject: &str) -> bool {
        let now = self.clock.now();
        let mut entry = self
            .windows
            .entry((action.to_string(), subject.to_string()))
            .or_insert(Window {
                started_at: now,
                hits: 0,
            });

        if now - entry.started_at >= self.window {
            *entry = Window {
                started_at: now,
                hits: 0,
            };
        }
        if entry.hits >= self.max_hits {
            return false;
        }
        entry.hits += 1;
        true
    }

    /// Drop windows that have already elapsed.
    pub fn cleanup(&self) {
        let now = self.clock.now();
        self.windows.retain(|_, w| now - w.started_at < self.window);
    }

    /// Forget every counter.
    pub fn reset(&self) {
        self.windows.clear();
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_reputation::ManualClock;

    fn limiter(clock: Arc<ManualClock>) -> RateLimiter {
        RateLimiter::new(clock, Duration::seconds(60), 2)
    }

    #[test]
    fn blocks_after_limit_until_window_resets() {
        let clock = Arc::new(ManualClock::new(
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let limiter = limiter(clock.clone());

        assert!(limiter.check("recalc_tier", "alice"));
        assert!(limiter.check("recalc_tier", "alice"));
        assert!(!limiter.check("recalc_tier", "alice"));

        // Other keys are independent
        assert!(limiter.check("recalc_tier", "bob"));
        assert!(limiter.check("preview", "alice"));

        clock.advance(Duration::seconds(59));
        assert!(!limiter.check("recalc_tier", "alice"));
        clock.advance(Duration::seconds(1));
        assert!(limiter.check("recalc_tier", "alice"));
    }

    #[test]
    fn cleanup_and_reset() {
        let clock = Arc::new(ManualClock::new(
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let limiter = limiter(clock.clone());
        limiter.check("a", "x");
        clock.advance(Duration::seconds(30));
        limiter.check("a", "y");
        assert_eq!(limiter.len(), 2);

        clock.advance(Duration::seconds(30));
        limiter.cleanup();
        assert_eq!(limiter.len(), 1);

        limiter.reset();
        assert!(limiter.is_empty());
        assert!(limiter.check("a", "y"));
    }
}
