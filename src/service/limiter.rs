//! Global cooldown rate limiter.
//!
//! One window shared by every caller: a request is rejected when less than
//! `window` has passed since the last accepted request.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Minimum spacing between accepted lookups.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct CooldownLimiter {
    window: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl CooldownLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(None),
        }
    }

    /// Accepts the request and restarts the window, or rejects it.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Like `try_acquire`, against an explicit clock reading.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match *last {
            Some(previous) if now.saturating_duration_since(previous) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

impl Default for CooldownLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_WINDOW)
    }
}
