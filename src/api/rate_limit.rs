use crate::settings::RateLimit;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Entries are swept once the table grows past this many clients.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client address.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        RateLimiter {
            max_requests,
            window,
            windows: DashMap::new(),
        }
    }

    /// Counts one request. On refusal returns the seconds until the window resets.
    pub fn try_acquire(&self, key: &str) -> Result<(), u64> {
        self.try_acquire_at(key, Instant::now())
    }

    fn try_acquire_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        let window = entry.value_mut();
        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.max_requests {
            let reset = self.window.saturating_sub(now.duration_since(window.started));
            return Err(reset.as_secs().max(1));
        }
        window.count += 1;
        Ok(())
    }

    /// Gives back one request, e.g. after a successful login.
    pub fn release(&self, key: &str) {
        if let Some(mut entry) = self.windows.get_mut(key) {
            let window = entry.value_mut();
            window.count = window.count.saturating_sub(1);
        }
    }

    fn sweep(&self, now: Instant) {
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }
}

impl From<RateLimit> for RateLimiter {
    fn from(limit: RateLimit) -> Self {
        RateLimiter::new(limit.max_requests, Duration::from_secs(limit.window_secs))
    }
}
