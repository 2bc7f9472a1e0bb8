//! Fixed-window request counting per client key
//!
//! Constructed once at startup and shared through `AppState`; nothing here
//! is global. Windows that have expired are swept whenever the number of
//! tracked keys reaches the configured capacity.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    max_keys: usize,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, max_keys: usize) -> Self {
        if max_requests == 0 {
            tracing::warn!("Rate limiter initialized with a limit of 0, no rate limiting applied");
        }
        Self {
            max_requests,
            window,
            max_keys: max_keys.max(1),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one request for `key` at `now`.
    ///
    /// Returns `Err(retry_after)` once the key has used up its window.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        if self.max_requests == 0 {
            return Ok(());
        }

        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("Rate limiter lock poisoned, recovering");
                poisoned.into_inner()
            }
        };

        if windows.len() >= self.max_keys && !windows.contains_key(key) {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.started);
            return Err(self.window.saturating_sub(elapsed));
        }
        entry.count += 1;
        Ok(())
    }

    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    /// Number of client keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }
}
