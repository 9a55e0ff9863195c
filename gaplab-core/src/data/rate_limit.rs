//! Delay-based request throttle for provider politeness.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Enforces a minimum gap between consecutive requests.
///
/// `wait` blocks the calling thread until the gap since the previous
/// request has elapsed, then claims the next slot. The slot bookkeeping
/// sits behind a mutex so one limiter can be shared across threads.
#[derive(Debug)]
pub struct RateLimiter {
    min_gap: Duration,
    next_allowed: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            next_allowed: Mutex::new(None),
        }
    }

    /// Block until a request slot is free and claim it.
    pub fn wait(&self) {
        let mut next = self.next_allowed.lock().unwrap();
        if let Some(at) = *next {
            let now = Instant::now();
            if now < at {
                std::thread::sleep(at - now);
            }
        }
        *next = Some(Instant::now() + self.min_gap);
    }
}
