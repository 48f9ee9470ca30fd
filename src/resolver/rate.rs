// src/resolver/rate.rs
// =============================================================================
// Tracks how many requests the workers have issued and how fast.
//
// Every worker bumps the same counter, so it is an AtomicU64: increments
// from many threads never get lost, and reading it never blocks a worker.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counts resolution attempts since the resolver was created.
#[derive(Debug)]
pub struct RateCounter {
    attempts: AtomicU64,
    started: Instant,
}

/// A point-in-time view of the counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSnapshot {
    pub attempts: u64,
    pub elapsed: Duration,
    pub per_second: f64,
}

impl RateCounter {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub(crate) fn started_at(started: Instant) -> Self {
        Self {
            attempts: AtomicU64::new(0),
            started,
        }
    }

    /// Records one attempt. Called once per request, before it is sent.
    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Requests per second since the counter was created.
    pub fn current_rate(&self) -> f64 {
        self.snapshot().per_second
    }

    pub fn snapshot(&self) -> RateSnapshot {
        let attempts = self.attempts();
        let elapsed = self.started.elapsed();
        RateSnapshot {
            attempts,
            elapsed,
            per_second: per_second(attempts, elapsed),
        }
    }
}

impl Default for RateCounter {
    fn default() -> Self {
        Self::new()
    }
}

// Zero elapsed time would divide by zero, report 0 req/s instead
fn per_second(attempts: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        attempts as f64 / secs
    } else {
        0.0
    }
}
