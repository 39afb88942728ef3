//! Sliding-window action budget against the venue message limit.
//!
//! Every outbound command (insert, cancel, hedge) consumes one unit.
//! Optional actions that are refused are skipped until the next evaluation
//! cycle; mandatory actions (hedges) retry until admitted. The dispatcher
//! owns that loop; this type only reports when the window next frees up.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::trader::config::RateLimitConfig;

/// Rolling-window rate limiter.
///
/// Admits at most `max_actions` within any window of the configured width.
/// Timestamps are evicted lazily on each call, so the window is exact at
/// every admission decision.
#[derive(Debug)]
pub struct ActionRateLimiter {
    /// Admission timestamps, oldest first.
    window: VecDeque<Instant>,
    /// Maximum admissions per rolling window.
    max_actions: usize,
    /// Window width.
    width: Duration,
    /// Total admissions this session.
    admitted: u64,
    /// Total refusals this session.
    refused: u64,
}

impl ActionRateLimiter {
    /// Create a limiter from the session rate config.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: VecDeque::with_capacity(config.max_actions + 1),
            max_actions: config.max_actions,
            width: config.window(),
            admitted: 0,
            refused: 0,
        }
    }

    /// Attempt to admit one action now.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Attempt to admit one action at an explicit instant.
    ///
    /// Records the timestamp on admission. Exposed so tests control the
    /// clock instead of sleeping through the window.
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.evict(now);
        if self.window.len() >= self.max_actions {
            self.refused += 1;
            return false;
        }
        self.window.push_back(now);
        self.admitted += 1;
        true
    }

    /// Time until the oldest entry leaves the window, or `None` when the
    /// budget already has room. Mandatory callers sleep on this hint.
    pub fn retry_after(&mut self, now: Instant) -> Option<Duration> {
        self.evict(now);
        if self.window.len() < self.max_actions {
            return None;
        }
        self.window
            .front()
            .map(|oldest| (*oldest + self.width).saturating_duration_since(now))
    }

    /// Actions currently inside the window.
    pub fn in_flight(&self) -> usize {
        self.window.len()
    }

    /// (admitted, refused) totals for telemetry.
    pub fn totals(&self) -> (u64, u64) {
        (self.admitted, self.refused)
    }

    fn evict(&mut self, now: Instant) {
        while let Some(oldest) = self.window.front() {
            if now.duration_since(*oldest) > self.width {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }
}
