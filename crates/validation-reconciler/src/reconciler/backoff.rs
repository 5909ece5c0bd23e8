//! Bounded exponential backoff for list calls.

use std::time::Duration;

/// Retry schedule: `steps` attempts in total, delays growing by `factor` up to `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub steps: u32,
    pub initial_delay: Duration,
    pub factor: u32,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            steps: 4,
            initial_delay: Duration::from_millis(10),
            factor: 5,
            max_delay: Duration::from_secs(2),
        }
    }
}

impl BackoffPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            steps: 1,
            ..Self::default()
        }
    }

    /// Delays to wait before each retry; yields `steps - 1` values.
    pub fn delays(&self) -> Backoff {
        Backoff {
            next: self.initial_delay.min(self.max_delay),
            remaining: self.steps.saturating_sub(1),
            factor: self.factor,
            max_delay: self.max_delay,
        }
    }
}

/// Iterator over the delays of one retry sequence.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    remaining: u32,
    factor: u32,
    max_delay: Duration,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next;
        self.next = self.next.saturating_mul(self.factor).min(self.max_delay);
        Some(current)
    }
}
