//! Polling priority and backoff schedules
//!
//! An action starts on the high-priority schedule: short interval, bounded
//! attempt count (a fixed wall-clock budget). When that budget runs out the
//! action downgrades once to the low-priority schedule: longer interval,
//! unbounded attempts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Polling priority of a pending action. One-way: `High` downgrades to
/// `Low` at most once and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Low,
}

/// One polling pass: how often to ask and how many times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    /// `None` polls indefinitely until a document appears.
    pub attempts: Option<u32>,
}

impl PollSchedule {
    #[inline]
    #[must_use]
    pub fn bounded(interval: Duration, attempts: u32) -> Self {
        Self {
            interval,
            attempts: Some(attempts),
        }
    }

    #[inline]
    #[must_use]
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            attempts: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.attempts.is_some()
    }
}

/// Tunables for the retry protocol.
#[derive(Debug, Clone)]
pub struct ActionConfig {
    /// Interval between high-priority attempts.
    pub high_interval: Duration,
    /// High-priority attempt budget before the downgrade.
    pub high_attempts: u32,
    /// Interval between low-priority attempts.
    pub low_interval: Duration,
}

impl ActionConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_high_schedule(mut self, interval: Duration, attempts: u32) -> Self {
        self.high_interval = interval;
        self.high_attempts = attempts;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_low_interval(mut self, interval: Duration) -> Self {
        self.low_interval = interval;
        self
    }

    /// The schedule for one polling pass under the given priority.
    #[must_use]
    pub fn schedule(&self, priority: Priority) -> PollSchedule {
        match priority {
            Priority::High => PollSchedule::bounded(self.high_interval, self.high_attempts),
            Priority::Low => PollSchedule::unbounded(self.low_interval),
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        // High budget: 24 attempts at 5s, roughly two minutes wall-clock.
        Self {
            high_interval: Duration::from_secs(5),
            high_attempts: 24,
            low_interval: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_schedule_is_bounded() {
        let config = ActionConfig::default();
        let schedule = config.schedule(Priority::High);
        assert!(schedule.is_bounded());
        assert_eq!(schedule.attempts, Some(24));
    }

    #[test]
    fn low_schedule_is_unbounded() {
        let config = ActionConfig::default();
        let schedule = config.schedule(Priority::Low);
        assert!(!schedule.is_bounded());
        assert_eq!(schedule.interval, Duration::from_secs(60));
    }

    #[test]
    fn builders_override_defaults() {
        let config = ActionConfig::new()
            .with_high_schedule(Duration::from_millis(10), 3)
            .with_low_interval(Duration::from_millis(50));
        assert_eq!(config.schedule(Priority::High).attempts, Some(3));
        assert_eq!(
            config.schedule(Priority::Low).interval,
            Duration::from_millis(50)
        );
    }
}
