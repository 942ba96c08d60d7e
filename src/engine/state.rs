// src/engine/state.rs

//! Restart backoff bookkeeping.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::RestartTiming;

/// Timing state that persists across child runs.
///
/// - `current_delay` is the wait before the next restart. It starts at zero,
///   jumps to `min_restart_delay` on the first escalation and is multiplied
///   by the backoff factor on every further one, capped at
///   `max_restart_delay`.
/// - `previous_start` decides whether a start is "clean": a start that comes
///   at least `clean_time` after the previous one resets the delay.
/// - `last_failure_signature` is the canonical output of the previous run.
#[derive(Debug, Clone)]
pub struct RestartState {
    timing: RestartTiming,
    current_delay: Duration,
    previous_start: Option<Instant>,
    last_failure_signature: String,
}

impl RestartState {
    pub fn new(timing: RestartTiming) -> Self {
        Self {
            timing,
            current_delay: Duration::ZERO,
            previous_start: None,
            last_failure_signature: String::new(),
        }
    }

    pub fn timing(&self) -> RestartTiming {
        self.timing
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    pub fn last_failure_signature(&self) -> &str {
        &self.last_failure_signature
    }

    /// Record a start at `now`. Returns true for a clean start, which also
    /// resets the delay.
    pub fn record_start(&mut self, now: Instant) -> bool {
        let clean = match self.previous_start {
            None => true,
            Some(prev) => now.saturating_duration_since(prev) >= self.timing.clean_time,
        };
        self.previous_start = Some(now);
        if clean {
            self.current_delay = Duration::ZERO;
        }
        clean
    }

    /// The run survived its stability window.
    pub fn mark_stable(&mut self) {
        self.current_delay = Duration::ZERO;
    }

    /// Grow the delay for the restart that is about to happen.
    pub fn escalate(&mut self) -> Duration {
        let max = self.timing.max_restart_delay;
        self.current_delay = if self.current_delay.is_zero() {
            self.timing.min_restart_delay
        } else {
            let scaled =
                self.current_delay.as_secs_f64() * self.timing.restart_delay_backoff;
            Duration::try_from_secs_f64(scaled).unwrap_or(max).min(max)
        };
        self.current_delay
    }

    /// Store the signature of the run that just ended. Returns true if it
    /// equals the previous one.
    pub fn remember_signature(&mut self, signature: String) -> bool {
        let same = signature == self.last_failure_signature;
        self.last_failure_signature = signature;
        same
    }
}
