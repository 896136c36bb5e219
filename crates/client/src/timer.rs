// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Resettable one-shot timer.
//!
//! A timer holds at most one deadline. Arming it again replaces the pending
//! deadline, which is what both typing timers need. The timer never sleeps
//! on its own: the owner selects on [`Timer::deadline`] and calls
//! [`Timer::fire`] when it wakes.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Timer {
    period: Duration,
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new(period: Duration) -> Self {
        Timer {
            period,
            deadline: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the timer, or restart it if already armed.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.period);
    }

    /// Disarm the timer. Returns true if it was armed.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the full period has passed since the last arm.
    pub fn has_elapsed(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|at| now >= at)
    }

    /// Disarm and return true if the timer has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        if self.has_elapsed(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
