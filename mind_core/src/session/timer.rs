//! The single per-session round clock.

use serde::{Deserialize, Serialize};

/// One step of the round clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerTick {
    pub remaining_ms: u64,
    /// 0.0 at round start, 1.0 at expiry.
    pub pressure: f64,
    /// True only on the tick that hit zero.
    pub expired_now: bool,
}

/// Counts one round's action window down. Starting always replaces the
/// previous countdown, so at most one is ever running.
#[derive(Debug, Clone, Default)]
pub struct RoundTimer {
    window_ms: u64,
    elapsed_ms: u64,
    running: bool,
    starts: u64,
}

impl RoundTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, window_ms: u64) {
        self.cancel();
        self.window_ms = window_ms.max(1);
        self.elapsed_ms = 0;
        self.running = true;
        self.starts += 1;
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.window_ms.saturating_sub(self.elapsed_ms)
    }

    /// How many countdowns have been started.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Whether the running countdown is at least halfway through.
    pub fn past_midpoint(&self) -> bool {
        self.running && self.elapsed_ms * 2 >= self.window_ms
    }

    /// Advance the countdown. `None` when nothing is running.
    pub fn tick(&mut self, delta_ms: u64) -> Option<TimerTick> {
        if !self.running {
            return None;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms).min(self.window_ms);
        let expired_now = self.elapsed_ms >= self.window_ms;
        if expired_now {
            self.running = false;
        }
        Some(TimerTick {
            remaining_ms: self.remaining_ms(),
            pressure: self.elapsed_ms as f64 / self.window_ms as f64,
            expired_now,
        })
    }
}
