use serde::{Deserialize, Serialize};

use crate::jr100::CPU_CLOCK_HZ;

pub const REFRESH_RATE: f64 = 60.0;
pub const GAMEPAD_POLL_RATE: f64 = 120.0;

/// Periodic host-side work due at a given cycle count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    Refresh,
    GamepadPoll,
}

/// Master cycle counter and the periodic events derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    /// Total CPU cycles executed
    total_cycles: u64,

    frequency: u32,
    refresh_interval: u64,
    gamepad_interval: u64,
    next_refresh: u64,
    next_gamepad_poll: u64,

    frame_count: u64,
}

fn interval(frequency: u32, rate: f64) -> u64 {
    ((frequency as f64 / rate) as u64).max(1)
}

impl Clock {
    pub fn new(frequency: u32, refresh_rate: f64) -> Self {
        let refresh_interval = interval(frequency, refresh_rate);
        let gamepad_interval = interval(frequency, GAMEPAD_POLL_RATE);
        Self {
            total_cycles: 0,
            frequency,
            refresh_interval,
            gamepad_interval,
            next_refresh: refresh_interval,
            next_gamepad_poll: gamepad_interval,
            frame_count: 0,
        }
    }

    /// Restarts counting from cycle zero, keeping the configured rates.
    pub fn reset(&mut self) {
        self.total_cycles = 0;
        self.frame_count = 0;
        self.next_refresh = self.refresh_interval;
        self.next_gamepad_poll = self.gamepad_interval;
    }

    /// Advance the clock by the specified number of CPU cycles
    pub fn tick(&mut self, cycles: u32) -> Vec<ClockEvent> {
        let mut triggered_events = Vec::new();
        self.total_cycles += cycles as u64;

        while self.next_gamepad_poll <= self.total_cycles {
            self.next_gamepad_poll += self.gamepad_interval;
            triggered_events.push(ClockEvent::GamepadPoll);
        }
        while self.next_refresh <= self.total_cycles {
            self.next_refresh += self.refresh_interval;
            self.frame_count += 1;
            triggered_events.push(ClockEvent::Refresh);
        }

        triggered_events
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn refresh_interval(&self) -> u64 {
        self.refresh_interval
    }

    /// Emulated time since the last reset.
    pub fn elapsed_ns(&self) -> f64 {
        self.total_cycles as f64 * 1e9 / self.frequency as f64
    }

    /// Progress through the current refresh period (0.0 - 1.0)
    pub fn frame_progress(&self) -> f64 {
        let remaining = self.next_refresh - self.total_cycles;
        1.0 - remaining as f64 / self.refresh_interval as f64
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(CPU_CLOCK_HZ, REFRESH_RATE)
    }
}
