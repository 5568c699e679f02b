use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Events kept before the oldest are dropped; a host drains them each frame.
pub const EVENT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SoundEvent {
    Frequency { timestamp_ns: f64, hz: f64 },
    LineOn,
    LineOff,
}

/// The JR-100 beeper: a square wave from VIA timer 1, switched on and off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Beeper {
    frequency: f64,
    line_on: bool,
    events: VecDeque<SoundEvent>,
}

impl Beeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn is_on(&self) -> bool {
        self.line_on
    }

    fn push(&mut self, event: SoundEvent) {
        if self.events.len() == EVENT_CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Records a tone change unless it matches the current frequency.
    /// Returns whether the frequency changed.
    pub fn set_frequency(&mut self, timestamp_ns: f64, hz: f64) -> bool {
        if (hz - self.frequency).abs() < 1e-6 {
            return false;
        }
        trace!("[BEEP] {:.2} Hz", hz);
        self.frequency = hz;
        self.push(SoundEvent::Frequency { timestamp_ns, hz });
        true
    }

    /// Timer 1 re-arms the line on every reload, so only transitions are logged.
    pub fn line_on(&mut self) {
        if !self.line_on {
            self.line_on = true;
            self.push(SoundEvent::LineOn);
        }
    }

    pub fn line_off(&mut self) {
        if self.line_on {
            self.line_on = false;
            self.push(SoundEvent::LineOff);
        }
    }

    pub fn events(&self) -> impl Iterator<Item = &SoundEvent> {
        self.events.iter()
    }

    pub fn drain_events(&mut self) -> Vec<SoundEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_order() {
        let mut beeper = Beeper::new();
        beeper.set_frequency(0.0, 440.0);
        beeper.line_on();
        beeper.line_off();

        assert_eq!(
            beeper.drain_events(),
            vec![
                SoundEvent::Frequency {
                    timestamp_ns: 0.0,
                    hz: 440.0
                },
                SoundEvent::LineOn,
                SoundEvent::LineOff,
            ]
        );
        assert_eq!(beeper.events().count(), 0);
    }

    #[test]
    fn test_repeated_frequency_is_cached() {
        let mut beeper = Beeper::new();
        assert!(beeper.set_frequency(0.0, 1000.0));
        assert!(!beeper.set_frequency(10.0, 1000.0));
        assert_eq!(beeper.events().count(), 1);
    }

    #[test]
    fn test_line_events_only_on_transition() {
        let mut beeper = Beeper::new();
        beeper.line_off();
        beeper.line_on();
        beeper.line_on();
        assert_eq!(beeper.drain_events(), vec![SoundEvent::LineOn]);
        assert!(beeper.is_on());
    }

    #[test]
    fn test_event_queue_is_bounded() {
        let mut beeper = Beeper::new();
        for _ in 0..EVENT_CAPACITY {
            beeper.line_on();
            beeper.line_off();
        }
        assert_eq!(beeper.events().count(), EVENT_CAPACITY);
    }
}
