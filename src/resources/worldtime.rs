//! Time sources and the per-tick time snapshot.
//!
//! Everything time-dependent in the engine takes `now` in milliseconds from
//! a [`Clock`]. Production uses [`SystemClock`]; tests drive a
//! [`ManualClock`] so nothing ever sleeps.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Time as seen by the logic tick currently running.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldTime {
    /// Clock time of the tick, in ms.
    pub elapsed_ms: f64,
    /// Time since the previous tick, in ms.
    pub delta_ms: f64,
    /// Logic ticks executed so far.
    pub tick_count: u64,
}

impl WorldTime {
    pub(crate) fn advance_to(&mut self, now: f64) {
        self.delta_ms = if self.tick_count == 0 {
            0.0
        } else {
            now - self.elapsed_ms
        };
        self.elapsed_ms = now;
        self.tick_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(16.5);
        assert_eq!(other.now_ms(), 16.5);
        other.set(100.0);
        assert_eq!(clock.now_ms(), 100.0);
    }

    #[test]
    fn world_time_tracks_deltas() {
        let mut time = WorldTime::default();
        time.advance_to(1000.0);
        assert_eq!(time.delta_ms, 0.0);
        time.advance_to(1016.0);
        assert_eq!(time.delta_ms, 16.0);
        assert_eq!(time.tick_count, 2);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
