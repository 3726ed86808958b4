//! Fixed-rate logic scheduler.
//!
//! The scheduler is a re-arming deadline: each time the clock passes
//! `next_tick_at` a tick becomes due and the deadline moves one interval
//! forward. The host polls [`Scheduler::due_ticks`] from its loop; the
//! [`Engine`](crate::engine::Engine) runs the actual tick work.
//!
//! Pausing only suppresses tick work. Deadlines keep re-arming, so resuming
//! does not trigger a burst of catch-up ticks.

use log::{debug, warn};
use smallvec::SmallVec;

use crate::error::{EngineError, Result};
use crate::events::distributor::EventDistributor;
use crate::events::engine::LogicExecuted;
use crate::resources::worldtime::WorldTime;

/// Tick times returned by one poll.
pub type DueTicks = SmallVec<[f64; 8]>;

#[derive(Debug)]
pub struct Scheduler {
    interval_ms: f64,
    max_catch_up: u32,
    next_tick_at: Option<f64>,
    paused: bool,
    time: WorldTime,
    skipped_ticks: u64,
    /// Per-tick subscribers, run first in every tick.
    pub step: EventDistributor<()>,
    /// Published at the end of every executed tick.
    pub logic_executed: EventDistributor<LogicExecuted>,
}

impl Scheduler {
    pub fn new(interval_ms: f64, max_catch_up: u32) -> Result<Self> {
        if !(interval_ms.is_finite() && interval_ms > 0.0) {
            return Err(EngineError::Configuration(format!(
                "tick interval must be positive, got {} ms",
                interval_ms
            )));
        }
        Ok(Self {
            interval_ms,
            max_catch_up: max_catch_up.max(1),
            next_tick_at: None,
            paused: false,
            time: WorldTime::default(),
            skipped_ticks: 0,
            step: EventDistributor::new(),
            logic_executed: EventDistributor::new(),
        })
    }

    pub fn from_rate(ticks_per_second: u32, max_catch_up: u32) -> Result<Self> {
        if ticks_per_second == 0 {
            return Err(EngineError::Configuration("tick rate must be positive".into()));
        }
        Self::new(1000.0 / ticks_per_second as f64, max_catch_up)
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Arm the first tick at `now`.
    pub fn start(&mut self, now: f64) {
        if self.next_tick_at.is_none() {
            debug!("[scheduler] started, {} ms per tick", self.interval_ms);
            self.next_tick_at = Some(now);
        }
    }

    pub fn stop(&mut self) {
        self.next_tick_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_tick_at.is_some()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Logic ticks executed so far.
    pub fn ticks_executed(&self) -> u64 {
        self.time.tick_count
    }

    /// Ticks dropped because the host fell too far behind.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    pub fn time(&self) -> WorldTime {
        self.time
    }

    /// Tick times that came due up to `now`, oldest first, at most
    /// `max_catch_up` of them. The deadline is re-armed past `now` either way.
    pub fn due_ticks(&mut self, now: f64) -> DueTicks {
        let mut due = DueTicks::new();
        let Some(mut next) = self.next_tick_at else {
            return due;
        };
        while next <= now {
            if due.len() as u32 == self.max_catch_up {
                let behind = ((now - next) / self.interval_ms).floor() as u64 + 1;
                warn!("[scheduler] {} tick(s) behind, skipping ahead", behind);
                self.skipped_ticks += behind;
                next += behind as f64 * self.interval_ms;
                break;
            }
            due.push(next);
            next += self.interval_ms;
        }
        self.next_tick_at = Some(next);
        due
    }

    /// Milliseconds until the next tick is due; zero if overdue.
    pub fn time_until_next_tick(&self, now: f64) -> Option<f64> {
        self.next_tick_at.map(|next| (next - now).max(0.0))
    }

    /// Record the tick and run the per-tick subscribers.
    pub fn begin_tick(&mut self, now: f64) -> WorldTime {
        self.time.advance_to(now);
        self.step.notify();
        self.time
    }

    /// Announce that the tick started by [`Scheduler::begin_tick`] is done.
    pub fn finish_tick(&mut self) {
        let payload = LogicExecuted {
            tick: self.time.tick_count,
            now: self.time.elapsed_ms,
        };
        self.logic_executed.publish(&payload);
    }
}
