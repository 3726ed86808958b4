//! Time-interpolated movement from a start coordinate to an end coordinate.
//!
//! Progress is the elapsed time since the last (re)start divided by the
//! traversal duration, added to the progress saved at the last pause and
//! clamped to 1. Completion is a deadline polled by [`MovingVector::update`];
//! it fires exactly once and leaves the vector inert until [`MovingVector::stop`].
//!
//! State machine:
//!
//! ```text
//! Idle --start--> Moving --pause--> Paused --resume/start--> Moving
//! Moving --deadline reached--> Completed
//! any --stop--> Idle
//! ```

use crate::components::coordinates::Coordinate;
use crate::error::{EngineError, Result};
use crate::events::distributor::EventDistributor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorState {
    Idle,
    Moving,
    Paused,
    Completed,
}

#[derive(Debug)]
pub struct MovingVector {
    start: Coordinate,
    end: Coordinate,
    /// Duration of the whole start-to-end traversal in milliseconds.
    duration_ms: f64,
    saved_progress: f64,
    time_start: f64,
    /// When the pending completion fires; `None` means no timer is armed.
    deadline: Option<f64>,
    state: VectorState,
    /// Fired once when the vector reaches its end coordinate.
    pub completed: EventDistributor<()>,
}

impl MovingVector {
    /// Create an idle vector. The duration must be positive and finite.
    pub fn new(start: Coordinate, end: Coordinate, duration_ms: f64) -> Result<Self> {
        if !(duration_ms.is_finite() && duration_ms > 0.0) {
            return Err(EngineError::Configuration(format!(
                "moving vector duration must be positive, got {} ms",
                duration_ms
            )));
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(EngineError::Configuration(
                "moving vector coordinates must be finite".into(),
            ));
        }
        Ok(Self {
            start,
            end,
            duration_ms,
            saved_progress: 0.0,
            time_start: 0.0,
            deadline: None,
            state: VectorState::Idle,
            completed: EventDistributor::new(),
        })
    }

    pub fn state(&self) -> VectorState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == VectorState::Moving
    }

    pub fn is_completed(&self) -> bool {
        self.state == VectorState::Completed
    }

    pub fn start_coordinates(&self) -> Coordinate {
        self.start
    }

    pub fn end_coordinates(&self) -> Coordinate {
        self.end
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn saved_progress(&self) -> f64 {
        self.saved_progress
    }

    /// Time at which the pending completion fires, if one is armed.
    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    /// Idle/Paused -> Moving. Returns false when already moving or completed.
    pub fn start(&mut self, now: f64) -> bool {
        match self.state {
            VectorState::Idle | VectorState::Paused => {
                self.arm(now);
                true
            }
            VectorState::Moving | VectorState::Completed => false,
        }
    }

    /// Moving -> Paused: snapshot progress and cancel the pending completion.
    /// Pausing a vector that is not moving changes nothing.
    pub fn pause(&mut self, now: f64) {
        if self.state != VectorState::Moving {
            return;
        }
        self.saved_progress = self.progress(now);
        self.deadline = None;
        self.state = VectorState::Paused;
    }

    /// Paused -> Moving when the saved progress lies strictly inside (0, 1).
    pub fn resume(&mut self, now: f64) -> bool {
        if self.state != VectorState::Paused
            || self.saved_progress <= 0.0
            || self.saved_progress >= 1.0
        {
            return false;
        }
        self.arm(now);
        true
    }

    /// Any -> Idle, forgetting all progress.
    pub fn stop(&mut self) {
        self.saved_progress = 0.0;
        self.deadline = None;
        self.state = VectorState::Idle;
    }

    /// Overwrite the saved progress. Progress only moves forward; a lower
    /// value or one outside [0, 1] is rejected. A moving vector restarts its
    /// timing from `now` at the new progress.
    pub fn set_saved_progress(&mut self, progress: f64, now: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&progress) {
            return Err(EngineError::InvariantViolation(format!(
                "saved progress {} outside [0, 1]",
                progress
            )));
        }
        if progress < self.saved_progress {
            return Err(EngineError::InvariantViolation(format!(
                "saved progress cannot decrease ({} -> {})",
                self.saved_progress, progress
            )));
        }
        self.saved_progress = progress;
        if self.state == VectorState::Moving {
            self.arm(now);
        }
        Ok(())
    }

    /// Fraction of the path covered at `now`, in [0, 1].
    pub fn progress(&self, now: f64) -> f64 {
        match self.state {
            VectorState::Moving => {
                let elapsed = (now - self.time_start).max(0.0);
                (self.saved_progress + elapsed / self.duration_ms).min(1.0)
            }
            VectorState::Completed => 1.0,
            VectorState::Idle | VectorState::Paused => self.saved_progress,
        }
    }

    /// Interpolated position at `now`.
    pub fn actual_coordinates(&self, now: f64) -> Coordinate {
        self.start.lerp(self.end, self.progress(now) as f32)
    }

    /// Retarget the vector. The new leg starts from the position reached at
    /// `now`, so the sprite does not jump. A moving vector keeps moving with
    /// fresh timing; any other state falls back to Idle.
    pub fn set_end_coordinates(&mut self, end: Coordinate, now: f64) {
        let here = self.actual_coordinates(now);
        self.start = here;
        self.end = end;
        self.saved_progress = 0.0;
        if self.state == VectorState::Moving {
            self.arm(now);
        } else {
            self.deadline = None;
            self.state = VectorState::Idle;
        }
    }

    /// Poll the completion timer. Returns true on the call that completes
    /// the vector; the `completed` event is published on that call only.
    pub fn update(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if self.state == VectorState::Moving && now >= deadline => {
                self.deadline = None;
                self.saved_progress = 1.0;
                self.state = VectorState::Completed;
                self.completed.notify();
                true
            }
            _ => false,
        }
    }

    fn arm(&mut self, now: f64) {
        self.time_start = now;
        self.deadline = Some(now + (1.0 - self.saved_progress) * self.duration_ms);
        self.state = VectorState::Moving;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const EPSILON: f32 = 1e-3;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vector() -> MovingVector {
        MovingVector::new(Coordinate::new(0.0, 0.0), Coordinate::new(100.0, 0.0), 1000.0)
            .unwrap()
    }

    #[test]
    fn rejects_non_positive_duration() {
        let err = MovingVector::new(Coordinate::origin(), Coordinate::new(1.0, 1.0), 0.0);
        assert!(matches!(err, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn interpolates_halfway_and_completes_once() {
        let fired = Rc::new(Cell::new(0));
        let mut v = vector();
        let f = fired.clone();
        v.completed.subscribe(move |_| f.set(f.get() + 1));

        assert!(v.start(0.0));
        let mid = v.actual_coordinates(500.0);
        assert!(approx_eq(mid.x, 50.0));
        assert!(approx_eq(mid.y, 0.0));

        assert!(!v.update(999.0));
        assert!(v.update(1000.0));
        assert!(!v.update(1500.0));
        assert_eq!(fired.get(), 1);
        assert!(v.is_completed());
        assert!(approx_eq(v.actual_coordinates(2000.0).x, 100.0));
    }

    #[test]
    fn progress_clamps_to_one() {
        let mut v = vector();
        v.start(0.0);
        assert_eq!(v.progress(5000.0), 1.0);
    }

    #[test]
    fn pause_twice_keeps_saved_progress() {
        let mut v = vector();
        v.start(0.0);
        v.pause(250.0);
        let first = v.saved_progress();
        v.pause(900.0);
        assert_eq!(v.saved_progress(), first);
        assert!((first - 0.25).abs() < 1e-9);
        assert_eq!(v.deadline(), None);
    }

    #[test]
    fn resume_continues_from_saved_progress() {
        let mut v = vector();
        v.start(0.0);
        v.pause(400.0);
        assert!(v.resume(10_000.0));
        assert!(approx_eq(v.actual_coordinates(10_100.0).x, 50.0));
        let deadline = v.deadline().unwrap();
        assert!((deadline - 10_600.0).abs() < 1e-6);
    }

    #[test]
    fn resume_fails_when_never_paused_or_complete() {
        let mut v = vector();
        assert!(!v.resume(0.0));
        v.start(0.0);
        assert!(!v.resume(10.0));
        v.update(1000.0);
        assert!(!v.resume(1001.0));
    }

    #[test]
    fn saved_progress_never_decreases() {
        let mut v = vector();
        v.set_saved_progress(0.5, 0.0).unwrap();
        let err = v.set_saved_progress(0.25, 0.0);
        assert!(matches!(err, Err(EngineError::InvariantViolation(_))));
        assert!(v.set_saved_progress(1.5, 0.0).is_err());
        v.stop();
        assert_eq!(v.saved_progress(), 0.0);
        assert!(v.set_saved_progress(0.1, 0.0).is_ok());
    }

    #[test]
    fn retarget_starts_from_current_position() {
        let mut v = vector();
        v.start(0.0);
        v.set_end_coordinates(Coordinate::new(50.0, 100.0), 500.0);

        let here = v.actual_coordinates(500.0);
        assert!(approx_eq(here.x, 50.0));
        assert!(approx_eq(here.y, 0.0));
        assert!(v.is_moving());

        let later = v.actual_coordinates(1000.0);
        assert!(approx_eq(later.x, 50.0));
        assert!(approx_eq(later.y, 50.0));
        assert_eq!(v.deadline(), Some(1500.0));
    }

    #[test]
    fn stop_returns_to_idle() {
        let mut v = vector();
        v.start(0.0);
        v.update(2000.0);
        v.stop();
        assert_eq!(v.state(), VectorState::Idle);
        assert!(v.start(3000.0));
    }
}
