//! Frame-cycling animation over a single-row sprite sheet.
//!
//! The frame clock advances `frame_index` by one every `frame_duration_ms`.
//! On a tick at the last frame the animation publishes `completed` instead of
//! advancing; a looping animation then restarts at frame 0, a one-shot
//! animation stops and stays on its last frame.

use std::cell::Cell;

use crate::components::coordinates::Rect;
use crate::error::{EngineError, Result};
use crate::events::distributor::EventDistributor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Stopped,
    PlayingOnce,
    Looping,
    Paused,
}

#[derive(Debug)]
pub struct SpriteAnimation {
    frame_count: usize,
    frame_duration_ms: f64,
    /// Pixel width of one frame in the source image.
    frame_width: f32,
    frame_index: usize,
    active: bool,
    looping: bool,
    paused: bool,
    next_frame_at: Option<f64>,
    /// Time left until the next frame when the clock was paused.
    remaining_ms: Option<f64>,
    frame_due: Cell<bool>,
    pub completed: EventDistributor<()>,
}

impl SpriteAnimation {
    pub fn new(frame_count: usize, frame_duration_ms: f64, frame_width: f32) -> Result<Self> {
        if frame_count == 0 {
            return Err(EngineError::Configuration(
                "animation needs at least one frame".into(),
            ));
        }
        if !(frame_duration_ms.is_finite() && frame_duration_ms > 0.0) {
            return Err(EngineError::Configuration(format!(
                "animation frame duration must be positive, got {} ms",
                frame_duration_ms
            )));
        }
        if !(frame_width.is_finite() && frame_width > 0.0) {
            return Err(EngineError::Configuration(format!(
                "animation frame width must be positive, got {}",
                frame_width
            )));
        }
        Ok(Self {
            frame_count,
            frame_duration_ms,
            frame_width,
            frame_index: 0,
            active: false,
            looping: false,
            paused: false,
            next_frame_at: None,
            remaining_ms: None,
            frame_due: Cell::new(true),
            completed: EventDistributor::new(),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn frame_duration_ms(&self) -> f64 {
        self.frame_duration_ms
    }

    pub fn frame_width(&self) -> f32 {
        self.frame_width
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn state(&self) -> AnimationState {
        if self.paused {
            AnimationState::Paused
        } else if !self.active {
            AnimationState::Stopped
        } else if self.looping {
            AnimationState::Looping
        } else {
            AnimationState::PlayingOnce
        }
    }

    /// Play through the frames once.
    pub fn play(&mut self, now: f64) {
        self.looping = false;
        self.begin(now);
    }

    /// Play and restart from frame 0 after every completion.
    pub fn play_loop(&mut self, now: f64) {
        self.looping = true;
        self.begin(now);
    }

    /// Freeze the frame clock without touching the frame index.
    pub fn pause(&mut self, now: f64) {
        if !self.active || self.paused {
            return;
        }
        self.remaining_ms = self.next_frame_at.map(|at| (at - now).max(0.0));
        self.next_frame_at = None;
        self.paused = true;
    }

    pub fn resume(&mut self, now: f64) -> bool {
        if !self.paused {
            return false;
        }
        let remaining = self.remaining_ms.take().unwrap_or(self.frame_duration_ms);
        self.next_frame_at = Some(now + remaining);
        self.paused = false;
        true
    }

    /// Back to frame 0; clears the active and loop flags.
    pub fn stop(&mut self) {
        self.frame_index = 0;
        self.active = false;
        self.looping = false;
        self.paused = false;
        self.next_frame_at = None;
        self.remaining_ms = None;
        self.frame_due.set(true);
    }

    /// Run the frame clock up to `now`. Returns how many completions fired.
    pub fn update(&mut self, now: f64) -> usize {
        let mut completions = 0;
        // Enough steps for one full cycle; a longer stall realigns the clock.
        let mut budget = self.frame_count + 1;
        while let Some(at) = self.next_frame_at {
            if now < at || !self.active {
                break;
            }
            if budget == 0 {
                self.next_frame_at = Some(now + self.frame_duration_ms);
                break;
            }
            budget -= 1;
            self.next_frame_at = Some(at + self.frame_duration_ms);
            if self.frame_index + 1 < self.frame_count {
                self.frame_index += 1;
                self.frame_due.set(true);
            } else {
                completions += 1;
                self.completed.notify();
                if self.looping {
                    self.frame_index = 0;
                    self.frame_due.set(true);
                } else {
                    self.active = false;
                    self.next_frame_at = None;
                }
            }
        }
        completions
    }

    /// Consume the "new frame to draw" flag. The render pass calls this once
    /// per frame.
    pub fn take_frame_due(&self) -> bool {
        self.frame_due.replace(false)
    }

    /// Source rectangle of the current frame in a sheet of `image_height`.
    pub fn source_rect(&self, image_height: f32) -> Rect {
        Rect::new(
            self.frame_width * self.frame_index as f32,
            0.0,
            self.frame_width,
            image_height,
        )
    }

    /// Starting from Stopped rewinds to frame 0; a running or paused clock
    /// keeps its frame.
    fn begin(&mut self, now: f64) {
        if !self.active {
            self.frame_index = 0;
            self.frame_due.set(true);
        }
        self.active = true;
        self.paused = false;
        self.remaining_ms = None;
        self.next_frame_at = Some(now + self.frame_duration_ms);
    }
}
