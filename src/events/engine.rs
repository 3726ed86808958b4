//! Scheduler and render pass notifications.

/// A logic tick finished its work.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogicExecuted {
    /// Ticks executed so far, this one included.
    pub tick: u64,
    /// Clock time the tick ran at, in ms.
    pub now: f64,
}

/// A frame was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRendered {
    /// Frames drawn so far, this one included.
    pub frame: u64,
    /// Sprites drawn in this frame.
    pub sprites_drawn: usize,
    /// Drawn animations showing a different frame than at their last draw.
    pub frames_advanced: usize,
}
