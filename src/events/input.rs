//! Normalized pointer input.
//!
//! The host translates platform mouse/touch/wheel events into [`InputEvent`]
//! values carrying only device coordinates (and a zoom delta for the wheel).
//! The engine never sees platform event objects. Sprites receive
//! [`PointerEvent`] payloads on their `mouse_click` / `mouse_move` hooks.

use crate::components::coordinates::Coordinate;

/// Pointer input already reduced to plain coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    Click { x: f32, y: f32 },
    TouchStart { x: f32, y: f32 },
    TouchMove { x: f32, y: f32 },
    TouchEnd { x: f32, y: f32 },
    TouchCancel,
    /// `delta` is a relative zoom step: positive zooms in.
    Wheel { x: f32, y: f32, delta: f32 },
}

impl InputEvent {
    /// Screen position carried by the event, if any.
    pub fn position(&self) -> Option<Coordinate> {
        match *self {
            InputEvent::PointerDown { x, y }
            | InputEvent::PointerMove { x, y }
            | InputEvent::PointerUp { x, y }
            | InputEvent::Click { x, y }
            | InputEvent::TouchStart { x, y }
            | InputEvent::TouchMove { x, y }
            | InputEvent::TouchEnd { x, y }
            | InputEvent::Wheel { x, y, .. } => Some(Coordinate::new(x, y)),
            InputEvent::TouchCancel => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Click,
    Move,
}

/// Delivered to the sprite under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    /// Position on the drawing surface.
    pub screen: Coordinate,
    /// The same position in world space.
    pub world: Coordinate,
}
