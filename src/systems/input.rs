//! Pointer dispatch.
//!
//! Turns normalized [`InputEvent`]s into sprite hooks and camera requests:
//!
//! - a click (or a touch lifted without dragging) goes to the `mouse_click`
//!   hook of the top-layer sprites under the pointer;
//! - pointer movement without a drag goes to their `mouse_move` hook;
//! - moving with the pointer held beyond a small threshold pans the camera;
//! - the wheel zooms the camera around the point under the pointer.

use log::debug;

use crate::components::coordinates::Coordinate;
use crate::components::sprite::SpriteId;
use crate::events::input::{InputEvent, PointerEvent, PointerKind};
use crate::geometry::distance;
use crate::resources::camera2d::Camera2D;
use crate::resources::spriteregistry::SpriteRegistry;
use crate::systems::collision::{HitQuery, who_is_at};

/// Pointer travel in pixels before a press turns into a drag.
pub const DRAG_THRESHOLD: f32 = 4.0;

#[derive(Debug, Clone)]
pub struct PointerDispatcher {
    pressed_at: Option<Coordinate>,
    last: Option<Coordinate>,
    dragging: bool,
    /// A drag just ended; the click that follows the release is swallowed.
    suppress_click: bool,
    /// Pan the camera while dragging.
    pub pan_enabled: bool,
    /// Zoom the camera on wheel events.
    pub zoom_enabled: bool,
}

impl Default for PointerDispatcher {
    fn default() -> Self {
        Self {
            pressed_at: None,
            last: None,
            dragging: false,
            suppress_click: false,
            pan_enabled: true,
            zoom_enabled: true,
        }
    }
}

impl PointerDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Handle one input event. Returns how many sprites were notified.
    pub fn dispatch(
        &mut self,
        event: InputEvent,
        registry: &mut SpriteRegistry,
        camera: &mut Camera2D,
    ) -> usize {
        match event {
            InputEvent::PointerDown { x, y } | InputEvent::TouchStart { x, y } => {
                let p = Coordinate::new(x, y);
                self.pressed_at = Some(p);
                self.last = Some(p);
                self.dragging = false;
                self.suppress_click = false;
                0
            }
            InputEvent::PointerMove { x, y } | InputEvent::TouchMove { x, y } => {
                let p = Coordinate::new(x, y);
                let notified = if self.drag(p, camera) {
                    0
                } else {
                    notify(registry, camera, p, PointerKind::Move)
                };
                self.last = Some(p);
                notified
            }
            InputEvent::PointerUp { .. } => {
                self.release();
                0
            }
            InputEvent::TouchEnd { x, y } => {
                let tapped = self.pressed_at.is_some() && !self.dragging;
                self.release();
                if tapped {
                    notify(registry, camera, Coordinate::new(x, y), PointerKind::Click)
                } else {
                    0
                }
            }
            InputEvent::Click { x, y } => {
                let after_drag = std::mem::take(&mut self.suppress_click);
                if self.dragging || after_drag {
                    return 0;
                }
                notify(registry, camera, Coordinate::new(x, y), PointerKind::Click)
            }
            InputEvent::TouchCancel => {
                self.release();
                0
            }
            InputEvent::Wheel { x, y, delta } => {
                if self.zoom_enabled && delta != 0.0 {
                    camera.zoom_at_screen(delta, Coordinate::new(x, y));
                }
                0
            }
        }
    }

    /// Pan while the pointer is held. Returns true while dragging.
    fn drag(&mut self, p: Coordinate, camera: &mut Camera2D) -> bool {
        let Some(pressed) = self.pressed_at else {
            return false;
        };
        if !self.dragging && distance(pressed, p) >= DRAG_THRESHOLD {
            debug!("[input] drag started at ({}, {})", pressed.x, pressed.y);
            self.dragging = true;
        }
        if self.dragging && self.pan_enabled {
            if let Some(last) = self.last {
                camera.scroll_by(p - last);
            }
        }
        self.dragging
    }

    fn release(&mut self) {
        self.suppress_click = self.dragging;
        self.pressed_at = None;
        self.last = None;
        self.dragging = false;
    }
}

fn notify(
    registry: &mut SpriteRegistry,
    camera: &Camera2D,
    screen: Coordinate,
    kind: PointerKind,
) -> usize {
    let targets: Vec<SpriteId> = who_is_at(registry, camera, screen, HitQuery::default())
        .into_iter()
        .map(|s| s.id().clone())
        .collect();
    let payload = PointerEvent {
        kind,
        screen,
        world: camera.screen_to_world(screen),
    };
    let mut notified = 0;
    for sprite in registry.iter_mut().filter(|s| targets.contains(s.id())) {
        match kind {
            PointerKind::Click => sprite.mouse_click.publish(&payload),
            PointerKind::Move => sprite.mouse_move.publish(&payload),
        }
        notified += 1;
    }
    notified
}
