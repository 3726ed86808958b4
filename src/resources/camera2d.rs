//! 2D camera: world/screen transform with pan and anchored zoom.
//!
//! The forward transform translates first and scales second:
//!
//! ```text
//! screen = (world + focal) * scale
//! world  = screen / scale - focal
//! ```
//!
//! Render pass, hit testing and pointer dispatch all go through this one pair
//! of functions so pointer-to-world round trips stay exact.

use log::{debug, warn};

use crate::components::coordinates::{Coordinate, Size};
use crate::events::distributor::{EventDistributor, SubscriptionId};

/// Lowest scale the camera accepts.
pub const MIN_SCALE: f32 = 0.00001;

/// Published after every pan or zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraChanged {
    pub focal: Coordinate,
    pub scale: f32,
}

#[derive(Debug)]
pub struct Camera2D {
    focal: Coordinate,
    scale: f32,
    min_scale: f32,
    viewport: Size,
    pub changed: EventDistributor<CameraChanged>,
}

impl Camera2D {
    pub fn new(viewport: Size) -> Self {
        Self {
            focal: Coordinate::origin(),
            scale: 1.0,
            min_scale: MIN_SCALE,
            viewport,
            changed: EventDistributor::new(),
        }
    }

    /// Override the lower scale bound; values below [`MIN_SCALE`] are raised to it.
    pub fn with_min_scale(mut self, min_scale: f32) -> Self {
        self.min_scale = if min_scale.is_finite() {
            min_scale.max(MIN_SCALE)
        } else {
            MIN_SCALE
        };
        self
    }

    pub fn focal(&self) -> Coordinate {
        self.focal
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    #[inline]
    pub fn world_to_screen(&self, world: Coordinate) -> Coordinate {
        (world + self.focal) * self.scale
    }

    #[inline]
    pub fn screen_to_world(&self, screen: Coordinate) -> Coordinate {
        screen / self.scale - self.focal
    }

    #[inline]
    pub fn world_size_to_screen(&self, size: Size) -> Size {
        size * self.scale
    }

    pub fn set_focal(&mut self, focal: Coordinate) {
        self.focal = focal;
        self.publish();
    }

    /// Set the scale, clamping to the minimum. Returns the scale applied.
    pub fn set_scale(&mut self, scale: f32) -> f32 {
        self.scale = self.clamp_scale(scale);
        self.publish();
        self.scale
    }

    /// Pan by a screen-space distance, e.g. a pointer drag.
    pub fn scroll_by(&mut self, screen_delta: Coordinate) {
        self.focal += screen_delta / self.scale;
        self.publish();
    }

    /// Put `world` in the middle of the viewport.
    pub fn center_on(&mut self, world: Coordinate) {
        self.focal = self.viewport.half() / self.scale - world;
        self.publish();
    }

    /// Multiply the scale by `1 + delta`. The world point `anchor` (the
    /// focal coordinate when `None`) keeps its screen position.
    pub fn zoom_by(&mut self, delta: f32, anchor: Option<Coordinate>) {
        let anchor = anchor.unwrap_or(self.focal);
        let old_scale = self.scale;
        let new_scale = self.clamp_scale(old_scale * (1.0 + delta));
        // (anchor + f) * s == (anchor + f') * s'
        self.focal = (anchor + self.focal) * (old_scale / new_scale) - anchor;
        self.scale = new_scale;
        debug!(
            "[camera] zoom {} -> {} around ({}, {})",
            old_scale, new_scale, anchor.x, anchor.y
        );
        self.publish();
    }

    /// Zoom keeping whatever is under `screen` in place.
    pub fn zoom_at_screen(&mut self, delta: f32, screen: Coordinate) {
        let anchor = self.screen_to_world(screen);
        self.zoom_by(delta, Some(anchor));
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&CameraChanged) + 'static) -> SubscriptionId {
        self.changed.subscribe(handler)
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        if !scale.is_finite() || scale < self.min_scale {
            warn!(
                "[camera] scale {} below minimum, clamped to {}",
                scale, self.min_scale
            );
            self.min_scale
        } else {
            scale
        }
    }

    fn publish(&mut self) {
        let payload = CameraChanged {
            focal: self.focal,
            scale: self.scale,
        };
        self.changed.publish(&payload);
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(Size::new(800.0, 600.0))
    }
}
