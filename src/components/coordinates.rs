//! Coordinate and size value types.
//!
//! [`Coordinate`] and [`Size`] are plain `Copy` values. Change notification
//! lives in the owning wrapper [`Observed`], whose setter both mutates and
//! publishes a [`Change`] carrying the old and new values.

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub};
use serde::{Deserialize, Serialize};

use crate::events::distributor::{EventDistributor, SubscriptionId};

/// A point in world or screen space.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f32,
    pub y: f32,
}

impl Coordinate {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Linear interpolation towards `to`; `t` is not clamped.
    #[inline]
    pub fn lerp(self, to: Coordinate, t: f32) -> Coordinate {
        Coordinate::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

impl Add for Coordinate {
    type Output = Coordinate;
    #[inline]
    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Coordinate {
    #[inline]
    fn add_assign(&mut self, rhs: Coordinate) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;
    #[inline]
    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Coordinate {
    type Output = Coordinate;
    #[inline]
    fn neg(self) -> Coordinate {
        Coordinate::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Coordinate {
    type Output = Coordinate;
    #[inline]
    fn mul(self, rhs: f32) -> Coordinate {
        Coordinate::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Coordinate {
    type Output = Coordinate;
    #[inline]
    fn div(self, rhs: f32) -> Coordinate {
        Coordinate::new(self.x / rhs, self.y / rhs)
    }
}

/// Width and height pair.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn half(self) -> Coordinate {
        Coordinate::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Mul<f32> for Size {
    type Output = Size;
    #[inline]
    fn mul(self, rhs: f32) -> Size {
        Size::new(self.width * rhs, self.height * rhs)
    }
}

impl Div<f32> for Size {
    type Output = Size;
    #[inline]
    fn div(self, rhs: f32) -> Size {
        Size::new(self.width / rhs, self.height / rhs)
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn from_parts(top_left: Coordinate, size: Size) -> Self {
        Self::new(top_left.x, top_left.y, size.width, size.height)
    }

    #[inline]
    pub fn top_left(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Payload of a value change notification.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Change<T> {
    pub old: T,
    pub new: T,
}

pub type CoordinatesChanged = Change<Coordinate>;
pub type SizeChanged = Change<Size>;

/// A value plus the distributor that announces every mutation of it.
#[derive(Debug, Default)]
pub struct Observed<T: Copy> {
    value: T,
    changed: EventDistributor<Change<T>>,
}

impl<T: Copy> Observed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            changed: EventDistributor::new(),
        }
    }

    #[inline]
    pub fn get(&self) -> T {
        self.value
    }

    /// Store `value` and notify subscribers. Returns the previous value.
    pub fn set(&mut self, value: T) -> T {
        let old = self.value;
        self.value = value;
        self.changed.publish(&Change { old, new: value });
        old
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&Change<T>) + 'static) -> SubscriptionId {
        self.changed.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }
}
