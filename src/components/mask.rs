use serde::{Deserialize, Serialize};

use crate::components::coordinates::{Coordinate, Size};
use crate::geometry::{radius_from_rect, rect_center};

/// Hit-test geometry of a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskShape {
    #[default]
    Rectangle,
    Circle,
}

/// Hit-test area of a sprite, independent from the drawn picture.
///
/// The mask is placed at the sprite's coordinates plus `offset`. A circle
/// mask is inscribed in its `size` box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub size: Size,
    #[serde(default)]
    pub shape: MaskShape,
    #[serde(default)]
    pub offset: Coordinate,
}

impl Mask {
    /// Rectangle mask with the given size at zero offset.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
            shape: MaskShape::Rectangle,
            offset: Coordinate::origin(),
        }
    }

    /// Circle mask of the given radius, its bounding box at zero offset.
    pub fn circle(radius: f32) -> Self {
        Self {
            size: Size::new(radius * 2.0, radius * 2.0),
            shape: MaskShape::Circle,
            offset: Coordinate::origin(),
        }
    }

    pub fn with_offset(mut self, offset: Coordinate) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_shape(mut self, shape: MaskShape) -> Self {
        self.shape = shape;
        self
    }

    /// Resolve the mask against a sprite position.
    /// Handles negative size by normalizing to a proper top-left corner.
    pub fn body(&self, position: Coordinate) -> MaskBody {
        let p0 = position + self.offset;
        let p1 = Coordinate::new(p0.x + self.size.width, p0.y + self.size.height);
        let top_left = Coordinate::new(p0.x.min(p1.x), p0.y.min(p1.y));
        MaskBody {
            top_left,
            size: Size::new(self.size.width.abs(), self.size.height.abs()),
            shape: self.shape,
        }
    }
}

/// A mask placed in a concrete coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskBody {
    pub top_left: Coordinate,
    pub size: Size,
    pub shape: MaskShape,
}

impl MaskBody {
    pub fn center(&self) -> Coordinate {
        rect_center(self.top_left, self.size)
    }

    pub fn radius(&self) -> f32 {
        radius_from_rect(self.size)
    }
}
