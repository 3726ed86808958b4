//! Pure 2D geometry predicates used by hit-testing and collision.
//!
//! All tests are inclusive: touching edges count as contact.

use crate::components::coordinates::{Coordinate, Size};

/// Point inside the rectangle with top-left `rect` and the given extent.
pub fn point_in_rect(point: Coordinate, rect: Coordinate, width: f32, height: f32) -> bool {
    point.x >= rect.x
        && point.x <= rect.x + width
        && point.y >= rect.y
        && point.y <= rect.y + height
}

pub fn point_in_circle(point: Coordinate, center: Coordinate, radius: f32) -> bool {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    dx * dx + dy * dy <= radius * radius
}

/// AABB overlap of two rectangles given by top-left corner and size.
pub fn rect_intersects_rect(a: Coordinate, a_size: Size, b: Coordinate, b_size: Size) -> bool {
    let (a_left, a_top) = (a.x, a.y);
    let (a_right, a_bottom) = (a.x + a_size.width, a.y + a_size.height);
    let (b_left, b_top) = (b.x, b.y);
    let (b_right, b_bottom) = (b.x + b_size.width, b.y + b_size.height);
    a_left <= b_right && a_right >= b_left && a_top <= b_bottom && a_bottom >= b_top
}

/// Rectangle (given by its center) against circle, via the clamped distance
/// from the circle center to the rectangle.
pub fn rect_intersects_circle(
    rect_center: Coordinate,
    rect_size: Size,
    circle_center: Coordinate,
    radius: f32,
) -> bool {
    let dx = (circle_center.x - rect_center.x).abs();
    let dy = (circle_center.y - rect_center.y).abs();
    let half_w = rect_size.width / 2.0;
    let half_h = rect_size.height / 2.0;

    if dx > half_w + radius || dy > half_h + radius {
        return false;
    }
    if dx <= half_w || dy <= half_h {
        return true;
    }

    let corner_x = dx - half_w;
    let corner_y = dy - half_h;
    corner_x * corner_x + corner_y * corner_y <= radius * radius
}

pub fn circle_intersects_circle(c1: Coordinate, r1: f32, c2: Coordinate, r2: f32) -> bool {
    distance(c1, c2) <= r1 + r2
}

pub fn distance(p1: Coordinate, p2: Coordinate) -> f32 {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    (dx * dx + dy * dy).sqrt()
}

pub fn rect_center(top_left: Coordinate, size: Size) -> Coordinate {
    top_left + size.half()
}

/// Approximate radius for treating a rectangle as a circle: the mean of the
/// half-width and half-height.
pub fn radius_from_rect(size: Size) -> f32 {
    (size.width + size.height) / 4.0
}
