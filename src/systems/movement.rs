//! Moving-vector system.
//!
//! Moves every sprite with an active [`MovingVector`] to its interpolated
//! position for the current tick. On completion the sprite is snapped to the
//! end coordinate, its own `vector_movement_ended` hook fires, and the
//! registry republishes the event with the sprite id.
//!
//! [`MovingVector`]: crate::components::movingvector::MovingVector

use log::debug;

use crate::components::coordinates::Coordinate;
use crate::components::sprite::Sprite;
use crate::events::sprite::VectorMovementEnded;
use crate::resources::spriteregistry::SpriteRegistry;

/// Advance one sprite's vector. Returns the end coordinate when the vector
/// completed on this call.
pub fn step_vector(sprite: &mut Sprite, now: f64) -> Option<Coordinate> {
    let (position, finished) = match sprite.vector_mut() {
        Some(vector) if vector.is_moving() => {
            let finished = vector.update(now);
            let position = if finished {
                vector.end_coordinates()
            } else {
                vector.actual_coordinates(now)
            };
            (position, finished)
        }
        _ => return None,
    };
    sprite.set_coordinates(position);
    if finished {
        sprite.vector_movement_ended.publish(&position);
        Some(position)
    } else {
        None
    }
}

pub fn movement_system(registry: &mut SpriteRegistry, now: f64) {
    let mut ended = Vec::new();
    for sprite in registry.iter_mut() {
        if let Some(coordinates) = step_vector(sprite, now) {
            ended.push(VectorMovementEnded {
                id: sprite.id().clone(),
                coordinates,
            });
        }
    }
    for event in &ended {
        debug!(
            "[movement] {} arrived at ({}, {})",
            event.id, event.coordinates.x, event.coordinates.y
        );
        registry.vector_movement_ended.publish(event);
    }
}
