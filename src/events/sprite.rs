//! Registry-level sprite events.
//!
//! Sprites carry their own hooks (`mouse_click`, `vector_movement_ended`, ...);
//! the registry republishes the interesting ones with the sprite id attached
//! so consumers can watch every sprite from one place.

use crate::components::coordinates::Coordinate;
use crate::components::sprite::SpriteId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteCreated {
    pub id: SpriteId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteRemoved {
    pub id: SpriteId,
}

/// A sprite's coordinates changed, by a setter or by its moving vector.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteMoved {
    pub id: SpriteId,
    pub old: Coordinate,
    pub new: Coordinate,
}

/// Published after a move when the moved sprite overlaps others.
///
/// `standing` lists every sprite the moving one overlaps at its new
/// position, in registry order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionEvent {
    pub moving: SpriteId,
    pub standing: Vec<SpriteId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorMovementEnded {
    pub id: SpriteId,
    pub coordinates: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationCompleted {
    pub id: SpriteId,
    /// Whether the animation restarts by itself.
    pub looping: bool,
}
