//! The sprite collection.
//!
//! The registry is the only owner of sprites. It creates them from image
//! configs, hands out borrows by id and republishes per-sprite changes as
//! registry-wide events. Spatial queries over the collection live in
//! [`crate::systems::collision`].

use log::{debug, info};
use std::time::Duration;

use crate::components::coordinates::CoordinatesChanged;
use crate::components::mask::Mask;
use crate::components::sprite::{Sprite, SpriteId};
use crate::error::{EngineError, Result};
use crate::events::distributor::EventDistributor;
use crate::events::sprite::{
    AnimationCompleted, IntersectionEvent, SpriteCreated, SpriteMoved, SpriteRemoved,
    VectorMovementEnded,
};
use crate::resources::imageloader::{ImageConfig, ImageResolver};

#[derive(Debug, Default)]
pub struct SpriteRegistry {
    sprites: Vec<Sprite>,
    /// Sprites added since the last intersection pass.
    unplaced: Vec<SpriteId>,
    pub sprite_created: EventDistributor<SpriteCreated>,
    pub sprite_removed: EventDistributor<SpriteRemoved>,
    pub coordinates_changed: EventDistributor<SpriteMoved>,
    pub intersection: EventDistributor<IntersectionEvent>,
    pub vector_movement_ended: EventDistributor<VectorMovementEnded>,
    pub animation_completed: EventDistributor<AnimationCompleted>,
}

impl SpriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the picture, build a sprite with a mask covering the whole
    /// (scaled) picture and register it.
    pub fn create_sprite(
        &mut self,
        id: SpriteId,
        config: &ImageConfig,
        resolver: &mut dyn ImageResolver,
        timeout: Duration,
    ) -> Result<&mut Sprite> {
        if !(config.scale.is_finite() && config.scale > 0.0) {
            return Err(EngineError::Configuration(format!(
                "image scale must be positive, got {} for {}",
                config.scale, config.path
            )));
        }
        let image = resolver.resolve(&config.path, timeout)?;
        let mut sprite = Sprite::new(id, image);
        sprite.set_scale(config.scale);
        let size = sprite.pic_size();
        sprite.mask = Mask::new(size.width, size.height).with_shape(config.shape);
        Ok(self.add_sprite(sprite))
    }

    /// Register a ready-made sprite and announce it.
    pub fn add_sprite(&mut self, sprite: Sprite) -> &mut Sprite {
        let id = sprite.id().clone();
        info!(
            "[registry] added sprite {} ({}) on layer {}",
            id,
            sprite.image().path(),
            sprite.layer()
        );
        let index = self.sprites.len();
        self.sprites.push(sprite);
        self.unplaced.push(id.clone());
        self.sprite_created.publish(&SpriteCreated { id });
        &mut self.sprites[index]
    }

    /// Remove every sprite with this id. Returns how many were removed.
    pub fn remove_sprite_by_id(&mut self, id: &SpriteId) -> usize {
        let before = self.sprites.len();
        self.sprites.retain(|s| s.id() != id);
        self.unplaced.retain(|u| u != id);
        let removed = before - self.sprites.len();
        for _ in 0..removed {
            self.sprite_removed.publish(&SpriteRemoved { id: id.clone() });
        }
        if removed > 0 {
            debug!("[registry] removed {} sprite(s) with id {}", removed, id);
        }
        removed
    }

    pub fn get(&self, id: &SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: &SpriteId) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: &SpriteId) -> bool {
        self.get(id).is_some()
    }

    pub fn index_of(&self, id: &SpriteId) -> Option<usize> {
        self.sprites.iter().position(|s| s.id() == id)
    }

    /// Sprites in insertion order.
    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sprite> {
        self.sprites.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Sprite> {
        self.sprites.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Coordinate changes recorded by sprites since the last call, with the
    /// index of the sprite that moved.
    pub(crate) fn take_moves(&mut self) -> Vec<(usize, CoordinatesChanged)> {
        let mut moves = Vec::new();
        for (index, sprite) in self.sprites.iter_mut().enumerate() {
            moves.extend(sprite.take_pending_moves().into_iter().map(|m| (index, m)));
        }
        moves
    }

    pub(crate) fn take_unplaced(&mut self) -> Vec<SpriteId> {
        std::mem::take(&mut self.unplaced)
    }
}
