//! JSON scene descriptions.
//!
//! A scene lists sprites to create at startup:
//!
//! ```json
//! {
//!   "background": "./images/grass.png",
//!   "sprites": [
//!     { "id": "hero", "image": { "path": "./images/hero.png", "shape": "circle" },
//!       "coordinates": { "x": 10, "y": 20 }, "layer": 1,
//!       "vector": { "to": { "x": 200, "y": 20 }, "duration_ms": 2000 },
//!       "animation": { "frames": 4, "frame_duration_ms": 120, "frame_width": 32, "looping": true } }
//!   ]
//! }
//! ```

use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::components::coordinates::Coordinate;
use crate::components::mask::Mask;
use crate::components::sprite::SpriteId;
use crate::components::spriteanimation::SpriteAnimation;
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::resources::imageloader::ImageConfig;
use crate::systems::render::Surface;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSpec {
    pub to: Coordinate,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub frames: usize,
    pub frame_duration_ms: f64,
    pub frame_width: f32,
    #[serde(default)]
    pub looping: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSpec {
    /// Random when absent.
    #[serde(default)]
    pub id: Option<SpriteId>,
    pub image: ImageConfig,
    #[serde(default)]
    pub coordinates: Coordinate,
    #[serde(default)]
    pub layer: i32,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub skip_click: bool,
    #[serde(default)]
    pub static_coordinates: bool,
    /// Replaces the default full-picture mask.
    #[serde(default)]
    pub mask: Option<Mask>,
    #[serde(default)]
    pub vector: Option<VectorSpec>,
    #[serde(default)]
    pub animation: Option<AnimationSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub sprites: Vec<SpriteSpec>,
}

impl SceneFile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::Configuration(format!("invalid scene: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("cannot read scene {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Image configs of every sprite, for preloading.
    pub fn images(&self) -> impl Iterator<Item = &ImageConfig> {
        self.sprites.iter().map(|s| &s.image)
    }

    /// Create every sprite of the scene in `engine`. Vectors start at the
    /// engine's current time. Returns the ids in scene order.
    pub fn spawn<S: Surface>(&self, engine: &mut Engine<S>) -> Result<Vec<SpriteId>> {
        if let Some(path) = &self.background {
            let timeout = engine.config().load_timeout();
            let image = engine.images_mut().resolve(path, timeout)?;
            engine.render.set_background(Some(image));
        }

        let now = engine.now();
        let mut ids = Vec::with_capacity(self.sprites.len());
        for spec in &self.sprites {
            let id = spec.id.clone().unwrap_or_else(SpriteId::random);
            let animation = spec
                .animation
                .as_ref()
                .map(|a| {
                    SpriteAnimation::new(a.frames, a.frame_duration_ms, a.frame_width).map(
                        |mut anim| {
                            if a.looping {
                                anim.play_loop(now);
                            } else {
                                anim.play(now);
                            }
                            anim
                        },
                    )
                })
                .transpose()?;

            let sprite = engine.create_sprite(id.clone(), &spec.image)?;
            sprite.set_coordinates(spec.coordinates);
            sprite.set_layer(spec.layer);
            sprite.tag = spec.tag.clone();
            sprite.rotation = spec.rotation;
            sprite.hidden = spec.hidden;
            sprite.skip_click = spec.skip_click;
            sprite.static_coordinates = spec.static_coordinates;
            if let Some(mask) = spec.mask {
                sprite.mask = mask;
            }
            sprite.animation = animation;
            if let Some(vector) = &spec.vector {
                sprite.move_to(vector.to, vector.duration_ms, now)?;
            }
            ids.push(id);
        }
        info!("[scene] spawned {} sprite(s)", ids.len());
        Ok(ids)
    }
}
