//! GPU textures keyed by image path, for the raylib backend.

use log::{info, warn};
use raylib::prelude::{RaylibHandle, RaylibThread, Texture2D};
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct TextureStore {
    map: FxHashMap<String, Texture2D>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&Texture2D> {
        self.map.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.map.contains_key(path)
    }

    /// Upload `path` unless it is already resident. Failures are logged and
    /// the sprite is simply not drawn.
    pub fn ensure(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread, path: &str) {
        if self.map.contains_key(path) {
            return;
        }
        match rl.load_texture(thread, path) {
            Ok(texture) => {
                info!("[textures] uploaded {}", path);
                self.map.insert(path.to_string(), texture);
            }
            Err(e) => warn!("[textures] cannot upload {}: {:?}", path, e),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
