//! Image resolution.
//!
//! Sprites only need a ready-to-draw handle plus pixel dimensions; how the
//! picture is fetched is behind [`ImageResolver`]. Two resolvers ship with
//! the engine:
//!
//! - [`ImageLoader`] decodes image headers on a background thread, caches
//!   results by path and waits for an answer with a timeout. Use it the same
//!   way as any worker bridge: create it once, let it drop (or call
//!   [`ImageLoader::shutdown`]) to stop and join the thread.
//! - [`MemoryImages`] answers from a fixed table; handy for tests and for
//!   hosts that already loaded their textures.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::components::coordinates::Size;
use crate::components::mask::MaskShape;
use crate::error::{EngineError, ImageLoadReason, Result};

/// Cheap-to-clone reference to a loaded picture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    path: Arc<str>,
    width: u32,
    height: u32,
}

impl ImageHandle {
    pub fn new(path: impl AsRef<str>, width: u32, height: u32) -> Self {
        Self {
            path: Arc::from(path.as_ref()),
            width,
            height,
        }
    }

    /// The path doubles as the key a drawing backend uses to find its texture.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }
}

fn default_scale() -> f32 {
    1.0
}

/// How to create a sprite's picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Path of the picture, e.g. `./images/hero.png`.
    pub path: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Mask shape given to sprites created from this picture.
    #[serde(default)]
    pub shape: MaskShape,
}

impl ImageConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            scale: 1.0,
            shape: MaskShape::Rectangle,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_shape(mut self, shape: MaskShape) -> Self {
        self.shape = shape;
        self
    }
}

/// Turns an image path into a handle, loading it if needed.
pub trait ImageResolver {
    /// Resolve `path`, waiting at most `timeout` for a load to finish.
    fn resolve(&mut self, path: &str, timeout: Duration) -> Result<ImageHandle>;

    /// Already-resolved handle, without loading.
    fn get_cached(&self, path: &str) -> Option<ImageHandle>;
}

/// Requests sent *to* the loader thread.
#[derive(Debug)]
enum LoaderCmd {
    Load { path: String },
    Shutdown,
}

/// Answers sent *back* from the loader thread.
#[derive(Debug)]
enum LoaderMessage {
    Loaded { path: String, width: u32, height: u32 },
    Failed { path: String, error: String },
}

fn loader_thread(rx_cmd: Receiver<LoaderCmd>, tx_msg: Sender<LoaderMessage>) {
    debug!("[images] loader thread starting");
    for cmd in rx_cmd.iter() {
        match cmd {
            LoaderCmd::Load { path } => {
                let msg = match image::image_dimensions(&path) {
                    Ok((width, height)) => LoaderMessage::Loaded {
                        path,
                        width,
                        height,
                    },
                    Err(e) => LoaderMessage::Failed {
                        path,
                        error: e.to_string(),
                    },
                };
                if tx_msg.send(msg).is_err() {
                    break;
                }
            }
            LoaderCmd::Shutdown => break,
        }
    }
    debug!("[images] loader thread exiting");
}

/// Background image loader with a by-path cache.
pub struct ImageLoader {
    tx_cmd: Sender<LoaderCmd>,
    rx_msg: Receiver<LoaderMessage>,
    handle: Option<std::thread::JoinHandle<()>>,
    cache: FxHashMap<String, ImageHandle>,
    failed: FxHashMap<String, String>,
    pending: FxHashSet<String>,
}

impl ImageLoader {
    pub fn new() -> Self {
        let (tx_cmd, rx_cmd) = unbounded::<LoaderCmd>();
        let (tx_msg, rx_msg) = unbounded::<LoaderMessage>();
        let handle = std::thread::spawn(move || loader_thread(rx_cmd, tx_msg));
        Self {
            tx_cmd,
            rx_msg,
            handle: Some(handle),
            cache: FxHashMap::default(),
            failed: FxHashMap::default(),
            pending: FxHashSet::default(),
        }
    }

    /// Loader that starts fetching `configs` right away.
    pub fn with_preload<'a>(configs: impl IntoIterator<Item = &'a ImageConfig>) -> Self {
        let mut loader = Self::new();
        for config in configs {
            loader.preload(&config.path);
        }
        loader
    }

    /// Queue a load without waiting. Loading a path again refreshes it.
    pub fn preload(&mut self, path: &str) {
        self.cache.remove(path);
        self.failed.remove(path);
        self.request(path);
    }

    /// Move finished loads into the cache without blocking.
    pub fn poll(&mut self) {
        let messages: Vec<LoaderMessage> = self.rx_msg.try_iter().collect();
        for msg in messages {
            self.store(msg);
        }
    }

    pub fn is_pending(&self, path: &str) -> bool {
        self.pending.contains(path)
    }

    /// Ask the loader thread to stop and wait for it.
    pub fn shutdown(mut self) {
        self.stop_thread();
    }

    fn request(&mut self, path: &str) {
        if self.pending.insert(path.to_string()) {
            // A send only fails when the thread is gone; resolve() reports that.
            let _ = self.tx_cmd.send(LoaderCmd::Load {
                path: path.to_string(),
            });
        }
    }

    /// Record one loader answer; returns the path it was about.
    fn store(&mut self, msg: LoaderMessage) -> String {
        match msg {
            LoaderMessage::Loaded {
                path,
                width,
                height,
            } => {
                info!("[images] loaded {} ({}x{})", path, width, height);
                self.pending.remove(&path);
                self.cache
                    .insert(path.clone(), ImageHandle::new(&path, width, height));
                path
            }
            LoaderMessage::Failed { path, error } => {
                warn!("[images] failed to load {}: {}", path, error);
                self.pending.remove(&path);
                self.failed.insert(path.clone(), error);
                path
            }
        }
    }

    fn stop_thread(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.tx_cmd.send(LoaderCmd::Shutdown);
            let _ = handle.join();
        }
    }

    fn take_failure(&mut self, path: &str) -> Option<EngineError> {
        self.failed.remove(path).map(|error| EngineError::ImageLoad {
            path: path.to_string(),
            reason: ImageLoadReason::Decode(error),
        })
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

impl ImageResolver for ImageLoader {
    fn resolve(&mut self, path: &str, timeout: Duration) -> Result<ImageHandle> {
        self.poll();
        if let Some(handle) = self.cache.get(path) {
            return Ok(handle.clone());
        }
        if let Some(err) = self.take_failure(path) {
            return Err(err);
        }

        self.request(path);
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx_msg.recv_timeout(remaining) {
                Ok(msg) => {
                    if self.store(msg) != path {
                        continue;
                    }
                    if let Some(handle) = self.cache.get(path) {
                        return Ok(handle.clone());
                    }
                    if let Some(err) = self.take_failure(path) {
                        return Err(err);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!("[images] timed out waiting for {}", path);
                    return Err(EngineError::ImageLoad {
                        path: path.to_string(),
                        reason: ImageLoadReason::Timeout {
                            waited_ms: timeout.as_millis() as u64,
                        },
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(EngineError::ImageLoad {
                        path: path.to_string(),
                        reason: ImageLoadReason::WorkerGone,
                    });
                }
            }
        }
    }

    fn get_cached(&self, path: &str) -> Option<ImageHandle> {
        self.cache.get(path).cloned()
    }
}

/// Resolver backed by a fixed table of known pictures.
#[derive(Debug, Default, Clone)]
pub struct MemoryImages {
    images: FxHashMap<String, ImageHandle>,
}

impl MemoryImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, path: &str, width: u32, height: u32) -> Self {
        self.insert(path, width, height);
        self
    }

    pub fn insert(&mut self, path: &str, width: u32, height: u32) {
        self.images
            .insert(path.to_string(), ImageHandle::new(path, width, height));
    }
}

impl ImageResolver for MemoryImages {
    fn resolve(&mut self, path: &str, timeout: Duration) -> Result<ImageHandle> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| {
                debug!("[images] {} not in table after {:?}", path, timeout);
                EngineError::ImageLoad {
                    path: path.to_string(),
                    reason: ImageLoadReason::Decode("unknown image".into()),
                }
            })
    }

    fn get_cached(&self, path: &str) -> Option<ImageHandle> {
        self.images.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &std::path::Path, name: &str, w: u32, h: u32) -> String {
        let path = dir.join(name);
        image::RgbaImage::new(w, h).save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn loads_dimensions_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "sheet.png", 128, 32);

        let mut loader = ImageLoader::new();
        let handle = loader.resolve(&path, Duration::from_secs(5)).unwrap();
        assert_eq!((handle.width(), handle.height()), (128, 32));
        assert_eq!(loader.get_cached(&path), Some(handle));
        loader.shutdown();
    }

    #[test]
    fn preloaded_images_land_in_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 4, 4);
        let config = ImageConfig::new(path.clone());

        let mut loader = ImageLoader::with_preload([&config]);
        let handle = loader.resolve(&path, Duration::from_secs(5)).unwrap();
        assert_eq!(handle.size(), Size::new(4.0, 4.0));
        assert!(!loader.is_pending(&path));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let mut loader = ImageLoader::new();
        let err = loader
            .resolve("/definitely/not/here.png", Duration::from_secs(5))
            .unwrap_err();
        match err {
            EngineError::ImageLoad { path, reason } => {
                assert_eq!(path, "/definitely/not/here.png");
                assert!(matches!(reason, ImageLoadReason::Decode(_)));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn memory_images_resolve_known_paths_only() {
        let mut images = MemoryImages::new().with_image("hero.png", 10, 20);
        assert_eq!(
            images
                .resolve("hero.png", Duration::from_millis(1))
                .unwrap()
                .size(),
            Size::new(10.0, 20.0)
        );
        assert!(images.resolve("nope.png", Duration::from_millis(1)).is_err());
    }

    #[test]
    fn image_config_defaults_from_json() {
        let config: ImageConfig = serde_json::from_str(r#"{ "path": "x.png" }"#).unwrap();
        assert_eq!(config, ImageConfig::new("x.png"));
        let circle: ImageConfig =
            serde_json::from_str(r#"{ "path": "c.png", "scale": 0.5, "shape": "circle" }"#)
                .unwrap();
        assert_eq!(circle.shape, MaskShape::Circle);
        assert_eq!(circle.scale, 0.5);
    }
}
