//! Engine configuration resource.
//!
//! Settings loaded from an INI file. Defaults allow a safe start without any
//! file; keys missing from the file keep their current values.
//!
//! # Configuration File Format
//!
//! ```ini
//! [engine]
//! tick_rate = 60
//! max_catch_up = 5
//!
//! [viewport]
//! width = 800
//! height = 600
//!
//! [camera]
//! min_scale = 0.00001
//!
//! [collision]
//! broad_phase = scan   ; or grid
//! cell_size = 128
//!
//! [images]
//! load_timeout_ms = 10000
//!
//! [debug]
//! draw_masks = false
//! ```

use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

use crate::resources::camera2d::MIN_SCALE;
use crate::systems::collision::{BroadPhase, MIN_CELL_SIZE};

const DEFAULT_TICK_RATE: u32 = 60;
const DEFAULT_MAX_CATCH_UP: u32 = 5;
const DEFAULT_VIEWPORT_WIDTH: u32 = 800;
const DEFAULT_VIEWPORT_HEIGHT: u32 = 600;
const DEFAULT_LOAD_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_CELL_SIZE: f32 = 128.0;
const DEFAULT_DRAW_MASKS: bool = false;
const DEFAULT_CONFIG_PATH: &str = "./spritecore.ini";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Logic ticks per second.
    pub tick_rate: u32,
    /// Most ticks a single advance may run to catch up after a stall.
    pub max_catch_up: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub min_scale: f32,
    pub broad_phase: BroadPhase,
    pub load_timeout_ms: u64,
    /// Outline every mask when rendering.
    pub draw_masks: bool,
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_catch_up: DEFAULT_MAX_CATCH_UP,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            min_scale: MIN_SCALE,
            broad_phase: BroadPhase::Scan,
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            draw_masks: DEFAULT_DRAW_MASKS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Milliseconds between logic ticks.
    pub fn tick_interval_ms(&self) -> f64 {
        1000.0 / self.tick_rate.max(1) as f64
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Load configuration from the INI file.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [engine]
        if let Some(rate) = config.getuint("engine", "tick_rate").ok().flatten() {
            if rate == 0 {
                warn!("tick_rate = 0 ignored, keeping {}", self.tick_rate);
            } else {
                self.tick_rate = rate as u32;
            }
        }
        if let Some(n) = config.getuint("engine", "max_catch_up").ok().flatten() {
            self.max_catch_up = (n as u32).max(1);
        }

        // [viewport]
        if let Some(width) = config.getuint("viewport", "width").ok().flatten() {
            self.viewport_width = width as u32;
        }
        if let Some(height) = config.getuint("viewport", "height").ok().flatten() {
            self.viewport_height = height as u32;
        }

        // [camera]
        if let Some(min) = config.getfloat("camera", "min_scale").ok().flatten() {
            self.min_scale = (min as f32).max(MIN_SCALE);
        }

        // [collision]
        let cell_size = config
            .getfloat("collision", "cell_size")
            .ok()
            .flatten()
            .map(|c| c as f32)
            .filter(|c| *c > 0.0)
            .map(|c| {
                if c < MIN_CELL_SIZE {
                    warn!("cell_size {} below {}, raised", c, MIN_CELL_SIZE);
                }
                c.max(MIN_CELL_SIZE)
            })
            .unwrap_or(DEFAULT_CELL_SIZE);
        match config.get("collision", "broad_phase").as_deref() {
            Some("grid") => self.broad_phase = BroadPhase::Grid { cell_size },
            Some("scan") => self.broad_phase = BroadPhase::Scan,
            Some(other) => warn!("unknown broad_phase '{}', keeping {:?}", other, self.broad_phase),
            None => {}
        }

        // [images]
        if let Some(ms) = config.getuint("images", "load_timeout_ms").ok().flatten() {
            self.load_timeout_ms = ms;
        }

        // [debug]
        if let Some(draw) = config.getbool("debug", "draw_masks").ok().flatten() {
            self.draw_masks = draw;
        }

        info!(
            "Loaded config: {} ticks/s (catch-up {}), viewport {}x{}, broad phase {:?}, image timeout {} ms",
            self.tick_rate,
            self.max_catch_up,
            self.viewport_width,
            self.viewport_height,
            self.broad_phase,
            self.load_timeout_ms
        );

        Ok(())
    }

    /// Save configuration to the INI file, creating it if needed.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("engine", "tick_rate", Some(self.tick_rate.to_string()));
        config.set("engine", "max_catch_up", Some(self.max_catch_up.to_string()));
        config.set("viewport", "width", Some(self.viewport_width.to_string()));
        config.set("viewport", "height", Some(self.viewport_height.to_string()));
        config.set("camera", "min_scale", Some(self.min_scale.to_string()));
        match self.broad_phase {
            BroadPhase::Scan => {
                config.set("collision", "broad_phase", Some("scan".to_string()));
            }
            BroadPhase::Grid { cell_size } => {
                config.set("collision", "broad_phase", Some("grid".to_string()));
                config.set("collision", "cell_size", Some(cell_size.to_string()));
            }
        }
        config.set(
            "images",
            "load_timeout_ms",
            Some(self.load_timeout_ms.to_string()),
        );
        config.set("debug", "draw_masks", Some(self.draw_masks.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }
}
