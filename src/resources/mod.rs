//! Long-lived engine state.
//!
//! Overview
//! - `camera2d` – world/screen transform with pan and anchored zoom
//! - `engineconfig` – INI-backed engine settings
//! - `imageloader` – image resolution with a background loader and cache
//! - `spriteregistry` – owner of all sprites and their registry-wide events
//! - `texturestore` – GPU textures keyed by image path (`raylib` feature)
//! - `worldtime` – clocks and the per-tick time snapshot

pub mod camera2d;
pub mod engineconfig;
pub mod imageloader;
pub mod spriteregistry;
#[cfg(feature = "raylib")]
pub mod texturestore;
pub mod worldtime;
