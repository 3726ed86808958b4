//! Spritecore library.
//!
//! A 2D sprite simulation and presentation engine: sprites with interpolated
//! movement and frame animation, a fixed-rate logic tick, two-phase
//! collision and hit testing, and a pannable/zoomable camera feeding a
//! depth-sorted render pass.
//!
//! # Project Structure
//!
//! - [`components`] – sprite data: coordinates, masks, vectors, animations
//! - [`events`] – the event distributor and event payloads
//! - [`resources`] – camera, registry, image loading, configuration, clocks
//! - [`systems`] – collision, movement, animation, scheduler, render, input
//! - [`engine`] – the facade tying everything together
//! - [`geometry`] – pure intersection predicates
//! - [`scene`] – JSON scene files

pub mod components;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod resources;
pub mod scene;
pub mod systems;

pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result};
