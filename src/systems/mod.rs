//! Engine systems.
//!
//! Functions and small state machines that advance the simulation and
//! present it. They operate on the registry and camera but own neither.
//!
//! Submodules overview
//! - [`animation`] – advance sprite animations, republish completions
//! - [`collision`] – hit testing, intersection queries and change propagation
//! - [`input`] – route pointer input to sprites and the camera
//! - [`movement`] – apply moving vectors to sprite coordinates
//! - [`render`] – depth-sorted render pass and the drawing surface trait
//! - [`scheduler`] – fixed-rate logic tick
//! - `raylibsurface` – raylib drawing backend (`raylib` feature)

pub mod animation;
pub mod collision;
pub mod input;
pub mod movement;
#[cfg(feature = "raylib")]
pub mod raylibsurface;
pub mod render;
pub mod scheduler;
