//! Sprite data types.
//!
//! This module groups the value types and per-sprite state the engine is
//! built from. Everything here is plain data plus the rules that keep it
//! consistent; the systems in [`crate::systems`] decide when it changes.
//!
//! Submodules overview:
//! - [`coordinates`] – 2D point, size and rectangle, plus change notification
//! - [`mask`] – hit-test geometry (rectangle or circle) with its own offset
//! - [`movingvector`] – time-interpolated movement between two coordinates
//! - [`sprite`] – the sprite entity and its id
//! - [`spriteanimation`] – frame clock over a single-row sprite sheet

pub mod coordinates;
pub mod mask;
pub mod movingvector;
pub mod sprite;
pub mod spriteanimation;
