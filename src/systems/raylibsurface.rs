//! Raylib drawing backend.
//!
//! Draw calls are queued while the engine renders a frame and replayed in
//! [`RaylibSurface::present`] inside raylib's drawing scope, after any
//! missing textures have been uploaded. Presenting without a new frame
//! redraws the previous one.

use raylib::prelude::*;

use crate::components::coordinates::{Rect, Size};
use crate::components::mask::MaskShape;
use crate::error::Result;
use crate::resources::texturestore::TextureStore;
use crate::systems::render::{DrawCommand, Surface, SurfaceOp};

pub struct RaylibSurface {
    size: Size,
    queue: Vec<SurfaceOp>,
    textures: TextureStore,
    pub background: Color,
}

impl RaylibSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width as f32, height as f32),
            queue: Vec::new(),
            textures: TextureStore::new(),
            background: Color::BLACK,
        }
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    /// Track the window size.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.size = Size::new(width as f32, height as f32);
    }

    /// Draw the last rendered frame into the window. The frame stays queued
    /// until the engine renders a new one.
    pub fn present(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread) {
        for op in &self.queue {
            if let SurfaceOp::Image(cmd) = op {
                self.textures.ensure(rl, thread, cmd.image.path());
            }
        }

        let mut d = rl.begin_drawing(thread);
        for op in &self.queue {
            match op {
                SurfaceOp::Clear => d.clear_background(self.background),
                SurfaceOp::Image(cmd) => {
                    if let Some(texture) = self.textures.get(cmd.image.path()) {
                        draw_command(&mut d, texture, cmd);
                    }
                }
                SurfaceOp::Stroke(rect, MaskShape::Rectangle) => d.draw_rectangle_lines(
                    rect.x as i32,
                    rect.y as i32,
                    rect.width as i32,
                    rect.height as i32,
                    Color::RED,
                ),
                SurfaceOp::Stroke(rect, MaskShape::Circle) => d.draw_circle_lines(
                    (rect.x + rect.width / 2.0) as i32,
                    (rect.y + rect.height / 2.0) as i32,
                    (rect.width + rect.height) / 4.0,
                    Color::RED,
                ),
            }
        }
    }
}

fn draw_command(d: &mut RaylibDrawHandle, texture: &Texture2D, cmd: &DrawCommand) {
    let src = Rectangle {
        x: cmd.source.x,
        y: cmd.source.y,
        width: cmd.source.width,
        height: cmd.source.height,
    };
    // The destination x/y is the pivot; the origin puts it in the middle.
    let dest = Rectangle {
        x: cmd.center.x,
        y: cmd.center.y,
        width: cmd.size.width,
        height: cmd.size.height,
    };
    let origin = Vector2 {
        x: cmd.size.width / 2.0,
        y: cmd.size.height / 2.0,
    };
    d.draw_texture_pro(texture, src, dest, origin, cmd.rotation, Color::WHITE);
}

impl Surface for RaylibSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.queue.push(SurfaceOp::Clear);
    }

    fn draw_image(&mut self, command: &DrawCommand) -> Result<()> {
        self.queue.push(SurfaceOp::Image(command.clone()));
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, shape: MaskShape) -> Result<()> {
        self.queue.push(SurfaceOp::Stroke(rect, shape));
        Ok(())
    }
}
