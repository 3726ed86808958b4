//! Render pass.
//!
//! Each frame clears the surface, builds one transient [`DrawRecord`] per
//! visible sprite, depth-sorts them and hands them to a [`Surface`] in order.
//!
//! Depth order: layer ascending, then the lower edge of the sprite on screen
//! (`y + height`) ascending, so sprites further down the screen are drawn
//! later and overlap those above them. The sort is stable: ties keep
//! registry order.
//!
//! Drawing itself is behind [`Surface`]. [`RecordingSurface`] keeps the
//! commands in memory for headless runs and tests; with the `raylib` feature
//! `RaylibSurface` draws into a window.

use log::trace;
use std::cmp::Ordering;

use crate::components::coordinates::{Coordinate, Rect, Size};
use crate::components::mask::MaskShape;
use crate::components::sprite::Sprite;
use crate::error::{EngineError, Result};
use crate::events::distributor::EventDistributor;
use crate::events::engine::FrameRendered;
use crate::resources::camera2d::Camera2D;
use crate::resources::imageloader::ImageHandle;
use crate::resources::spriteregistry::SpriteRegistry;
use crate::systems::collision::local_body;

/// One image draw: `source` of `image` stretched over a `size` box centered
/// on `center`, rotated by `rotation` degrees around that center.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub image: ImageHandle,
    pub source: Rect,
    pub center: Coordinate,
    pub size: Size,
    pub rotation: f32,
}

impl DrawCommand {
    /// Screen rectangle covered before rotation.
    pub fn dest(&self) -> Rect {
        Rect::from_parts(self.center - self.size.half(), self.size)
    }
}

/// A drawing backend.
pub trait Surface {
    /// Drawable area in pixels.
    fn size(&self) -> Size;

    fn clear(&mut self);

    fn draw_image(&mut self, command: &DrawCommand) -> Result<()>;

    /// Outline a mask. Backends without line drawing keep the default.
    fn stroke_rect(&mut self, _rect: Rect, _shape: MaskShape) -> Result<()> {
        Err(EngineError::Unimplemented("Surface::stroke_rect"))
    }
}

/// Draw data of one sprite for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Position of the sprite in the registry.
    pub index: usize,
    pub layer: i32,
    /// Screen rectangle before rotation.
    pub screen: Rect,
    pub rotation: f32,
    pub source: Rect,
}

impl DrawRecord {
    pub fn depth_cmp(&self, other: &Self) -> Ordering {
        self.layer
            .cmp(&other.layer)
            .then_with(|| self.screen.bottom().total_cmp(&other.screen.bottom()))
    }
}

/// Screen rectangle of a sprite's picture.
pub fn screen_rect(sprite: &Sprite, camera: &Camera2D) -> Rect {
    let position = sprite.coordinates() + sprite.pic_offset;
    let size = sprite.display_size();
    if sprite.static_coordinates {
        Rect::from_parts(position, size)
    } else {
        Rect::from_parts(
            camera.world_to_screen(position),
            camera.world_size_to_screen(size),
        )
    }
}

/// Part of the image to draw: the current animation frame or the whole picture.
pub fn source_rect(sprite: &Sprite) -> Rect {
    let image = sprite.image();
    match &sprite.animation {
        Some(animation) => animation.source_rect(image.height() as f32),
        None => Rect::new(0.0, 0.0, image.width() as f32, image.height() as f32),
    }
}

/// Draw records for every visible sprite, depth-sorted.
pub fn build_draw_list(registry: &SpriteRegistry, camera: &Camera2D) -> Vec<DrawRecord> {
    let mut records: Vec<DrawRecord> = registry
        .iter()
        .enumerate()
        .filter(|(_, sprite)| !sprite.hidden)
        .map(|(index, sprite)| DrawRecord {
            index,
            layer: sprite.layer(),
            screen: screen_rect(sprite, camera),
            rotation: sprite.rotation,
            source: source_rect(sprite),
        })
        .collect();
    records.sort_by(DrawRecord::depth_cmp);
    records
}

#[derive(Debug, Default)]
pub struct RenderPass {
    frames: u64,
    draw_masks: bool,
    background: Option<ImageHandle>,
    pub frame_rendered: EventDistributor<FrameRendered>,
}

impl RenderPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug_masks(mut self, draw_masks: bool) -> Self {
        self.draw_masks = draw_masks;
        self
    }

    pub fn set_debug_masks(&mut self, draw_masks: bool) {
        self.draw_masks = draw_masks;
    }

    /// Image tiled over the whole surface behind all sprites.
    pub fn set_background(&mut self, background: Option<ImageHandle>) {
        self.background = background;
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Draw one frame. Returns how many sprites were drawn.
    pub fn render_frame(
        &mut self,
        surface: &mut dyn Surface,
        registry: &SpriteRegistry,
        camera: &Camera2D,
    ) -> Result<usize> {
        surface.clear();
        if let Some(background) = &self.background {
            render_background_repeat(surface, background, camera)?;
        }

        let records = build_draw_list(registry, camera);
        let sprites = registry.sprites();
        let mut frames_advanced = 0;
        for record in &records {
            let sprite = &sprites[record.index];
            if sprite.animation.as_ref().is_some_and(|a| a.take_frame_due()) {
                frames_advanced += 1;
            }
            surface.draw_image(&DrawCommand {
                image: sprite.image().clone(),
                source: record.source,
                center: record.screen.top_left() + record.screen.size().half(),
                size: record.screen.size(),
                rotation: record.rotation,
            })?;
        }

        if self.draw_masks {
            for sprite in registry.iter().filter(|s| !s.hidden) {
                let body = local_body(sprite);
                let rect = if sprite.static_coordinates {
                    Rect::from_parts(body.top_left, body.size)
                } else {
                    Rect::from_parts(
                        camera.world_to_screen(body.top_left),
                        camera.world_size_to_screen(body.size),
                    )
                };
                surface.stroke_rect(rect, body.shape)?;
            }
        }

        self.frames += 1;
        trace!("[render] frame {} drew {} sprite(s)", self.frames, records.len());
        self.frame_rendered.publish(&FrameRendered {
            frame: self.frames,
            sprites_drawn: records.len(),
            frames_advanced,
        });
        Ok(records.len())
    }
}

/// Tile `image` over the whole surface, scrolling and scaling with the camera.
pub fn render_background_repeat(
    surface: &mut dyn Surface,
    image: &ImageHandle,
    camera: &Camera2D,
) -> Result<()> {
    let tile = camera.world_size_to_screen(image.size());
    if tile.width < 1.0 || tile.height < 1.0 {
        return Ok(());
    }
    let area = surface.size();
    let origin = camera.world_to_screen(Coordinate::origin());
    let start_x = origin.x.rem_euclid(tile.width) - tile.width;
    let start_y = origin.y.rem_euclid(tile.height) - tile.height;
    let source = Rect::new(0.0, 0.0, image.width() as f32, image.height() as f32);

    let mut y = start_y;
    while y < area.height {
        let mut x = start_x;
        while x < area.width {
            surface.draw_image(&DrawCommand {
                image: image.clone(),
                source,
                center: Coordinate::new(x, y) + tile.half(),
                size: tile,
                rotation: 0.0,
            })?;
            x += tile.width;
        }
        y += tile.height;
    }
    Ok(())
}

/// Draw `image` at a fixed screen position, ignoring the camera.
pub fn render_static_picture(
    surface: &mut dyn Surface,
    image: &ImageHandle,
    top_left: Coordinate,
    size: Option<Size>,
) -> Result<()> {
    let size = size.unwrap_or_else(|| image.size());
    surface.draw_image(&DrawCommand {
        image: image.clone(),
        source: Rect::new(0.0, 0.0, image.width() as f32, image.height() as f32),
        center: top_left + size.half(),
        size,
        rotation: 0.0,
    })
}

/// What a [`RecordingSurface`] saw.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Clear,
    Image(DrawCommand),
    Stroke(Rect, MaskShape),
}

/// Surface that records the operations of the latest frame instead of drawing.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Size,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Image draws since the last clear.
    pub fn last_frame(&self) -> Vec<&DrawCommand> {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == SurfaceOp::Clear)
            .map_or(0, |i| i + 1);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Image(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    /// Starts a new frame; ops from earlier frames are dropped.
    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(SurfaceOp::Clear);
    }

    fn draw_image(&mut self, command: &DrawCommand) -> Result<()> {
        self.ops.push(SurfaceOp::Image(command.clone()));
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rect, shape: MaskShape) -> Result<()> {
        self.ops.push(SurfaceOp::Stroke(rect, shape));
        Ok(())
    }
}
