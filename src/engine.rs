//! Engine facade.
//!
//! [`Engine`] wires the sprite registry, camera, scheduler, render pass and
//! pointer dispatch together around a clock, an image resolver and a drawing
//! surface. All three collaborators are required; [`EngineBuilder::build`]
//! refuses to produce an engine without them.
//!
//! One logic tick runs, in order:
//!
//! 1. the scheduler's `step` subscribers;
//! 2. every sprite's step actions, then moving vectors and animations;
//! 3. coordinate-change and intersection events for everything that moved;
//! 4. the scheduler's `logic_executed` event;
//!
//! and then requests a render. The host drives the loop through
//! [`Engine::advance`], which runs the ticks that came due and draws a frame
//! when one was requested.

use log::{debug, info};

use crate::components::coordinates::{Coordinate, Size};
use crate::components::sprite::{Sprite, SpriteId};
use crate::error::{EngineError, Result};
use crate::events::input::InputEvent;
use crate::resources::camera2d::Camera2D;
use crate::resources::engineconfig::EngineConfig;
use crate::resources::imageloader::{ImageConfig, ImageResolver};
use crate::resources::spriteregistry::SpriteRegistry;
use crate::resources::worldtime::Clock;
use crate::systems::animation::animation_system;
use crate::systems::collision::{self, HitQuery, detect_intersections};
use crate::systems::input::PointerDispatcher;
use crate::systems::movement::movement_system;
use crate::systems::render::{RenderPass, Surface};
use crate::systems::scheduler::Scheduler;

pub struct EngineBuilder<S: Surface> {
    config: EngineConfig,
    clock: Option<Box<dyn Clock>>,
    images: Option<Box<dyn ImageResolver>>,
    surface: Option<S>,
}

impl<S: Surface> EngineBuilder<S> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            clock: None,
            images: None,
            surface: None,
        }
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn images(mut self, images: impl ImageResolver + 'static) -> Self {
        self.images = Some(Box::new(images));
        self
    }

    pub fn surface(mut self, surface: S) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn build(self) -> Result<Engine<S>> {
        let clock = self
            .clock
            .ok_or_else(|| EngineError::Configuration("engine needs a clock".into()))?;
        let images = self
            .images
            .ok_or_else(|| EngineError::Configuration("engine needs an image resolver".into()))?;
        let surface = self
            .surface
            .ok_or_else(|| EngineError::Configuration("engine needs a drawing surface".into()))?;

        let config = self.config;
        let scheduler = Scheduler::from_rate(config.tick_rate, config.max_catch_up)?;
        let viewport = Size::new(config.viewport_width as f32, config.viewport_height as f32);
        let camera = Camera2D::new(viewport).with_min_scale(config.min_scale);
        let render = RenderPass::new().with_debug_masks(config.draw_masks);

        info!(
            "[engine] ready: {} ticks/s, viewport {}x{}",
            config.tick_rate, config.viewport_width, config.viewport_height
        );

        Ok(Engine {
            config,
            clock,
            images,
            surface,
            registry: SpriteRegistry::new(),
            camera,
            scheduler,
            render,
            input: PointerDispatcher::new(),
            render_requested: false,
        })
    }
}

pub struct Engine<S: Surface> {
    config: EngineConfig,
    clock: Box<dyn Clock>,
    images: Box<dyn ImageResolver>,
    surface: S,
    pub registry: SpriteRegistry,
    pub camera: Camera2D,
    pub scheduler: Scheduler,
    pub render: RenderPass,
    pub input: PointerDispatcher,
    render_requested: bool,
}

impl<S: Surface> Engine<S> {
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn images_mut(&mut self) -> &mut dyn ImageResolver {
        self.images.as_mut()
    }

    /// Arm the scheduler; the first tick is due immediately.
    pub fn start(&mut self) {
        let now = self.now();
        self.scheduler.start(now);
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn pause(&mut self) {
        self.scheduler.pause();
    }

    pub fn resume(&mut self) {
        self.scheduler.resume();
    }

    /// Resolve the picture and register a new sprite.
    pub fn create_sprite(&mut self, id: SpriteId, image: &ImageConfig) -> Result<&mut Sprite> {
        let timeout = self.config.load_timeout();
        self.registry
            .create_sprite(id, image, self.images.as_mut(), timeout)
    }

    pub fn add_sprite(&mut self, sprite: Sprite) -> &mut Sprite {
        self.registry.add_sprite(sprite)
    }

    pub fn remove_sprite(&mut self, id: &SpriteId) -> usize {
        self.registry.remove_sprite_by_id(id)
    }

    pub fn sprite(&self, id: &SpriteId) -> Option<&Sprite> {
        self.registry.get(id)
    }

    pub fn sprite_mut(&mut self, id: &SpriteId) -> Option<&mut Sprite> {
        self.registry.get_mut(id)
    }

    /// Start moving a sprite towards `end`, timed from the current clock.
    pub fn move_sprite(&mut self, id: &SpriteId, end: Coordinate, duration_ms: f64) -> Result<()> {
        let now = self.now();
        let sprite = self.registry.get_mut(id).ok_or_else(|| {
            EngineError::InvariantViolation(format!("no sprite with id {}", id))
        })?;
        sprite.move_to(end, duration_ms, now)
    }

    /// Run one logic tick at `now`, regardless of the schedule.
    pub fn tick(&mut self, now: f64) {
        if self.scheduler.is_paused() {
            return;
        }
        self.scheduler.begin_tick(now);
        for sprite in self.registry.iter_mut() {
            sprite.run_step_actions();
        }
        movement_system(&mut self.registry, now);
        animation_system(&mut self.registry, now);
        detect_intersections(&mut self.registry, &self.camera, self.config.broad_phase);
        self.scheduler.finish_tick();
        self.render_requested = true;
    }

    /// Run the ticks that came due and draw a frame if one was requested.
    /// Returns how many logic ticks ran.
    pub fn advance(&mut self) -> Result<usize> {
        let now = self.now();
        let due = self.scheduler.due_ticks(now);
        let mut ran = 0;
        for at in &due {
            if !self.scheduler.is_paused() {
                self.tick(*at);
                ran += 1;
            }
        }
        if !due.is_empty() {
            self.render_requested = true;
        }
        if self.render_requested {
            self.render_frame()?;
        }
        Ok(ran)
    }

    /// Draw a frame now. Changes made outside a tick are announced first.
    pub fn render_frame(&mut self) -> Result<usize> {
        detect_intersections(&mut self.registry, &self.camera, self.config.broad_phase);
        self.render_requested = false;
        self.render
            .render_frame(&mut self.surface, &self.registry, &self.camera)
    }

    /// Milliseconds until [`Engine::advance`] has work to do.
    pub fn time_until_next_tick(&self) -> Option<f64> {
        self.scheduler.time_until_next_tick(self.now())
    }

    pub fn handle_input(&mut self, event: InputEvent) -> usize {
        debug!("[engine] input {:?}", event);
        self.input
            .dispatch(event, &mut self.registry, &mut self.camera)
    }

    pub fn who_is_at(&self, screen: Coordinate, query: HitQuery) -> Vec<&Sprite> {
        collision::who_is_at(&self.registry, &self.camera, screen, query)
    }

    /// Sprites overlapping the sprite `id`; empty when there is no such sprite.
    pub fn all_intersecting(&self, id: &SpriteId) -> Vec<&Sprite> {
        match self.registry.get(id) {
            Some(sprite) => collision::all_intersecting(&self.registry, &self.camera, sprite),
            None => Vec::new(),
        }
    }

    /// `None` when either sprite does not exist.
    pub fn intersects(&self, a: &SpriteId, b: &SpriteId, rect_only: bool) -> Option<bool> {
        let a = self.registry.get(a)?;
        let b = self.registry.get(b)?;
        Some(collision::intersects(a, b, &self.camera, rect_only))
    }

    pub fn ticks_executed(&self) -> u64 {
        self.scheduler.ticks_executed()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.render.frames()
    }
}
