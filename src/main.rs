//! Spritecore runner.
//!
//! Loads an INI configuration and a JSON scene, then drives the engine:
//!
//! - headless (default): renders into a [`RecordingSurface`] for a fixed
//!   number of logic ticks, either on simulated time or, with `--realtime`,
//!   on the system clock;
//! - windowed (`--window`, needs the `raylib` feature): opens a raylib window
//!   and feeds mouse input to the engine until the window closes.
//!
//! Intersections and finished movements are logged as they happen.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --scene scene.json --ticks 600
//! ```

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

use spritecore::Engine;
use spritecore::EngineBuilder;
use spritecore::resources::engineconfig::EngineConfig;
use spritecore::resources::imageloader::ImageLoader;
use spritecore::resources::worldtime::{ManualClock, SystemClock};
use spritecore::scene::SceneFile;
use spritecore::systems::render::{RecordingSurface, Surface};

/// Spritecore 2D sprite engine
#[derive(Parser)]
#[command(version, about = "Runs a sprite scene through the spritecore engine.")]
struct Cli {
    /// INI configuration file. Defaults apply when absent.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON scene to spawn.
    #[arg(long, value_name = "PATH")]
    scene: Option<PathBuf>,

    /// Logic ticks to run in headless mode.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Follow the wall clock instead of simulated time.
    #[arg(long)]
    realtime: bool,

    /// Outline sprite masks.
    #[arg(long)]
    draw_masks: bool,

    /// Open a window (requires the `raylib` feature).
    #[arg(long)]
    window: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> spritecore::Result<()> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = EngineConfig::with_path(path);
            config
                .load_from_file()
                .map_err(spritecore::EngineError::Config)?;
            config
        }
        None => EngineConfig::new(),
    };
    config.draw_masks |= cli.draw_masks;

    let scene = match &cli.scene {
        Some(path) => SceneFile::load(path)?,
        None => SceneFile::default(),
    };
    let images = ImageLoader::with_preload(scene.images());

    if cli.window {
        return run_windowed(config, images, &scene);
    }

    let (width, height) = config.viewport_size();
    let surface = RecordingSurface::new(width as f32, height as f32);
    if cli.realtime {
        let mut engine = EngineBuilder::new(config)
            .clock(SystemClock::new())
            .images(images)
            .surface(surface)
            .build()?;
        setup(&mut engine, &scene)?;
        while engine.ticks_executed() < cli.ticks {
            engine.advance()?;
            if let Some(wait) = engine.time_until_next_tick() {
                std::thread::sleep(std::time::Duration::from_secs_f64(wait / 1000.0));
            }
        }
        report(&engine);
    } else {
        let clock = ManualClock::new();
        let mut engine = EngineBuilder::new(config)
            .clock(clock.clone())
            .images(images)
            .surface(surface)
            .build()?;
        setup(&mut engine, &scene)?;
        let interval = engine.scheduler.interval_ms();
        while engine.ticks_executed() < cli.ticks {
            engine.advance()?;
            clock.advance(interval);
        }
        report(&engine);
    }
    Ok(())
}

fn setup<S: Surface>(engine: &mut Engine<S>, scene: &SceneFile) -> spritecore::Result<()> {
    engine.registry.intersection.subscribe(|e| {
        let standing: Vec<&str> = e.standing.iter().map(|id| id.as_str()).collect();
        info!("{} intersects [{}]", e.moving, standing.join(", "));
    });
    engine.registry.vector_movement_ended.subscribe(|e| {
        info!(
            "{} finished moving at ({}, {})",
            e.id, e.coordinates.x, e.coordinates.y
        );
    });
    let ids = scene.spawn(engine)?;
    info!("Scene ready with {} sprite(s)", ids.len());
    engine.start();
    Ok(())
}

fn report(engine: &Engine<RecordingSurface>) {
    info!(
        "Ran {} tick(s), rendered {} frame(s), last frame drew {} image(s)",
        engine.ticks_executed(),
        engine.frames_rendered(),
        engine.surface().last_frame().len()
    );
}

#[cfg(feature = "raylib")]
fn run_windowed(
    config: EngineConfig,
    images: ImageLoader,
    scene: &SceneFile,
) -> spritecore::Result<()> {
    use raylib::prelude::*;
    use spritecore::events::input::InputEvent;
    use spritecore::systems::raylibsurface::RaylibSurface;

    let (width, height) = config.viewport_size();
    let (mut rl, thread) = raylib::init()
        .size(width as i32, height as i32)
        .resizable()
        .title("Spritecore")
        .build();
    rl.set_target_fps(120);

    let mut engine = EngineBuilder::new(config)
        .clock(SystemClock::new())
        .images(images)
        .surface(RaylibSurface::new(width, height))
        .build()?;
    setup(&mut engine, scene)?;

    while !rl.window_should_close() {
        let mouse = rl.get_mouse_position();
        let (x, y) = (mouse.x, mouse.y);
        if rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT) {
            engine.handle_input(InputEvent::PointerDown { x, y });
        }
        let delta = rl.get_mouse_delta();
        if delta.x != 0.0 || delta.y != 0.0 {
            engine.handle_input(InputEvent::PointerMove { x, y });
        }
        if rl.is_mouse_button_released(MouseButton::MOUSE_BUTTON_LEFT) {
            engine.handle_input(InputEvent::PointerUp { x, y });
            engine.handle_input(InputEvent::Click { x, y });
        }
        let wheel = rl.get_mouse_wheel_move();
        if wheel != 0.0 {
            engine.handle_input(InputEvent::Wheel {
                x,
                y,
                delta: wheel * 0.1,
            });
        }

        let (w, h) = (rl.get_screen_width(), rl.get_screen_height());
        engine.surface_mut().resize(w, h);
        engine.camera.set_viewport(spritecore::components::coordinates::Size::new(
            w as f32, h as f32,
        ));

        engine.advance()?;
        engine.surface_mut().present(&mut rl, &thread);
    }
    Ok(())
}

#[cfg(not(feature = "raylib"))]
fn run_windowed(
    _config: EngineConfig,
    _images: ImageLoader,
    _scene: &SceneFile,
) -> spritecore::Result<()> {
    Err(spritecore::EngineError::Configuration(
        "this build has no window support; rebuild with --features raylib".into(),
    ))
}
