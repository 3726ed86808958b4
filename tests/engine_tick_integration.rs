//! Engine tick integration tests: scheduling, movement, animation, event
//! ordering and rendering driven through the public engine facade.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spritecore::components::coordinates::Coordinate;
use spritecore::components::mask::Mask;
use spritecore::components::sprite::{Sprite, SpriteId};
use spritecore::components::spriteanimation::SpriteAnimation;
use spritecore::events::input::InputEvent;
use spritecore::resources::engineconfig::EngineConfig;
use spritecore::resources::imageloader::{ImageConfig, ImageHandle, MemoryImages};
use spritecore::resources::worldtime::{Clock, ManualClock};
use spritecore::scene::SceneFile;
use spritecore::systems::render::RecordingSurface;
use spritecore::{Engine, EngineBuilder};

const EPSILON: f32 = 1e-3;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn make_engine(tick_rate: u32) -> (Engine<RecordingSurface>, ManualClock) {
    let clock = ManualClock::new();
    let mut config = EngineConfig::new();
    config.tick_rate = tick_rate;
    let images = MemoryImages::new()
        .with_image("hero.png", 10, 10)
        .with_image("rock.png", 10, 10)
        .with_image("sheet.png", 40, 10);
    let engine = EngineBuilder::new(config)
        .clock(clock.clone())
        .images(images)
        .surface(RecordingSurface::new(800.0, 600.0))
        .build()
        .unwrap();
    (engine, clock)
}

fn id(s: &str) -> SpriteId {
    SpriteId::new(s).unwrap()
}

/// Step the clock one tick interval at a time, advancing the engine at
/// every step, until it reads `until`.
fn run_until(engine: &mut Engine<RecordingSurface>, clock: &ManualClock, until: f64) {
    let step = engine.scheduler.interval_ms();
    engine.advance().unwrap();
    while clock.now_ms() < until {
        clock.advance(step);
        engine.advance().unwrap();
    }
}

fn drawn(engine: &Engine<RecordingSurface>) -> Vec<String> {
    engine
        .surface()
        .last_frame()
        .iter()
        .map(|c| c.image.path().to_string())
        .collect()
}

#[test]
fn vector_moves_sprite_across_ticks_and_ends_once() {
    let (mut engine, clock) = make_engine(100);
    engine
        .create_sprite(id("hero"), &ImageConfig::new("hero.png"))
        .unwrap();
    engine.start();
    engine
        .move_sprite(&id("hero"), Coordinate::new(100.0, 0.0), 1000.0)
        .unwrap();

    let ended = Rc::new(Cell::new(0));
    let e = ended.clone();
    engine
        .registry
        .vector_movement_ended
        .subscribe(move |_| e.set(e.get() + 1));

    run_until(&mut engine, &clock, 500.0);
    let at = engine.sprite(&id("hero")).unwrap().coordinates();
    assert!(approx_eq(at.x, 50.0), "x = {}", at.x);
    assert!(approx_eq(at.y, 0.0));

    run_until(&mut engine, &clock, 1500.0);

    let at = engine.sprite(&id("hero")).unwrap().coordinates();
    assert_eq!(at, Coordinate::new(100.0, 0.0));
    assert_eq!(ended.get(), 1);
}

#[test]
fn tick_phases_run_in_order_before_render() {
    let (mut engine, clock) = make_engine(10);
    let log = Rc::new(RefCell::new(Vec::<String>::new()));

    let l = log.clone();
    engine.scheduler.step.subscribe(move |_| l.borrow_mut().push("step".into()));
    let l = log.clone();
    engine
        .scheduler
        .logic_executed
        .subscribe(move |e| l.borrow_mut().push(format!("logic {}", e.tick)));
    let l = log.clone();
    engine
        .registry
        .coordinates_changed
        .subscribe(move |m| l.borrow_mut().push(format!("moved {}", m.id)));
    let l = log.clone();
    engine
        .registry
        .intersection
        .subscribe(move |e| l.borrow_mut().push(format!("hit {}", e.moving)));
    let l = log.clone();
    engine
        .render
        .frame_rendered
        .subscribe(move |f| l.borrow_mut().push(format!("frame {}", f.frame)));

    engine.add_sprite(
        Sprite::new(id("rock"), ImageHandle::new("rock.png", 10, 10))
            .with_coordinates(Coordinate::new(12.0, 0.0)),
    );
    let walker = engine.add_sprite(Sprite::new(id("walker"), ImageHandle::new("hero.png", 10, 10)));
    let l = log.clone();
    walker.add_step_action(move |s| {
        l.borrow_mut().push("action".into());
        let c = s.coordinates();
        s.set_coordinates(Coordinate::new(c.x + 5.0, c.y));
    });

    engine.start();
    engine.advance().unwrap();
    log.borrow_mut().clear();

    clock.advance(100.0);
    engine.advance().unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["step", "action", "moved walker", "hit walker", "logic 2", "frame 2"]
    );
}

#[test]
fn pause_skips_logic_but_keeps_rendering() {
    let (mut engine, clock) = make_engine(10);
    let actions = Rc::new(Cell::new(0));
    let a = actions.clone();
    engine
        .add_sprite(Sprite::new(id("s"), ImageHandle::new("hero.png", 10, 10)))
        .add_step_action(move |_| a.set(a.get() + 1));

    engine.start();
    engine.advance().unwrap();
    assert_eq!(actions.get(), 1);

    engine.pause();
    clock.advance(300.0);
    assert_eq!(engine.advance().unwrap(), 0);
    assert_eq!(actions.get(), 1);
    assert_eq!(engine.frames_rendered(), 2);

    engine.resume();
    clock.advance(100.0);
    assert_eq!(engine.advance().unwrap(), 1);
    assert_eq!(actions.get(), 2);
}

#[test]
fn catch_up_is_bounded_after_a_stall() {
    let (mut engine, clock) = make_engine(100);
    engine.start();
    clock.advance(10_000.0);
    let ran = engine.advance().unwrap();
    assert_eq!(ran as u32, engine.config().max_catch_up);
    assert!(engine.scheduler.skipped_ticks() > 0);
}

#[test]
fn hidden_sprites_never_reach_the_surface() {
    let (mut engine, _clock) = make_engine(60);
    engine
        .create_sprite(id("visible"), &ImageConfig::new("hero.png"))
        .unwrap();
    engine
        .create_sprite(id("secret"), &ImageConfig::new("rock.png"))
        .unwrap()
        .hidden = true;
    engine.start();
    engine.advance().unwrap();
    assert_eq!(drawn(&engine), vec!["hero.png"]);
}

#[test]
fn looping_animation_publishes_every_cycle() {
    let (mut engine, clock) = make_engine(100);
    let completions = Rc::new(Cell::new(0));
    let c = completions.clone();
    engine
        .registry
        .animation_completed
        .subscribe(move |_| c.set(c.get() + 1));

    let sheet = engine
        .create_sprite(id("torch"), &ImageConfig::new("sheet.png"))
        .unwrap();
    let mut animation = SpriteAnimation::new(4, 50.0, 10.0).unwrap();
    animation.play_loop(0.0);
    sheet.animation = Some(animation);

    engine.start();
    for _ in 0..45 {
        engine.advance().unwrap();
        clock.advance(10.0);
    }
    // Completions at 200 ms and 400 ms.
    assert_eq!(completions.get(), 2);
    let frame = engine.surface().last_frame()[0].clone();
    assert_eq!(frame.size.width, 10.0);
}

#[test]
fn removing_a_sprite_releases_its_subscriptions() {
    let (mut engine, _clock) = make_engine(60);
    let token = Rc::new(());
    let held = token.clone();
    engine
        .create_sprite(id("temp"), &ImageConfig::new("hero.png"))
        .unwrap()
        .mouse_click
        .subscribe(move |_| {
            let _ = &held;
        });
    assert_eq!(Rc::strong_count(&token), 2);
    assert_eq!(engine.remove_sprite(&id("temp")), 1);
    assert_eq!(Rc::strong_count(&token), 1);
}

#[test]
fn clicks_go_through_the_engine() {
    let (mut engine, _clock) = make_engine(60);
    let clicked = Rc::new(Cell::new(false));
    let c = clicked.clone();
    engine
        .add_sprite(
            Sprite::new(id("button"), ImageHandle::new("hero.png", 10, 10))
                .with_coordinates(Coordinate::new(100.0, 100.0))
                .with_mask(Mask::new(10.0, 10.0)),
        )
        .mouse_click
        .subscribe(move |_| c.set(true));

    assert_eq!(engine.handle_input(InputEvent::Click { x: 50.0, y: 50.0 }), 0);
    assert_eq!(engine.handle_input(InputEvent::Click { x: 105.0, y: 105.0 }), 1);
    assert!(clicked.get());
}

#[test]
fn scene_spawns_sprites_with_vectors() {
    let (mut engine, clock) = make_engine(100);
    let scene = SceneFile::from_json(
        r#"{ "sprites": [
            { "id": "hero", "image": { "path": "hero.png" }, "layer": 1,
              "vector": { "to": { "x": 0, "y": 40 }, "duration_ms": 400 } },
            { "image": { "path": "rock.png" }, "coordinates": { "x": 0, "y": 200 } }
        ] }"#,
    )
    .unwrap();
    let ids = scene.spawn(&mut engine).unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(engine.sprite(&id("hero")).unwrap().layer(), 1);

    engine.start();
    run_until(&mut engine, &clock, 200.0);
    let y = engine.sprite(&id("hero")).unwrap().coordinates().y;
    assert!(approx_eq(y, 20.0));
}
