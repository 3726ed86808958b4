use std::cell::RefCell;
use std::rc::Rc;

use spritecore::components::coordinates::Coordinate;
use spritecore::components::mask::Mask;
use spritecore::components::sprite::{Sprite, SpriteId};
use spritecore::events::sprite::IntersectionEvent;
use spritecore::resources::camera2d::Camera2D;
use spritecore::resources::imageloader::ImageHandle;
use spritecore::resources::spriteregistry::SpriteRegistry;
use spritecore::systems::collision::{
    BroadPhase, HitQuery, all_intersecting, detect_intersections, intersects, who_is_at,
};
use spritecore::systems::render::build_draw_list;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

fn id(name: &str) -> SpriteId {
    SpriteId::new(name).unwrap()
}

fn square(name: &str, x: f32, y: f32, side: f32) -> Sprite {
    Sprite::new(id(name), ImageHandle::new("img.png", side as u32, side as u32))
        .with_coordinates(Coordinate::new(x, y))
        .with_mask(Mask::new(side, side))
}

fn record_intersections(registry: &mut SpriteRegistry) -> Rc<RefCell<Vec<IntersectionEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    registry
        .intersection
        .subscribe(move |e: &IntersectionEvent| l.borrow_mut().push(e.clone()));
    log
}

#[test]
fn moving_into_a_sprite_reports_it() {
    let mut registry = SpriteRegistry::new();
    let camera = Camera2D::default();
    registry.add_sprite(square("a", 0.0, 0.0, 10.0));
    registry.add_sprite(square("b", 20.0, 20.0, 10.0));
    let log = record_intersections(&mut registry);

    // Placement check of the new sprites: nothing overlaps yet.
    assert_eq!(detect_intersections(&mut registry, &camera, BroadPhase::Scan), 0);

    registry
        .get_mut(&id("a"))
        .unwrap()
        .set_coordinates(Coordinate::new(15.0, 15.0));
    assert_eq!(detect_intersections(&mut registry, &camera, BroadPhase::Scan), 1);

    let log = log.borrow();
    assert_eq!(log[0].moving, id("a"));
    assert_eq!(log[0].standing, vec![id("b")]);

    let a = registry.get(&id("a")).unwrap();
    let overlapping: Vec<&SpriteId> = all_intersecting(&registry, &camera, a)
        .into_iter()
        .map(|s| s.id())
        .collect();
    assert_eq!(overlapping, vec![&id("b")]);
}

#[test]
fn circle_and_rect_use_the_exact_shape() {
    let camera = Camera2D::default();
    let ball = Sprite::new(id("ball"), ImageHandle::new("ball.png", 20, 20))
        .with_mask(Mask::circle(10.0));

    // Bounding boxes overlap at the corner, the circle does not reach it.
    let far = square("far", 18.0, 18.0, 10.0);
    assert!(intersects(&ball, &far, &camera, true));
    assert!(!intersects(&ball, &far, &camera, false));

    let near = square("near", 17.0, 17.0, 10.0);
    assert!(intersects(&ball, &near, &camera, false));

    // Circle centered at (50, 50) with radius 10 inside a 20x20 box at (40, 40).
    let inner = Sprite::new(id("inner"), ImageHandle::new("ball.png", 20, 20))
        .with_coordinates(Coordinate::new(40.0, 40.0))
        .with_mask(Mask::circle(10.0));
    let frame = square("frame", 40.0, 40.0, 20.0);
    assert!(intersects(&inner, &frame, &camera, false));
}

#[test]
fn hidden_sprites_are_never_hit() {
    let mut registry = SpriteRegistry::new();
    let camera = Camera2D::default();
    registry.add_sprite(square("visible", 0.0, 0.0, 50.0));
    let ghost = registry.add_sprite(square("ghost", 0.0, 0.0, 50.0).with_layer(3));
    ghost.hidden = true;

    for (x, y) in [(1.0, 1.0), (25.0, 25.0), (49.0, 49.0)] {
        let hits = who_is_at(&registry, &camera, Coordinate::new(x, y), HitQuery::all_layers());
        assert!(hits.iter().all(|s| s.id() != &id("ghost")));
        assert_eq!(hits.len(), 1);
    }
}

#[test]
fn far_apart_sprites_never_intersect() {
    let mut registry = SpriteRegistry::new();
    let camera = Camera2D::default();
    registry.add_sprite(square("left", 0.0, 0.0, 10.0));
    registry.add_sprite(square("right", 500.0, 0.0, 10.0));
    let left = registry.get(&id("left")).unwrap();
    assert!(all_intersecting(&registry, &camera, left).is_empty());
    assert!(!intersects(
        left,
        registry.get(&id("right")).unwrap(),
        &camera,
        false
    ));
}

#[test]
fn grid_and_scan_report_the_same_overlaps() {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut scan = SpriteRegistry::new();
    let mut grid = SpriteRegistry::new();
    for i in 0..80 {
        let (x, y) = (rng.f32() * 300.0, rng.f32() * 300.0);
        let side = 5.0 + rng.f32() * 25.0;
        let name = format!("s{}", i);
        scan.add_sprite(square(&name, x, y, side));
        grid.add_sprite(square(&name, x, y, side));
    }
    let camera = Camera2D::default();
    let scan_log = record_intersections(&mut scan);
    let grid_log = record_intersections(&mut grid);

    let n_scan = detect_intersections(&mut scan, &camera, BroadPhase::Scan);
    let n_grid = detect_intersections(&mut grid, &camera, BroadPhase::Grid { cell_size: 32.0 });

    assert!(n_scan > 0);
    assert_eq!(n_scan, n_grid);
    assert_eq!(*scan_log.borrow(), *grid_log.borrow());
}

#[test]
fn huge_background_does_not_break_the_grid() {
    let mut scan = SpriteRegistry::new();
    let mut grid = SpriteRegistry::new();
    for registry in [&mut scan, &mut grid] {
        registry.add_sprite(square("world", -500_000.0, -500_000.0, 1_000_000.0));
        registry.add_sprite(square("a", 0.0, 0.0, 10.0));
        registry.add_sprite(square("b", 5.0, 5.0, 10.0));
        registry.add_sprite(square("c", 400.0, 400.0, 10.0));
    }
    let camera = Camera2D::default();
    let scan_log = record_intersections(&mut scan);
    let grid_log = record_intersections(&mut grid);

    let n_scan = detect_intersections(&mut scan, &camera, BroadPhase::Scan);
    let n_grid = detect_intersections(&mut grid, &camera, BroadPhase::Grid { cell_size: 128.0 });

    assert_eq!(n_scan, 4);
    assert_eq!(n_scan, n_grid);
    assert_eq!(*scan_log.borrow(), *grid_log.borrow());
    let c_hits = scan_log
        .borrow()
        .iter()
        .find(|e| e.moving == id("c"))
        .map(|e| e.standing.clone());
    assert_eq!(c_hits, Some(vec![id("world")]));
}

#[test]
fn screen_world_round_trip() {
    let mut camera = Camera2D::default();
    let mut rng = fastrand::Rng::with_seed(42);
    for _ in 0..50 {
        camera.set_focal(Coordinate::new(
            rng.f32() * 400.0 - 200.0,
            rng.f32() * 400.0 - 200.0,
        ));
        camera.set_scale(0.25 + rng.f32() * 4.0);
        let p = Coordinate::new(rng.f32() * 1000.0 - 500.0, rng.f32() * 1000.0 - 500.0);
        let back = camera.screen_to_world(camera.world_to_screen(p));
        assert!(approx_eq(back.x, p.x) && approx_eq(back.y, p.y));
    }
}

#[test]
fn zoom_at_focal_keeps_its_projection() {
    let mut camera = Camera2D::default();
    camera.set_focal(Coordinate::new(30.0, -20.0));
    let focal = camera.focal();
    let before = camera.world_to_screen(focal);

    camera.zoom_by(0.5, None);

    assert!(approx_eq(camera.scale(), 1.5));
    let after = camera.world_to_screen(focal);
    assert!(approx_eq(before.x, after.x) && approx_eq(before.y, after.y));
}

#[test]
fn lower_sprites_draw_later_on_the_same_layer() {
    let mut registry = SpriteRegistry::new();
    registry.add_sprite(square("low", 0.0, 100.0, 10.0));
    registry.add_sprite(square("high", 0.0, 50.0, 10.0));
    registry.add_sprite(square("top", 0.0, 0.0, 10.0).with_layer(2));

    let order: Vec<usize> = build_draw_list(&registry, &Camera2D::default())
        .iter()
        .map(|r| r.index)
        .collect();
    assert_eq!(order, vec![1, 0, 2]);
}
