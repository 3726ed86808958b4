//! Hit testing and sprite-to-sprite intersection.
//!
//! Every query runs in two phases. The broad phase compares axis-aligned
//! bounding boxes of the masks; only candidates that survive it reach the
//! shape-specific narrow phase (rect/rect, rect/circle, circle/circle).
//!
//! Camera-static sprites live in screen space. For hit tests their masks are
//! compared against the raw screen point; for intersections they are
//! brought into world space through the camera first.

use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::components::coordinates::{Coordinate, Size};
use crate::components::mask::{MaskBody, MaskShape};
use crate::components::sprite::Sprite;
use crate::events::sprite::{IntersectionEvent, SpriteMoved};
use crate::geometry::{
    circle_intersects_circle, point_in_circle, point_in_rect, rect_intersects_circle,
    rect_intersects_rect,
};
use crate::resources::camera2d::Camera2D;
use crate::resources::spriteregistry::SpriteRegistry;

/// How candidates are gathered before the exact shape test.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BroadPhase {
    /// Compare against every other sprite.
    #[default]
    Scan,
    /// Bucket masks into a uniform grid rebuilt for each pass.
    Grid { cell_size: f32 },
}

/// Filters for [`who_is_at`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitQuery {
    /// Keep only the hits on the highest layer among all hits.
    pub from_top_layer_only: bool,
    /// Skip camera-static sprites.
    pub ignore_static: bool,
    /// Keep only hits on this layer; ignored when `from_top_layer_only`.
    pub layer: Option<i32>,
}

impl Default for HitQuery {
    fn default() -> Self {
        Self {
            from_top_layer_only: true,
            ignore_static: false,
            layer: None,
        }
    }
}

impl HitQuery {
    pub fn all_layers() -> Self {
        Self {
            from_top_layer_only: false,
            ..Self::default()
        }
    }

    pub fn on_layer(layer: i32) -> Self {
        Self {
            from_top_layer_only: false,
            layer: Some(layer),
            ..Self::default()
        }
    }
}

/// Mask of `sprite` in the space its coordinates live in.
pub fn local_body(sprite: &Sprite) -> MaskBody {
    sprite.mask.body(sprite.coordinates())
}

/// Mask of `sprite` in world space.
pub fn world_body(sprite: &Sprite, camera: &Camera2D) -> MaskBody {
    let body = local_body(sprite);
    if !sprite.static_coordinates {
        return body;
    }
    let scale = camera.scale();
    MaskBody {
        top_left: camera.screen_to_world(body.top_left),
        size: Size::new(body.size.width / scale, body.size.height / scale),
        shape: body.shape,
    }
}

/// Exact overlap test between two placed masks. `rect_only` stops after the
/// bounding box test.
pub fn bodies_intersect(a: &MaskBody, b: &MaskBody, rect_only: bool) -> bool {
    if !rect_intersects_rect(a.top_left, a.size, b.top_left, b.size) {
        return false;
    }
    if rect_only {
        return true;
    }
    match (a.shape, b.shape) {
        (MaskShape::Rectangle, MaskShape::Rectangle) => true,
        (MaskShape::Rectangle, MaskShape::Circle) => {
            rect_intersects_circle(a.center(), a.size, b.center(), b.radius())
        }
        (MaskShape::Circle, MaskShape::Rectangle) => {
            rect_intersects_circle(b.center(), b.size, a.center(), a.radius())
        }
        (MaskShape::Circle, MaskShape::Circle) => {
            circle_intersects_circle(a.center(), a.radius(), b.center(), b.radius())
        }
    }
}

/// Whether the masks of `a` and `b` overlap.
pub fn intersects(a: &Sprite, b: &Sprite, camera: &Camera2D, rect_only: bool) -> bool {
    bodies_intersect(&world_body(a, camera), &world_body(b, camera), rect_only)
}

fn body_contains(body: &MaskBody, point: Coordinate) -> bool {
    if !point_in_rect(point, body.top_left, body.size.width, body.size.height) {
        return false;
    }
    match body.shape {
        MaskShape::Rectangle => true,
        MaskShape::Circle => point_in_circle(point, body.center(), body.radius()),
    }
}

/// Sprites whose mask contains the screen point, in registry order.
/// Hidden and click-through sprites are never returned.
pub fn who_is_at<'a>(
    registry: &'a SpriteRegistry,
    camera: &Camera2D,
    screen: Coordinate,
    query: HitQuery,
) -> Vec<&'a Sprite> {
    let world = camera.screen_to_world(screen);
    let hits: Vec<&Sprite> = registry
        .iter()
        .filter(|s| s.is_clickable())
        .filter(|s| !(query.ignore_static && s.static_coordinates))
        .filter(|s| {
            let point = if s.static_coordinates { screen } else { world };
            body_contains(&local_body(s), point)
        })
        .collect();

    if query.from_top_layer_only {
        match hits.iter().map(|s| s.layer()).max() {
            Some(top) => hits.into_iter().filter(|s| s.layer() == top).collect(),
            None => hits,
        }
    } else if let Some(layer) = query.layer {
        hits.into_iter().filter(|s| s.layer() == layer).collect()
    } else {
        hits
    }
}

/// Every other sprite whose mask overlaps the mask of `sprite`.
pub fn all_intersecting<'a>(
    registry: &'a SpriteRegistry,
    camera: &Camera2D,
    sprite: &Sprite,
) -> Vec<&'a Sprite> {
    let body = world_body(sprite, camera);
    let candidates: Vec<&Sprite> = registry
        .iter()
        .filter(|other| !std::ptr::eq(*other, sprite))
        .filter(|other| bodies_intersect(&body, &world_body(other, camera), true))
        .collect();
    candidates
        .into_iter()
        .filter(|other| bodies_intersect(&body, &world_body(other, camera), false))
        .collect()
}

type GridCell = (i32, i32);

/// Smallest accepted grid cell edge, in world units.
pub const MIN_CELL_SIZE: f32 = 8.0;

/// Bodies covering more cells than this skip bucketing and are offered as
/// candidates to every query.
pub const MAX_CELLS_PER_BODY: i64 = 64;

/// Uniform grid over mask bounding boxes.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: FxHashMap<GridCell, SmallVec<[usize; 8]>>,
    /// Bodies too large to bucket.
    oversized: Vec<usize>,
    len: usize,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size.is_finite() {
                cell_size.max(MIN_CELL_SIZE)
            } else {
                MIN_CELL_SIZE
            },
            cells: FxHashMap::default(),
            oversized: Vec::new(),
            len: 0,
        }
    }

    pub fn build(cell_size: f32, bodies: &[MaskBody]) -> Self {
        let mut grid = Self::new(cell_size);
        for (index, body) in bodies.iter().enumerate() {
            grid.insert(index, body);
        }
        grid
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Indices kept out of the buckets.
    pub fn oversized(&self) -> &[usize] {
        &self.oversized
    }

    fn cell_range(&self, body: &MaskBody) -> (GridCell, GridCell) {
        let to_cell = |v: f32| (v / self.cell_size).floor() as i32;
        (
            (to_cell(body.top_left.x), to_cell(body.top_left.y)),
            (
                to_cell(body.top_left.x + body.size.width),
                to_cell(body.top_left.y + body.size.height),
            ),
        )
    }

    fn cell_count(((x0, y0), (x1, y1)): (GridCell, GridCell)) -> i64 {
        (i64::from(x1) - i64::from(x0) + 1) * (i64::from(y1) - i64::from(y0) + 1)
    }

    pub fn insert(&mut self, index: usize, body: &MaskBody) {
        self.len = self.len.max(index + 1);
        let range = self.cell_range(body);
        if Self::cell_count(range) > MAX_CELLS_PER_BODY {
            debug!(
                "[collision] body {} spans {} cells, kept out of the grid",
                index,
                Self::cell_count(range)
            );
            self.oversized.push(index);
            return;
        }
        let ((x0, y0), (x1, y1)) = range;
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
    }

    /// Indices sharing at least one cell with `body`, plus every oversized
    /// body, sorted, without duplicates. A query body too large to walk gets
    /// every inserted index.
    pub fn candidates(&self, body: &MaskBody) -> Vec<usize> {
        let range = self.cell_range(body);
        if Self::cell_count(range) > MAX_CELLS_PER_BODY {
            return (0..self.len).collect();
        }
        let ((x0, y0), (x1, y1)) = range;
        let mut found = self.oversized.clone();
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    found.extend_from_slice(bucket);
                }
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }
}

/// Publish the coordinate changes recorded since the last pass and the
/// intersections they cause. Sprites added since the last pass are checked
/// once as if they had just moved. Returns how many intersection events
/// were published.
pub fn detect_intersections(
    registry: &mut SpriteRegistry,
    camera: &Camera2D,
    broad_phase: BroadPhase,
) -> usize {
    let moves = registry.take_moves();
    let unplaced = registry.take_unplaced();

    let mut movers: Vec<usize> = Vec::with_capacity(moves.len() + unplaced.len());
    for (index, change) in &moves {
        let event = SpriteMoved {
            id: registry.sprites()[*index].id().clone(),
            old: change.old,
            new: change.new,
        };
        registry.coordinates_changed.publish(&event);
        movers.push(*index);
    }
    movers.extend(unplaced.iter().filter_map(|id| registry.index_of(id)));
    if movers.is_empty() {
        return 0;
    }
    movers.sort_unstable();
    movers.dedup();

    let bodies: Vec<MaskBody> = registry
        .iter()
        .map(|s| world_body(s, camera))
        .collect();
    let grid = match broad_phase {
        BroadPhase::Grid { cell_size } => Some(SpatialGrid::build(cell_size, &bodies)),
        BroadPhase::Scan => None,
    };

    let mut events = Vec::new();
    for &mover in &movers {
        let body = &bodies[mover];
        let candidates: Vec<usize> = match &grid {
            Some(grid) => grid.candidates(body),
            None => (0..bodies.len()).collect(),
        };
        let standing: Vec<_> = candidates
            .into_iter()
            .filter(|&other| other != mover)
            .filter(|&other| bodies_intersect(body, &bodies[other], true))
            .filter(|&other| bodies_intersect(body, &bodies[other], false))
            .map(|other| registry.sprites()[other].id().clone())
            .collect();
        if !standing.is_empty() {
            events.push(IntersectionEvent {
                moving: registry.sprites()[mover].id().clone(),
                standing,
            });
        }
    }

    for event in &events {
        debug!(
            "[collision] {} overlaps {} sprite(s)",
            event.moving,
            event.standing.len()
        );
        registry.intersection.publish(event);
    }
    events.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::mask::Mask;
    use crate::components::sprite::SpriteId;
    use crate::resources::imageloader::ImageHandle;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sprite(name: &str, x: f32, y: f32, mask: Mask) -> Sprite {
        Sprite::new(SpriteId::new(name).unwrap(), ImageHandle::new("img.png", 10, 10))
            .with_coordinates(Coordinate::new(x, y))
            .with_mask(mask)
    }

    fn names(sprites: &[&Sprite]) -> Vec<String> {
        sprites.iter().map(|s| s.id().to_string()).collect()
    }

    #[test]
    fn circle_touching_rectangle_intersects() {
        let camera = Camera2D::default();
        let circle = sprite("c", 40.0, 40.0, Mask::circle(10.0));
        let rect = sprite("r", 40.0, 40.0, Mask::new(20.0, 20.0));
        assert!(intersects(&circle, &rect, &camera, false));
        assert!(intersects(&rect, &circle, &camera, false));
    }

    #[test]
    fn circles_in_box_corners_do_not_intersect() {
        let camera = Camera2D::default();
        let a = sprite("a", 0.0, 0.0, Mask::circle(10.0));
        let b = sprite("b", 18.0, 18.0, Mask::circle(10.0));
        assert!(intersects(&a, &b, &camera, true));
        assert!(!intersects(&a, &b, &camera, false));
    }

    #[test]
    fn who_is_at_prefers_top_layer() {
        let camera = Camera2D::default();
        let mut registry = SpriteRegistry::new();
        registry.add_sprite(sprite("floor", 0.0, 0.0, Mask::new(100.0, 100.0)).with_layer(0));
        registry.add_sprite(sprite("chest", 10.0, 10.0, Mask::new(20.0, 20.0)).with_layer(2));
        registry.add_sprite(sprite("coin", 15.0, 15.0, Mask::new(5.0, 5.0)).with_layer(2));

        let point = Coordinate::new(16.0, 16.0);
        let top = who_is_at(&registry, &camera, point, HitQuery::default());
        assert_eq!(names(&top), vec!["chest", "coin"]);

        let all = who_is_at(&registry, &camera, point, HitQuery::all_layers());
        assert_eq!(all.len(), 3);

        let floor = who_is_at(&registry, &camera, point, HitQuery::on_layer(0));
        assert_eq!(names(&floor), vec!["floor"]);
    }

    #[test]
    fn who_is_at_skips_hidden_and_click_through() {
        let camera = Camera2D::default();
        let mut registry = SpriteRegistry::new();
        registry.add_sprite(sprite("ghost", 0.0, 0.0, Mask::new(10.0, 10.0))).hidden = true;
        registry.add_sprite(sprite("glass", 0.0, 0.0, Mask::new(10.0, 10.0))).skip_click = true;
        registry.add_sprite(sprite("wall", 0.0, 0.0, Mask::new(10.0, 10.0)).with_layer(-1));

        let hits = who_is_at(&registry, &camera, Coordinate::new(5.0, 5.0), HitQuery::default());
        assert_eq!(names(&hits), vec!["wall"]);
    }

    #[test]
    fn who_is_at_respects_circle_masks_and_camera() {
        let mut camera = Camera2D::default();
        camera.set_scale(2.0);
        let mut registry = SpriteRegistry::new();
        registry.add_sprite(sprite("ball", 0.0, 0.0, Mask::circle(10.0)));

        // World (10, 10) is the circle center, drawn at screen (20, 20).
        let center = who_is_at(&registry, &camera, Coordinate::new(20.0, 20.0), HitQuery::default());
        assert_eq!(center.len(), 1);
        // World (1, 1) is inside the box but outside the circle.
        let corner = who_is_at(&registry, &camera, Coordinate::new(2.0, 2.0), HitQuery::default());
        assert!(corner.is_empty());
    }

    #[test]
    fn static_sprites_are_hit_in_screen_space() {
        let mut camera = Camera2D::default();
        camera.set_focal(Coordinate::new(-500.0, -500.0));
        let mut registry = SpriteRegistry::new();
        registry
            .add_sprite(sprite("hud", 0.0, 0.0, Mask::new(50.0, 20.0)))
            .static_coordinates = true;

        let point = Coordinate::new(10.0, 10.0);
        assert_eq!(who_is_at(&registry, &camera, point, HitQuery::default()).len(), 1);
        let query = HitQuery {
            ignore_static: true,
            ..HitQuery::default()
        };
        assert!(who_is_at(&registry, &camera, point, query).is_empty());
    }

    #[test]
    fn all_intersecting_excludes_self() {
        let camera = Camera2D::default();
        let mut registry = SpriteRegistry::new();
        registry.add_sprite(sprite("a", 0.0, 0.0, Mask::new(10.0, 10.0)));
        registry.add_sprite(sprite("b", 5.0, 5.0, Mask::new(10.0, 10.0)));
        registry.add_sprite(sprite("c", 50.0, 50.0, Mask::new(10.0, 10.0)));

        let a = &registry.sprites()[0];
        assert_eq!(names(&all_intersecting(&registry, &camera, a)), vec!["b"]);
    }

    #[test]
    fn grid_candidates_cover_neighbouring_cells() {
        let bodies = vec![
            Mask::new(10.0, 10.0).body(Coordinate::new(0.0, 0.0)),
            Mask::new(10.0, 10.0).body(Coordinate::new(60.0, 0.0)),
            Mask::new(10.0, 10.0).body(Coordinate::new(300.0, 300.0)),
        ];
        let grid = SpatialGrid::build(64.0, &bodies);
        let probe = Mask::new(20.0, 20.0).body(Coordinate::new(55.0, 0.0));
        assert_eq!(grid.candidates(&probe), vec![0, 1]);
    }

    #[test]
    fn oversized_bodies_skip_the_buckets() {
        let bodies = vec![
            Mask::new(1_000_000.0, 1_000_000.0).body(Coordinate::new(-500_000.0, -500_000.0)),
            Mask::new(10.0, 10.0).body(Coordinate::new(0.0, 0.0)),
            Mask::new(10.0, 10.0).body(Coordinate::new(300.0, 300.0)),
        ];
        let grid = SpatialGrid::build(128.0, &bodies);
        assert_eq!(grid.oversized(), &[0]);
        assert_eq!(grid.candidates(&bodies[2]), vec![0, 2]);
        assert_eq!(grid.candidates(&bodies[0]), vec![0, 1, 2]);
    }

    #[test]
    fn tiny_cell_size_is_raised_to_the_minimum() {
        assert_eq!(SpatialGrid::new(0.5).cell_size(), MIN_CELL_SIZE);
        assert_eq!(SpatialGrid::new(f32::NAN).cell_size(), MIN_CELL_SIZE);
        assert_eq!(SpatialGrid::new(64.0).cell_size(), 64.0);
    }

    #[test]
    fn detect_publishes_moves_then_intersections() {
        for broad_phase in [BroadPhase::Scan, BroadPhase::Grid { cell_size: 16.0 }] {
            let camera = Camera2D::default();
            let mut registry = SpriteRegistry::new();
            registry.add_sprite(sprite("a", 0.0, 0.0, Mask::new(10.0, 10.0)));
            registry.add_sprite(sprite("b", 20.0, 20.0, Mask::new(10.0, 10.0)));
            assert_eq!(detect_intersections(&mut registry, &camera, broad_phase), 0);

            let log = Rc::new(RefCell::new(Vec::new()));
            let l = log.clone();
            registry
                .coordinates_changed
                .subscribe(move |m| l.borrow_mut().push(format!("moved {}", m.id)));
            let l = log.clone();
            registry.intersection.subscribe(move |e| {
                l.borrow_mut()
                    .push(format!("{} hits {}", e.moving, e.standing[0]))
            });

            let a_id = SpriteId::new("a").unwrap();
            registry
                .get_mut(&a_id)
                .unwrap()
                .set_coordinates(Coordinate::new(15.0, 15.0));
            assert_eq!(detect_intersections(&mut registry, &camera, broad_phase), 1);
            assert_eq!(*log.borrow(), vec!["moved a", "a hits b"]);

            let a = registry.get(&a_id).unwrap();
            assert_eq!(names(&all_intersecting(&registry, &camera, a)), vec!["b"]);
        }
    }

    #[test]
    fn newly_added_sprites_get_a_placement_check() {
        let camera = Camera2D::default();
        let mut registry = SpriteRegistry::new();
        registry.add_sprite(sprite("a", 0.0, 0.0, Mask::new(10.0, 10.0)));
        registry.add_sprite(sprite("b", 5.0, 5.0, Mask::new(10.0, 10.0)));
        let events = Rc::new(RefCell::new(Vec::new()));
        let e = events.clone();
        registry
            .intersection
            .subscribe(move |ev| e.borrow_mut().push(ev.clone()));

        assert_eq!(detect_intersections(&mut registry, &camera, BroadPhase::Scan), 2);
        assert_eq!(detect_intersections(&mut registry, &camera, BroadPhase::Scan), 0);
        assert_eq!(events.borrow()[0].moving.as_str(), "a");
    }
}
