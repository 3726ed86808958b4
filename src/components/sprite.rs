//! The sprite entity.
//!
//! A sprite owns its coordinate (with change propagation), a hit-test
//! [`Mask`], an optional [`MovingVector`] and [`SpriteAnimation`], an ordered
//! list of per-tick actions and pointer hooks. Sprites live in the
//! [`SpriteRegistry`](crate::resources::spriteregistry::SpriteRegistry); every
//! subscription a sprite holds is dropped together with it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::coordinates::{Coordinate, CoordinatesChanged, Observed, Size, SizeChanged};
use crate::components::mask::Mask;
use crate::components::movingvector::MovingVector;
use crate::components::spriteanimation::SpriteAnimation;
use crate::error::{EngineError, Result};
use crate::events::distributor::{EventDistributor, SubscriberList, SubscriptionId};
use crate::events::input::PointerEvent;
use crate::resources::imageloader::ImageHandle;

/// Stable, externally meaningful sprite identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpriteId(String);

impl SpriteId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EngineError::Configuration("sprite id must not be empty".into()));
        }
        Ok(SpriteId(id))
    }

    /// Random UUID-v4 shaped id.
    pub fn random() -> Self {
        let mut bits = fastrand::u128(..);
        bits = (bits & !(0xF << 76)) | (0x4 << 76);
        bits = (bits & !(0x3 << 62)) | (0x2 << 62);
        let hex = format!("{:032x}", bits);
        SpriteId(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SpriteId {
    type Error = EngineError;
    fn try_from(value: String) -> Result<Self> {
        SpriteId::new(value)
    }
}

impl From<SpriteId> for String {
    fn from(id: SpriteId) -> String {
        id.0
    }
}

/// Per-tick action; receives the sprite it is attached to.
pub type StepAction = dyn FnMut(&mut Sprite);

#[derive(Debug)]
pub struct Sprite {
    id: SpriteId,
    image: ImageHandle,
    /// Free-form label.
    pub tag: String,
    scale: f32,
    pic_size: Observed<Size>,
    /// Rotation in degrees around the picture center.
    pub rotation: f32,
    layer: i32,
    /// Hidden sprites are neither drawn nor hit by the pointer.
    pub hidden: bool,
    /// Drawn normally but lets clicks through to whatever is below.
    pub skip_click: bool,
    /// Coordinates are screen coordinates, unaffected by camera pan/zoom.
    pub static_coordinates: bool,
    coordinates: Observed<Coordinate>,
    /// Offset of the drawn picture relative to the coordinates.
    pub pic_offset: Coordinate,
    pub mask: Mask,
    vector: Option<MovingVector>,
    pub animation: Option<SpriteAnimation>,
    step_actions: SubscriberList<StepAction>,
    pub mouse_click: EventDistributor<PointerEvent>,
    pub mouse_move: EventDistributor<PointerEvent>,
    /// Fired with the final coordinates when the moving vector completes.
    pub vector_movement_ended: EventDistributor<Coordinate>,
    pending_moves: Vec<CoordinatesChanged>,
}

impl Sprite {
    /// New sprite at the origin, mask covering the whole picture.
    pub fn new(id: SpriteId, image: ImageHandle) -> Self {
        let size = image.size();
        Self {
            id,
            image,
            tag: String::new(),
            scale: 1.0,
            pic_size: Observed::new(size),
            rotation: 0.0,
            layer: 0,
            hidden: false,
            skip_click: false,
            static_coordinates: false,
            coordinates: Observed::new(Coordinate::origin()),
            pic_offset: Coordinate::origin(),
            mask: Mask::new(size.width, size.height),
            vector: None,
            animation: None,
            step_actions: SubscriberList::default(),
            mouse_click: EventDistributor::new(),
            mouse_move: EventDistributor::new(),
            vector_movement_ended: EventDistributor::new(),
            pending_moves: Vec::new(),
        }
    }

    pub fn with_coordinates(mut self, coordinates: Coordinate) -> Self {
        self.set_coordinates(coordinates);
        self
    }

    pub fn with_layer(mut self, layer: impl Into<Option<i32>>) -> Self {
        self.set_layer(layer);
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = mask;
        self
    }

    pub fn id(&self) -> &SpriteId {
        &self.id
    }

    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    /// Swap the picture; the displayed size follows the new image at the
    /// current scale. The mask is left alone.
    pub fn set_image(&mut self, image: ImageHandle) {
        self.image = image;
        self.pic_size.set(self.image.size() * self.scale);
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Scale relative to the image's pixel size; recomputes the picture size.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.pic_size.set(self.image.size() * scale);
    }

    pub fn pic_size(&self) -> Size {
        self.pic_size.get()
    }

    pub fn set_pic_size(&mut self, size: Size) {
        self.pic_size.set(size);
    }

    pub fn on_pic_size_changed(&mut self, handler: impl FnMut(&SizeChanged) + 'static) -> SubscriptionId {
        self.pic_size.subscribe(handler)
    }

    /// Size the picture is drawn at: an animation narrows it to one frame.
    pub fn display_size(&self) -> Size {
        let size = self.pic_size.get();
        match &self.animation {
            Some(anim) => Size::new(anim.frame_width() * self.scale, size.height),
            None => size,
        }
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    /// `None` means the default layer 0.
    pub fn set_layer(&mut self, layer: impl Into<Option<i32>>) {
        self.layer = layer.into().unwrap_or(0);
    }

    pub fn coordinates(&self) -> Coordinate {
        self.coordinates.get()
    }

    /// Move the sprite and notify coordinate subscribers.
    pub fn set_coordinates(&mut self, coordinates: Coordinate) {
        let old = self.coordinates.set(coordinates);
        if old != coordinates {
            self.pending_moves.push(CoordinatesChanged {
                old,
                new: coordinates,
            });
        }
    }

    pub fn on_coordinates_changed(
        &mut self,
        handler: impl FnMut(&CoordinatesChanged) + 'static,
    ) -> SubscriptionId {
        self.coordinates.subscribe(handler)
    }

    pub fn unsubscribe_coordinates(&mut self, id: SubscriptionId) -> bool {
        self.coordinates.unsubscribe(id)
    }

    pub fn vector(&self) -> Option<&MovingVector> {
        self.vector.as_ref()
    }

    pub fn vector_mut(&mut self) -> Option<&mut MovingVector> {
        self.vector.as_mut()
    }

    /// Replace the moving vector wholesale; returns the previous one.
    pub fn set_vector(&mut self, vector: Option<MovingVector>) -> Option<MovingVector> {
        std::mem::replace(&mut self.vector, vector)
    }

    /// Start moving from the current position to `end` over `duration_ms`.
    pub fn move_to(&mut self, end: Coordinate, duration_ms: f64, now: f64) -> Result<()> {
        let mut vector = MovingVector::new(self.coordinates(), end, duration_ms)?;
        vector.start(now);
        self.vector = Some(vector);
        Ok(())
    }

    pub fn add_step_action(&mut self, action: impl FnMut(&mut Sprite) + 'static) -> SubscriptionId {
        self.step_actions.insert(Box::new(action))
    }

    pub fn remove_step_action(&mut self, id: SubscriptionId) -> bool {
        self.step_actions.remove(id)
    }

    pub fn step_action_count(&self) -> usize {
        self.step_actions.len()
    }

    /// Run every per-tick action in order. Actions may add or remove actions
    /// on this sprite; such changes apply from the next run.
    pub fn run_step_actions(&mut self) {
        let mut actions = self.step_actions.detach();
        actions.for_each(|action| action(self));
        self.step_actions.absorb(actions);
    }

    /// Hit by the pointer at all (not hidden, not click-through).
    pub fn is_clickable(&self) -> bool {
        !self.hidden && !self.skip_click
    }

    pub(crate) fn take_pending_moves(&mut self) -> Vec<CoordinatesChanged> {
        std::mem::take(&mut self.pending_moves)
    }
}
