//! Animation system.
//!
//! Runs each sprite's frame clock up to the tick time and republishes
//! completions on the registry.

use crate::events::sprite::AnimationCompleted;
use crate::resources::spriteregistry::SpriteRegistry;

pub fn animation_system(registry: &mut SpriteRegistry, now: f64) {
    let mut completed = Vec::new();
    for sprite in registry.iter_mut() {
        if let Some(animation) = sprite.animation.as_mut() {
            let fired = animation.update(now);
            let looping = animation.is_looping();
            for _ in 0..fired {
                completed.push(AnimationCompleted {
                    id: sprite.id().clone(),
                    looping,
                });
            }
        }
    }
    for event in &completed {
        registry.animation_completed.publish(event);
    }
}
