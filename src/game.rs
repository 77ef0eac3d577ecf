//! World assembly and frame stepping.
//!
//! Builds the ECS world the animation systems run in, the per-frame
//! schedule, and a few helpers to drive playheads from outside a system.

use bevy_ecs::message::Messages;
use bevy_ecs::observer::{Observer, On};
use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemState;
use log::{debug, warn};

use crate::components::animationstate::{AnimationState, PlaybackContext};
use crate::components::sprite::Sprite;
use crate::events::animation::{
    AnimationAddedEvent, AnimationMessage, AnimationsPausedEvent, AnimationsResumedEvent,
};
use crate::resources::animationmanager::AnimationManager;
use crate::resources::gameconfig::GameConfig;
use crate::resources::texturestore::TextureStore;
use crate::resources::worldtime::WorldTime;
use crate::systems::animation::{
    SpriteTarget, animation, animation_removed_observer, dispatch_animation_notices,
    log_animation_messages, update_animation_messages,
};
use crate::systems::time::update_world_time;

fn animation_added_observer(trigger: On<AnimationAddedEvent>) {
    debug!("Animation added: {}", trigger.event().key);
}

fn animations_paused_observer(_trigger: On<AnimationsPausedEvent>) {
    debug!("All animations paused");
}

fn animations_resumed_observer(_trigger: On<AnimationsResumedEvent>) {
    debug!("All animations resumed");
}

/// Create the world with every resource and observer the animation systems need.
///
/// The manager picks up the configured global time scale.
pub fn setup_world(config: GameConfig, textures: TextureStore, mut manager: AnimationManager) -> World {
    let mut world = World::new();
    manager.global_time_scale = config.global_time_scale;

    world.insert_resource(WorldTime::default().with_time_scale(config.time_scale));
    world.insert_resource(textures);
    world.insert_resource(manager);
    world.insert_resource(config);
    world.init_resource::<Messages<AnimationMessage>>();

    world.spawn(Observer::new(animation_removed_observer));
    world.spawn(Observer::new(animation_added_observer));
    world.spawn(Observer::new(animations_paused_observer));
    world.spawn(Observer::new(animations_resumed_observer));
    // Observers must exist before the first notice is dispatched.
    world.flush();

    world
}

/// Per-frame schedule.
pub fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(update_animation_messages);
    update.add_systems(dispatch_animation_notices.after(update_animation_messages));
    update.add_systems(animation.after(dispatch_animation_notices));
    update.add_systems(log_animation_messages.after(animation));
    update
}

/// Spawn an entity with an empty playhead driving `sprite`.
pub fn spawn_animated(world: &mut World, sprite: Sprite) -> Entity {
    world.spawn((AnimationState::new(), sprite)).id()
}

/// Run `f` against the playhead of `entity` with a live [`PlaybackContext`].
///
/// Events raised inside `f` are written as [`AnimationMessage`]s.
/// Returns `None` when the entity has no playhead.
pub fn with_playhead<R>(
    world: &mut World,
    entity: Entity,
    f: impl FnOnce(&mut AnimationState, &mut PlaybackContext<'_>) -> R,
) -> Option<R> {
    let mut system_state: SystemState<(
        Res<AnimationManager>,
        Query<(&mut AnimationState, &mut Sprite)>,
        MessageWriter<AnimationMessage>,
    )> = SystemState::new(world);

    let result = {
        let (manager, mut query, mut writer) = system_state.get_mut(world);
        let Ok((mut state, mut sprite)) = query.get_mut(entity) else {
            warn!("Entity {:?} has no animation state", entity);
            return None;
        };
        let mut events = Vec::new();
        let result = {
            let mut target = SpriteTarget::new(&mut *sprite, &mut events);
            let mut ctx = PlaybackContext::new(&manager, &mut target);
            f(&mut *state, &mut ctx)
        };
        writer.write_batch(events.into_iter().map(|event| AnimationMessage { entity, event }));
        result
    };
    system_state.apply(world);
    Some(result)
}

/// Play `key` on every entity in `entities`. Returns how many entities have a playhead.
pub fn play_all(world: &mut World, entities: &[Entity], key: &str) -> usize {
    entities
        .iter()
        .filter_map(|&entity| {
            with_playhead(world, entity, |state, ctx| {
                state.play(ctx, key, false);
            })
        })
        .count()
}

/// Start delay (ms) for each of `count` entities played with a `stagger`.
///
/// A positive stagger delays entity `i` by `stagger * i`. A negative one
/// runs the other way, `|stagger| * (len - i)`, where `len` is `count`, or
/// `count - 1` when `stagger_first` is false so the last entity starts at once.
pub fn stagger_delays(count: usize, stagger: f32, stagger_first: bool) -> Vec<f32> {
    let len = if stagger_first { count } else { count.saturating_sub(1) };
    (0..count)
        .map(|i| {
            if stagger < 0.0 {
                stagger.abs() * len.saturating_sub(i) as f32
            } else {
                stagger * i as f32
            }
        })
        .collect()
}

/// Play `key` on every entity in `entities`, each after its [`stagger_delays`] delay.
/// Returns how many entities have a playhead.
pub fn stagger_play(
    world: &mut World,
    entities: &[Entity],
    key: &str,
    stagger: f32,
    stagger_first: bool,
) -> usize {
    let delays = stagger_delays(entities.len(), stagger, stagger_first);
    entities
        .iter()
        .zip(delays)
        .filter_map(|(&entity, delay)| {
            with_playhead(world, entity, |state, ctx| {
                state.play_after_delay(ctx, key, delay);
            })
        })
        .count()
}

/// Advance the simulation by `dt` seconds.
pub fn step(world: &mut World, schedule: &mut Schedule, dt: f32) {
    update_world_time(world, dt);
    schedule.run(world);
    world.clear_trackers(); // Clear changed components for next frame
}

/// Take every buffered playback message, oldest first.
pub fn drain_animation_messages(world: &mut World) -> Vec<AnimationMessage> {
    world.resource_mut::<Messages<AnimationMessage>>().drain().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::animation::AnimationConfig;

    #[test]
    fn test_setup_world_applies_config_scales() {
        let mut config = GameConfig::new();
        config.time_scale = 2.0;
        config.global_time_scale = 0.5;
        let world = setup_world(config, TextureStore::new(), AnimationManager::new());
        assert_eq!(world.resource::<WorldTime>().time_scale, 2.0);
        assert_eq!(world.resource::<AnimationManager>().global_time_scale, 0.5);
        assert!(world.contains_resource::<Messages<AnimationMessage>>());
    }

    #[test]
    fn test_with_playhead_missing_entity_returns_none() {
        let mut world = setup_world(GameConfig::new(), TextureStore::new(), AnimationManager::new());
        let entity = world.spawn(Sprite::new("hero")).id();
        assert!(with_playhead(&mut world, entity, |state, _ctx| state.is_playing).is_none());

        let animated = spawn_animated(&mut world, Sprite::new("hero"));
        assert_eq!(with_playhead(&mut world, animated, |state, _ctx| state.is_playing), Some(false));
    }

    #[test]
    fn test_stagger_delays() {
        assert_eq!(stagger_delays(4, 100.0, true), vec![0.0, 100.0, 200.0, 300.0]);
        assert_eq!(stagger_delays(4, 100.0, false), vec![0.0, 100.0, 200.0, 300.0]);
        assert_eq!(stagger_delays(4, -100.0, true), vec![400.0, 300.0, 200.0, 100.0]);
        assert_eq!(stagger_delays(4, -100.0, false), vec![300.0, 200.0, 100.0, 0.0]);
        assert_eq!(stagger_delays(3, 0.0, true), vec![0.0, 0.0, 0.0]);
        assert!(stagger_delays(0, -50.0, false).is_empty());
    }

    #[test]
    fn test_play_all_skips_entities_without_playhead() {
        let mut textures = TextureStore::new();
        textures.add_spritesheet("sheet", 8.0, 8.0, 3);
        let mut manager = AnimationManager::new();
        manager.create(&textures, &AnimationConfig::new("blink", "sheet").with_frame_rate(10.0));
        let mut world = setup_world(GameConfig::new(), textures, manager);

        let first = spawn_animated(&mut world, Sprite::default());
        let plain = world.spawn(Sprite::default()).id();
        let second = spawn_animated(&mut world, Sprite::default());

        assert_eq!(play_all(&mut world, &[first, plain, second], "blink"), 2);
        for entity in [first, second] {
            let state = world.get::<AnimationState>(entity).unwrap();
            assert!(state.is_playing);
            assert!(state.has_started);
        }
        assert_eq!(drain_animation_messages(&mut world).len(), 2);
    }
}
