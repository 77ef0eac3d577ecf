//! Registry integration tests: manager changes reaching playheads and observers.

use bevy_ecs::observer::{Observer, On};
use bevy_ecs::prelude::*;

use flipbook::components::animationstate::AnimationState;
use flipbook::components::sprite::Sprite;
use flipbook::events::animation::{
    AnimationAddedEvent, AnimationEventKind, AnimationMessage, AnimationRemovedEvent,
    AnimationsPausedEvent, AnimationsResumedEvent,
};
use flipbook::game::{build_schedule, drain_animation_messages, setup_world, spawn_animated, step, with_playhead};
use flipbook::resources::animation::AnimationConfig;
use flipbook::resources::animationframe::FrameKey;
use flipbook::resources::animationmanager::AnimationManager;
use flipbook::resources::gameconfig::GameConfig;
use flipbook::resources::texturestore::TextureStore;

const DT: f32 = 0.125;

#[derive(Resource, Default)]
struct RegistryLog {
    added: Vec<String>,
    removed: Vec<String>,
    paused: u32,
    resumed: u32,
}

fn on_added(trigger: On<AnimationAddedEvent>, mut log: ResMut<RegistryLog>) {
    log.added.push(trigger.event().key.clone());
}

fn on_removed(trigger: On<AnimationRemovedEvent>, mut log: ResMut<RegistryLog>) {
    log.removed.push(trigger.event().key.clone());
}

fn on_paused(_trigger: On<AnimationsPausedEvent>, mut log: ResMut<RegistryLog>) {
    log.paused += 1;
}

fn on_resumed(_trigger: On<AnimationsResumedEvent>, mut log: ResMut<RegistryLog>) {
    log.resumed += 1;
}

fn textures() -> TextureStore {
    let mut store = TextureStore::new();
    store.add_spritesheet("walker", 32.0, 48.0, 4);
    store
}

fn make_world() -> (World, Schedule) {
    let textures = textures();
    let mut manager = AnimationManager::new();
    manager.create(
        &textures,
        &AnimationConfig::new("walk", "walker").with_frame_rate(8.0).with_repeat(-1),
    );
    let mut world = setup_world(GameConfig::new(), textures, manager);
    world.init_resource::<RegistryLog>();
    world.spawn(Observer::new(on_added));
    world.spawn(Observer::new(on_removed));
    world.spawn(Observer::new(on_paused));
    world.spawn(Observer::new(on_resumed));
    world.flush();
    (world, build_schedule())
}

fn run(world: &mut World, schedule: &mut Schedule, frames: usize) -> Vec<AnimationMessage> {
    let mut messages = drain_animation_messages(world);
    for _ in 0..frames {
        step(world, schedule, DT);
        messages.extend(drain_animation_messages(world));
    }
    messages
}

fn spawn_walker(world: &mut World) -> Entity {
    let entity = spawn_animated(world, Sprite::default());
    with_playhead(world, entity, |state, ctx| {
        state.play(ctx, "walk", false);
    });
    entity
}

#[test]
fn notices_are_dispatched_to_observers() {
    let (mut world, mut schedule) = make_world();
    run(&mut world, &mut schedule, 1);
    assert_eq!(world.resource::<RegistryLog>().added, vec!["walk".to_string()]);

    {
        let textures = textures();
        let mut manager = world.resource_mut::<AnimationManager>();
        manager.create(&textures, &AnimationConfig::new("idle", "walker").with_frame_rate(4.0));
        manager.pause_all();
        manager.pause_all();
        manager.resume_all();
    }
    run(&mut world, &mut schedule, 1);

    let log = world.resource::<RegistryLog>();
    assert_eq!(log.added, vec!["walk".to_string(), "idle".to_string()]);
    assert_eq!(log.paused, 1);
    assert_eq!(log.resumed, 1);
    assert!(log.removed.is_empty());
}

#[test]
fn removing_an_animation_stops_its_playheads() {
    let (mut world, mut schedule) = make_world();
    let walker = spawn_walker(&mut world);
    let idle = spawn_animated(&mut world, Sprite::default());
    run(&mut world, &mut schedule, 2);

    assert!(world.resource_mut::<AnimationManager>().remove("walk").is_some());
    let messages = run(&mut world, &mut schedule, 1);

    let stops: Vec<_> = messages
        .iter()
        .filter(|m| m.event.kind == AnimationEventKind::Stop)
        .collect();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].entity, walker);
    assert_eq!(messages.last().map(|m| m.event.kind), Some(AnimationEventKind::Stop));

    assert!(!world.get::<AnimationState>(walker).unwrap().is_playing);
    assert_eq!(world.get::<Sprite>(walker).unwrap().frame, FrameKey::Index(0));
    assert!(!world.get::<AnimationState>(idle).unwrap().is_playing);
    assert_eq!(world.resource::<RegistryLog>().removed, vec!["walk".to_string()]);

    // Nothing left to tick.
    assert!(run(&mut world, &mut schedule, 3).is_empty());
}

#[test]
fn pause_all_freezes_playheads_until_resumed() {
    let (mut world, mut schedule) = make_world();
    let walker = spawn_walker(&mut world);
    run(&mut world, &mut schedule, 1);
    assert_eq!(world.get::<Sprite>(walker).unwrap().frame, FrameKey::Index(1));

    world.resource_mut::<AnimationManager>().pause_all();
    assert!(run(&mut world, &mut schedule, 4).is_empty());
    assert!(world.get::<AnimationState>(walker).unwrap().is_playing);
    assert_eq!(world.get::<Sprite>(walker).unwrap().frame, FrameKey::Index(1));

    world.resource_mut::<AnimationManager>().resume_all();
    let messages = run(&mut world, &mut schedule, 1);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].event.kind, AnimationEventKind::Update);
    assert_eq!(world.get::<Sprite>(walker).unwrap().frame, FrameKey::Index(2));
}

#[test]
fn json_definitions_drive_playback() {
    let json = r#"{
        "anims": [
            { "key": "blink", "type": "frame", "frames": "walker", "frameRate": 8, "hideOnComplete": true }
        ],
        "globalTimeScale": 1
    }"#;
    let textures = textures();
    let mut manager = AnimationManager::new();
    let created = manager.from_json(&textures, json, false).unwrap();
    assert_eq!(created.len(), 1);

    let mut world = setup_world(GameConfig::new(), textures, manager);
    let mut schedule = build_schedule();
    let entity = spawn_animated(&mut world, Sprite::default());
    with_playhead(&mut world, entity, |state, ctx| {
        state.play(ctx, "blink", false);
    });

    let messages = run(&mut world, &mut schedule, 4);
    let last = messages.last().unwrap();
    assert_eq!(last.event.kind, AnimationEventKind::Complete);
    assert!(last.event.is_named("animationcomplete-blink"));
    assert!(!world.get::<Sprite>(entity).unwrap().visible);
}
