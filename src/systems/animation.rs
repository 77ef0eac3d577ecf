//! Animation systems.
//!
//! - [`animation`] ticks every playing [`AnimationState`] with the frame
//!   delta and writes the resulting events as [`AnimationMessage`]s.
//! - [`update_animation_messages`] and [`log_animation_messages`] keep the
//!   message buffer moving and trace it.
//! - [`dispatch_animation_notices`] turns queued registry changes into
//!   observer events.
//! - [`animation_removed_observer`] stops playheads that were showing an
//!   animation removed from the [`AnimationManager`].
//!
//! # Animation Flow
//!
//! 1. Definitions live in the [`AnimationManager`] resource
//! 2. Entities carry an [`AnimationState`] and a [`Sprite`]
//! 3. The `animation` system advances each playhead; frame changes land on the `Sprite`
//! 4. Playback events are read with a `MessageReader<AnimationMessage>`
//!
//! # Related
//!
//! - [`crate::components::animationstate::AnimationState`] – per-entity playhead
//! - [`crate::resources::animationmanager::AnimationManager`] – animation definitions
//! - [`crate::events::animation`] – playback messages and registry events

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::components::animationstate::{AnimationState, AnimationTarget, PlaybackContext};
use crate::components::sprite::Sprite;
use crate::events::animation::{
    AnimationAddedEvent, AnimationEvent, AnimationMessage, AnimationNotice, AnimationRemovedEvent,
    AnimationsPausedEvent, AnimationsResumedEvent,
};
use crate::resources::animationframe::AnimationFrame;
use crate::resources::animationmanager::AnimationManager;
use crate::resources::worldtime::WorldTime;

/// Owner adapter: frames and visibility land on the sprite, events are collected.
pub struct SpriteTarget<'a> {
    sprite: &'a mut Sprite,
    events: &'a mut Vec<AnimationEvent>,
}

impl<'a> SpriteTarget<'a> {
    pub fn new(sprite: &'a mut Sprite, events: &'a mut Vec<AnimationEvent>) -> Self {
        Self { sprite, events }
    }
}

impl AnimationTarget for SpriteTarget<'_> {
    fn set_visible(&mut self, visible: bool) {
        self.sprite.visible = visible;
    }

    fn apply_frame(&mut self, frame: &AnimationFrame) {
        self.sprite.apply_frame(frame);
    }

    fn emit(&mut self, event: AnimationEvent) {
        self.events.push(event);
    }
}

/// Advance every playing animation by the frame delta.
///
/// Contract
/// - Reads [`WorldTime`] (seconds) and converts it to the milliseconds playheads work in.
/// - Looks up definitions and mixes in [`AnimationManager`].
/// - Mutates [`AnimationState`] and the [`Sprite`] it drives.
/// - Writes one [`AnimationMessage`] per playback event, in emission order.
pub fn animation(
    mut query: Query<(Entity, &mut AnimationState, &mut Sprite)>,
    manager: Res<AnimationManager>,
    time: Res<WorldTime>,
    mut writer: MessageWriter<AnimationMessage>,
) {
    let delta = time.delta_ms();
    let elapsed = time.elapsed_ms();
    let mut events = Vec::new();

    for (entity, mut state, mut sprite) in query.iter_mut() {
        if !state.is_playing {
            continue;
        }
        {
            let mut target = SpriteTarget::new(&mut sprite, &mut events);
            let mut ctx = PlaybackContext::new(&manager, &mut target);
            state.update(&mut ctx, elapsed, delta);
        }
        writer.write_batch(events.drain(..).map(|event| AnimationMessage { entity, event }));
    }
}

/// Advance the [`AnimationMessage`] double buffer. Runs first every frame.
pub fn update_animation_messages(mut messages: ResMut<Messages<AnimationMessage>>) {
    messages.update();
}

/// Log playback events.
pub fn log_animation_messages(mut reader: MessageReader<AnimationMessage>) {
    for msg in reader.read() {
        info!(
            "{:?} {} frame {} ({}:{})",
            msg.entity,
            msg.event.keyed_name().unwrap_or_else(|| msg.event.name().to_string()),
            msg.event.frame_index,
            msg.event.texture_key,
            msg.event.texture_frame
        );
    }
}

/// Trigger observer events for the registry changes queued on the manager.
pub fn dispatch_animation_notices(mut manager: ResMut<AnimationManager>, mut commands: Commands) {
    for notice in manager.drain_notices() {
        debug!("Animation registry: {:?}", notice);
        match notice {
            AnimationNotice::Added(key) => {
                commands.trigger(AnimationAddedEvent { key });
            }
            AnimationNotice::Removed(key) => {
                commands.trigger(AnimationRemovedEvent { key });
            }
            AnimationNotice::PausedAll => {
                commands.trigger(AnimationsPausedEvent);
            }
            AnimationNotice::ResumedAll => {
                commands.trigger(AnimationsResumedEvent);
            }
        }
    }
}

/// Global observer stopping every playhead still playing the removed animation.
///
/// The playhead falls back to the first frame of the removed animation,
/// which it still holds.
pub fn animation_removed_observer(
    trigger: On<AnimationRemovedEvent>,
    manager: Res<AnimationManager>,
    mut query: Query<(Entity, &mut AnimationState, &mut Sprite)>,
    mut writer: MessageWriter<AnimationMessage>,
) {
    let key = &trigger.event().key;
    let mut events = Vec::new();

    for (entity, mut state, mut sprite) in query.iter_mut() {
        if !(state.is_playing && state.get_name() == key.as_str()) {
            continue;
        }
        {
            let mut target = SpriteTarget::new(&mut sprite, &mut events);
            let mut ctx = PlaybackContext::new(&manager, &mut target);
            state.global_remove(&mut ctx, key);
        }
        writer.write_batch(events.drain(..).map(|event| AnimationMessage { entity, event }));
    }
}
