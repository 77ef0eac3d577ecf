//! Animation playback notifications.
//!
//! Playheads report what happens during playback as [`AnimationEvent`]
//! values handed to their owner. Inside the world, the
//! [`animation`](crate::systems::animation::animation) system forwards them
//! as [`AnimationMessage`]s, tagged with the entity they belong to.
//!
//! Registry changes made on the
//! [`AnimationManager`](crate::resources::animationmanager::AnimationManager)
//! are queued as [`AnimationNotice`]s and triggered as the observer events
//! below by [`dispatch_animation_notices`](crate::systems::animation::dispatch_animation_notices).
//!
//! # Example
//!
//! ```ignore
//! fn log_repeats(mut reader: MessageReader<AnimationMessage>) {
//!     for msg in reader.read() {
//!         if msg.event.kind == AnimationEventKind::Repeat {
//!             info!("{:?} repeated {}", msg.entity, msg.event.animation_key);
//!         }
//!     }
//! }
//! ```

use bevy_ecs::message::Message;
use bevy_ecs::prelude::*;

use crate::resources::animationframe::FrameKey;

/// Kind of playback notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationEventKind {
    Start,
    Update,
    Repeat,
    Restart,
    Stop,
    Complete,
}

impl AnimationEventKind {
    /// Generic event name.
    pub fn name(self) -> &'static str {
        match self {
            AnimationEventKind::Start => "animationstart",
            AnimationEventKind::Update => "animationupdate",
            AnimationEventKind::Repeat => "animationrepeat",
            AnimationEventKind::Restart => "animationrestart",
            AnimationEventKind::Stop => "animationstop",
            AnimationEventKind::Complete => "animationcomplete",
        }
    }
}

/// A playback notification with the animation and frame it happened on.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationEvent {
    pub kind: AnimationEventKind,
    pub animation_key: String,
    /// 1-based index of the current frame.
    pub frame_index: usize,
    pub texture_key: String,
    pub texture_frame: FrameKey,
    /// Repeats left, `None` when repeating forever.
    pub repeat_counter: Option<u32>,
}

impl AnimationEvent {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Name suffixed with the animation key, e.g. `animationcomplete-walk`.
    /// Only repeat and complete events have one.
    pub fn keyed_name(&self) -> Option<String> {
        match self.kind {
            AnimationEventKind::Repeat | AnimationEventKind::Complete => {
                Some(format!("{}-{}", self.kind.name(), self.animation_key))
            }
            _ => None,
        }
    }

    /// Whether this event answers to `name`, generic or keyed.
    pub fn is_named(&self, name: &str) -> bool {
        name == self.name() || self.keyed_name().is_some_and(|keyed| keyed == name)
    }
}

/// An [`AnimationEvent`] raised by the playhead of `entity`.
#[derive(Message, Debug, Clone)]
pub struct AnimationMessage {
    pub entity: Entity,
    pub event: AnimationEvent,
}

/// Registry change queued by the animation manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationNotice {
    Added(String),
    Removed(String),
    PausedAll,
    ResumedAll,
}

/// An animation was registered under `key`.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct AnimationAddedEvent {
    pub key: String,
}

/// The animation registered under `key` was removed.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct AnimationRemovedEvent {
    pub key: String,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationsPausedEvent;

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationsResumedEvent;
