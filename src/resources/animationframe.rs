//! Single steps of an animation sequence.
//!
//! An [`AnimationFrame`] pairs a texture frame with its position inside the
//! owning [`Animation`](crate::resources::animation::Animation): 1-based
//! sequence index, first/last markers, normalized progress and the links to
//! its neighbours. Links are stored as positions in the owning animation's
//! frame vector, so the sequence forms a circular doubly-linked list without
//! any cyclic ownership: `frames[last].next_frame == 0` and
//! `frames[0].prev_frame == last`, a single frame linking to itself.
//!
//! Frames are rebuilt wholesale whenever the sequence is edited; playheads
//! never mutate them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::resources::texturestore::TextureFrame;

/// Identifier of a frame inside a texture.
///
/// Atlases name their frames, spritesheets number them. JSON accepts either
/// a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameKey {
    Index(u32),
    Name(String),
}

impl Default for FrameKey {
    fn default() -> Self {
        FrameKey::Index(0)
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKey::Index(i) => write!(f, "{}", i),
            FrameKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for FrameKey {
    fn from(name: &str) -> Self {
        FrameKey::Name(name.to_string())
    }
}

impl From<String> for FrameKey {
    fn from(name: String) -> Self {
        FrameKey::Name(name)
    }
}

impl From<u32> for FrameKey {
    fn from(index: u32) -> Self {
        FrameKey::Index(index)
    }
}

/// One entry of an explicit frame list.
///
/// `key` falls back to the animation's default texture key when absent.
/// `duration` is extra time in ms added on top of the animation's
/// per-frame time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub frame: FrameKey,
    #[serde(default)]
    pub duration: f32,
}

impl FrameConfig {
    pub fn new(key: impl Into<String>, frame: impl Into<FrameKey>) -> Self {
        Self {
            key: Some(key.into()),
            frame: frame.into(),
            duration: 0.0,
        }
    }

    /// Frame entry without a texture key, resolved against the default key.
    pub fn frame(frame: impl Into<FrameKey>) -> Self {
        Self {
            key: None,
            frame: frame.into(),
            duration: 0.0,
        }
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }
}

/// Callback run when its frame becomes current during active playback.
pub type FrameCallback = Arc<dyn Fn(&AnimationFrame) + Send + Sync>;

/// A node of an animation's frame sequence.
#[derive(Clone)]
pub struct AnimationFrame {
    /// Texture the frame belongs to.
    pub texture_key: String,
    /// Frame identifier inside the texture.
    pub texture_frame: FrameKey,
    /// 1-based position in the sequence.
    pub index: usize,
    /// Resolved texture frame data (size, pivot).
    pub frame: TextureFrame,
    pub is_first: bool,
    pub is_last: bool,
    /// Position of the previous frame in the owning sequence.
    pub prev_frame: usize,
    /// Position of the next frame in the owning sequence.
    pub next_frame: usize,
    /// Extra ms this frame stays on screen.
    pub duration: f32,
    /// Normalized position in the sequence, 0 for the first frame, 1 for the last.
    pub progress: f32,
    pub on_update: Option<FrameCallback>,
}

impl fmt::Debug for AnimationFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationFrame")
            .field("texture_key", &self.texture_key)
            .field("texture_frame", &self.texture_frame)
            .field("index", &self.index)
            .field("frame", &self.frame)
            .field("is_first", &self.is_first)
            .field("is_last", &self.is_last)
            .field("prev_frame", &self.prev_frame)
            .field("next_frame", &self.next_frame)
            .field("duration", &self.duration)
            .field("progress", &self.progress)
            .field("on_update", &self.on_update.is_some())
            .finish()
    }
}

impl AnimationFrame {
    /// Create an unlinked frame. Links, flags and progress are assigned when
    /// the owning sequence is (re)built.
    pub fn new(
        texture_key: impl Into<String>,
        texture_frame: FrameKey,
        index: usize,
        frame: TextureFrame,
    ) -> Self {
        Self {
            texture_key: texture_key.into(),
            texture_frame,
            index,
            frame,
            is_first: false,
            is_last: false,
            prev_frame: 0,
            next_frame: 0,
            duration: 0.0,
            progress: 0.0,
            on_update: None,
        }
    }

    pub fn with_on_update(mut self, callback: FrameCallback) -> Self {
        self.on_update = Some(callback);
        self
    }

    /// Frame list entry describing this frame.
    pub fn to_config(&self) -> FrameConfig {
        FrameConfig {
            key: Some(self.texture_key.clone()),
            frame: self.texture_frame.clone(),
            duration: self.duration,
        }
    }
}
