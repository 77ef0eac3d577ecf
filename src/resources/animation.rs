//! Shared animation definitions.
//!
//! An [`Animation`] is the immutable description of a frame based animation:
//! an ordered, circularly linked sequence of [`AnimationFrame`]s plus the
//! timing rules (frame rate, delays, repeats, yoyo) every playhead copies
//! when it loads the animation. Definitions are shared between entities
//! through `Arc<Animation>`; all mutable playback data lives in the
//! per-entity [`AnimationState`](crate::components::animationstate::AnimationState).
//!
//! The advance algorithm also lives here: [`Animation::next_frame`] and
//! [`Animation::previous_frame`] take the playhead that is being ticked and
//! decide between stepping, bouncing (yoyo), repeating and completing.
//!
//! # JSON
//!
//! ```json
//! {
//!   "key": "walk",
//!   "frames": [ { "key": "hero", "frame": "walk1" }, { "key": "hero", "frame": "walk2", "duration": 50 } ],
//!   "frameRate": 12,
//!   "repeat": -1,
//!   "yoyo": false
//! }
//! ```
//!
//! `frames` may also be a texture key, in which case every frame of that
//! texture is used in the order the texture reports them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::components::animationstate::{AnimationState, PendingStop, PlaybackContext};
use crate::resources::animationframe::{AnimationFrame, FrameConfig, FrameKey};
use crate::resources::texturestore::FrameSource;

/// Frame rate used when neither frame rate nor duration are configured.
pub const DEFAULT_FRAME_RATE: f32 = 24.0;

/// Frames of an animation: a whole texture, or an explicit list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FramesSpec {
    Texture(String),
    List(Vec<FrameConfig>),
}

impl Default for FramesSpec {
    fn default() -> Self {
        FramesSpec::List(Vec::new())
    }
}

impl From<&str> for FramesSpec {
    fn from(texture_key: &str) -> Self {
        FramesSpec::Texture(texture_key.to_string())
    }
}

impl From<Vec<FrameConfig>> for FramesSpec {
    fn from(frames: Vec<FrameConfig>) -> Self {
        FramesSpec::List(frames)
    }
}

fn default_kind() -> String {
    "frame".to_string()
}

fn default_true() -> bool {
    true
}

/// Description of an animation, as authored or loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationConfig {
    #[serde(default)]
    pub key: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub frames: FramesSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_texture_key: Option<String>,
    /// Sort texture derived frame names by the number they contain.
    #[serde(default)]
    pub sort_frames: bool,
    #[serde(default)]
    pub frame_rate: Option<f32>,
    #[serde(default)]
    pub duration: Option<f32>,
    #[serde(default = "default_true")]
    pub skip_missed_frames: bool,
    #[serde(default)]
    pub delay: f32,
    /// Number of repeats, -1 repeats forever.
    #[serde(default)]
    pub repeat: i32,
    #[serde(default)]
    pub repeat_delay: f32,
    #[serde(default)]
    pub yoyo: bool,
    #[serde(default)]
    pub show_before_delay: bool,
    #[serde(default)]
    pub show_on_start: bool,
    #[serde(default)]
    pub hide_on_complete: bool,
    #[serde(default)]
    pub random_frame: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            kind: default_kind(),
            frames: FramesSpec::default(),
            default_texture_key: None,
            sort_frames: false,
            frame_rate: None,
            duration: None,
            skip_missed_frames: true,
            delay: 0.0,
            repeat: 0,
            repeat_delay: 0.0,
            yoyo: false,
            show_before_delay: false,
            show_on_start: false,
            hide_on_complete: false,
            random_frame: false,
        }
    }
}

impl AnimationConfig {
    pub fn new(key: impl Into<String>, frames: impl Into<FramesSpec>) -> Self {
        Self {
            key: key.into(),
            frames: frames.into(),
            ..Self::default()
        }
    }
    pub fn with_default_texture_key(mut self, key: impl Into<String>) -> Self {
        self.default_texture_key = Some(key.into());
        self
    }
    pub fn with_sort_frames(mut self, sort: bool) -> Self {
        self.sort_frames = sort;
        self
    }
    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }
    pub fn with_skip_missed_frames(mut self, skip: bool) -> Self {
        self.skip_missed_frames = skip;
        self
    }
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }
    pub fn with_repeat(mut self, repeat: i32) -> Self {
        self.repeat = repeat;
        self
    }
    pub fn with_repeat_delay(mut self, repeat_delay: f32) -> Self {
        self.repeat_delay = repeat_delay;
        self
    }
    pub fn with_yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }
    pub fn with_show_before_delay(mut self, show: bool) -> Self {
        self.show_before_delay = show;
        self
    }
    pub fn with_show_on_start(mut self, show: bool) -> Self {
        self.show_on_start = show;
        self
    }
    pub fn with_hide_on_complete(mut self, hide: bool) -> Self {
        self.hide_on_complete = hide;
        self
    }
    pub fn with_random_frame(mut self, random: bool) -> Self {
        self.random_frame = random;
        self
    }
}

/// Frame rate, duration and per-frame time derived together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub frame_rate: f32,
    pub duration: f32,
    pub ms_per_frame: f32,
}

/// Derive frame rate, duration and ms per frame.
///
/// A frame rate always wins and recomputes the duration. A duration alone
/// derives the frame rate. With neither, the default rate of 24 fps is used
/// and the duration is computed as `(24 / total_frames) * 1000`, the long
/// standing formula animation data has been authored against.
pub fn calculate_duration(total_frames: usize, duration: Option<f32>, frame_rate: Option<f32>) -> Timing {
    let total = total_frames as f32;
    let (frame_rate, duration) = match (duration, frame_rate) {
        (_, Some(rate)) => (rate, (total / rate) * 1000.0),
        // 12 frames over 4000 ms play at 12 / 4 = 3 fps
        (Some(duration), None) if duration > 0.0 => (total / (duration / 1000.0), duration),
        _ => (DEFAULT_FRAME_RATE, (DEFAULT_FRAME_RATE / total) * 1000.0),
    };
    Timing {
        frame_rate,
        duration,
        ms_per_frame: 1000.0 / frame_rate,
    }
}

/// Relink a frame sequence: indices, first/last flags, neighbours, progress.
fn link_sequence(frames: &mut [AnimationFrame]) {
    let len = frames.len();
    for (i, frame) in frames.iter_mut().enumerate() {
        frame.index = i + 1;
        frame.is_first = i == 0;
        frame.is_last = i + 1 == len;
        frame.progress = if len > 1 {
            i as f32 / (len - 1) as f32
        } else {
            0.0
        };
        frame.prev_frame = if i == 0 { len - 1 } else { i - 1 };
        frame.next_frame = if i + 1 == len { 0 } else { i + 1 };
    }
}

fn digits_of(key: &FrameKey) -> u64 {
    match key {
        FrameKey::Index(i) => u64::from(*i),
        FrameKey::Name(name) => name
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .unwrap_or(0),
    }
}

/// A frame based animation shared by every playhead that plays it.
#[derive(Debug, Clone)]
pub struct Animation {
    /// Unique key within the owning registry.
    pub key: String,
    pub frames: Vec<AnimationFrame>,
    pub frame_rate: f32,
    /// Total duration in ms.
    pub duration: f32,
    pub ms_per_frame: f32,
    pub skip_missed_frames: bool,
    pub delay: f32,
    pub repeat: i32,
    pub repeat_delay: f32,
    pub yoyo: bool,
    pub show_before_delay: bool,
    pub show_on_start: bool,
    pub hide_on_complete: bool,
    pub random_frame: bool,
    // Shared by clones so a copy-on-write edit keeps obeying pause_all.
    paused: Arc<AtomicBool>,
}

impl Animation {
    /// Build an animation from its configuration, resolving frames through `textures`.
    pub fn new(config: &AnimationConfig, textures: &dyn FrameSource) -> Self {
        let frames = Self::get_frames(
            textures,
            &config.frames,
            config.default_texture_key.as_deref(),
            config.sort_frames,
        );
        let timing = calculate_duration(frames.len(), config.duration, config.frame_rate);
        Self {
            key: config.key.clone(),
            frames,
            frame_rate: timing.frame_rate,
            duration: timing.duration,
            ms_per_frame: timing.ms_per_frame,
            skip_missed_frames: config.skip_missed_frames,
            delay: config.delay,
            repeat: config.repeat,
            repeat_delay: config.repeat_delay,
            yoyo: config.yoyo,
            show_before_delay: config.show_before_delay,
            show_on_start: config.show_on_start,
            hide_on_complete: config.hide_on_complete,
            random_frame: config.random_frame,
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build linked frames from a frame spec.
    ///
    /// Entries without a texture key (and no default) are skipped, as are
    /// entries the texture registry cannot resolve.
    pub fn get_frames(
        textures: &dyn FrameSource,
        frames: &FramesSpec,
        default_texture_key: Option<&str>,
        sort_frames: bool,
    ) -> Vec<AnimationFrame> {
        let entries: Vec<FrameConfig> = match frames {
            FramesSpec::Texture(texture_key) => {
                let Some(mut names) = textures.frame_names(texture_key) else {
                    warn!("Texture '{}' not found", texture_key);
                    return Vec::new();
                };
                if sort_frames {
                    names.sort_by_key(digits_of);
                }
                names
                    .into_iter()
                    .map(|name| FrameConfig::new(texture_key.clone(), name))
                    .collect()
            }
            FramesSpec::List(list) => list.clone(),
        };

        let mut out: Vec<AnimationFrame> = Vec::with_capacity(entries.len());
        for item in &entries {
            let Some(key) = item.key.as_deref().or(default_texture_key) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            let Some(texture_frame) = textures.frame(key, &item.frame) else {
                warn!("Frame '{}' not found in texture '{}'", item.frame, key);
                continue;
            };
            let mut frame = AnimationFrame::new(key, item.frame.clone(), out.len() + 1, texture_frame);
            frame.duration = item.duration;
            out.push(frame);
        }
        link_sequence(&mut out);
        out
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    /// Whether `index` addresses a frame of this animation.
    pub fn check_frame(&self, index: usize) -> bool {
        index < self.frames.len()
    }

    pub fn get_frame_at(&self, index: usize) -> Option<&AnimationFrame> {
        self.frames.get(index)
    }

    pub fn get_last_frame(&self) -> Option<&AnimationFrame> {
        self.frames.last()
    }

    /// Append frames to the end of the sequence.
    pub fn add_frame(&mut self, textures: &dyn FrameSource, frames: &FramesSpec) -> &mut Self {
        let end = self.frames.len();
        self.add_frame_at(end, textures, frames)
    }

    /// Insert frames at `index` (0 prepends, the length appends).
    pub fn add_frame_at(&mut self, index: usize, textures: &dyn FrameSource, frames: &FramesSpec) -> &mut Self {
        let new_frames = Self::get_frames(textures, frames, None, false);
        if !new_frames.is_empty() {
            let index = index.min(self.frames.len());
            self.frames.splice(index..index, new_frames);
            self.update_frame_sequence();
        }
        self
    }

    /// Remove the first frame showing `texture_frame` of `texture_key`.
    pub fn remove_frame(&mut self, texture_key: &str, texture_frame: &FrameKey) -> &mut Self {
        if let Some(index) = self
            .frames
            .iter()
            .position(|f| f.texture_key == texture_key && f.texture_frame == *texture_frame)
        {
            self.remove_frame_at(index);
        }
        self
    }

    pub fn remove_frame_at(&mut self, index: usize) -> &mut Self {
        if index < self.frames.len() {
            self.frames.remove(index);
            self.update_frame_sequence();
        }
        self
    }

    /// Recompute indices, first/last flags, links and progress for every frame.
    pub fn update_frame_sequence(&mut self) -> &mut Self {
        link_sequence(&mut self.frames);
        self
    }

    /// Frame closest to `value` (clamped to 0..=1). Equidistant values pick
    /// the later frame.
    pub fn frame_by_progress(&self, value: f32) -> Option<usize> {
        let value = value.clamp(0.0, 1.0);
        let len = self.frames.len();
        match len {
            0 => return None,
            1 => return Some(0),
            _ => {}
        }
        if value < self.frames[0].progress {
            return Some(0);
        }
        let mut i = 1;
        while i < len - 1 && self.frames[i].progress < value {
            i += 1;
        }
        let low = self.frames[i - 1].progress;
        let high = self.frames[i].progress;
        if high - value <= value - low {
            Some(i)
        } else {
            Some(i - 1)
        }
    }

    fn frame_duration(&self, index: Option<usize>) -> f32 {
        index
            .and_then(|i| self.frames.get(i))
            .map_or(0.0, |frame| frame.duration)
    }

    /// Attach this animation to a playhead and resolve its start frame.
    ///
    /// Timing parameters are copied onto the playhead the first time it
    /// attaches, so later overrides on the playhead never touch the shared
    /// definition. An out of range `start_frame` falls back to 0, and a
    /// reverse playhead starting at 0 starts on the last frame instead.
    pub fn load(self: &Arc<Self>, state: &mut AnimationState, start_frame: usize) {
        let start_frame = if self.check_frame(start_frame) { start_frame } else { 0 };

        if !state.is_showing(self) {
            state.current_anim = Some(Arc::clone(self));
            state.frame_rate = self.frame_rate;
            state.duration = self.duration;
            state.ms_per_frame = self.ms_per_frame;
            state.skip_missed_frames = self.skip_missed_frames;
            state.delay = self.delay;
            state.repeat = self.repeat;
            state.repeat_delay = self.repeat_delay;
            state.yoyo = self.yoyo;
            state.show_before_delay = self.show_before_delay;
            state.show_on_start = self.show_on_start;
            state.hide_on_complete = self.hide_on_complete;
        }

        if self.frames.is_empty() {
            state.current_frame = None;
            return;
        }
        state.current_frame = if start_frame == 0 && !state.forward {
            Some(self.frames.len() - 1)
        } else {
            Some(start_frame)
        };
    }

    /// Reset the playhead's accumulator and schedule its first tick.
    pub fn get_first_tick(&self, state: &mut AnimationState, include_delay: bool) {
        state.accumulator = 0.0;
        state.next_tick = state.ms_per_frame + self.frame_duration(state.current_frame);
        if include_delay {
            state.next_tick += state.delay;
        }
    }

    /// Consume the elapsed tick, carrying any surplus, and schedule the next one.
    pub fn get_next_tick(&self, state: &mut AnimationState) {
        state.accumulator -= state.next_tick;
        state.next_tick = state.ms_per_frame + self.frame_duration(state.current_frame);
    }

    /// Advance the playhead one frame forward.
    pub fn next_frame(&self, state: &mut AnimationState, ctx: &mut PlaybackContext<'_>) {
        let Some(frame) = state.current_frame.and_then(|i| self.frames.get(i)) else {
            return;
        };

        if frame.is_last {
            if state.yoyo {
                self.handle_yoyo_frame(state, ctx, false);
            } else if state.has_repeats_left() {
                if state.in_reverse && state.forward {
                    state.forward = false;
                } else {
                    self.repeat_animation(state, ctx);
                }
            } else {
                state.complete(ctx);
            }
        } else {
            self.update_and_get_next_tick(state, ctx, frame.next_frame);
        }
    }

    /// Step the playhead one frame backward.
    pub fn previous_frame(&self, state: &mut AnimationState, ctx: &mut PlaybackContext<'_>) {
        let Some(frame) = state.current_frame.and_then(|i| self.frames.get(i)) else {
            return;
        };

        if frame.is_first {
            if state.yoyo {
                self.handle_yoyo_frame(state, ctx, true);
            } else if state.has_repeats_left() {
                if !(state.in_reverse && !state.forward) {
                    state.forward = true;
                }
                self.repeat_animation(state, ctx);
            } else {
                state.complete(ctx);
            }
        } else {
            self.update_and_get_next_tick(state, ctx, frame.prev_frame);
        }
    }

    /// Boundary handling for yoyo playback.
    ///
    /// `is_reverse` is true when the boundary was reached travelling
    /// backwards. When it disagrees with the playhead's requested direction
    /// the bounce has come home: repeat if repeats remain, else complete.
    /// Otherwise the direction flips and the bounce continues.
    fn handle_yoyo_frame(&self, state: &mut AnimationState, ctx: &mut PlaybackContext<'_>, is_reverse: bool) {
        let repeats_left = state.has_repeats_left();

        if state.in_reverse != is_reverse && repeats_left {
            if state.repeat_delay == 0.0 || state.pending_repeat {
                state.forward = is_reverse;
            }
            self.repeat_animation(state, ctx);
            return;
        }

        if state.in_reverse != is_reverse && !repeats_left {
            state.complete(ctx);
            return;
        }

        state.forward = is_reverse;

        let Some(frame) = state.current_frame.and_then(|i| self.frames.get(i)) else {
            return;
        };
        let target = if is_reverse { frame.next_frame } else { frame.prev_frame };
        self.update_and_get_next_tick(state, ctx, target);
    }

    fn update_and_get_next_tick(&self, state: &mut AnimationState, ctx: &mut PlaybackContext<'_>, index: usize) {
        state.set_current_frame(ctx, index);
        // A stop on this frame may already have chained into another animation.
        if state.is_showing(self) {
            self.get_next_tick(state);
        }
    }

    /// Repeat transition: honour a repeat-count stop, wait out the repeat
    /// delay, then consume a repeat and step past the boundary.
    fn repeat_animation(&self, state: &mut AnimationState, ctx: &mut PlaybackContext<'_>) {
        if state.pending_stop == PendingStop::AfterRepeats(0) {
            state.complete(ctx);
            return;
        }

        if state.repeat_delay > 0.0 && !state.pending_repeat {
            state.pending_repeat = true;
            state.accumulator -= state.next_tick;
            state.next_tick += state.repeat_delay;
            return;
        }

        if let PendingStop::AfterRepeats(remaining) = &mut state.pending_stop {
            *remaining -= 1;
        }
        state.consume_repeat();

        let Some(frame) = state.current_frame.and_then(|i| self.frames.get(i)) else {
            return;
        };
        let target = if state.forward { frame.next_frame } else { frame.prev_frame };
        state.set_current_frame(ctx, target);

        if state.is_playing && state.is_showing(self) {
            self.get_next_tick(state);
            state.handle_repeat(ctx);
        }
    }

    /// Pause every playhead using this animation.
    pub fn pause(&self) -> &Self {
        self.paused.store(true, Ordering::Relaxed);
        self
    }

    pub fn resume(&self) -> &Self {
        self.paused.store(false, Ordering::Relaxed);
        self
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Sever the frame sequence. Called when the definition is destroyed.
    pub fn destroy(&mut self) {
        self.frames.clear();
    }

    /// Configuration that rebuilds this animation.
    pub fn to_config(&self) -> AnimationConfig {
        AnimationConfig {
            key: self.key.clone(),
            kind: default_kind(),
            frames: FramesSpec::List(self.frames.iter().map(AnimationFrame::to_config).collect()),
            default_texture_key: None,
            sort_frames: false,
            frame_rate: Some(self.frame_rate),
            duration: Some(self.duration),
            skip_missed_frames: self.skip_missed_frames,
            delay: self.delay,
            repeat: self.repeat,
            repeat_delay: self.repeat_delay,
            yoyo: self.yoyo,
            show_before_delay: self.show_before_delay,
            show_on_start: self.show_on_start,
            hide_on_complete: self.hide_on_complete,
            random_frame: self.random_frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::texturestore::{TextureFrame, TextureStore};

    fn textures() -> TextureStore {
        let mut store = TextureStore::new();
        store.add_spritesheet("sheet", 16.0, 16.0, 15);
        store.add_frames(
            "hero",
            ["walk3", "walk1", "walk10", "walk2"]
                .into_iter()
                .map(|n| (FrameKey::from(n), TextureFrame::new(32.0, 32.0))),
        );
        store
    }

    fn sheet_frames(count: u32) -> FramesSpec {
        FramesSpec::List((0..count).map(|i| FrameConfig::new("sheet", i)).collect())
    }

    fn build(config: AnimationConfig) -> Animation {
        Animation::new(&config, &textures())
    }

    #[test]
    fn default_timing_uses_24_fps_and_literal_duration_formula() {
        let anim = build(AnimationConfig::new("a", sheet_frames(12)));
        assert_eq!(anim.frame_rate, 24.0);
        assert_eq!(anim.duration, (24.0 / 12.0) * 1000.0);
        assert_eq!(anim.ms_per_frame, 1000.0 / 24.0);
    }

    #[test]
    fn duration_alone_derives_frame_rate() {
        let anim = build(AnimationConfig::new("a", sheet_frames(12)).with_duration(4000.0));
        assert_eq!(anim.frame_rate, 3.0);
        assert_eq!(anim.duration, 4000.0);
    }

    #[test]
    fn frame_rate_wins_over_duration() {
        let anim = build(
            AnimationConfig::new("a", sheet_frames(15))
                .with_frame_rate(30.0)
                .with_duration(9999.0),
        );
        assert_eq!(anim.frame_rate, 30.0);
        assert_eq!(anim.duration, 500.0);
        assert_eq!(anim.ms_per_frame, 1000.0 / 30.0);
    }

    #[test]
    fn sequence_is_circular_in_both_directions() {
        for n in 1..6 {
            let anim = build(AnimationConfig::new("a", sheet_frames(n)));
            let len = anim.total_frames();
            assert_eq!(len, n as usize);
            for start in 0..len {
                let mut i = start;
                for _ in 0..len {
                    i = anim.frames[i].next_frame;
                }
                assert_eq!(i, start);
                for _ in 0..len {
                    i = anim.frames[i].prev_frame;
                }
                assert_eq!(i, start);
            }
            assert_eq!(anim.frames.iter().filter(|f| f.is_first).count(), 1);
            assert_eq!(anim.frames.iter().filter(|f| f.is_last).count(), 1);
            assert_eq!(anim.frames[0].is_last, len == 1);
        }
    }

    #[test]
    fn progress_is_index_over_last_index() {
        let anim = build(AnimationConfig::new("a", sheet_frames(7)));
        for (i, frame) in anim.frames.iter().enumerate() {
            assert_eq!(frame.progress, i as f32 / 6.0);
            assert_eq!(frame.index, i + 1);
        }
        let single = build(AnimationConfig::new("b", sheet_frames(1)));
        assert_eq!(single.frames[0].progress, 0.0);
        assert_eq!(single.frames[0].next_frame, 0);
        assert_eq!(single.frames[0].prev_frame, 0);
    }

    #[test]
    fn unresolvable_entries_are_skipped() {
        let frames = FramesSpec::List(vec![
            FrameConfig::new("sheet", 0u32),
            FrameConfig::frame(1u32),
            FrameConfig::new("missing", 0u32),
            FrameConfig::new("sheet", 99u32),
            FrameConfig::new("sheet", 2u32).with_duration(40.0),
        ]);
        let anim = build(AnimationConfig::new("a", frames));
        assert_eq!(anim.total_frames(), 2);
        assert_eq!(anim.frames[1].texture_frame, FrameKey::Index(2));
        assert_eq!(anim.frames[1].duration, 40.0);
        assert_eq!(anim.frames[1].index, 2);
    }

    #[test]
    fn default_texture_key_fills_missing_keys() {
        let frames = FramesSpec::List(vec![FrameConfig::frame(0u32), FrameConfig::frame(1u32)]);
        let anim = build(AnimationConfig::new("a", frames).with_default_texture_key("sheet"));
        assert_eq!(anim.total_frames(), 2);
        assert_eq!(anim.frames[0].texture_key, "sheet");
    }

    #[test]
    fn texture_key_uses_reported_order_unless_sorted() {
        let anim = build(AnimationConfig::new("a", "hero"));
        let names: Vec<String> = anim.frames.iter().map(|f| f.texture_frame.to_string()).collect();
        assert_eq!(names, ["walk3", "walk1", "walk10", "walk2"]);

        let sorted = build(AnimationConfig::new("b", "hero").with_sort_frames(true));
        let names: Vec<String> = sorted.frames.iter().map(|f| f.texture_frame.to_string()).collect();
        assert_eq!(names, ["walk1", "walk2", "walk3", "walk10"]);
    }

    #[test]
    fn missing_texture_builds_empty_animation() {
        let anim = build(AnimationConfig::new("a", "nowhere"));
        assert_eq!(anim.total_frames(), 0);
        assert!(anim.get_last_frame().is_none());
        assert_eq!(anim.frame_by_progress(0.5), None);
    }

    #[test]
    fn add_frame_at_splices_and_relinks() {
        let store = textures();
        let mut anim = Animation::new(&AnimationConfig::new("a", sheet_frames(3)), &store);

        anim.add_frame_at(0, &store, &FramesSpec::List(vec![FrameConfig::new("sheet", 10u32)]));
        anim.add_frame(&store, &FramesSpec::List(vec![FrameConfig::new("sheet", 11u32)]));
        anim.add_frame_at(2, &store, &FramesSpec::List(vec![FrameConfig::new("sheet", 12u32)]));

        let order: Vec<FrameKey> = anim.frames.iter().map(|f| f.texture_frame.clone()).collect();
        assert_eq!(
            order,
            [10u32, 0, 12, 1, 2, 11].map(FrameKey::Index).to_vec()
        );
        assert!(anim.frames[0].is_first);
        assert!(anim.frames[5].is_last);
        assert!(!anim.frames[3].is_last);
        assert_eq!(anim.frames[5].next_frame, 0);
        assert_eq!(anim.frames[0].prev_frame, 5);
        assert_eq!(anim.frames[5].progress, 1.0);
        assert_eq!(anim.frames[2].index, 3);
    }

    #[test]
    fn remove_frame_relinks_down_to_a_single_frame() {
        let mut anim = build(AnimationConfig::new("a", sheet_frames(3)));
        anim.remove_frame_at(1);
        assert_eq!(anim.total_frames(), 2);
        assert_eq!(anim.frames[1].texture_frame, FrameKey::Index(2));
        assert_eq!(anim.frames[1].progress, 1.0);

        anim.remove_frame("sheet", &FrameKey::Index(0));
        assert_eq!(anim.total_frames(), 1);
        let only = &anim.frames[0];
        assert!(only.is_first && only.is_last);
        assert_eq!(only.next_frame, 0);
        assert_eq!(only.prev_frame, 0);
        assert_eq!(only.progress, 0.0);

        // out of range is ignored
        anim.remove_frame_at(5);
        assert_eq!(anim.total_frames(), 1);
    }

    #[test]
    fn frame_by_progress_picks_nearest_with_ties_going_up() {
        let anim = build(AnimationConfig::new("a", sheet_frames(5)));
        assert_eq!(anim.frame_by_progress(0.0), Some(0));
        assert_eq!(anim.frame_by_progress(0.1), Some(0));
        assert_eq!(anim.frame_by_progress(0.125), Some(1));
        assert_eq!(anim.frame_by_progress(0.26), Some(1));
        assert_eq!(anim.frame_by_progress(0.9), Some(4));
        assert_eq!(anim.frame_by_progress(3.0), Some(4));
        assert_eq!(anim.frame_by_progress(-1.0), Some(0));
        for (i, frame) in anim.frames.iter().enumerate() {
            assert_eq!(anim.frame_by_progress(frame.progress), Some(i));
        }
    }

    #[test]
    fn pause_is_shared_between_clones() {
        let anim = build(AnimationConfig::new("a", sheet_frames(2)));
        let copy = anim.clone();
        anim.pause();
        assert!(copy.is_paused());
        copy.resume();
        assert!(!anim.is_paused());
    }

    #[test]
    fn to_config_rebuilds_an_equivalent_animation() {
        let store = textures();
        let mut original = Animation::new(
            &AnimationConfig::new("a", sheet_frames(4))
                .with_frame_rate(10.0)
                .with_repeat(-1)
                .with_yoyo(true)
                .with_repeat_delay(250.0),
            &store,
        );
        original.frames[2].duration = 30.0;
        let rebuilt = Animation::new(&original.to_config(), &store);
        assert_eq!(rebuilt.key, "a");
        assert_eq!(rebuilt.total_frames(), 4);
        assert_eq!(rebuilt.frame_rate, 10.0);
        assert_eq!(rebuilt.duration, original.duration);
        assert_eq!(rebuilt.repeat, -1);
        assert!(rebuilt.yoyo);
        assert_eq!(rebuilt.repeat_delay, 250.0);
        assert_eq!(rebuilt.frames[2].duration, 30.0);
    }

    #[test]
    fn config_json_uses_camel_case_and_defaults() {
        let json = r#"{ "key": "walk", "frames": "hero", "frameRate": 12, "repeat": -1, "hideOnComplete": true }"#;
        let cfg: AnimationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.kind, "frame");
        assert_eq!(cfg.frames, FramesSpec::Texture("hero".to_string()));
        assert_eq!(cfg.frame_rate, Some(12.0));
        assert_eq!(cfg.repeat, -1);
        assert!(cfg.hide_on_complete);
        assert!(cfg.skip_missed_frames);
        assert!(!cfg.sort_frames);
    }

    #[test]
    fn destroy_severs_frames() {
        let mut anim = build(AnimationConfig::new("a", sheet_frames(3)));
        anim.destroy();
        assert_eq!(anim.total_frames(), 0);
    }
}
