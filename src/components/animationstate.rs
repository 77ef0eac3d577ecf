//! Per-entity animation playhead.
//!
//! [`AnimationState`] is the mutable side of frame animation: it references
//! a shared [`Animation`] definition, keeps its own copy of every timing
//! parameter and tracks where playback is. Each call to
//! [`AnimationState::update`] accumulates elapsed milliseconds and advances
//! frames once enough time has built up.
//!
//! The playhead never renders anything itself. Every operation that has a
//! visible effect receives a [`PlaybackContext`], which carries the global
//! [`AnimationManager`] and the owner implementing [`AnimationTarget`]:
//! frame changes, visibility changes and playback events all go through it.
//!
//! Lifecycle of a run:
//!
//! - idle: nothing loaded, or stopped/completed
//! - delaying: loaded and playing, waiting for the start delay to elapse
//! - started: ticking frames, repeating and bouncing as configured
//!
//! A run emits `Start`, then `Update`/`Repeat` in order, and ends with
//! exactly one `Stop` or `Complete`.

use std::sync::Arc;

use bevy_ecs::prelude::Component;
use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::events::animation::{AnimationEvent, AnimationEventKind};
use crate::resources::animation::{Animation, AnimationConfig, calculate_duration};
use crate::resources::animationframe::{AnimationFrame, FrameConfig, FrameKey};
use crate::resources::animationmanager::{AnimationManager, FrameNamesConfig, FrameNumbersConfig};
use crate::resources::texturestore::FrameSource;

/// Upper bound of extra frame advances a single update may perform.
pub const MAX_CATCH_UP_STEPS: u32 = 60;

/// Owner driven by a playhead.
pub trait AnimationTarget {
    fn set_visible(&mut self, visible: bool);
    /// Display `frame` as the current visual. Called once per frame change.
    fn apply_frame(&mut self, frame: &AnimationFrame);
    fn emit(&mut self, event: AnimationEvent);
}

/// Collaborators a playhead needs while it runs.
pub struct PlaybackContext<'a> {
    pub manager: &'a AnimationManager,
    pub target: &'a mut dyn AnimationTarget,
}

impl<'a> PlaybackContext<'a> {
    pub fn new(manager: &'a AnimationManager, target: &'a mut dyn AnimationTarget) -> Self {
        Self { manager, target }
    }
}

/// A deferred stop request. Only one is armed at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PendingStop {
    #[default]
    NoStop,
    /// Stop once this many ms of unscaled time have elapsed.
    AfterDelay(f32),
    /// Complete when a repeat is due and no repeats are left.
    AfterRepeats(u32),
    /// Stop when this frame (0-based position) becomes current.
    OnFrame(usize),
}

/// Per-play overrides. Unset fields fall back to the animation's values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayConfig {
    pub key: String,
    pub frame_rate: Option<f32>,
    pub duration: Option<f32>,
    pub delay: Option<f32>,
    pub repeat: Option<i32>,
    pub repeat_delay: Option<f32>,
    pub yoyo: Option<bool>,
    pub show_before_delay: Option<bool>,
    pub show_on_start: Option<bool>,
    pub hide_on_complete: Option<bool>,
    pub skip_missed_frames: Option<bool>,
    pub time_scale: Option<f32>,
    pub start_frame: Option<usize>,
    pub random_frame: Option<bool>,
}

impl PlayConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = Some(delay);
        self
    }
    pub fn with_repeat(mut self, repeat: i32) -> Self {
        self.repeat = Some(repeat);
        self
    }
    pub fn with_repeat_delay(mut self, repeat_delay: f32) -> Self {
        self.repeat_delay = Some(repeat_delay);
        self
    }
    pub fn with_yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = Some(yoyo);
        self
    }
    pub fn with_show_before_delay(mut self, show: bool) -> Self {
        self.show_before_delay = Some(show);
        self
    }
    pub fn with_show_on_start(mut self, show: bool) -> Self {
        self.show_on_start = Some(show);
        self
    }
    pub fn with_hide_on_complete(mut self, hide: bool) -> Self {
        self.hide_on_complete = Some(hide);
        self
    }
    pub fn with_skip_missed_frames(mut self, skip: bool) -> Self {
        self.skip_missed_frames = Some(skip);
        self
    }
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = Some(time_scale);
        self
    }
    pub fn with_start_frame(mut self, start_frame: usize) -> Self {
        self.start_frame = Some(start_frame);
        self
    }
    pub fn with_random_frame(mut self, random: bool) -> Self {
        self.random_frame = Some(random);
        self
    }
}

/// What to play: a key, a definition handle, or a key with overrides.
#[derive(Debug, Clone)]
pub enum PlayTarget {
    Key(String),
    Instance(Arc<Animation>),
    Config(PlayConfig),
}

impl PlayTarget {
    pub fn key(&self) -> &str {
        match self {
            PlayTarget::Key(key) => key,
            PlayTarget::Instance(anim) => &anim.key,
            PlayTarget::Config(config) => &config.key,
        }
    }

    pub fn config(&self) -> Option<&PlayConfig> {
        match self {
            PlayTarget::Config(config) => Some(config),
            _ => None,
        }
    }
}

impl From<&str> for PlayTarget {
    fn from(key: &str) -> Self {
        PlayTarget::Key(key.to_string())
    }
}

impl From<String> for PlayTarget {
    fn from(key: String) -> Self {
        PlayTarget::Key(key)
    }
}

impl From<PlayConfig> for PlayTarget {
    fn from(config: PlayConfig) -> Self {
        PlayTarget::Config(config)
    }
}

impl From<Arc<Animation>> for PlayTarget {
    fn from(anim: Arc<Animation>) -> Self {
        PlayTarget::Instance(anim)
    }
}

impl From<&Arc<Animation>> for PlayTarget {
    fn from(anim: &Arc<Animation>) -> Self {
        PlayTarget::Instance(Arc::clone(anim))
    }
}

// Only -1 repeats forever; other negative counts play once.
fn repeat_counter_from(repeat: i32) -> Option<u32> {
    match repeat {
        -1 => None,
        count => Some(u32::try_from(count).unwrap_or(0)),
    }
}

/// Animation playhead of an entity.
#[derive(Component, Debug, Clone)]
pub struct AnimationState {
    // Owner-local definitions, created on first use.
    anims: Option<FxHashMap<String, Arc<Animation>>>,
    pub current_anim: Option<Arc<Animation>>,
    /// Position of the current frame in the current animation.
    pub current_frame: Option<usize>,
    pub next_anim: Option<PlayTarget>,
    pub next_anims_queue: SmallVec<[PlayTarget; 4]>,
    /// Multiplier applied to every delta.
    pub time_scale: f32,
    pub frame_rate: f32,
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
    /// Direction frames are currently advancing in.
    pub forward: bool,
    /// Direction playback was requested in.
    pub in_reverse: bool,
    /// Ms carried since the last frame change.
    pub accumulator: f32,
    /// Accumulator threshold of the next frame change.
    pub next_tick: f32,
    pub delay_counter: f32,
    /// Repeats left, `None` repeats forever.
    pub repeat_counter: Option<u32>,
    pub pending_repeat: bool,
    pub is_playing: bool,
    pub has_started: bool,
    paused: bool,
    was_playing: bool,
    pub(crate) pending_stop: PendingStop,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            anims: None,
            current_anim: None,
            current_frame: None,
            next_anim: None,
            next_anims_queue: SmallVec::new(),
            time_scale: 1.0,
            frame_rate: 0.0,
            duration: 0.0,
            ms_per_frame: 0.0,
            skip_missed_frames: true,
            delay: 0.0,
            repeat: 0,
            repeat_delay: 0.0,
            yoyo: false,
            show_before_delay: false,
            show_on_start: false,
            hide_on_complete: false,
            forward: true,
            in_reverse: false,
            accumulator: 0.0,
            next_tick: 0.0,
            delay_counter: 0.0,
            repeat_counter: Some(0),
            pending_repeat: false,
            is_playing: false,
            has_started: false,
            paused: false,
            was_playing: false,
            pending_stop: PendingStop::NoStop,
        }
    }
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Whether `anim` is the animation this playhead is attached to.
    pub fn is_showing(&self, anim: &Animation) -> bool {
        self.current_anim
            .as_ref()
            .is_some_and(|current| std::ptr::eq(Arc::as_ptr(current), anim))
    }

    pub fn current_animation_frame(&self) -> Option<&AnimationFrame> {
        let anim = self.current_anim.as_ref()?;
        anim.frames.get(self.current_frame?)
    }

    pub fn pending_stop(&self) -> PendingStop {
        self.pending_stop
    }

    pub(crate) fn has_repeats_left(&self) -> bool {
        self.repeat_counter != Some(0)
    }

    pub(crate) fn consume_repeat(&mut self) {
        if let Some(left) = self.repeat_counter.as_mut() {
            *left = left.saturating_sub(1);
        }
    }

    /// Queue animations to play, in order, when the current one stops or completes.
    pub fn chain<I, T>(&mut self, targets: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<PlayTarget>,
    {
        for target in targets {
            let target = target.into();
            if self.next_anim.is_none() {
                self.next_anim = Some(target);
            } else {
                self.next_anims_queue.push(target);
            }
        }
        self
    }

    pub fn clear_chain(&mut self) -> &mut Self {
        self.next_anim = None;
        self.next_anims_queue.clear();
        self
    }

    /// Key of the current animation, empty when nothing is loaded.
    pub fn get_name(&self) -> &str {
        self.current_anim.as_ref().map_or("", |anim| anim.key.as_str())
    }

    pub fn get_frame_name(&self) -> Option<&FrameKey> {
        self.current_animation_frame().map(|frame| &frame.texture_frame)
    }

    pub fn get_total_frames(&self) -> usize {
        self.current_anim.as_ref().map_or(0, |anim| anim.total_frames())
    }

    /// Resolve `target` and attach it, applying per-play overrides.
    ///
    /// Stops the current animation first. Returns false, with a warning,
    /// when the key is unknown or the animation has no frames.
    pub fn load(&mut self, ctx: &mut PlaybackContext<'_>, target: PlayTarget) -> bool {
        if self.is_playing {
            self.stop(ctx);
        }

        let key = target.key().to_string();
        let anim = match &target {
            PlayTarget::Instance(anim) => Some(Arc::clone(anim)),
            _ => self.get(&key).or_else(|| ctx.manager.get(&key)).cloned(),
        };
        let Some(anim) = anim else {
            warn!("Missing animation: {}", key);
            return false;
        };
        if anim.frames.is_empty() {
            warn!("Animation '{}' has no frames", key);
            return false;
        }

        let config = target.config();
        let random_frame = config.and_then(|c| c.random_frame).unwrap_or(anim.random_frame);
        let start_frame = if random_frame {
            fastrand::usize(..anim.total_frames())
        } else {
            config.and_then(|c| c.start_frame).unwrap_or(0)
        };

        anim.load(self, start_frame);

        let (frame_rate, duration) = (
            config.and_then(|c| c.frame_rate),
            config.and_then(|c| c.duration),
        );
        if frame_rate.is_some() || duration.is_some() {
            let timing = calculate_duration(anim.total_frames(), duration, frame_rate);
            self.frame_rate = timing.frame_rate;
            self.duration = timing.duration;
            self.ms_per_frame = timing.ms_per_frame;
        } else {
            self.frame_rate = anim.frame_rate;
            self.duration = anim.duration;
            self.ms_per_frame = anim.ms_per_frame;
        }
        self.delay = config.and_then(|c| c.delay).unwrap_or(anim.delay);
        self.repeat = config.and_then(|c| c.repeat).unwrap_or(anim.repeat);
        self.repeat_delay = config.and_then(|c| c.repeat_delay).unwrap_or(anim.repeat_delay);
        self.yoyo = config.and_then(|c| c.yoyo).unwrap_or(anim.yoyo);
        self.show_before_delay = config
            .and_then(|c| c.show_before_delay)
            .unwrap_or(anim.show_before_delay);
        self.show_on_start = config.and_then(|c| c.show_on_start).unwrap_or(anim.show_on_start);
        self.hide_on_complete = config
            .and_then(|c| c.hide_on_complete)
            .unwrap_or(anim.hide_on_complete);
        self.skip_missed_frames = config
            .and_then(|c| c.skip_missed_frames)
            .unwrap_or(anim.skip_missed_frames);
        if let Some(time_scale) = config.and_then(|c| c.time_scale) {
            self.time_scale = time_scale;
        }
        true
    }

    /// Pause playback, optionally jumping to frame `at_frame`.
    pub fn pause(&mut self, ctx: &mut PlaybackContext<'_>, at_frame: Option<usize>) -> &mut Self {
        if !self.paused {
            self.paused = true;
            self.was_playing = self.is_playing;
            self.is_playing = false;
        }
        if let Some(index) = at_frame {
            self.set_current_frame(ctx, index);
        }
        self
    }

    /// Resume playback if it was playing when paused, optionally from frame `from_frame`.
    pub fn resume(&mut self, ctx: &mut PlaybackContext<'_>, from_frame: Option<usize>) -> &mut Self {
        if self.paused {
            self.paused = false;
            self.is_playing = self.was_playing;
        }
        if let Some(index) = from_frame {
            self.set_current_frame(ctx, index);
        }
        self
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Play `target` after `delay` ms. If something is playing, it is stopped
    /// after the delay and `target` follows it.
    pub fn play_after_delay(&mut self, ctx: &mut PlaybackContext<'_>, target: impl Into<PlayTarget>, delay: f32) -> &mut Self {
        let target = target.into();
        if self.is_playing {
            self.queue_in_front(target);
            self.pending_stop = PendingStop::AfterDelay(delay);
        } else {
            self.delay_counter = delay;
            self.play(ctx, target, true);
        }
        self
    }

    /// Play `target` once the current animation has repeated `repeat_count` more times.
    pub fn play_after_repeat(&mut self, ctx: &mut PlaybackContext<'_>, target: impl Into<PlayTarget>, repeat_count: u32) -> &mut Self {
        let target = target.into();
        if self.is_playing {
            self.queue_in_front(target);
            self.stop_after_repeat(repeat_count);
        } else {
            self.play(ctx, target, false);
        }
        self
    }

    fn queue_in_front(&mut self, target: PlayTarget) {
        if let Some(previous) = self.next_anim.replace(target) {
            self.next_anims_queue.insert(0, previous);
        }
    }

    /// Play `target` forwards from its first frame (or configured start frame).
    pub fn play(&mut self, ctx: &mut PlaybackContext<'_>, target: impl Into<PlayTarget>, ignore_if_playing: bool) -> &mut Self {
        let target = target.into();
        if ignore_if_playing && self.is_playing && self.get_name() == target.key() {
            return self;
        }
        if self.mix_into(ctx, &target) {
            return self;
        }
        self.forward = true;
        self.in_reverse = false;
        self.paused = false;
        self.was_playing = true;
        self.start_animation(ctx, target)
    }

    /// Play `target` backwards, starting from its last frame.
    pub fn play_reverse(&mut self, ctx: &mut PlaybackContext<'_>, target: impl Into<PlayTarget>, ignore_if_playing: bool) -> &mut Self {
        let target = target.into();
        if ignore_if_playing && self.is_playing && self.get_name() == target.key() {
            return self;
        }
        if self.mix_into(ctx, &target) {
            return self;
        }
        self.forward = false;
        self.in_reverse = true;
        self.paused = false;
        self.was_playing = true;
        self.start_animation(ctx, target)
    }

    // Defer to play_after_delay when a mix is set between the current and target animation.
    fn mix_into(&mut self, ctx: &mut PlaybackContext<'_>, target: &PlayTarget) -> bool {
        if !self.is_playing {
            return false;
        }
        let mix = ctx.manager.get_mix(self.get_name(), target.key());
        if mix > 0.0 {
            self.play_after_delay(ctx, target.clone(), mix);
            return true;
        }
        false
    }

    /// Load `target` and start it, honouring its start delay.
    pub fn start_animation(&mut self, ctx: &mut PlaybackContext<'_>, target: impl Into<PlayTarget>) -> &mut Self {
        if !self.load(ctx, target.into()) {
            return self;
        }
        let Some(anim) = self.current_anim.clone() else {
            return self;
        };

        self.repeat_counter = repeat_counter_from(self.repeat);
        anim.get_first_tick(self, false);

        self.is_playing = true;
        self.pending_repeat = false;
        self.has_started = false;
        self.pending_stop = PendingStop::NoStop;
        self.paused = false;

        self.delay_counter += self.delay;

        if self.delay_counter <= 0.0 {
            self.handle_start(ctx);
        } else if self.show_before_delay {
            if let Some(index) = self.current_frame {
                self.set_current_frame(ctx, index);
            }
        }
        self
    }

    fn handle_start(&mut self, ctx: &mut PlaybackContext<'_>) {
        if self.show_on_start {
            ctx.target.set_visible(true);
        }
        if let Some(index) = self.current_frame {
            self.set_current_frame(ctx, index);
        }
        self.has_started = true;
        self.delay_counter = 0.0;
        self.emit_events(ctx, AnimationEventKind::Start);
    }

    pub(crate) fn handle_repeat(&mut self, ctx: &mut PlaybackContext<'_>) {
        self.pending_repeat = false;
        self.emit_events(ctx, AnimationEventKind::Repeat);
    }

    fn handle_stop(&mut self, ctx: &mut PlaybackContext<'_>) {
        self.pending_stop = PendingStop::NoStop;
        self.is_playing = false;
        self.emit_events(ctx, AnimationEventKind::Stop);
    }

    fn handle_complete(&mut self, ctx: &mut PlaybackContext<'_>) {
        self.pending_stop = PendingStop::NoStop;
        self.is_playing = false;
        if self.hide_on_complete {
            ctx.target.set_visible(false);
        }
        self.emit_events(ctx, AnimationEventKind::Complete);
    }

    fn emit_events(&self, ctx: &mut PlaybackContext<'_>, kind: AnimationEventKind) {
        let (Some(anim), Some(frame)) = (self.current_anim.as_ref(), self.current_animation_frame()) else {
            return;
        };
        ctx.target.emit(AnimationEvent {
            kind,
            animation_key: anim.key.clone(),
            frame_index: frame.index,
            texture_key: frame.texture_key.clone(),
            texture_frame: frame.texture_frame.clone(),
            repeat_counter: self.repeat_counter,
        });
    }

    /// Flip the playback direction of a running animation.
    pub fn reverse(&mut self) -> &mut Self {
        if self.is_playing {
            self.in_reverse = !self.in_reverse;
            self.forward = !self.forward;
        }
        self
    }

    /// Progress of the current frame, negative when playing in reverse.
    pub fn get_progress(&self) -> f32 {
        let Some(frame) = self.current_animation_frame() else {
            return 0.0;
        };
        if self.in_reverse {
            -frame.progress
        } else {
            frame.progress
        }
    }

    /// Jump to the frame closest to `value` in 0..=1.
    pub fn set_progress(&mut self, ctx: &mut PlaybackContext<'_>, value: f32) -> &mut Self {
        let value = if self.forward { value } else { 1.0 - value };
        if let Some(index) = self.current_anim.as_ref().and_then(|anim| anim.frame_by_progress(value)) {
            self.set_current_frame(ctx, index);
        }
        self
    }

    /// Set the repeats left for the current run, -1 repeating forever.
    pub fn set_repeat(&mut self, value: i32) -> &mut Self {
        self.repeat = value;
        self.repeat_counter = repeat_counter_from(value);
        self
    }

    /// React to `key` being removed from the global registry.
    pub fn global_remove(&mut self, ctx: &mut PlaybackContext<'_>, key: &str) {
        let Some(anim) = self.current_anim.clone() else {
            return;
        };
        if self.is_playing && anim.key == key {
            self.stop(ctx);
            if self.is_showing(&anim) {
                self.set_current_frame(ctx, 0);
            }
        }
    }

    /// Rewind to the first frame and play again.
    pub fn restart(&mut self, ctx: &mut PlaybackContext<'_>, include_delay: bool, reset_repeats: bool) -> &mut Self {
        let Some(anim) = self.current_anim.clone() else {
            return self;
        };
        if reset_repeats {
            self.repeat_counter = repeat_counter_from(self.repeat);
        }
        anim.get_first_tick(self, false);
        self.emit_events(ctx, AnimationEventKind::Restart);

        self.is_playing = true;
        self.pending_repeat = false;
        self.has_started = !include_delay;
        self.delay_counter = if include_delay { self.delay } else { 0.0 };
        self.pending_stop = PendingStop::NoStop;
        self.paused = false;

        self.set_current_frame(ctx, 0);
        self
    }

    /// Finish the current run as complete and start any chained animation.
    pub fn complete(&mut self, ctx: &mut PlaybackContext<'_>) -> &mut Self {
        self.pending_stop = PendingStop::NoStop;
        self.is_playing = false;
        self.delay_counter = 0.0;
        if self.current_anim.is_some() {
            self.handle_complete(ctx);
        }
        self.play_next(ctx);
        self
    }

    /// Stop immediately and start any chained animation.
    pub fn stop(&mut self, ctx: &mut PlaybackContext<'_>) -> &mut Self {
        self.pending_stop = PendingStop::NoStop;
        self.is_playing = false;
        self.delay_counter = 0.0;
        if self.current_anim.is_some() {
            self.handle_stop(ctx);
        }
        self.play_next(ctx);
        self
    }

    fn play_next(&mut self, ctx: &mut PlaybackContext<'_>) {
        if let Some(next) = self.next_anim.take() {
            if !self.next_anims_queue.is_empty() {
                self.next_anim = Some(self.next_anims_queue.remove(0));
            }
            self.play(ctx, next, false);
        }
    }

    pub fn stop_after_delay(&mut self, delay: f32) -> &mut Self {
        self.pending_stop = PendingStop::AfterDelay(delay);
        self
    }

    /// Stop once `repeat_count` more repeats have played, capped at the repeats left.
    pub fn stop_after_repeat(&mut self, repeat_count: u32) -> &mut Self {
        let count = match self.repeat_counter {
            Some(left) => repeat_count.min(left),
            None => repeat_count,
        };
        self.pending_stop = PendingStop::AfterRepeats(count);
        self
    }

    /// Stop when frame `index` (0-based) becomes current.
    pub fn stop_on_frame(&mut self, index: usize) -> &mut Self {
        self.pending_stop = PendingStop::OnFrame(index);
        self
    }

    /// Advance playback by `delta` ms.
    pub fn update(&mut self, ctx: &mut PlaybackContext<'_>, _time: f32, delta: f32) {
        let Some(anim) = self.current_anim.clone() else {
            return;
        };
        if !self.is_playing || anim.is_paused() {
            return;
        }

        self.accumulator += delta * self.time_scale * ctx.manager.global_time_scale;

        if let PendingStop::AfterDelay(remaining) = &mut self.pending_stop {
            *remaining -= delta;
            if *remaining <= 0.0 {
                self.stop(ctx);
                return;
            }
        }

        if !self.has_started {
            if self.accumulator >= self.delay_counter {
                self.accumulator -= self.delay_counter;
                self.handle_start(ctx);
            }
        } else if self.accumulator >= self.next_tick {
            self.advance(ctx);

            if self.is_playing
                && self.pending_stop == PendingStop::NoStop
                && self.skip_missed_frames
                && self.accumulator > self.next_tick
            {
                let mut safety_net = 0;
                loop {
                    self.advance(ctx);
                    safety_net += 1;
                    if !(self.is_playing && self.accumulator > self.next_tick && safety_net < MAX_CATCH_UP_STEPS) {
                        break;
                    }
                }
            }
        }
    }

    fn advance(&mut self, ctx: &mut PlaybackContext<'_>) {
        if self.forward {
            self.next_frame(ctx);
        } else {
            self.previous_frame(ctx);
        }
    }

    /// Make frame `index` current and show it on the owner.
    pub fn set_current_frame(&mut self, ctx: &mut PlaybackContext<'_>, index: usize) -> &mut Self {
        let Some(anim) = self.current_anim.clone() else {
            return self;
        };
        let Some(frame) = anim.frames.get(index) else {
            return self;
        };
        self.current_frame = Some(index);
        ctx.target.apply_frame(frame);

        if self.is_playing && self.has_started {
            if let Some(on_update) = &frame.on_update {
                on_update(frame);
            }
            self.emit_events(ctx, AnimationEventKind::Update);
            if self.pending_stop == PendingStop::OnFrame(index) {
                self.stop(ctx);
            }
        }
        self
    }

    /// Step forward one frame using the current animation's rules.
    pub fn next_frame(&mut self, ctx: &mut PlaybackContext<'_>) -> &mut Self {
        if let Some(anim) = self.current_anim.clone() {
            anim.next_frame(self, ctx);
        }
        self
    }

    /// Step backward one frame using the current animation's rules.
    pub fn previous_frame(&mut self, ctx: &mut PlaybackContext<'_>) -> &mut Self {
        if let Some(anim) = self.current_anim.clone() {
            anim.previous_frame(self, ctx);
        }
        self
    }

    /// Local animation `key`, if this playhead defines one.
    pub fn get(&self, key: &str) -> Option<&Arc<Animation>> {
        self.anims.as_ref()?.get(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.anims.as_ref().is_some_and(|anims| anims.contains_key(key))
    }

    /// Create a local animation. Returns the existing one if `key` is taken.
    pub fn create(&mut self, config: &AnimationConfig, textures: &dyn FrameSource) -> Option<Arc<Animation>> {
        if config.key.is_empty() {
            return None;
        }
        let anims = self.anims.get_or_insert_with(FxHashMap::default);
        let anim = anims
            .entry(config.key.clone())
            .or_insert_with(|| Arc::new(Animation::new(config, textures)));
        Some(Arc::clone(anim))
    }

    /// Remove local animation `key`, stopping it if it is current.
    pub fn remove(&mut self, ctx: &mut PlaybackContext<'_>, key: &str) -> Option<Arc<Animation>> {
        let anim = self.anims.as_mut()?.remove(key)?;
        if self.is_playing && self.is_showing(&anim) {
            self.stop(ctx);
        }
        Some(anim)
    }

    pub fn generate_frame_names(
        &self,
        manager: &AnimationManager,
        textures: &dyn FrameSource,
        key: &str,
        config: Option<&FrameNamesConfig>,
    ) -> Vec<FrameConfig> {
        manager.generate_frame_names(textures, key, config)
    }

    pub fn generate_frame_numbers(
        &self,
        manager: &AnimationManager,
        textures: &dyn FrameSource,
        key: &str,
        config: &FrameNumbersConfig,
    ) -> Vec<FrameConfig> {
        manager.generate_frame_numbers(textures, key, config)
    }

    /// Drop local animations, the chain and the current animation.
    pub fn destroy(&mut self) {
        self.anims = None;
        self.clear_chain();
        self.current_anim = None;
        self.current_frame = None;
        self.is_playing = false;
        self.has_started = false;
        self.pending_stop = PendingStop::NoStop;
    }
}
