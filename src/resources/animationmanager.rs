//! Global animation registry.
//!
//! [`AnimationManager`] owns every shared [`Animation`] definition by key,
//! in registration order. Playheads look animations up here when they have
//! no local animation of the same key, and ask it for mix delays when
//! switching between two animations.
//!
//! Registry changes are queued as [`AnimationNotice`]s. In the world, the
//! [`dispatch_animation_notices`](crate::systems::animation::dispatch_animation_notices)
//! system drains them every frame and triggers the matching observer
//! events, which is how a removal reaches the playheads still showing the
//! removed animation.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::events::animation::AnimationNotice;
use crate::resources::animation::{Animation, AnimationConfig};
use crate::resources::animationframe::{FrameConfig, FrameKey};
use crate::resources::texturestore::FrameSource;

/// Options of [`AnimationManager::generate_frame_names`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameNamesConfig {
    pub prefix: String,
    pub start: u32,
    pub end: u32,
    pub suffix: String,
    /// Minimum number of digits, left padded with zeros.
    pub zero_pad: usize,
    /// Explicit numbers to use instead of `start..=end`.
    pub frames: Option<Vec<u32>>,
}

/// Options of [`AnimationManager::generate_frame_numbers`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameNumbersConfig {
    pub start: u32,
    /// Last frame, -1 meaning the texture's last frame.
    pub end: i64,
    /// Frame placed before the generated range.
    pub first: Option<FrameKey>,
    /// Explicit frame numbers to use instead of `start..=end`.
    pub frames: Option<Vec<u32>>,
}

impl Default for FrameNumbersConfig {
    fn default() -> Self {
        Self {
            start: 0,
            end: -1,
            first: None,
            frames: None,
        }
    }
}

/// Inclusive run of numbers from `start` to `end`, descending if `end < start`.
fn number_array(start: u32, end: u32) -> Vec<u32> {
    if start <= end {
        (start..=end).collect()
    } else {
        (end..=start).rev().collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnimationsJson {
    anims: Vec<AnimationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    global_time_scale: Option<f32>,
}

/// Registry of shared animations keyed by string IDs.
#[derive(Resource, Debug)]
pub struct AnimationManager {
    anims: FxHashMap<String, Arc<Animation>>,
    order: Vec<String>,
    mixes: FxHashMap<String, FxHashMap<String, f32>>,
    /// Multiplier applied to the delta of every playhead.
    pub global_time_scale: f32,
    paused: bool,
    notices: Vec<AnimationNotice>,
}

impl Default for AnimationManager {
    fn default() -> Self {
        Self {
            anims: FxHashMap::default(),
            order: Vec::new(),
            mixes: FxHashMap::default(),
            global_time_scale: 1.0,
            paused: false,
            notices: Vec::new(),
        }
    }
}

impl AnimationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a mix delay (ms) used when a playhead switches from `anim_a` to `anim_b`.
    ///
    /// Both keys must be registered.
    pub fn add_mix(&mut self, anim_a: &str, anim_b: &str, delay: f32) -> bool {
        if !(self.exists(anim_a) && self.exists(anim_b)) {
            return false;
        }
        self.mixes
            .entry(anim_a.to_string())
            .or_default()
            .insert(anim_b.to_string(), delay);
        true
    }

    /// Remove the `anim_a` to `anim_b` mix, or every mix from `anim_a` when `anim_b` is `None`.
    pub fn remove_mix(&mut self, anim_a: &str, anim_b: Option<&str>) {
        match anim_b {
            Some(anim_b) => {
                if let Some(mix) = self.mixes.get_mut(anim_a) {
                    mix.remove(anim_b);
                }
            }
            None => {
                self.mixes.remove(anim_a);
            }
        }
    }

    /// Mix delay from `anim_a` to `anim_b`, 0 if none is set.
    pub fn get_mix(&self, anim_a: &str, anim_b: &str) -> f32 {
        self.mixes
            .get(anim_a)
            .and_then(|mix| mix.get(anim_b))
            .copied()
            .unwrap_or(0.0)
    }

    /// Register `animation` under `key`. Duplicate keys are rejected.
    pub fn add(&mut self, key: &str, mut animation: Animation) -> bool {
        if self.exists(key) {
            warn!("Animation key exists: {}", key);
            return false;
        }
        animation.key = key.to_string();
        self.insert(Arc::new(animation));
        true
    }

    fn insert(&mut self, anim: Arc<Animation>) {
        let key = anim.key.clone();
        self.anims.insert(key.clone(), anim);
        self.order.push(key.clone());
        self.notices.push(AnimationNotice::Added(key));
    }

    /// Build and register an animation from `config`.
    ///
    /// Returns `None` for an empty key, or with a warning when the key is
    /// already registered.
    pub fn create(&mut self, textures: &dyn FrameSource, config: &AnimationConfig) -> Option<Arc<Animation>> {
        if config.key.is_empty() {
            return None;
        }
        if self.exists(&config.key) {
            warn!("AnimationManager key already exists: {}", config.key);
            return None;
        }
        let anim = Arc::new(Animation::new(config, textures));
        self.insert(Arc::clone(&anim));
        Some(anim)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.anims.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Arc<Animation>> {
        self.anims.get(key)
    }

    /// Edit a registered animation.
    ///
    /// Playheads already attached keep the definition they loaded; the edit
    /// is picked up the next time they load `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Animation> {
        self.anims.get_mut(key).map(Arc::make_mut)
    }

    /// Unregister `key`, returning its animation.
    pub fn remove(&mut self, key: &str) -> Option<Arc<Animation>> {
        let anim = self.anims.remove(key)?;
        self.notices.push(AnimationNotice::Removed(key.to_string()));
        self.order.retain(|k| k != key);
        self.remove_mix(key, None);
        Some(anim)
    }

    /// Unregister `key` and sever its frames once no playhead holds it.
    pub fn destroy(&mut self, key: &str) -> bool {
        let Some(mut anim) = self.remove(key) else {
            return false;
        };
        if let Some(anim) = Arc::get_mut(&mut anim) {
            anim.destroy();
        }
        true
    }

    /// Registered keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.anims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anims.is_empty()
    }

    /// Pause every registered animation.
    pub fn pause_all(&mut self) {
        if !self.paused {
            self.paused = true;
            for anim in self.anims.values() {
                anim.pause();
            }
            self.notices.push(AnimationNotice::PausedAll);
        }
    }

    pub fn resume_all(&mut self) {
        if self.paused {
            self.paused = false;
            for anim in self.anims.values() {
                anim.resume();
            }
            self.notices.push(AnimationNotice::ResumedAll);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Take the queued registry notices.
    pub fn drain_notices(&mut self) -> Vec<AnimationNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Keys of the animations showing at least one frame of `texture_key`.
    pub fn get_anims_from_texture(&self, texture_key: &str) -> Vec<String> {
        self.order
            .iter()
            .filter(|key| {
                self.anims
                    .get(key.as_str())
                    .is_some_and(|anim| anim.frames.iter().any(|f| f.texture_key == texture_key))
            })
            .cloned()
            .collect()
    }

    /// Frame list for named atlas frames such as `ruby_0001`..`ruby_0006`.
    ///
    /// Without a config every frame of the texture is used. Generated names
    /// the texture lacks are skipped with a warning.
    pub fn generate_frame_names(
        &self,
        textures: &dyn FrameSource,
        key: &str,
        config: Option<&FrameNamesConfig>,
    ) -> Vec<FrameConfig> {
        if !textures.has_texture(key) {
            warn!("Texture '{}' not found", key);
            return Vec::new();
        }

        let Some(config) = config else {
            return textures
                .frame_names(key)
                .unwrap_or_default()
                .into_iter()
                .map(|name| FrameConfig::new(key, name))
                .collect();
        };

        let numbers = config
            .frames
            .clone()
            .unwrap_or_else(|| number_array(config.start, config.end));

        let mut out = Vec::with_capacity(numbers.len());
        for number in numbers {
            let name = FrameKey::Name(format!(
                "{}{:0width$}{}",
                config.prefix,
                number,
                config.suffix,
                width = config.zero_pad
            ));
            if textures.has_frame(key, &name) {
                out.push(FrameConfig::new(key, name));
            } else {
                warn!("Frame '{}' not found in texture '{}'", name, key);
            }
        }
        out
    }

    /// Frame list for numbered spritesheet frames.
    pub fn generate_frame_numbers(
        &self,
        textures: &dyn FrameSource,
        key: &str,
        config: &FrameNumbersConfig,
    ) -> Vec<FrameConfig> {
        if !textures.has_texture(key) {
            warn!("Texture '{}' not found", key);
            return Vec::new();
        }

        let mut out = Vec::new();
        if let Some(first) = &config.first {
            if textures.has_frame(key, first) {
                out.push(FrameConfig::new(key, first.clone()));
            }
        }

        let numbers = match &config.frames {
            Some(frames) => frames.clone(),
            None => {
                let end = if config.end < 0 {
                    let total = textures.frame_total(key);
                    if total == 0 {
                        return out;
                    }
                    (total - 1) as u32
                } else {
                    config.end as u32
                };
                number_array(config.start, end)
            }
        };

        for number in numbers {
            let frame = FrameKey::Index(number);
            if textures.has_frame(key, &frame) {
                out.push(FrameConfig::new(key, frame));
            } else {
                warn!("Frame '{}' not found in texture '{}'", frame, key);
            }
        }
        out
    }

    /// Create animations from JSON.
    ///
    /// Accepts `{ "anims": [...], "globalTimeScale": 1 }` as written by
    /// [`to_json`](Self::to_json), or a single animation object with
    /// `"type": "frame"`. With `clear`, registered animations are dropped
    /// first. Returns the animations created.
    pub fn from_json(
        &mut self,
        textures: &dyn FrameSource,
        data: &str,
        clear: bool,
    ) -> Result<Vec<Arc<Animation>>, Box<dyn std::error::Error>> {
        let value: serde_json::Value = serde_json::from_str(data)?;

        if clear {
            self.anims.clear();
            self.order.clear();
            self.mixes.clear();
        }

        let mut created = Vec::new();
        if value.get("anims").is_some() {
            let parsed: AnimationsJson = serde_json::from_value(value)?;
            for config in &parsed.anims {
                created.extend(self.create(textures, config));
            }
            if let Some(scale) = parsed.global_time_scale {
                self.global_time_scale = scale;
            }
        } else if value.get("type").and_then(serde_json::Value::as_str) == Some("frame")
            && value.get("key").is_some()
        {
            let config: AnimationConfig = serde_json::from_value(value)?;
            created.extend(self.create(textures, &config));
        }
        Ok(created)
    }

    /// Load animations from a JSON file. See [`from_json`](Self::from_json).
    pub fn load_from_file(
        &mut self,
        textures: &dyn FrameSource,
        path: &str,
        clear: bool,
    ) -> Result<Vec<Arc<Animation>>, Box<dyn std::error::Error>> {
        let file_content = std::fs::read_to_string(path)?;
        self.from_json(textures, &file_content, clear)
    }

    /// JSON description of one animation, or of the whole registry.
    pub fn to_json(&self, key: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
        let anims = match key {
            Some(key) => self.get(key).map(|anim| vec![anim.to_config()]).unwrap_or_default(),
            None => self
                .order
                .iter()
                .filter_map(|key| self.anims.get(key.as_str()))
                .map(|anim| anim.to_config())
                .collect(),
        };
        let json = AnimationsJson {
            anims,
            global_time_scale: Some(self.global_time_scale),
        };
        Ok(serde_json::to_string_pretty(&json)?)
    }
}
