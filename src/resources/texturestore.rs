//! Texture frame registry.
//!
//! The animation core never touches pixels; it only needs to know which
//! frames a texture has, in what order, and how big they are. The
//! [`FrameSource`] trait captures that contract and [`TextureStore`] is the
//! in-memory implementation inserted into the world as a resource.
//!
//! # Manifest format
//!
//! ```json
//! {
//!   "hero": {
//!     "frames": [
//!       { "name": "walk1", "width": 32, "height": 48, "pivot": [0.5, 1.0] },
//!       { "name": "walk2", "width": 32, "height": 48 }
//!     ]
//!   },
//!   "coin": { "sheet": { "frameWidth": 16, "frameHeight": 16, "count": 8 } }
//! }
//! ```
//!
//! Sheet textures expose integer frames `0..count`.

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::resources::animationframe::FrameKey;

/// Size and pivot of a single texture frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextureFrame {
    pub width: f32,
    pub height: f32,
    /// Custom normalized origin, when the frame defines one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<(f32, f32)>,
}

impl TextureFrame {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pivot: None,
        }
    }

    pub fn with_pivot(mut self, x: f32, y: f32) -> Self {
        self.pivot = Some((x, y));
        self
    }
}

/// Provider of texture frames for animation building.
pub trait FrameSource {
    fn has_texture(&self, key: &str) -> bool;
    fn frame(&self, key: &str, frame: &FrameKey) -> Option<TextureFrame>;
    /// Every frame of the texture, in the order the texture reports them.
    fn frame_names(&self, key: &str) -> Option<Vec<FrameKey>>;

    fn has_frame(&self, key: &str, frame: &FrameKey) -> bool {
        self.frame(key, frame).is_some()
    }

    fn frame_total(&self, key: &str) -> usize {
        self.frame_names(key).map_or(0, |names| names.len())
    }
}

#[derive(Debug, Clone, Default)]
struct Texture {
    frames: Vec<(FrameKey, TextureFrame)>,
    lookup: FxHashMap<FrameKey, usize>,
}

impl Texture {
    fn push(&mut self, key: FrameKey, frame: TextureFrame) {
        if let Some(&slot) = self.lookup.get(&key) {
            self.frames[slot].1 = frame;
        } else {
            self.lookup.insert(key.clone(), self.frames.len());
            self.frames.push((key, frame));
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ManifestFrame {
    name: FrameKey,
    width: f32,
    height: f32,
    #[serde(default)]
    pivot: Option<(f32, f32)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestSheet {
    frame_width: f32,
    frame_height: f32,
    count: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ManifestTexture {
    #[serde(default)]
    frames: Vec<ManifestFrame>,
    #[serde(default)]
    sheet: Option<ManifestSheet>,
}

/// Loaded textures keyed by string IDs.
#[derive(Resource, Debug, Clone, Default)]
pub struct TextureStore {
    textures: FxHashMap<String, Texture>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or extend) a texture with named or numbered frames.
    pub fn add_frames(
        &mut self,
        key: impl Into<String>,
        frames: impl IntoIterator<Item = (FrameKey, TextureFrame)>,
    ) {
        let texture = self.textures.entry(key.into()).or_default();
        for (name, frame) in frames {
            texture.push(name, frame);
        }
    }

    /// Register a uniform spritesheet exposing frames `0..count`.
    pub fn add_spritesheet(&mut self, key: impl Into<String>, width: f32, height: f32, count: u32) {
        let frame = TextureFrame::new(width, height);
        self.add_frames(key, (0..count).map(|i| (FrameKey::Index(i), frame)));
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.textures.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Parse a texture manifest (see the module docs) into a new store.
    pub fn from_json_str(data: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let manifest: FxHashMap<String, ManifestTexture> = serde_json::from_str(data)?;
        let mut store = TextureStore::new();
        // Stable registration order keeps log output deterministic.
        let mut keys: Vec<&String> = manifest.keys().collect();
        keys.sort();
        for key in keys {
            let texture = &manifest[key];
            if let Some(sheet) = &texture.sheet {
                store.add_spritesheet(key.clone(), sheet.frame_width, sheet.frame_height, sheet.count);
            }
            store.add_frames(
                key.clone(),
                texture.frames.iter().map(|f| {
                    (
                        f.name.clone(),
                        TextureFrame {
                            width: f.width,
                            height: f.height,
                            pivot: f.pivot,
                        },
                    )
                }),
            );
        }
        Ok(store)
    }

    /// Load a texture manifest from a JSON file.
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let file_content = std::fs::read_to_string(path)?;
        Self::from_json_str(&file_content)
    }
}

impl FrameSource for TextureStore {
    fn has_texture(&self, key: &str) -> bool {
        self.textures.contains_key(key)
    }

    fn frame(&self, key: &str, frame: &FrameKey) -> Option<TextureFrame> {
        let texture = self.textures.get(key)?;
        texture.lookup.get(frame).map(|&slot| texture.frames[slot].1)
    }

    fn frame_names(&self, key: &str) -> Option<Vec<FrameKey>> {
        self.textures
            .get(key)
            .map(|t| t.frames.iter().map(|(name, _)| name.clone()).collect())
    }

    fn frame_total(&self, key: &str) -> usize {
        self.textures.get(key).map_or(0, |t| t.frames.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spritesheet_exposes_numbered_frames_in_order() {
        let mut store = TextureStore::new();
        store.add_spritesheet("coin", 16.0, 16.0, 4);
        assert_eq!(store.frame_total("coin"), 4);
        assert_eq!(
            store.frame_names("coin").unwrap(),
            vec![
                FrameKey::Index(0),
                FrameKey::Index(1),
                FrameKey::Index(2),
                FrameKey::Index(3)
            ]
        );
        assert_eq!(store.frame("coin", &FrameKey::Index(2)), Some(TextureFrame::new(16.0, 16.0)));
        assert!(store.frame("coin", &FrameKey::Index(4)).is_none());
    }

    #[test]
    fn named_frames_keep_insertion_order() {
        let mut store = TextureStore::new();
        store.add_frames(
            "hero",
            ["walk10", "walk2", "walk1"]
                .into_iter()
                .map(|n| (FrameKey::from(n), TextureFrame::new(8.0, 8.0))),
        );
        let names = store.frame_names("hero").unwrap();
        assert_eq!(names[0], FrameKey::from("walk10"));
        assert_eq!(names[2], FrameKey::from("walk1"));
    }

    #[test]
    fn re_adding_a_frame_replaces_its_data() {
        let mut store = TextureStore::new();
        store.add_frames("hero", [(FrameKey::from("a"), TextureFrame::new(8.0, 8.0))]);
        store.add_frames("hero", [(FrameKey::from("a"), TextureFrame::new(4.0, 4.0))]);
        assert_eq!(store.frame_total("hero"), 1);
        assert_eq!(store.frame("hero", &FrameKey::from("a")).unwrap().width, 4.0);
    }

    #[test]
    fn manifest_parses_frames_and_sheets() {
        let json = r#"{
            "hero": { "frames": [
                { "name": "idle", "width": 32, "height": 48, "pivot": [0.5, 1.0] },
                { "name": "jump", "width": 32, "height": 48 }
            ] },
            "coin": { "sheet": { "frameWidth": 16, "frameHeight": 16, "count": 8 } }
        }"#;
        let store = TextureStore::from_json_str(json).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.frame_total("coin"), 8);
        let idle = store.frame("hero", &FrameKey::from("idle")).unwrap();
        assert_eq!(idle.pivot, Some((0.5, 1.0)));
        assert!(store.frame("hero", &FrameKey::from("jump")).unwrap().pivot.is_none());
    }

    #[test]
    fn manifest_rejects_malformed_json() {
        assert!(TextureStore::from_json_str("{ not json").is_err());
    }

    #[test]
    fn unknown_texture_has_no_frames() {
        let store = TextureStore::new();
        assert!(!store.has_texture("ghost"));
        assert!(store.frame_names("ghost").is_none());
        assert_eq!(store.frame_total("ghost"), 0);
    }
}
