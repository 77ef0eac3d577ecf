use bevy_ecs::prelude::Component;

use crate::resources::animationframe::{AnimationFrame, FrameKey};

/// Sprite is identified by a texture key and the frame of that texture it shows.
/// Width and height come from the current frame.
/// The origin is normalized (0..1) relative to the frame's top-left and is
/// replaced by the frame's pivot when the frame defines one.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Sprite {
    pub tex_key: String,
    pub frame: FrameKey,
    pub width: f32,
    pub height: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub flip_h: bool,
    pub flip_v: bool,
    pub visible: bool,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            tex_key: String::new(),
            frame: FrameKey::default(),
            width: 0.0,
            height: 0.0,
            origin_x: 0.5,
            origin_y: 0.5,
            flip_h: false,
            flip_v: false,
            visible: true,
        }
    }
}

impl Sprite {
    pub fn new(tex_key: impl Into<String>) -> Self {
        Self {
            tex_key: tex_key.into(),
            ..Self::default()
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Show `frame`: texture, size and pivot.
    pub fn apply_frame(&mut self, frame: &AnimationFrame) {
        self.tex_key.clone_from(&frame.texture_key);
        self.frame = frame.texture_frame.clone();
        self.width = frame.frame.width;
        self.height = frame.frame.height;
        if let Some((x, y)) = frame.frame.pivot {
            self.origin_x = x;
            self.origin_y = y;
        }
    }

    /// Origin in pixels from the frame's top-left.
    pub fn display_origin(&self) -> (f32, f32) {
        (self.origin_x * self.width, self.origin_y * self.height)
    }
}
