//! Playback configuration resource.
//!
//! Settings for the headless animation runner, loaded from an INI file.
//! Every value has a default so a missing or partial file still yields a
//! usable configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! fps = 60
//! frames = 240
//! time_scale = 1.0
//!
//! [animation]
//! global_time_scale = 1.0
//! animations = ./assets/animations.json
//! textures = ./assets/textures.json
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

const DEFAULT_FPS: u32 = 60;
const DEFAULT_FRAMES: u32 = 240;
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_GLOBAL_TIME_SCALE: f32 = 1.0;
const DEFAULT_ANIMATIONS_PATH: &str = "./assets/animations.json";
const DEFAULT_TEXTURES_PATH: &str = "./assets/textures.json";
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Runner configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Simulated frames per second.
    pub fps: u32,
    /// Number of frames to simulate.
    pub frames: u32,
    /// Scale applied to the world clock.
    pub time_scale: f32,
    /// Scale applied by the animation manager to every playhead.
    pub global_time_scale: f32,
    /// Animation definitions JSON.
    pub animations_path: String,
    /// Texture manifest JSON.
    pub textures_path: String,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            fps: DEFAULT_FPS,
            frames: DEFAULT_FRAMES,
            time_scale: DEFAULT_TIME_SCALE,
            global_time_scale: DEFAULT_GLOBAL_TIME_SCALE,
            animations_path: DEFAULT_ANIMATIONS_PATH.to_string(),
            textures_path: DEFAULT_TEXTURES_PATH.to_string(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Seconds per simulated frame.
    pub fn frame_delta(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);

        info!(
            "Loaded config: fps={}, frames={}, time_scale={}, global_time_scale={}, animations={}, textures={}",
            self.fps,
            self.frames,
            self.time_scale,
            self.global_time_scale,
            self.animations_path,
            self.textures_path
        );

        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [simulation] section
        if let Some(fps) = config.getuint("simulation", "fps").ok().flatten() {
            self.fps = fps as u32;
        }
        if let Some(frames) = config.getuint("simulation", "frames").ok().flatten() {
            self.frames = frames as u32;
        }
        if let Some(scale) = config.getfloat("simulation", "time_scale").ok().flatten() {
            self.time_scale = scale as f32;
        }

        // [animation] section
        if let Some(scale) = config.getfloat("animation", "global_time_scale").ok().flatten() {
            self.global_time_scale = scale as f32;
        }
        if let Some(path) = config.get("animation", "animations") {
            self.animations_path = path;
        }
        if let Some(path) = config.get("animation", "textures") {
            self.textures_path = path;
        }
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [simulation] section
        config.set("simulation", "fps", Some(self.fps.to_string()));
        config.set("simulation", "frames", Some(self.frames.to_string()));
        config.set("simulation", "time_scale", Some(self.time_scale.to_string()));

        // [animation] section
        config.set(
            "animation",
            "global_time_scale",
            Some(self.global_time_scale.to_string()),
        );
        config.set("animation", "animations", Some(self.animations_path.clone()));
        config.set("animation", "textures", Some(self.textures_path.clone()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ini_keeps_defaults() {
        let mut config = GameConfig::new();
        config
            .load_from_str("[simulation]\nfps = 30\n\n[animation]\nglobal_time_scale = 0.5\n")
            .unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.frames, DEFAULT_FRAMES);
        assert_eq!(config.global_time_scale, 0.5);
        assert_eq!(config.animations_path, DEFAULT_ANIMATIONS_PATH);
        assert!((config.frame_delta() - 1.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut config = GameConfig::with_path("./definitely/not/here.ini");
        assert!(config.load_from_file().is_err());
        assert_eq!(config.fps, DEFAULT_FPS);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let path = std::env::temp_dir().join(format!("flipbook_config_{}.ini", std::process::id()));
        let mut saved = GameConfig::with_path(&path);
        saved.fps = 24;
        saved.frames = 10;
        saved.textures_path = "tex.json".to_string();
        saved.save_to_file().unwrap();

        let mut loaded = GameConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, saved);
    }
}
