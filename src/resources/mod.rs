//! ECS resources made available to systems.
//!
//! Long-lived data injected into the world: animation definitions and their
//! registry, texture frame metadata, configuration and timing.
//!
//! Overview
//! - `animation` – shared frame sequence with timing and playback defaults
//! - `animationframe` – one frame of an animation and its links
//! - `animationmanager` – global registry of animations and mixes
//! - `gameconfig` – runner configuration loaded from INI
//! - `texturestore` – frame metadata keyed by texture
//! - `worldtime` – simulation time and delta
pub mod animation;
pub mod animationframe;
pub mod animationmanager;
pub mod gameconfig;
pub mod texturestore;
pub mod worldtime;
