//! ECS components for animated entities.
//!
//! Submodules overview:
//! - [`animationstate`] – per-entity playhead over a shared animation
//! - [`sprite`] – texture frame an entity currently shows

pub mod animationstate;
pub mod sprite;
