//! Event types exchanged by the animation systems.
//!
//! Submodules:
//! - [`animation`] – playback messages and animation registry events
pub mod animation;
