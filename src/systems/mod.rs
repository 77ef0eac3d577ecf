//! Engine systems.
//!
//! Submodules overview
//! - [`animation`] – advance playheads, forward playback messages and registry events
//! - [`time`] – update simulation time and delta
pub mod animation;
pub mod time;
