//! Flipbook library.
//!
//! Frame-by-frame sprite animation: shared animation definitions, a global
//! registry, per-entity playheads and the ECS systems that drive them.
//! Exposed as a library for the runner binary and integration tests.

pub mod components;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
