//! Simulation clock.
//!
//! Times are in seconds. Animation playheads work in milliseconds, the
//! conversion happens in the [`animation`](crate::systems::animation::animation) system.
use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    /// Number of simulated frames so far.
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed * 1000.0
    }

    pub fn delta_ms(&self) -> f32 {
        self.delta * 1000.0
    }
}
