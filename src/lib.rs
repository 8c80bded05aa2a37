//! Sleigh Drop - gameplay logic for a single-screen delivery arcade game
//!
//! Core modules:
//! - `sim`: Behaviour layer (event bus, state machines, controllers)
//! - `audio`: Cue helpers on top of the host's audio sources
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod sim;
pub mod tuning;

pub use audio::Cue;
pub use tuning::{Difficulty, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the demo host (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Correct drops needed per level (level 2 needs 6, level 3 needs 9...)
    pub const MATCHES_PER_LEVEL: u32 = 3;

    /// Sleigh height at level 0
    pub const BASE_HEIGHT: f32 = 0.0;
    /// Height gained per level
    pub const RISE_RATE: f32 = 5.0;
    /// Distance below the sleigh where dropped items appear
    pub const DROP_OFFSET: f32 = 2.0;
    /// Sleigh stays afloat while playing
    pub const ACTIVE_GRAVITY_FACTOR: f32 = 0.0;

    /// Ground tiles
    pub const GROUND_SPEED: f32 = 10.0;
    pub const GROUND_LEFT_BOUND: f32 = -50.0;
    pub const GROUND_RESET_OFFSET: f32 = 100.0;
    pub const GROUND_CAPACITY: usize = 5;

    /// Obstacle field
    pub const OBSTACLE_SPEED: f32 = 9.0;
    pub const OBSTACLE_LEFT_BOUND: f32 = -32.0;
    /// Wrapping adds the field span, i.e. subtracts the (negative) left bound
    pub const OBSTACLE_RESET_OFFSET: f32 = 32.0;
    pub const OBSTACLE_MIN_HEIGHT: f32 = -6.0;
    pub const OBSTACLE_MAX_HEIGHT: f32 = 5.0;
    pub const OBSTACLE_BASE_COUNT: u32 = 8;
    pub const OBSTACLE_LEVEL_INCREASE_RATE: f32 = 0.10;
}
