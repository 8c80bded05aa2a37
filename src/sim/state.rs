//! Data model shared by the controllers
//!
//! Each struct is owned by exactly one controller; others only learn about it
//! through events.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Progress of the current play-through (owned by the session controller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Current level (starts at 1)
    pub level: u32,
    /// Correct drops since the last level-up
    pub matched_count: u32,
    /// False only while the session is over
    pub active: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            level: 1,
            matched_count: 0,
            active: true,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches needed to leave the current level
    pub fn level_up_threshold(&self, matches_per_level: u32) -> u32 {
        self.level * matches_per_level
    }
}

/// Sleigh state (owned by the character controller)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    pub level: u32,
    pub height: f32,
    /// 0 while floating idle, the configured active value while playing
    pub gravity_factor: f32,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            level: 1,
            height: 0.0,
            gravity_factor: 0.0,
        }
    }
}

/// Sleigh height for a level: a non-decreasing step function of the level
pub fn height_for_level(level: u32, base_height: f32, rise_rate: f32) -> f32 {
    base_height + level as f32 * rise_rate.max(0.0)
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ self.stream.rotate_left(32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::Rng;

    #[test]
    fn test_session_defaults() {
        let session = SessionState::new();
        assert_eq!((session.level, session.matched_count, session.active), (1, 0, true));
        assert_eq!(session.level_up_threshold(3), 3);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = RngState::new(42).to_rng();
        let mut b = RngState::new(42).to_rng();
        for _ in 0..16 {
            assert_eq!(a.random::<u32>(), b.random::<u32>());
        }
    }

    proptest! {
        #[test]
        fn height_is_monotonic_and_idempotent(
            level in 1u32..500,
            base in -50.0f32..50.0,
            rise in -5.0f32..20.0,
        ) {
            let here = height_for_level(level, base, rise);
            prop_assert_eq!(here, height_for_level(level, base, rise));
            prop_assert!(height_for_level(level + 1, base, rise) >= here);
        }
    }
}
