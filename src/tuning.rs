//! Game balance
//!
//! Every controller reads its numbers from one section of [`Tuning`]. Tuning
//! is plain serde data so it can be shipped as JSON next to the game and
//! partially overridden (missing fields keep their defaults).

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Relaxed,
    #[default]
    Standard,
    Frantic,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Relaxed => "Relaxed",
            Difficulty::Standard => "Standard",
            Difficulty::Frantic => "Frantic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Some(Difficulty::Relaxed),
            "standard" | "normal" => Some(Difficulty::Standard),
            "frantic" | "hard" => Some(Difficulty::Frantic),
            _ => None,
        }
    }

    /// Multiplier applied to field scroll speeds
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Difficulty::Relaxed => 0.75,
            Difficulty::Standard => 1.0,
            Difficulty::Frantic => 1.35,
        }
    }
}

/// Session controller numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionTuning {
    pub matches_per_level: u32,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            matches_per_level: MATCHES_PER_LEVEL,
        }
    }
}

/// Character controller numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CharacterTuning {
    pub base_height: f32,
    pub rise_rate: f32,
    pub active_gravity_factor: f32,
    pub drop_offset: f32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            base_height: BASE_HEIGHT,
            rise_rate: RISE_RATE,
            active_gravity_factor: ACTIVE_GRAVITY_FACTOR,
            drop_offset: DROP_OFFSET,
        }
    }
}

/// Scrolling ground numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroundTuning {
    /// Units per second
    pub speed: f32,
    pub left_bound: f32,
    pub reset_offset: f32,
    /// Tiles scrolled (extra children are left alone)
    pub capacity: usize,
}

impl Default for GroundTuning {
    fn default() -> Self {
        Self {
            speed: GROUND_SPEED,
            left_bound: GROUND_LEFT_BOUND,
            reset_offset: GROUND_RESET_OFFSET,
            capacity: GROUND_CAPACITY,
        }
    }
}

/// Obstacle field numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObstacleTuning {
    /// Units per second
    pub speed: f32,
    pub left_bound: f32,
    pub reset_offset: f32,
    pub min_height: f32,
    pub max_height: f32,
    /// Pool size at level 1
    pub base_count: u32,
    /// Fractional pool growth per level
    pub level_increase_rate: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            speed: OBSTACLE_SPEED,
            left_bound: OBSTACLE_LEFT_BOUND,
            reset_offset: OBSTACLE_RESET_OFFSET,
            min_height: OBSTACLE_MIN_HEIGHT,
            max_height: OBSTACLE_MAX_HEIGHT,
            base_count: OBSTACLE_BASE_COUNT,
            level_increase_rate: OBSTACLE_LEVEL_INCREASE_RATE,
        }
    }
}

/// Background scale per platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackdropTuning {
    pub desktop_scale: Vec3,
    pub mobile_scale: Vec3,
}

impl Default for BackdropTuning {
    fn default() -> Self {
        Self {
            // Wider screens get a wider backdrop
            desktop_scale: Vec3::new(5.0, 6.0, 5.0),
            mobile_scale: Vec3::new(3.0, 6.0, 3.0),
        }
    }
}

/// All balance numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Tuning {
    pub difficulty: Difficulty,
    pub session: SessionTuning,
    pub character: CharacterTuning,
    pub ground: GroundTuning,
    pub obstacles: ObstacleTuning,
    pub backdrop: BackdropTuning,
}

impl Tuning {
    /// Defaults adjusted for a difficulty preset
    pub fn from_preset(preset: Difficulty) -> Self {
        let mut tuning = Self::default();
        tuning.apply_preset(preset);
        tuning
    }

    /// Switch preset, rescaling field speeds relative to the current preset
    pub fn apply_preset(&mut self, preset: Difficulty) {
        let scale = preset.speed_multiplier() / self.difficulty.speed_multiplier();
        self.ground.speed *= scale;
        self.obstacles.speed *= scale;
        self.difficulty = preset;
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load tuning from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    return tuning;
                }
                Err(e) => log::warn!("Invalid tuning in {}: {}", path.display(), e),
            },
            Err(e) => log::warn!("Could not read {}: {}", path.display(), e),
        }

        log::info!("Using default tuning");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(
            r#"{ "difficulty": "frantic", "obstacles": { "baseCount": 12 }, "session": {} }"#,
        )
        .unwrap();
        assert_eq!(tuning.difficulty, Difficulty::Frantic);
        assert_eq!(tuning.obstacles.base_count, 12);
        assert_eq!(tuning.obstacles.left_bound, OBSTACLE_LEFT_BOUND);
        assert_eq!(tuning.session.matches_per_level, MATCHES_PER_LEVEL);
        assert_eq!(tuning.ground, GroundTuning::default());
    }

    #[test]
    fn test_json_round_trip() {
        let tuning = Tuning::from_preset(Difficulty::Relaxed);
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Tuning::from_json("{ \"ground\": { \"speed\": \"fast\" } }").is_err());
    }

    #[test]
    fn test_presets_scale_speeds() {
        let relaxed = Tuning::from_preset(Difficulty::Relaxed);
        assert!((relaxed.ground.speed - GROUND_SPEED * 0.75).abs() < 1e-4);

        let mut tuning = relaxed.clone();
        tuning.apply_preset(Difficulty::Standard);
        assert!((tuning.ground.speed - GROUND_SPEED).abs() < 1e-4);
        assert!((tuning.obstacles.speed - OBSTACLE_SPEED).abs() < 1e-4);

        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Frantic));
        assert_eq!(Difficulty::from_str("nope"), None);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let tuning = Tuning::load(Path::new("/definitely/not/here.json"));
        assert_eq!(tuning, Tuning::default());
    }
}
