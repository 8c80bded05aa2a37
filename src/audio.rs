//! Audio cues
//!
//! Controllers never touch audio sources directly: they fire a [`Cue`] on an
//! entity and the entity's audio source (if it has one) switches clip and
//! plays. Entities without audio simply stay silent.

use serde::{Deserialize, Serialize};

use crate::sim::{EntityId, World};

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// Sleigh climbed a level
    LevelUp,
    /// Session ended
    GameOver,
    /// Correct item on the right house
    Match,
    /// Item left the sleigh
    Drop,
    /// Sleigh hit an obstacle
    Collision,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::LevelUp => "levelUp",
            Cue::GameOver => "gameOver",
            Cue::Match => "match",
            Cue::Drop => "drop",
            Cue::Collision => "collision",
        }
    }

    /// Clip played for this cue
    pub fn clip_url(&self) -> &'static str {
        match self {
            Cue::LevelUp => "assets/level-up.mp3",
            Cue::GameOver => "assets/game-over.mp3",
            Cue::Match => "assets/match.mp3",
            Cue::Drop => "assets/drop.mp3",
            Cue::Collision => "assets/collision.mp3",
        }
    }
}

/// Play a cue on an entity's audio source. Returns false if it has none.
pub fn play(world: &mut dyn World, entity: EntityId, cue: Cue) -> bool {
    if !world.has_audio(entity) {
        return false;
    }
    log::trace!("cue {} on {:?}", cue.as_str(), entity);
    world.set_audio_clip(entity, cue.clip_url());
    world.set_audio_paused(entity, false);
    true
}

/// Pause an entity's audio source if it is playing
pub fn pause(world: &mut dyn World, entity: EntityId) -> bool {
    if !world.has_audio(entity) {
        return false;
    }
    world.set_audio_paused(entity, true);
    true
}

/// Swap the clip without starting playback
pub fn change_clip(world: &mut dyn World, entity: EntityId, url: &str) -> bool {
    if !world.has_audio(entity) {
        return false;
    }
    world.set_audio_clip(entity, url);
    true
}
