//! Host world interface
//!
//! Positioning, hierarchy, visuals, colliders and audio belong to the host
//! runtime. Controllers only talk to it through [`World`]. Calls against an
//! entity that lacks the relevant capability are silent no-ops.
//!
//! [`HeadlessWorld`] is an in-memory host used by the demo binary and tests.

use std::collections::BTreeMap;

use glam::Vec3;

use super::event::{EntityId, ItemType, Platform, TargetColor};

/// Model attachment
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub url: String,
    pub position: Vec3,
    pub scale: Vec3,
    pub rotation: Vec3,
}

impl ModelSpec {
    /// Model at the origin with unit scale and no rotation
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
        }
    }
}

/// Animation request for a model
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSpec {
    pub clip: String,
    pub looped: bool,
    pub time_scale: f32,
}

/// Classification attached to a collider so gameplay can tell bodies apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderTag {
    /// A dropped item
    Item(ItemType),
    /// A target house of the given colour
    Target(TargetColor),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColliderShape {
    #[default]
    Box,
    Sphere,
}

/// Collider attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderSpec {
    pub shape: ColliderShape,
    /// Trigger colliders report contacts but do not push bodies around
    pub is_trigger: bool,
    pub tag: Option<ColliderTag>,
}

/// Everything the behaviour layer needs from the host runtime
pub trait World {
    // Positioning
    fn set_position(&mut self, entity: EntityId, position: Vec3);
    fn position(&self, entity: EntityId) -> Option<Vec3>;
    fn set_scale(&mut self, entity: EntityId, scale: Vec3);

    // Hierarchy
    fn create_entity(&mut self) -> EntityId;
    fn attach_child(&mut self, parent: EntityId, child: EntityId);
    fn children(&self, entity: EntityId) -> Vec<EntityId>;
    fn remove_entity(&mut self, entity: EntityId);

    // Visuals
    fn set_model(&mut self, entity: EntityId, model: ModelSpec);
    fn set_animation(&mut self, entity: EntityId, animation: AnimationSpec);

    // Colliders
    fn create_collider(&mut self, entity: EntityId, collider: ColliderSpec);
    fn set_gravity_factor(&mut self, entity: EntityId, factor: f32);
    fn collider_tag(&self, entity: EntityId) -> Option<ColliderTag>;

    // Audio
    fn create_audio(&mut self, entity: EntityId);
    fn has_audio(&self, entity: EntityId) -> bool;
    fn set_audio_clip(&mut self, entity: EntityId, url: &str);
    fn set_audio_paused(&mut self, entity: EntityId, paused: bool);

    // Platform
    fn platform(&self) -> Platform;
}

/// Audio source attached to a headless entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioSource {
    pub url: String,
    pub paused: bool,
}

/// One entity of the headless world
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub position: Vec3,
    pub scale: Vec3,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    pub model: Option<ModelSpec>,
    pub animation: Option<AnimationSpec>,
    pub collider: Option<ColliderSpec>,
    pub gravity_factor: f32,
    pub audio: Option<AudioSource>,
}

/// In-memory host world without rendering or physics
#[derive(Debug, Clone)]
pub struct HeadlessWorld {
    nodes: BTreeMap<EntityId, Node>,
    next_id: u32,
    platform: Platform,
    /// Every unpause of an audio source, in order: (entity, clip url)
    plays: Vec<(EntityId, String)>,
}

impl Default for HeadlessWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
            platform: Platform::Desktop,
            plays: Vec::new(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn set_platform(&mut self, platform: Platform) {
        self.platform = platform;
    }

    pub fn node(&self, entity: EntityId) -> Option<&Node> {
        self.nodes.get(&entity)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.nodes.contains_key(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.nodes.len()
    }

    /// Audio plays recorded so far, oldest first
    pub fn plays(&self) -> &[(EntityId, String)] {
        &self.plays
    }

    /// How many times `entity` started playing `url`
    pub fn play_count(&self, entity: EntityId, url: &str) -> usize {
        self.plays
            .iter()
            .filter(|(e, u)| *e == entity && u == url)
            .count()
    }

    pub fn clear_plays(&mut self) {
        self.plays.clear();
    }
}

impl World for HeadlessWorld {
    fn set_position(&mut self, entity: EntityId, position: Vec3) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.position = position;
        }
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.nodes.get(&entity).map(|n| n.position)
    }

    fn set_scale(&mut self, entity: EntityId, scale: Vec3) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.scale = scale;
        }
    }

    fn create_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                scale: Vec3::ONE,
                ..Default::default()
            },
        );
        id
    }

    fn attach_child(&mut self, parent: EntityId, child: EntityId) {
        if parent == child || !self.nodes.contains_key(&parent) {
            return;
        }
        let old_parent = match self.nodes.get_mut(&child) {
            Some(node) => node.parent.replace(parent),
            None => return,
        };
        if let Some(old) = old_parent.and_then(|p| self.nodes.get_mut(&p)) {
            old.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn children(&self, entity: EntityId) -> Vec<EntityId> {
        self.nodes
            .get(&entity)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn remove_entity(&mut self, entity: EntityId) {
        let Some(node) = self.nodes.remove(&entity) else {
            return;
        };
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != entity);
        }
        for child in node.children {
            self.remove_entity(child);
        }
    }

    fn set_model(&mut self, entity: EntityId, model: ModelSpec) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.model = Some(model);
        }
    }

    fn set_animation(&mut self, entity: EntityId, animation: AnimationSpec) {
        // Animations need a model to play on
        if let Some(node) = self.nodes.get_mut(&entity) {
            if node.model.is_some() {
                node.animation = Some(animation);
            }
        }
    }

    fn create_collider(&mut self, entity: EntityId, collider: ColliderSpec) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.collider = Some(collider);
        }
    }

    fn set_gravity_factor(&mut self, entity: EntityId, factor: f32) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.gravity_factor = factor;
        }
    }

    fn collider_tag(&self, entity: EntityId) -> Option<ColliderTag> {
        self.nodes
            .get(&entity)
            .and_then(|n| n.collider)
            .and_then(|c| c.tag)
    }

    fn create_audio(&mut self, entity: EntityId) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.audio.get_or_insert(AudioSource {
                url: String::new(),
                paused: true,
            });
        }
    }

    fn has_audio(&self, entity: EntityId) -> bool {
        self.nodes.get(&entity).is_some_and(|n| n.audio.is_some())
    }

    fn set_audio_clip(&mut self, entity: EntityId, url: &str) {
        if let Some(audio) = self.nodes.get_mut(&entity).and_then(|n| n.audio.as_mut()) {
            audio.url = url.to_string();
        }
    }

    fn set_audio_paused(&mut self, entity: EntityId, paused: bool) {
        if let Some(audio) = self.nodes.get_mut(&entity).and_then(|n| n.audio.as_mut()) {
            audio.paused = paused;
            if !paused {
                self.plays.push((entity, audio.url.clone()));
            }
        }
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_and_removal() {
        let mut world = HeadlessWorld::new();
        let parent = world.create_entity();
        let a = world.create_entity();
        let b = world.create_entity();
        world.attach_child(parent, a);
        world.attach_child(parent, b);
        assert_eq!(world.children(parent), vec![a, b]);

        world.remove_entity(a);
        assert_eq!(world.children(parent), vec![b]);
        assert!(!world.contains(a));

        world.remove_entity(parent);
        assert!(!world.contains(b));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_missing_capabilities_are_no_ops() {
        let mut world = HeadlessWorld::new();
        let entity = world.create_entity();

        world.set_audio_paused(entity, false);
        assert!(world.plays().is_empty());

        world.set_animation(
            entity,
            AnimationSpec {
                clip: "Idle".into(),
                looped: true,
                time_scale: 1.0,
            },
        );
        assert!(world.node(entity).and_then(|n| n.animation.as_ref()).is_none());

        // Unknown entity
        world.set_position(EntityId(999), Vec3::ONE);
        assert_eq!(world.position(EntityId(999)), None);
        assert!(world.children(EntityId(999)).is_empty());
    }

    #[test]
    fn test_audio_play_log() {
        let mut world = HeadlessWorld::new();
        let entity = world.create_entity();
        world.create_audio(entity);
        world.set_audio_clip(entity, "assets/match.mp3");
        world.set_audio_paused(entity, false);
        world.set_audio_paused(entity, true);
        assert_eq!(world.play_count(entity, "assets/match.mp3"), 1);
    }
}
