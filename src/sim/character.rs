//! Character (sleigh) controller
//!
//! Floats the sleigh at a height given by its level, signals animation intent
//! on the character model and drops gifts or coal while a session is running.

use glam::Vec3;

use super::event::{EntityId, Event, EventName, ItemType};
use super::machine::{Behavior, Context, Machine, Rule, Scope};
use super::sentinel::DropSentinel;
use super::state::{CharacterState, height_for_level};
use super::world::{AnimationSpec, ColliderShape, ColliderSpec, ColliderTag, ModelSpec};
use crate::audio::Cue;
use crate::tuning::CharacterTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterPhase {
    Start,
    InGame,
    Dead,
}

/// What the character model should be doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationIntent {
    Idle,
    Active,
    Death,
}

impl AnimationIntent {
    pub fn spec(&self) -> AnimationSpec {
        let (clip, looped, time_scale) = match self {
            AnimationIntent::Idle => ("Flying_Idle", true, 1.0),
            AnimationIntent::Active => ("Flying_Fast", true, 1.5),
            AnimationIntent::Death => ("Death", false, 0.6),
        };
        AnimationSpec {
            clip: clip.to_string(),
            looped,
            time_scale,
        }
    }
}

/// Model used for a dropped item
pub fn item_model_url(item: ItemType) -> &'static str {
    match item {
        ItemType::Gift => "assets/teddy-bear.glb",
        ItemType::Coal => "assets/coal.glb",
    }
}

pub struct CharacterController {
    tuning: CharacterTuning,
    /// Entity carrying the animated model (animation requests go here)
    model: Option<EntityId>,
    /// Entity moved to the sleigh height; the controller's own entity if unset
    body: Option<EntityId>,
    state: CharacterState,
}

impl CharacterController {
    pub fn new(tuning: CharacterTuning) -> Self {
        Self {
            tuning,
            model: None,
            body: None,
            state: CharacterState::default(),
        }
    }

    pub fn with_model(mut self, model: EntityId) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_body(mut self, body: EntityId) -> Self {
        self.body = Some(body);
        self
    }

    pub fn state(&self) -> CharacterState {
        self.state
    }

    fn body(&self, ctx: &Context<'_>) -> EntityId {
        self.body.unwrap_or(ctx.entity())
    }

    fn animate(&self, intent: AnimationIntent, ctx: &mut Context<'_>) {
        if let Some(model) = self.model {
            ctx.world.set_animation(model, intent.spec());
        }
    }

    fn set_gravity(&mut self, factor: f32, ctx: &mut Context<'_>) {
        self.state.gravity_factor = factor;
        let body = self.body(ctx);
        ctx.world.set_gravity_factor(body, factor);
    }

    /// Recompute the height for the current level and move the body there
    fn place(&mut self, ctx: &mut Context<'_>) {
        self.state.height =
            height_for_level(self.state.level, self.tuning.base_height, self.tuning.rise_rate);
        let body = self.body(ctx);
        ctx.world
            .set_position(body, Vec3::new(0.0, self.state.height, 0.0));
    }

    fn drop_item(&mut self, item: ItemType, ctx: &mut Context<'_>) {
        let position = Vec3::new(0.0, self.state.height - self.tuning.drop_offset, 0.0);
        let entity = ctx.world.create_entity();
        ctx.world.set_model(
            entity,
            ModelSpec {
                position,
                ..ModelSpec::new(item_model_url(item))
            },
        );
        ctx.world.set_position(entity, position);
        ctx.world.create_collider(
            entity,
            ColliderSpec {
                shape: ColliderShape::Box,
                is_trigger: false,
                tag: Some(ColliderTag::Item(item)),
            },
        );
        ctx.attach(Box::new(Machine::new(entity, DropSentinel::new(item))));
        log::debug!("dropped {:?} as {:?} at y={}", item, entity, position.y);
        ctx.cue(Cue::Drop);
    }
}

impl Behavior for CharacterController {
    type State = CharacterPhase;
    const NAME: &'static str = "character";
    const INITIAL: CharacterPhase = CharacterPhase::Start;
    const RULES: &'static [Rule<CharacterPhase, Self>] = &[
        Rule::on(CharacterPhase::Start, EventName::StartGame, Scope::Global, CharacterPhase::InGame),
        Rule::handle(CharacterPhase::InGame, EventName::LevelUp, Scope::Global),
        Rule::handle(CharacterPhase::InGame, EventName::DropGift, Scope::Own),
        Rule::handle(CharacterPhase::InGame, EventName::DropCoal, Scope::Own),
        Rule::on(CharacterPhase::InGame, EventName::GameOver, Scope::Global, CharacterPhase::Dead),
        Rule::on(CharacterPhase::Dead, EventName::Restart, Scope::Global, CharacterPhase::Start),
    ];

    fn on_enter(&mut self, state: CharacterPhase, ctx: &mut Context<'_>) {
        match state {
            CharacterPhase::Start => {
                self.state.level = 1;
                self.place(ctx);
                self.set_gravity(0.0, ctx);
                self.animate(AnimationIntent::Idle, ctx);
            }
            CharacterPhase::InGame => {
                self.set_gravity(self.tuning.active_gravity_factor, ctx);
                self.animate(AnimationIntent::Active, ctx);
            }
            CharacterPhase::Dead => {
                self.animate(AnimationIntent::Death, ctx);
                ctx.cue(Cue::GameOver);
            }
        }
    }

    fn on_event(&mut self, _state: CharacterPhase, event: &Event, ctx: &mut Context<'_>) {
        match event.name {
            EventName::LevelUp => {
                self.state.level += 1;
                self.place(ctx);
                ctx.cue(Cue::LevelUp);
            }
            EventName::DropGift => self.drop_item(ItemType::Gift, ctx),
            EventName::DropCoal => self.drop_item(ItemType::Coal, ctx),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::runtime::Simulation;
    use crate::sim::world::{HeadlessWorld, World};

    struct Rig {
        sim: Simulation<HeadlessWorld>,
        sleigh: EntityId,
        model: EntityId,
    }

    fn rig() -> Rig {
        let mut sim = Simulation::new(HeadlessWorld::new(), 3);
        let sleigh = sim.world_mut().create_entity();
        let model = sim.world_mut().create_entity();
        sim.world_mut().attach_child(sleigh, model);
        sim.world_mut().set_model(model, ModelSpec::new("assets/sleigh.glb"));
        sim.world_mut().create_audio(sleigh);
        sim.attach(
            sleigh,
            CharacterController::new(CharacterTuning::default()).with_model(model),
        );
        Rig { sim, sleigh, model }
    }

    impl Rig {
        fn controller(&self) -> &Machine<CharacterController> {
            self.sim.machine::<CharacterController>(self.sleigh).unwrap()
        }

        fn clip(&self) -> String {
            let node = self.sim.world().node(self.model).unwrap();
            node.animation.as_ref().map(|a| a.clip.clone()).unwrap_or_default()
        }

        fn y(&self) -> f32 {
            self.sim.world().position(self.sleigh).unwrap().y
        }
    }

    #[test]
    fn test_starts_floating_idle() {
        let rig = rig();
        assert_eq!(rig.controller().state(), CharacterPhase::Start);
        assert_eq!(rig.controller().behavior().state().height, 5.0);
        assert_eq!(rig.y(), 5.0);
        assert_eq!(rig.clip(), "Flying_Idle");
        assert_eq!(rig.sim.world().node(rig.sleigh).unwrap().gravity_factor, 0.0);
    }

    #[test]
    fn test_level_up_raises_the_sleigh() {
        let mut rig = rig();
        // Ignored before the game starts
        rig.sim.dispatch(Event::global(EventName::LevelUp));
        assert_eq!(rig.y(), 5.0);

        rig.sim.dispatch(Event::global(EventName::StartGame));
        assert_eq!(rig.clip(), "Flying_Fast");

        rig.sim.dispatch(Event::global(EventName::LevelUp));
        rig.sim.dispatch(Event::global(EventName::LevelUp));
        let state = rig.controller().behavior().state();
        assert_eq!(state.level, 3);
        assert_eq!(state.height, 15.0);
        assert_eq!(rig.y(), 15.0);
        assert_eq!(rig.sim.world().play_count(rig.sleigh, Cue::LevelUp.clip_url()), 2);
    }

    #[test]
    fn test_drop_spawns_tagged_item_below_sleigh() {
        let mut rig = rig();
        rig.sim.dispatch(Event::to(rig.sleigh, EventName::DropGift));
        let before = rig.sim.world().entity_count();
        assert_eq!(before, 2, "drops are ignored before the start");

        rig.sim.dispatch(Event::global(EventName::StartGame));
        rig.sim.dispatch(Event::to(rig.sleigh, EventName::DropCoal));
        assert_eq!(rig.sim.world().entity_count(), 3);

        let item = EntityId(3);
        assert_eq!(
            rig.sim.world().collider_tag(item),
            Some(ColliderTag::Item(ItemType::Coal))
        );
        assert_eq!(rig.sim.world().position(item), Some(Vec3::new(0.0, 3.0, 0.0)));
        assert!(rig.sim.machine::<DropSentinel>(item).is_some());
        assert_eq!(rig.sim.world().play_count(rig.sleigh, Cue::Drop.clip_url()), 1);
    }

    #[test]
    fn test_death_and_restart() {
        let mut rig = rig();
        rig.sim.dispatch(Event::global(EventName::StartGame));
        rig.sim.dispatch(Event::global(EventName::LevelUp));
        rig.sim.dispatch(Event::global(EventName::GameOver));
        assert_eq!(rig.controller().state(), CharacterPhase::Dead);
        assert_eq!(rig.clip(), "Death");
        assert_eq!(rig.sim.world().play_count(rig.sleigh, Cue::GameOver.clip_url()), 1);

        rig.sim.dispatch(Event::global(EventName::Restart));
        assert_eq!(rig.controller().state(), CharacterPhase::Start);
        assert_eq!(rig.controller().behavior().state().level, 1);
        assert_eq!(rig.y(), 5.0);
        assert_eq!(rig.clip(), "Flying_Idle");
    }
}
