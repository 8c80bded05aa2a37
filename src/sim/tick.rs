//! Scene assembly and the per-frame tick
//!
//! [`Game`] wires every controller onto a host world the way the sleigh scene
//! is laid out; [`tick`] turns one frame of host input into events and then
//! runs the per-frame updates.

use glam::Vec3;

use super::backdrop::BackdropController;
use super::character::CharacterController;
use super::event::{EntityId, Event, EventName, ItemType, Payload, Platform, TargetColor};
use super::field::{GroundController, ObstacleController};
use super::runtime::Simulation;
use super::sentinel::{DropSentinel, FloorCollider};
use super::session::{SessionController, SessionPhase};
use super::state::{CharacterState, SessionState};
use super::world::{ColliderShape, ColliderSpec, ModelSpec, World};
use crate::tuning::Tuning;

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Primary touch/press started this frame
    pub primary_press: bool,
    /// Debug key standing in for a press
    pub debug_start: bool,
    /// Item the player asked to drop
    pub drop: Option<ItemType>,
    /// Host switched device class
    pub device_change: Option<Platform>,
}

/// Entities of the assembled scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    pub session: EntityId,
    /// Sleigh container (moved, collides, plays character cues)
    pub character: EntityId,
    /// Animated sleigh model, child of the container
    pub character_model: EntityId,
    pub floor: EntityId,
    pub ground: EntityId,
    pub obstacles: EntityId,
    pub backdrop: EntityId,
}

/// A fully wired sleigh scene
pub struct Game<W: World> {
    sim: Simulation<W>,
    handles: SceneHandles,
}

impl<W: World> Game<W> {
    pub fn new(world: W, tuning: &Tuning, seed: u64) -> Self {
        let mut sim = Simulation::new(world, seed);
        let handles = build_scene(&mut sim, tuning);
        log::info!(
            "Scene ready (seed {}, difficulty {})",
            seed,
            tuning.difficulty.as_str()
        );
        Self { sim, handles }
    }

    pub fn sim(&self) -> &Simulation<W> {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut Simulation<W> {
        &mut self.sim
    }

    pub fn world(&self) -> &W {
        self.sim.world()
    }

    pub fn handles(&self) -> SceneHandles {
        self.handles
    }

    pub fn session_phase(&self) -> Option<SessionPhase> {
        self.sim
            .machine::<SessionController>(self.handles.session)
            .map(|m| m.state())
    }

    pub fn session_state(&self) -> Option<SessionState> {
        self.sim
            .machine::<SessionController>(self.handles.session)
            .map(|m| m.behavior().state())
    }

    pub fn character_state(&self) -> Option<CharacterState> {
        self.sim
            .machine::<CharacterController>(self.handles.character)
            .map(|m| m.behavior().state())
    }

    /// Items still falling
    pub fn falling_items(&self) -> Vec<EntityId> {
        self.sim.attached::<DropSentinel>()
    }

    /// Houses of the obstacle field with their colours, in pool order
    pub fn houses(&self) -> Vec<(EntityId, TargetColor)> {
        self.sim
            .machine::<ObstacleController>(self.handles.obstacles)
            .map(|m| {
                let field = m.behavior();
                field
                    .pool()
                    .members()
                    .iter()
                    .copied()
                    .zip(field.colors().iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// House whose x is closest to the sleigh (which flies at x = 0)
    pub fn nearest_house(&self) -> Option<(EntityId, TargetColor)> {
        self.houses()
            .into_iter()
            .filter_map(|(entity, color)| {
                self.world()
                    .position(entity)
                    .map(|p| (entity, color, p.x.abs()))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(entity, color, _)| (entity, color))
    }
}

fn build_scene<W: World>(sim: &mut Simulation<W>, tuning: &Tuning) -> SceneHandles {
    let world = sim.world_mut();

    let session = world.create_entity();
    world.create_audio(session);

    let character = world.create_entity();
    let character_model = world.create_entity();
    world.attach_child(character, character_model);
    world.set_model(character_model, ModelSpec::new("assets/sleigh.glb"));
    world.create_audio(character);
    world.create_collider(
        character,
        ColliderSpec {
            shape: ColliderShape::Box,
            is_trigger: false,
            tag: None,
        },
    );

    let floor = world.create_entity();
    world.set_position(floor, Vec3::new(0.0, -10.0, 0.0));
    world.create_collider(
        floor,
        ColliderSpec {
            shape: ColliderShape::Box,
            is_trigger: false,
            tag: None,
        },
    );

    let ground = world.create_entity();
    let tiles = tuning.ground.capacity;
    for index in 0..tiles {
        let tile = world.create_entity();
        world.attach_child(ground, tile);
        world.set_model(tile, ModelSpec::new("assets/ground.glb"));
        let x = tuning.ground.left_bound + index as f32 * tuning.ground.reset_offset / tiles as f32;
        world.set_position(tile, Vec3::new(x, -10.0, 0.0));
    }

    let obstacles = world.create_entity();

    let backdrop = world.create_entity();
    world.set_model(backdrop, ModelSpec::new("assets/backdrop.glb"));

    // Session first so it hears global events before the other controllers
    sim.attach(session, SessionController::new(tuning.session));
    sim.attach(
        character,
        CharacterController::new(tuning.character).with_model(character_model),
    );
    sim.attach(floor, FloorCollider::new(character));
    sim.attach(ground, GroundController::new(tuning.ground));
    sim.attach(
        obstacles,
        ObstacleController::new(tuning.obstacles).with_hazard(character, session),
    );
    sim.attach(backdrop, BackdropController::new(tuning.backdrop));

    SceneHandles {
        session,
        character,
        character_model,
        floor,
        ground,
        obstacles,
        backdrop,
    }
}

/// Advance the game by one frame: deliver this frame's input, then update
pub fn tick<W: World>(game: &mut Game<W>, input: &TickInput, dt: f32) {
    let handles = game.handles;

    if input.primary_press || input.debug_start {
        game.sim
            .dispatch(Event::to(handles.session, EventName::PrimaryInput));
    }

    if let Some(item) = input.drop {
        game.sim
            .dispatch(Event::to(handles.character, item.drop_event()));
    }

    if let Some(platform) = input.device_change {
        game.sim.dispatch(
            Event::global(EventName::DeviceChange).with(Payload::Device { platform }),
        );
    }

    game.sim.step(dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Cue;
    use crate::consts::SIM_DT;
    use crate::sim::character::CharacterPhase;
    use crate::sim::field::{GroundPhase, ObstaclePhase};
    use crate::sim::world::HeadlessWorld;

    fn game() -> Game<HeadlessWorld> {
        Game::new(HeadlessWorld::new(), &Tuning::default(), 2024)
    }

    fn press(game: &mut Game<HeadlessWorld>) {
        let input = TickInput {
            primary_press: true,
            ..Default::default()
        };
        tick(game, &input, SIM_DT);
    }

    /// Drop `item` and land it on a house of `color`
    fn deliver(game: &mut Game<HeadlessWorld>, item: ItemType, color: TargetColor) {
        let input = TickInput {
            drop: Some(item),
            ..Default::default()
        };
        tick(game, &input, SIM_DT);
        let falling = game.falling_items();
        let dropped = *falling.last().unwrap();
        let (house, _) = game
            .houses()
            .into_iter()
            .find(|(_, c)| *c == color)
            .unwrap();
        game.sim_mut().collision_start(dropped, house);
    }

    #[test]
    fn test_scene_layout() {
        let game = game();
        let h = game.handles();
        let tiles = game.world().children(h.ground);
        assert_eq!(tiles.len(), 5);
        let xs: Vec<f32> = tiles
            .iter()
            .map(|t| game.world().position(*t).unwrap().x)
            .collect();
        assert_eq!(xs, vec![-50.0, -30.0, -10.0, 10.0, 30.0]);
        assert_eq!(game.houses().len(), 8);
        assert_eq!(game.session_phase(), Some(SessionPhase::Start));
        assert_eq!(game.world().position(h.character).unwrap().y, 5.0);
        assert_eq!(game.world().node(h.backdrop).unwrap().scale, Vec3::new(5.0, 6.0, 5.0));
    }

    #[test]
    fn test_three_matches_raise_the_level_everywhere() {
        let mut game = game();
        press(&mut game);
        assert_eq!(game.session_phase(), Some(SessionPhase::Playing));

        deliver(&mut game, ItemType::Gift, TargetColor::Green);
        deliver(&mut game, ItemType::Coal, TargetColor::Red);
        assert_eq!(game.session_state().unwrap().matched_count, 2);
        deliver(&mut game, ItemType::Gift, TargetColor::Green);

        let session = game.session_state().unwrap();
        assert_eq!((session.level, session.matched_count), (2, 0));
        assert_eq!(game.character_state().unwrap().level, 2);
        assert_eq!(game.world().position(game.handles().character).unwrap().y, 10.0);
        let field = game
            .sim()
            .machine::<ObstacleController>(game.handles().obstacles)
            .unwrap();
        assert_eq!(field.behavior().level(), 2);
        assert!(game.falling_items().is_empty());
    }

    #[test]
    fn test_hazard_contact_ends_the_session() {
        let mut game = game();
        let h = game.handles();
        let (house, _) = game.houses()[0];

        press(&mut game);
        game.sim_mut().collision_start(house, h.character);
        assert_eq!(game.session_phase(), Some(SessionPhase::GameOver));
        assert_eq!(
            game.sim().machine::<CharacterController>(h.character).unwrap().state(),
            CharacterPhase::Dead
        );
        assert_eq!(
            game.sim().machine::<GroundController>(h.ground).unwrap().state(),
            GroundPhase::Paused
        );
        assert_eq!(
            game.sim().machine::<ObstacleController>(h.obstacles).unwrap().state(),
            ObstaclePhase::Finished
        );

        // Dropping is over too
        let input = TickInput {
            drop: Some(ItemType::Gift),
            ..Default::default()
        };
        tick(&mut game, &input, SIM_DT);
        assert!(game.falling_items().is_empty());
    }

    #[test]
    fn test_restart_cycles_do_not_duplicate_cues() {
        let mut game = game();
        let h = game.handles();
        let mut bus_sizes = Vec::new();

        for cycle in 1..=2 {
            press(&mut game);
            deliver(&mut game, ItemType::Gift, TargetColor::Green);
            deliver(&mut game, ItemType::Coal, TargetColor::Green);
            assert_eq!(game.session_phase(), Some(SessionPhase::GameOver));

            let world = game.world();
            assert_eq!(world.play_count(h.session, Cue::Match.clip_url()), cycle);
            assert_eq!(world.play_count(h.session, Cue::GameOver.clip_url()), cycle);
            assert_eq!(world.play_count(h.character, Cue::GameOver.clip_url()), cycle);
            assert_eq!(world.play_count(h.character, Cue::Drop.clip_url()), 2 * cycle);

            press(&mut game);
            let session = game.session_state().unwrap();
            assert_eq!((session.level, session.matched_count, session.active), (1, 0, true));
            bus_sizes.push(game.sim().bus().len());
        }
        assert_eq!(bus_sizes[0], bus_sizes[1]);
    }

    #[test]
    fn test_stray_items_do_not_reach_the_next_session() {
        let mut game = game();
        let h = game.handles();
        press(&mut game);

        let release = |game: &mut Game<HeadlessWorld>, item| {
            let input = TickInput {
                drop: Some(item),
                ..Default::default()
            };
            tick(game, &input, SIM_DT);
            *game.falling_items().last().unwrap()
        };

        // One lands on the floor, one is still falling at game over
        let missed = release(&mut game, ItemType::Coal);
        game.sim_mut().collision_start(missed, h.floor);
        assert!(!game.sim().has_behavior(missed));
        let airborne = release(&mut game, ItemType::Coal);

        let (house, _) = game.houses()[0];
        game.sim_mut().collision_start(house, h.character);
        assert_eq!(game.session_phase(), Some(SessionPhase::GameOver));
        assert!(game.falling_items().is_empty());

        press(&mut game);
        assert_eq!(game.session_phase(), Some(SessionPhase::Playing));
        let (red, _) = game
            .houses()
            .into_iter()
            .find(|(_, c)| *c == TargetColor::Red)
            .unwrap();
        game.sim_mut().collision_start(airborne, red);
        assert_eq!(game.session_state().unwrap().matched_count, 0);
        assert!(!game.world().contains(airborne));
    }

    #[test]
    fn test_debug_key_and_device_change() {
        let mut game = game();
        let input = TickInput {
            debug_start: true,
            device_change: Some(Platform::Mobile),
            ..Default::default()
        };
        tick(&mut game, &input, SIM_DT);
        assert_eq!(game.session_phase(), Some(SessionPhase::Playing));
        assert_eq!(
            game.world().node(game.handles().backdrop).unwrap().scale,
            Vec3::new(3.0, 6.0, 3.0)
        );
        assert_eq!(game.sim().frame(), 1);
    }

    #[test]
    fn test_same_seed_same_field() {
        let mut a = game();
        let mut b = game();
        let input = TickInput {
            primary_press: true,
            ..Default::default()
        };
        tick(&mut a, &input, SIM_DT);
        tick(&mut b, &input, SIM_DT);
        for _ in 0..600 {
            tick(&mut a, &TickInput::default(), SIM_DT);
            tick(&mut b, &TickInput::default(), SIM_DT);
        }
        let heights = |g: &Game<HeadlessWorld>| -> Vec<Vec3> {
            g.houses()
                .iter()
                .map(|(e, _)| g.world().position(*e).unwrap())
                .collect()
        };
        assert_eq!(heights(&a), heights(&b));
        assert_eq!(a.houses(), b.houses());
    }
}
