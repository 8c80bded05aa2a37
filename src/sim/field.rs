//! Scrolling fields
//!
//! Ground tiles and obstacles are fixed pools of child entities that slide
//! left every frame and wrap back to the spawn side once they cross the left
//! bound. Nothing is created or destroyed while scrolling; the obstacle pool
//! only changes size through an explicit [`FieldPool::resize`] migration.

use glam::Vec3;
use rand::Rng;
use rand::seq::SliceRandom;

use super::event::{EntityId, Event, EventName, TargetColor};
use super::machine::{Behavior, Context, Machine, Rule, Scope};
use super::sentinel::GameOverCollider;
use super::world::{ColliderShape, ColliderSpec, ColliderTag, ModelSpec, World};
use crate::tuning::{GroundTuning, ObstacleTuning};

/// Move `x` left by `distance`, wrapping by `reset_offset` once it passes
/// `left_bound`. Returns the new x and whether it wrapped.
pub fn scroll_x(x: f32, distance: f32, left_bound: f32, reset_offset: f32) -> (f32, bool) {
    let next = x - distance;
    if next < left_bound {
        (next + reset_offset, true)
    } else {
        (next, false)
    }
}

/// Obstacle count for a level: `floor(base * (1 + (level - 1) * rate))`
pub fn pool_size_for_level(base_count: u32, level_increase_rate: f32, level: u32) -> usize {
    let growth = level.saturating_sub(1) as f64 * level_increase_rate.max(0.0) as f64;
    // Nudge so 8 * 2.0 lands on 16 and not 15.999..
    (base_count as f64 * (1.0 + growth) + 1e-9).floor() as usize
}

/// Colours for a fresh pool: an even split, any remainder picked at random,
/// then shuffled so the colours don't come in runs
pub fn split_colors<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<TargetColor> {
    let half = size / 2;
    let mut colors = Vec::with_capacity(size);
    colors.extend(std::iter::repeat_n(TargetColor::Red, half));
    colors.extend(std::iter::repeat_n(TargetColor::Green, half));
    if size % 2 == 1 {
        colors.push(random_color(rng));
    }
    colors.shuffle(rng);
    colors
}

/// Colours for `extra` new members, each taking whichever colour is scarcer
pub fn extend_colors<R: Rng + ?Sized>(
    existing: &[TargetColor],
    extra: usize,
    rng: &mut R,
) -> Vec<TargetColor> {
    let mut red = existing.iter().filter(|c| **c == TargetColor::Red).count();
    let mut green = existing.len() - red;
    let mut out = Vec::with_capacity(extra);
    for _ in 0..extra {
        let color = match red.cmp(&green) {
            std::cmp::Ordering::Less => TargetColor::Red,
            std::cmp::Ordering::Greater => TargetColor::Green,
            std::cmp::Ordering::Equal => random_color(rng),
        };
        match color {
            TargetColor::Red => red += 1,
            TargetColor::Green => green += 1,
        }
        out.push(color);
    }
    out
}

fn random_color<R: Rng + ?Sized>(rng: &mut R) -> TargetColor {
    if rng.random_bool(0.5) {
        TargetColor::Red
    } else {
        TargetColor::Green
    }
}

/// Height in `[min, max)`, snapped down to a whole unit but never below
/// `min`; `min` when the range is empty
pub fn sample_height<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..max).floor().max(min)
}

/// Model used for an obstacle house of each colour
pub fn house_model_url(color: TargetColor) -> &'static str {
    match color {
        TargetColor::Red => "assets/house-red.glb",
        TargetColor::Green => "assets/house-green.glb",
    }
}

/// Result of resizing a pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Migration {
    /// Members that survived, in pool order
    pub kept: usize,
    /// New entities, already parented to the pool owner
    pub created: Vec<EntityId>,
    /// Members dropped from the pool; the caller removes them
    pub retired: Vec<EntityId>,
}

/// Ordered set of child entities recycled by a field
#[derive(Debug, Clone, Default)]
pub struct FieldPool {
    members: Vec<EntityId>,
    capacity: usize,
}

impl FieldPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            members: Vec::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Take over the owner's existing children, up to capacity
    pub fn adopt(&mut self, world: &dyn World, owner: EntityId) -> usize {
        let room = self.capacity.saturating_sub(self.members.len());
        let fresh: Vec<EntityId> = world
            .children(owner)
            .into_iter()
            .filter(|c| !self.members.contains(c))
            .take(room)
            .collect();
        self.members.extend(&fresh);
        fresh.len()
    }

    /// Grow or shrink to `target` members. Survivors keep their slots.
    pub fn resize(&mut self, target: usize, world: &mut dyn World, owner: EntityId) -> Migration {
        self.capacity = target;
        let mut migration = Migration::default();
        if target < self.members.len() {
            migration.retired = self.members.split_off(target);
        }
        migration.kept = self.members.len();
        while self.members.len() < target {
            let entity = world.create_entity();
            world.attach_child(owner, entity);
            self.members.push(entity);
            migration.created.push(entity);
        }
        migration
    }

    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundPhase {
    Moving,
    Paused,
}

/// Endless ground: scrolls its tiles until `gameOver`, resumes on `restart`
pub struct GroundController {
    tuning: GroundTuning,
    pool: FieldPool,
    active: bool,
}

impl GroundController {
    pub fn new(tuning: GroundTuning) -> Self {
        Self {
            tuning,
            pool: FieldPool::with_capacity(tuning.capacity),
            active: false,
        }
    }

    pub fn pool(&self) -> &FieldPool {
        &self.pool
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Behavior for GroundController {
    type State = GroundPhase;
    const NAME: &'static str = "ground";
    const INITIAL: GroundPhase = GroundPhase::Moving;
    const RULES: &'static [Rule<GroundPhase, Self>] = &[
        Rule::on(GroundPhase::Moving, EventName::GameOver, Scope::Global, GroundPhase::Paused),
        Rule::on(GroundPhase::Paused, EventName::Restart, Scope::Global, GroundPhase::Moving),
    ];

    fn on_attach(&mut self, ctx: &mut Context<'_>) {
        let adopted = self.pool.adopt(&*ctx.world, ctx.entity());
        log::debug!("ground scrolls {} tiles", adopted);
    }

    fn on_enter(&mut self, state: GroundPhase, _ctx: &mut Context<'_>) {
        self.active = state == GroundPhase::Moving;
    }

    fn tick(&mut self, _state: GroundPhase, ctx: &mut Context<'_>, dt: f32) {
        if !self.active {
            return;
        }
        let distance = self.tuning.speed * dt;
        for &tile in self.pool.members() {
            let Some(position) = ctx.world.position(tile) else {
                continue;
            };
            let (x, _) = scroll_x(
                position.x,
                distance,
                self.tuning.left_bound,
                self.tuning.reset_offset,
            );
            ctx.world.set_position(tile, Vec3::new(x, position.y, position.z));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstaclePhase {
    Start,
    InGame,
    Finished,
}

/// Field of red and green houses flying at the sleigh.
///
/// Houses are drop targets (trigger colliders tagged with their colour). With
/// a hazard link they also end the session when the sleigh touches them. The
/// pool grows with the level while playing and is laid out again for level 1
/// when the next session is being prepared.
pub struct ObstacleController {
    tuning: ObstacleTuning,
    pool: FieldPool,
    colors: Vec<TargetColor>,
    level: u32,
    active: bool,
    /// (character, session) for hazard sentinels on every member
    hazard: Option<(EntityId, EntityId)>,
}

impl ObstacleController {
    pub fn new(tuning: ObstacleTuning) -> Self {
        Self {
            tuning,
            pool: FieldPool::with_capacity(usize::MAX),
            colors: Vec::new(),
            level: 1,
            active: false,
            hazard: None,
        }
    }

    pub fn with_hazard(mut self, character: EntityId, session: EntityId) -> Self {
        self.hazard = Some((character, session));
        self
    }

    pub fn pool(&self) -> &FieldPool {
        &self.pool
    }

    pub fn colors(&self) -> &[TargetColor] {
        &self.colors
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn label(&self, entity: EntityId, color: TargetColor, ctx: &mut Context<'_>) {
        ctx.world.set_model(entity, ModelSpec::new(house_model_url(color)));
        ctx.world.create_collider(
            entity,
            ColliderSpec {
                shape: ColliderShape::Box,
                is_trigger: true,
                tag: Some(ColliderTag::Target(color)),
            },
        );
    }

    fn arm(&self, members: &[EntityId], ctx: &mut Context<'_>) {
        let Some((character, session)) = self.hazard else {
            return;
        };
        for &entity in members {
            let collider = GameOverCollider::new(character, session).armed(self.active);
            ctx.attach(Box::new(Machine::new(entity, collider)));
        }
    }

    fn migrate(&mut self, target: usize, ctx: &mut Context<'_>) -> Vec<EntityId> {
        let owner = ctx.entity();
        let migration = self.pool.resize(target, &mut *ctx.world, owner);
        self.colors.truncate(migration.kept);
        for entity in migration.retired {
            ctx.remove(entity);
        }
        self.arm(&migration.created, ctx);
        migration.created
    }

    /// Lay the whole pool out for the current level
    fn respawn(&mut self, ctx: &mut Context<'_>) {
        let size = pool_size_for_level(
            self.tuning.base_count,
            self.tuning.level_increase_rate,
            self.level,
        );
        self.migrate(size, ctx);
        self.colors = split_colors(size, &mut *ctx.rng);
        if size == 0 {
            log::warn!("obstacle pool is empty; nothing to spawn");
            return;
        }

        let spacing = self.tuning.left_bound / size as f32;
        for (index, (&entity, &color)) in self.pool.members().iter().zip(&self.colors).enumerate() {
            self.label(entity, color, ctx);
            let y = sample_height(&mut *ctx.rng, self.tuning.min_height, self.tuning.max_height);
            ctx.world
                .set_position(entity, Vec3::new(-(index as f32 * spacing), y, 0.0));
        }
        log::info!("obstacles respawned: {} houses for level {}", size, self.level);
    }

    /// Add members for the current level, keeping the ones already flying
    fn grow(&mut self, ctx: &mut Context<'_>) {
        let size = pool_size_for_level(
            self.tuning.base_count,
            self.tuning.level_increase_rate,
            self.level,
        );
        if size <= self.pool.len() {
            return;
        }
        let created = self.migrate(size, ctx);
        let colors = extend_colors(&self.colors, created.len(), &mut *ctx.rng);
        let spawn_x = self.tuning.left_bound + self.tuning.reset_offset;
        let spacing = self.tuning.left_bound.abs() / size as f32;
        for (offset, (&entity, &color)) in created.iter().zip(&colors).enumerate() {
            self.label(entity, color, ctx);
            let y = sample_height(&mut *ctx.rng, self.tuning.min_height, self.tuning.max_height);
            ctx.world
                .set_position(entity, Vec3::new(spawn_x + offset as f32 * spacing, y, 0.0));
        }
        self.colors.extend(colors);
        log::info!("obstacles grew to {} for level {}", size, self.level);
    }
}

impl Behavior for ObstacleController {
    type State = ObstaclePhase;
    const NAME: &'static str = "obstacles";
    const INITIAL: ObstaclePhase = ObstaclePhase::Start;
    const RULES: &'static [Rule<ObstaclePhase, Self>] = &[
        Rule::on(ObstaclePhase::Start, EventName::StartGame, Scope::Global, ObstaclePhase::InGame),
        Rule::handle(ObstaclePhase::InGame, EventName::LevelUp, Scope::Global),
        Rule::on(ObstaclePhase::InGame, EventName::GameOver, Scope::Global, ObstaclePhase::Finished),
        Rule::on(ObstaclePhase::Finished, EventName::Restart, Scope::Global, ObstaclePhase::Start),
    ];

    fn on_attach(&mut self, ctx: &mut Context<'_>) {
        self.pool.adopt(&*ctx.world, ctx.entity());
        let adopted = self.pool.members().to_vec();
        self.arm(&adopted, ctx);
        self.respawn(ctx);
    }

    fn on_exit(&mut self, state: ObstaclePhase, ctx: &mut Context<'_>) {
        match state {
            ObstaclePhase::Start => self.active = true,
            ObstaclePhase::InGame => self.active = false,
            ObstaclePhase::Finished => {
                self.level = 1;
                self.respawn(ctx);
            }
        }
    }

    fn on_event(&mut self, _state: ObstaclePhase, event: &Event, ctx: &mut Context<'_>) {
        if event.name == EventName::LevelUp {
            self.level += 1;
            self.grow(ctx);
        }
    }

    fn tick(&mut self, _state: ObstaclePhase, ctx: &mut Context<'_>, dt: f32) {
        if !self.active || self.pool.is_empty() {
            return;
        }
        let distance = self.tuning.speed * dt;
        for &entity in self.pool.members() {
            let Some(position) = ctx.world.position(entity) else {
                continue;
            };
            let (x, wrapped) = scroll_x(
                position.x,
                distance,
                self.tuning.left_bound,
                self.tuning.reset_offset,
            );
            let y = if wrapped {
                sample_height(&mut *ctx.rng, self.tuning.min_height, self.tuning.max_height)
            } else {
                position.y
            };
            ctx.world.set_position(entity, Vec3::new(x, y, position.z));
        }
    }
}
