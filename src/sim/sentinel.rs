//! Collision sentinels
//!
//! The only behaviours that look at raw collision notifications. Each turns
//! them into one semantic event and nothing else.

use super::event::{EntityId, Event, EventName, ItemType, Payload};
use super::machine::{Behavior, Context, Rule, Scope};
use super::world::ColliderTag;
use crate::audio::Cue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardPhase {
    Watching,
}

/// Ends the session when the character touches this entity.
///
/// Armed only while a session is being played: it arms on `startGame` and
/// disarms as soon as it reports (or hears of) a `gameOver`, so several
/// obstacles touched in one frame still produce a single `gameOver`.
pub struct GameOverCollider {
    character: EntityId,
    session: EntityId,
    armed: bool,
}

impl GameOverCollider {
    pub fn new(character: EntityId, session: EntityId) -> Self {
        Self {
            character,
            session,
            armed: false,
        }
    }

    /// Start armed (for hazards spawned while a session is running)
    pub fn armed(mut self, armed: bool) -> Self {
        self.armed = armed;
        self
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl Behavior for GameOverCollider {
    type State = HazardPhase;
    const NAME: &'static str = "game-over collider";
    const INITIAL: HazardPhase = HazardPhase::Watching;
    const RULES: &'static [Rule<HazardPhase, Self>] = &[
        Rule::handle(HazardPhase::Watching, EventName::CollisionStart, Scope::Own),
        Rule::handle(HazardPhase::Watching, EventName::StartGame, Scope::Global),
        Rule::handle(HazardPhase::Watching, EventName::GameOver, Scope::Global),
    ];

    fn on_event(&mut self, _state: HazardPhase, event: &Event, ctx: &mut Context<'_>) {
        match event.name {
            EventName::StartGame => self.armed = true,
            EventName::GameOver => self.armed = false,
            EventName::CollisionStart => {
                if self.armed && event.other() == Some(self.character) {
                    self.armed = false;
                    log::info!("{:?} hit hazard {:?}", self.character, ctx.entity());
                    ctx.dispatch(Event::to(self.session, EventName::GameOver));
                    ctx.cue(Cue::Collision);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorPhase {
    InAir,
    Grounded,
}

/// Tracks whether the character container rests on this floor and announces
/// `onFloor` / `offFloor` on itself when that changes
pub struct FloorCollider {
    container: EntityId,
}

impl FloorCollider {
    pub fn new(container: EntityId) -> Self {
        Self { container }
    }
}

fn involves_container(floor: &FloorCollider, event: &Event) -> bool {
    event.other() == Some(floor.container)
}

impl Behavior for FloorCollider {
    type State = FloorPhase;
    const NAME: &'static str = "floor collider";
    const INITIAL: FloorPhase = FloorPhase::InAir;
    const RULES: &'static [Rule<FloorPhase, Self>] = &[
        Rule::on_if(
            FloorPhase::InAir,
            EventName::CollisionStart,
            Scope::Own,
            FloorPhase::Grounded,
            involves_container,
        ),
        Rule::on_if(
            FloorPhase::Grounded,
            EventName::CollisionEnd,
            Scope::Own,
            FloorPhase::InAir,
            involves_container,
        ),
    ];

    // Exit hooks only run on real transitions, never on the initial enter
    fn on_exit(&mut self, state: FloorPhase, ctx: &mut Context<'_>) {
        match state {
            FloorPhase::InAir => ctx.dispatch_self(EventName::OnFloor),
            FloorPhase::Grounded => ctx.dispatch_self(EventName::OffFloor),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPhase {
    Falling,
}

/// Rides on a dropped item. The first thing it lands on ends its fall: a
/// house is reported as a delivery, anything else is a miss. Either way the
/// item is removed, and so are items still in the air when the session ends.
pub struct DropSentinel {
    item: ItemType,
    landed: bool,
}

impl DropSentinel {
    pub fn new(item: ItemType) -> Self {
        Self {
            item,
            landed: false,
        }
    }

    pub fn item(&self) -> ItemType {
        self.item
    }

    fn discard(&mut self, ctx: &mut Context<'_>) {
        self.landed = true;
        let entity = ctx.entity();
        ctx.remove(entity);
    }
}

impl Behavior for DropSentinel {
    type State = DropPhase;
    const NAME: &'static str = "drop sentinel";
    const INITIAL: DropPhase = DropPhase::Falling;
    const RULES: &'static [Rule<DropPhase, Self>] = &[
        Rule::handle(DropPhase::Falling, EventName::CollisionStart, Scope::Own),
        Rule::handle(DropPhase::Falling, EventName::GameOver, Scope::Global),
        Rule::handle(DropPhase::Falling, EventName::Restart, Scope::Global),
    ];

    fn on_event(&mut self, _state: DropPhase, event: &Event, ctx: &mut Context<'_>) {
        if self.landed {
            return;
        }
        match event.name {
            EventName::CollisionStart => {
                let Some(other) = event.other() else {
                    return;
                };
                if let Some(ColliderTag::Target(target)) = ctx.world.collider_tag(other) {
                    ctx.dispatch(
                        Event::global(EventName::DropItem).with(Payload::Drop {
                            item: self.item,
                            target,
                        }),
                    );
                } else {
                    log::debug!("{:?} missed, landed on {:?}", self.item, other);
                }
                self.discard(ctx);
            }
            EventName::GameOver | EventName::Restart => self.discard(ctx),
            _ => {}
        }
    }
}
