//! Per-entity finite state machines
//!
//! A behaviour declares its states and a static rule table. The table says,
//! per state, which events it listens to (on its own entity or on the global
//! channel), which of them cause a transition (optionally guarded) and which
//! are handled in place. The runtime owns subscriptions: entering a state
//! subscribes exactly the events that state lists, leaving it releases exactly
//! those handles, so restart loops can never accumulate listeners.

use std::any::Any;
use std::fmt;

use rand_pcg::Pcg32;

use super::bus::{EventBus, SubscriptionHandle};
use super::event::{EntityId, Event, EventName, Target};
use super::world::World;
use crate::audio::{self, Cue};

/// Pure predicate deciding whether a matching event may transition
pub type Guard<B> = fn(&B, &Event) -> bool;

/// Where a state listens for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Events addressed to the owning entity only
    Own,
    /// Events on the global channel, whatever their target
    Global,
}

/// What a rule does when its event arrives
pub enum Reaction<S, B> {
    /// Move to another state if the guard (if any) accepts the event
    Transition { to: S, guard: Option<Guard<B>> },
    /// Stay put and call [`Behavior::on_event`]
    Handle,
}

/// One row of a behaviour's rule table
pub struct Rule<S, B> {
    pub from: S,
    pub event: EventName,
    pub scope: Scope,
    pub reaction: Reaction<S, B>,
}

impl<S, B> Rule<S, B> {
    pub const fn on(from: S, event: EventName, scope: Scope, to: S) -> Self {
        Self {
            from,
            event,
            scope,
            reaction: Reaction::Transition { to, guard: None },
        }
    }

    pub const fn on_if(from: S, event: EventName, scope: Scope, to: S, guard: Guard<B>) -> Self {
        Self {
            from,
            event,
            scope,
            reaction: Reaction::Transition {
                to,
                guard: Some(guard),
            },
        }
    }

    pub const fn handle(from: S, event: EventName, scope: Scope) -> Self {
        Self {
            from,
            event,
            scope,
            reaction: Reaction::Handle,
        }
    }
}

/// Find the transition `(state, event)` leads to, if any rule allows it
pub fn resolve<S: Copy + PartialEq, B>(
    rules: &[Rule<S, B>],
    behavior: &B,
    state: S,
    event: &Event,
) -> Option<S> {
    rules
        .iter()
        .filter(|r| r.from == state && r.event == event.name)
        .find_map(|r| match r.reaction {
            Reaction::Transition { to, guard } => {
                guard.is_none_or(|g| g(behavior, event)).then_some(to)
            }
            Reaction::Handle => None,
        })
}

/// Events a state listens to, one entry per event name (first scope wins)
pub fn listens<S: Copy + PartialEq, B>(rules: &[Rule<S, B>], state: S) -> Vec<(EventName, Scope)> {
    let mut out: Vec<(EventName, Scope)> = Vec::new();
    for rule in rules.iter().filter(|r| r.from == state) {
        if !out.iter().any(|(name, _)| *name == rule.event) {
            out.push((rule.event, rule.scope));
        }
    }
    out
}

/// Deferred request produced while a handler runs
pub enum Command {
    Dispatch(Event),
    Attach(Box<dyn Component>),
    Remove(EntityId),
}

/// Everything a hook may touch while it runs
pub struct Context<'a> {
    entity: EntityId,
    pub(crate) bus: &'a mut EventBus,
    pub world: &'a mut dyn World,
    pub rng: &'a mut Pcg32,
    commands: &'a mut Vec<Command>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        entity: EntityId,
        bus: &'a mut EventBus,
        world: &'a mut dyn World,
        rng: &'a mut Pcg32,
        commands: &'a mut Vec<Command>,
    ) -> Self {
        Self {
            entity,
            bus,
            world,
            rng,
            commands,
        }
    }

    /// The entity whose behaviour is running
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Queue an event; it is delivered as soon as the current hook returns
    pub fn dispatch(&mut self, event: Event) {
        self.commands.push(Command::Dispatch(event));
    }

    /// Queue an event addressed to the running entity
    pub fn dispatch_self(&mut self, name: EventName) {
        let event = Event::to(self.entity, name);
        self.dispatch(event);
    }

    /// Play a cue on the running entity (silent if it has no audio)
    pub fn cue(&mut self, cue: Cue) -> bool {
        audio::play(&mut *self.world, self.entity, cue)
    }

    /// Queue a new behaviour to be attached and started
    pub fn attach(&mut self, component: Box<dyn Component>) {
        self.commands.push(Command::Attach(component));
    }

    /// Queue removal of an entity (its behaviour, subscriptions and world node)
    pub fn remove(&mut self, entity: EntityId) {
        self.commands.push(Command::Remove(entity));
    }
}

/// Behaviour of one kind of entity
pub trait Behavior: Sized + 'static {
    type State: Copy + PartialEq + fmt::Debug + 'static;

    /// Human-readable name for logs
    const NAME: &'static str;
    const INITIAL: Self::State;
    const RULES: &'static [Rule<Self::State, Self>];

    /// Runs once when the entity joins the simulation, before the initial state is entered
    fn on_attach(&mut self, _ctx: &mut Context<'_>) {}
    fn on_enter(&mut self, _state: Self::State, _ctx: &mut Context<'_>) {}
    fn on_exit(&mut self, _state: Self::State, _ctx: &mut Context<'_>) {}
    /// Called for [`Reaction::Handle`] rules of the current state
    fn on_event(&mut self, _state: Self::State, _event: &Event, _ctx: &mut Context<'_>) {}
    /// Per-frame update
    fn tick(&mut self, _state: Self::State, _ctx: &mut Context<'_>, _dt: f32) {}
}

/// Type-erased machine as stored by the simulation
pub trait Component: Any {
    fn entity(&self) -> EntityId;
    fn name(&self) -> &'static str;
    fn state_label(&self) -> String;
    fn start(&mut self, ctx: &mut Context<'_>);
    fn handle(&mut self, event: &Event, ctx: &mut Context<'_>);
    fn tick(&mut self, ctx: &mut Context<'_>, dt: f32);
    /// Release every subscription without running exit hooks
    fn detach(&mut self, bus: &mut EventBus);
    fn as_any(&self) -> &dyn Any;
}

/// A behaviour bound to an entity, with its current state
pub struct Machine<B: Behavior> {
    entity: EntityId,
    state: B::State,
    behavior: B,
    subscriptions: Vec<SubscriptionHandle>,
}

impl<B: Behavior> Machine<B> {
    pub fn new(entity: EntityId, behavior: B) -> Self {
        Self {
            entity,
            state: B::INITIAL,
            behavior,
            subscriptions: Vec::new(),
        }
    }

    pub fn state(&self) -> B::State {
        self.state
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    /// Live subscription count (one per event the current state listens to)
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn subscribe_current(&mut self, bus: &mut EventBus) {
        for (name, scope) in listens(B::RULES, self.state) {
            let target = match scope {
                Scope::Own => Target::Entity(self.entity),
                Scope::Global => Target::Global,
            };
            self.subscriptions.push(bus.subscribe(target, name, self.entity));
        }
    }

    fn release(&mut self, bus: &mut EventBus) {
        for handle in self.subscriptions.drain(..) {
            bus.unsubscribe(handle);
        }
    }

    fn transition(&mut self, next: B::State, ctx: &mut Context<'_>) {
        log::debug!(
            "{} {:?}: {:?} -> {:?}",
            B::NAME,
            self.entity,
            self.state,
            next
        );
        self.behavior.on_exit(self.state, ctx);
        self.release(ctx.bus);
        self.state = next;
        self.subscribe_current(ctx.bus);
        self.behavior.on_enter(next, ctx);
    }
}

impl<B: Behavior> Component for Machine<B> {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn name(&self) -> &'static str {
        B::NAME
    }

    fn state_label(&self) -> String {
        format!("{:?}", self.state)
    }

    fn start(&mut self, ctx: &mut Context<'_>) {
        self.behavior.on_attach(ctx);
        self.state = B::INITIAL;
        self.subscribe_current(ctx.bus);
        self.behavior.on_enter(self.state, ctx);
    }

    fn handle(&mut self, event: &Event, ctx: &mut Context<'_>) {
        let state = self.state;
        let handled = B::RULES.iter().any(|r| {
            r.from == state && r.event == event.name && matches!(r.reaction, Reaction::Handle)
        });
        if handled {
            self.behavior.on_event(state, event, ctx);
        }

        match resolve(B::RULES, &self.behavior, state, event) {
            Some(next) if next != state => self.transition(next, ctx),
            Some(_) => log::warn!("{} ignored self-transition on {}", B::NAME, event.name.as_str()),
            None => {}
        }
    }

    fn tick(&mut self, ctx: &mut Context<'_>, dt: f32) {
        self.behavior.tick(self.state, ctx, dt);
    }

    fn detach(&mut self, bus: &mut EventBus) {
        self.release(bus);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::event::Payload;
    use crate::sim::runtime::Simulation;
    use crate::sim::world::HeadlessWorld;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Door {
        Closed,
        Open,
    }

    struct Keyed {
        key: EntityId,
        /// Hook calls in order, with the state each ran in
        calls: Vec<(&'static str, Door)>,
    }

    impl Keyed {
        fn new(key: EntityId) -> Self {
            Self {
                key,
                calls: Vec::new(),
            }
        }
    }

    fn has_key(door: &Keyed, event: &Event) -> bool {
        event.other() == Some(door.key)
    }

    impl Behavior for Keyed {
        type State = Door;
        const NAME: &'static str = "keyed";
        const INITIAL: Door = Door::Closed;
        const RULES: &'static [Rule<Door, Self>] = &[
            Rule::handle(Door::Closed, EventName::CollisionStart, Scope::Own),
            Rule::on_if(Door::Closed, EventName::CollisionStart, Scope::Own, Door::Open, has_key),
            Rule::on(Door::Open, EventName::Restart, Scope::Global, Door::Closed),
        ];

        fn on_exit(&mut self, state: Door, _ctx: &mut Context<'_>) {
            self.calls.push(("exit", state));
        }

        fn on_event(&mut self, state: Door, _event: &Event, _ctx: &mut Context<'_>) {
            self.calls.push(("handle", state));
        }
    }

    fn touch(other: u32) -> Event {
        Event::to(EntityId(1), EventName::CollisionStart).with(Payload::Collision {
            other: EntityId(other),
        })
    }

    #[test]
    fn test_guarded_transition_table() {
        let door = Keyed::new(EntityId(9));
        assert_eq!(resolve(Keyed::RULES, &door, Door::Closed, &touch(9)), Some(Door::Open));
        assert_eq!(resolve(Keyed::RULES, &door, Door::Closed, &touch(4)), None);
        assert_eq!(resolve(Keyed::RULES, &door, Door::Open, &touch(9)), None);
        assert_eq!(
            resolve(Keyed::RULES, &door, Door::Open, &Event::global(EventName::Restart)),
            Some(Door::Closed)
        );
    }

    #[test]
    fn test_listens_dedupes_event_names() {
        assert_eq!(
            listens(Keyed::RULES, Door::Closed),
            vec![(EventName::CollisionStart, Scope::Own)]
        );
        assert_eq!(
            listens(Keyed::RULES, Door::Open),
            vec![(EventName::Restart, Scope::Global)]
        );
    }

    #[test]
    fn test_handler_runs_before_guarded_transition() {
        let mut sim = Simulation::new(HeadlessWorld::new(), 3);
        let door = sim.world_mut().create_entity();
        sim.attach(door, Keyed::new(EntityId(9)));
        let machine = |sim: &Simulation<HeadlessWorld>| {
            let m = sim.machine::<Keyed>(door).unwrap();
            (m.state(), m.behavior().calls.clone())
        };

        // Guard refuses: the handler still sees the event, no transition
        sim.collision_start(door, EntityId(4));
        assert_eq!(machine(&sim), (Door::Closed, vec![("handle", Door::Closed)]));

        sim.collision_start(door, EntityId(9));
        assert_eq!(
            machine(&sim),
            (
                Door::Open,
                vec![
                    ("handle", Door::Closed),
                    ("handle", Door::Closed),
                    ("exit", Door::Closed)
                ]
            )
        );

        // Open does not listen for collisions at all
        sim.collision_start(door, EntityId(9));
        assert_eq!(machine(&sim).1.len(), 3);
    }
}
