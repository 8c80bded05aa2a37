//! Simulation runtime
//!
//! Owns the bus, the host world, the seeded RNG and every attached state
//! machine. Dispatch is synchronous and depth-first: each listener's hook runs
//! to completion, then whatever it queued (events, attachments, removals) is
//! processed before the next listener of the original event runs.

use rand_pcg::Pcg32;

use super::bus::EventBus;
use super::event::{EntityId, Event, EventName, Payload};
use super::machine::{Behavior, Command, Component, Context, Machine};
use super::state::RngState;
use super::world::World;

/// The behaviour layer of one game, bound to a host world
pub struct Simulation<W: World> {
    world: W,
    bus: EventBus,
    /// Attachment order is tick order
    components: Vec<Box<dyn Component>>,
    rng_state: RngState,
    rng: Pcg32,
    frame: u64,
}

impl<W: World> Simulation<W> {
    pub fn new(world: W, seed: u64) -> Self {
        let rng_state = RngState::new(seed);
        let rng = rng_state.to_rng();
        Self {
            world,
            bus: EventBus::new(),
            components: Vec::new(),
            rng_state,
            rng,
            frame: 0,
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn seed(&self) -> u64 {
        self.rng_state.seed
    }

    /// Frames stepped so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn has_behavior(&self, entity: EntityId) -> bool {
        self.components.iter().any(|c| c.entity() == entity)
    }

    /// Current state of an entity's machine, for logs and diagnostics
    pub fn state_label(&self, entity: EntityId) -> Option<String> {
        self.components
            .iter()
            .find(|c| c.entity() == entity)
            .map(|c| c.state_label())
    }

    /// Typed view of an attached machine
    pub fn machine<B: Behavior>(&self, entity: EntityId) -> Option<&Machine<B>> {
        self.components
            .iter()
            .filter(|c| c.entity() == entity)
            .find_map(|c| c.as_any().downcast_ref::<Machine<B>>())
    }

    /// Entities running behaviour `B`, in attachment order
    pub fn attached<B: Behavior>(&self) -> Vec<EntityId> {
        self.components
            .iter()
            .filter(|c| c.as_any().is::<Machine<B>>())
            .map(|c| c.entity())
            .collect()
    }

    /// Bind a behaviour to an entity and enter its initial state
    pub fn attach<B: Behavior>(&mut self, entity: EntityId, behavior: B) -> bool {
        self.attach_component(Box::new(Machine::new(entity, behavior)))
    }

    /// Attach an already-built machine. An entity carries at most one.
    pub fn attach_component(&mut self, component: Box<dyn Component>) -> bool {
        let entity = component.entity();
        if self.has_behavior(entity) {
            log::warn!(
                "{:?} already has a behaviour; refusing to attach {}",
                entity,
                component.name()
            );
            return false;
        }
        log::debug!("attach {} to {:?}", component.name(), entity);
        self.components.push(component);
        self.run_on(entity, |component, ctx| component.start(ctx));
        true
    }

    /// Drop an entity and its descendants: release their subscriptions,
    /// their machines and their world nodes
    pub fn remove(&mut self, entity: EntityId) {
        let mut subtree = vec![entity];
        let mut next = 0;
        while let Some(&node) = subtree.get(next) {
            subtree.extend(self.world.children(node));
            next += 1;
        }
        for node in subtree {
            if let Some(index) = self.components.iter().position(|c| c.entity() == node) {
                let mut component = self.components.remove(index);
                component.detach(&mut self.bus);
                log::debug!("removed {} from {:?}", component.name(), node);
            }
        }
        self.world.remove_entity(entity);
    }

    /// Deliver an event to every current listener, depth-first
    pub fn dispatch(&mut self, event: Event) {
        log::trace!("dispatch {} -> {:?}", event.name.as_str(), event.target);
        let listeners = self.bus.listeners(event.target, event.name);
        for (handle, listener) in listeners {
            // Unsubscribed while an earlier listener ran
            if !self.bus.is_live(handle) {
                continue;
            }
            self.run_on(listener, |component, ctx| component.handle(&event, ctx));
        }
    }

    /// Host notification: `entity` started touching `other`
    pub fn collision_start(&mut self, entity: EntityId, other: EntityId) {
        self.dispatch(
            Event::to(entity, EventName::CollisionStart).with(Payload::Collision { other }),
        );
    }

    /// Host notification: `entity` stopped touching `other`
    pub fn collision_end(&mut self, entity: EntityId, other: EntityId) {
        self.dispatch(Event::to(entity, EventName::CollisionEnd).with(Payload::Collision { other }));
    }

    /// Run every machine's per-frame update once
    pub fn step(&mut self, dt: f32) {
        self.frame += 1;
        let entities: Vec<EntityId> = self.components.iter().map(|c| c.entity()).collect();
        for entity in entities {
            self.run_on(entity, |component, ctx| component.tick(ctx, dt));
        }
    }

    fn run_on(&mut self, entity: EntityId, f: impl FnOnce(&mut dyn Component, &mut Context<'_>)) {
        let mut commands = Vec::new();
        if let Some(component) = self.components.iter_mut().find(|c| c.entity() == entity) {
            let mut ctx = Context::new(
                entity,
                &mut self.bus,
                &mut self.world,
                &mut self.rng,
                &mut commands,
            );
            f(component.as_mut(), &mut ctx);
        }
        self.apply(commands);
    }

    fn apply(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Dispatch(event) => self.dispatch(event),
                Command::Attach(component) => {
                    self.attach_component(component);
                }
                Command::Remove(entity) => self.remove(entity),
            }
        }
    }
}
