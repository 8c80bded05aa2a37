//! Typed publish/subscribe registry
//!
//! The bus only records who listens to what. Delivery (and re-entrancy) is
//! driven by [`crate::sim::Simulation::dispatch`], which asks the bus for a
//! snapshot of listeners and re-checks each handle before invoking it.

use super::event::{EntityId, EventName, Target};

/// Handle returned by [`EventBus::subscribe`]; the only way to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

#[derive(Debug, Clone)]
struct Subscription {
    handle: SubscriptionHandle,
    target: Target,
    name: EventName,
    listener: EntityId,
}

/// Registry of `(target, event name) -> listener` subscriptions
#[derive(Debug, Default)]
pub struct EventBus {
    /// Kept in registration order (handles grow monotonically)
    subscriptions: Vec<Subscription>,
    next_handle: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `name` events addressed to `target`
    pub fn subscribe(
        &mut self,
        target: Target,
        name: EventName,
        listener: EntityId,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;
        self.subscriptions.push(Subscription {
            handle,
            target,
            name,
            listener,
        });
        handle
    }

    /// Remove exactly this registration. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.handle != handle);
        self.subscriptions.len() != before
    }

    pub fn is_live(&self, handle: SubscriptionHandle) -> bool {
        self.subscriptions.iter().any(|s| s.handle == handle)
    }

    /// Snapshot of listeners for an event, in registration order.
    ///
    /// Entity-addressed events also reach every global subscriber of the same
    /// name; global events reach only global subscribers.
    pub fn listeners(&self, target: Target, name: EventName) -> Vec<(SubscriptionHandle, EntityId)> {
        self.subscriptions
            .iter()
            .filter(|s| s.name == name && (s.target == target || s.target == Target::Global))
            .map(|s| (s.handle, s.listener))
            .collect()
    }

    /// Number of live subscriptions held by one listener
    pub fn count_for(&self, listener: EntityId) -> usize {
        self.subscriptions
            .iter()
            .filter(|s| s.listener == listener)
            .count()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: EntityId = EntityId(1);
    const B: EntityId = EntityId(2);
    const C: EntityId = EntityId(3);

    #[test]
    fn test_entity_events_reach_global_listeners_in_order() {
        let mut bus = EventBus::new();
        bus.subscribe(Target::Global, EventName::GameOver, A);
        bus.subscribe(Target::Entity(B), EventName::GameOver, B);
        bus.subscribe(Target::Entity(C), EventName::GameOver, C);
        bus.subscribe(Target::Global, EventName::Restart, C);

        let to_b: Vec<_> = bus
            .listeners(Target::Entity(B), EventName::GameOver)
            .into_iter()
            .map(|(_, l)| l)
            .collect();
        assert_eq!(to_b, vec![A, B]);

        let global: Vec<_> = bus
            .listeners(Target::Global, EventName::GameOver)
            .into_iter()
            .map(|(_, l)| l)
            .collect();
        assert_eq!(global, vec![A]);
    }

    #[test]
    fn test_unsubscribe_is_exact() {
        let mut bus = EventBus::new();
        let first = bus.subscribe(Target::Global, EventName::LevelUp, A);
        let second = bus.subscribe(Target::Global, EventName::LevelUp, A);
        assert_ne!(first, second);

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        assert!(!bus.is_live(first));
        assert!(bus.is_live(second));
        assert_eq!(bus.listeners(Target::Global, EventName::LevelUp).len(), 1);
        assert_eq!(bus.count_for(A), 1);
    }

    #[test]
    fn test_snapshot_does_not_see_later_subscriptions() {
        let mut bus = EventBus::new();
        bus.subscribe(Target::Global, EventName::StartGame, A);
        let snapshot = bus.listeners(Target::Global, EventName::StartGame);
        bus.subscribe(Target::Global, EventName::StartGame, B);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(bus.len(), 2);
    }
}
