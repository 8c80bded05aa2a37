//! Entity ids, event names and payloads
//!
//! Events are plain values. Nothing here knows who listens.

use serde::{Deserialize, Serialize};

/// Opaque entity handle issued by the host world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Event address: one entity, or the reserved global channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Entity(EntityId),
    Global,
}

/// Every event name the behaviour layer uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    /// Screen touch / primary press started (host input)
    PrimaryInput,
    StartGame,
    /// An item landed on a target
    DropItem,
    /// Player asked the sleigh to drop a gift
    DropGift,
    /// Player asked the sleigh to drop coal
    DropCoal,
    LevelUp,
    GameOver,
    Restart,
    /// Raw physics contact began
    CollisionStart,
    /// Raw physics contact ended
    CollisionEnd,
    OnFloor,
    OffFloor,
    DeviceChange,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::PrimaryInput => "primaryInput",
            EventName::StartGame => "startGame",
            EventName::DropItem => "dropItem",
            EventName::DropGift => "dropGift",
            EventName::DropCoal => "dropCoal",
            EventName::LevelUp => "levelUp",
            EventName::GameOver => "gameOver",
            EventName::Restart => "restart",
            EventName::CollisionStart => "collisionStart",
            EventName::CollisionEnd => "collisionEnd",
            EventName::OnFloor => "onFloor",
            EventName::OffFloor => "offFloor",
            EventName::DeviceChange => "deviceChange",
        }
    }
}

/// What the sleigh can drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Gift,
    Coal,
}

impl ItemType {
    /// The event the character listens for to drop this item
    pub fn drop_event(self) -> EventName {
        match self {
            ItemType::Gift => EventName::DropGift,
            ItemType::Coal => EventName::DropCoal,
        }
    }

    /// Gifts go to green houses, coal goes to red ones
    pub fn matches(self, color: TargetColor) -> bool {
        matches!(
            (self, color),
            (ItemType::Gift, TargetColor::Green) | (ItemType::Coal, TargetColor::Red)
        )
    }
}

/// Colour of a target house
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetColor {
    Red,
    Green,
}

impl TargetColor {
    /// The item this target wants
    pub fn accepts(self) -> ItemType {
        match self {
            TargetColor::Red => ItemType::Coal,
            TargetColor::Green => ItemType::Gift,
        }
    }
}

/// Host platform class, used for layout decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Platform {
    #[default]
    Desktop,
    Mobile,
}

/// Optional event data
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Payload {
    #[default]
    None,
    Drop { item: ItemType, target: TargetColor },
    Collision { other: EntityId },
    Device { platform: Platform },
}

/// A dispatched event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub name: EventName,
    pub target: Target,
    pub payload: Payload,
}

impl Event {
    /// Event on the global channel
    pub fn global(name: EventName) -> Self {
        Self {
            name,
            target: Target::Global,
            payload: Payload::None,
        }
    }

    /// Event addressed to one entity
    pub fn to(entity: EntityId, name: EventName) -> Self {
        Self {
            name,
            target: Target::Entity(entity),
            payload: Payload::None,
        }
    }

    pub fn with(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// The other party of a collision notification
    pub fn other(&self) -> Option<EntityId> {
        match self.payload {
            Payload::Collision { other } => Some(other),
            _ => None,
        }
    }
}
